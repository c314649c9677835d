//! Error types for the caching engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the caching engine and its admin surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No store is registered under this name
    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalidation pattern failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Durable medium refused an operation
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// HTTP status used when the error reaches the admin API.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::UnknownNamespace(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidPattern(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Storage(_)
            | CacheError::Io(_)
            | CacheError::Serialization(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string()
        }));

        (self.status_code(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching engine.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use proptest::prelude::*;

    #[test]
    fn test_error_status_codes() {
        let bad_regex = regex::Regex::new("(").unwrap_err();
        let test_cases = vec![
            (CacheError::UnknownNamespace("lotto".to_string()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".to_string()), StatusCode::BAD_REQUEST),
            (CacheError::InvalidPattern(bad_regex), StatusCode::BAD_REQUEST),
            (CacheError::Storage("full".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (CacheError::Internal("error".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(
                response.status(),
                expected_status,
                "Error should map to correct HTTP status"
            );
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        // Every error body is JSON with a string "error" carrying the message
        #[test]
        fn prop_error_response_format(msg in "[a-zA-Z0-9 ]{1,64}", variant in 0u8..4) {
            let error = match variant {
                0 => CacheError::UnknownNamespace(msg.clone()),
                1 => CacheError::InvalidRequest(msg.clone()),
                2 => CacheError::Storage(msg.clone()),
                _ => CacheError::Internal(msg.clone()),
            };

            let response = error.into_response();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let bytes = rt.block_on(async { to_bytes(response.into_body(), usize::MAX).await.unwrap() });
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

            let error_str = json["error"].as_str();
            prop_assert!(error_str.is_some(), "'error' field should be a string");
            prop_assert!(error_str.unwrap().contains(&msg));
        }
    }
}
