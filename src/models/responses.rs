//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies. Stats and debug
//! dumps are served straight from the engine's own serializable types.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::manager::InvalidationReport;
use crate::namespace::Namespace;

/// Body for endpoints that remove entries
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    pub removed: usize,
}

impl RemovedResponse {
    pub fn new(removed: usize) -> Self {
        Self { removed }
    }
}

/// Response body for `POST /invalidate`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Entries removed per namespace
    pub removed: BTreeMap<Namespace, usize>,
    pub total: usize,
}

impl From<InvalidationReport> for InvalidateResponse {
    fn from(report: InvalidationReport) -> Self {
        Self {
            total: report.total(),
            removed: report.removed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_response_serialize() {
        let mut report = InvalidationReport::default();
        report.removed.insert(Namespace::Sales, 3);
        report.removed.insert(Namespace::UserProfile, 1);

        let json = serde_json::to_value(InvalidateResponse::from(report)).unwrap();

        assert_eq!(json["total"], 4);
        assert_eq!(json["removed"]["sales"], 3);
        assert_eq!(json["removed"]["user-profile"], 1);
    }

    #[test]
    fn test_removed_response_serialize() {
        let json = serde_json::to_string(&RemovedResponse::new(7)).unwrap();
        assert_eq!(json, r#"{"removed":7}"#);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
