//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{CacheStats, DebugInfo};
use crate::error::{CacheError, Result};
use crate::manager::{CacheManager, GlobalStats};
use crate::models::{
    HealthResponse, InvalidateRequest, InvalidateResponse, PatternRequest, RemovedResponse,
};
use crate::namespace::{Namespace, NamespaceRegistry};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<NamespaceRegistry>,
    pub manager: CacheManager,
}

impl AppState {
    /// Creates a new AppState around a registry.
    pub fn new(registry: Arc<NamespaceRegistry>) -> Self {
        Self {
            manager: CacheManager::new(Arc::clone(&registry)),
            registry,
        }
    }
}

/// Handler for GET /stats
pub async fn global_stats_handler(State(state): State<AppState>) -> Json<GlobalStats> {
    Json(state.manager.global_stats().await)
}

/// Handler for GET /namespaces/:name/stats
pub async fn namespace_stats_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CacheStats>> {
    let cache = state.registry.lookup(&name)?;
    Ok(Json(cache.stats().await))
}

/// Handler for GET /namespaces/:name/debug
pub async fn debug_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DebugInfo<Value>>> {
    let cache = state.registry.lookup(&name)?;
    Ok(Json(cache.debug_info().await))
}

/// Handler for DELETE /namespaces/:name
pub async fn clear_namespace_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RemovedResponse>> {
    let namespace: Namespace = name.parse()?;
    let removed = state.manager.invalidate_namespace(namespace).await;
    Ok(Json(RemovedResponse::new(removed)))
}

/// Handler for POST /namespaces/:name/invalidate
pub async fn pattern_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<PatternRequest>,
) -> Result<Json<RemovedResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let namespace: Namespace = name.parse()?;
    let removed = state
        .manager
        .invalidate_pattern(namespace, &req.pattern)
        .await?;
    Ok(Json(RemovedResponse::new(removed)))
}

/// Handler for POST /invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    let event = req.to_event()?;
    let report = state.manager.invalidate(&event).await;
    Ok(Json(report.into()))
}

/// Handler for POST /cleanup
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    Json(RemovedResponse::new(state.manager.cleanup().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    fn state() -> AppState {
        AppState::new(Arc::new(NamespaceRegistry::in_memory(&Config::default())))
    }

    #[tokio::test]
    async fn test_namespace_stats_handler() {
        let state = state();
        let sales = state.registry.get(Namespace::Sales);
        sales.set("sales:daily:2025-08-14", json!(10), None).await;
        sales.get("sales:daily:2025-08-14").await;

        let stats = namespace_stats_handler(State(state), Path("sales".to_string()))
            .await
            .unwrap();

        assert_eq!(stats.hits, 1);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test]
    async fn test_unknown_namespace() {
        let result = debug_handler(State(state()), Path("bingo".to_string())).await;
        assert!(matches!(result, Err(CacheError::UnknownNamespace(_))));
    }

    #[tokio::test]
    async fn test_pattern_handler_bad_regex() {
        let req = PatternRequest {
            pattern: "(".to_string(),
        };
        let result = pattern_handler(State(state()), Path("sales".to_string()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidPattern(_))));
    }

    #[tokio::test]
    async fn test_invalidate_handler() {
        let state = state();
        state
            .registry
            .get(Namespace::UserProfile)
            .set("user:5:profile", json!({"role": "supervisor"}), None)
            .await;

        let req = InvalidateRequest {
            domain: "user-profile".to_string(),
            date: None,
            month: None,
            user_id: Some("5".to_string()),
        };
        let response = invalidate_handler(State(state), Json(req)).await.unwrap();

        assert_eq!(response.total, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
