//! API Routes
//!
//! Configures the Axum router with all cache admin endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cleanup_handler, clear_namespace_handler, debug_handler, global_stats_handler,
    health_handler, invalidate_handler, namespace_stats_handler, pattern_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /stats` - Statistics across every namespace
/// - `GET /namespaces/:name/stats` - One namespace's statistics
/// - `GET /namespaces/:name/debug` - Raw entries with expiry flags
/// - `DELETE /namespaces/:name` - Clear a namespace
/// - `POST /namespaces/:name/invalidate` - Remove keys matching a regex
/// - `POST /invalidate` - Apply a domain invalidation event
/// - `POST /cleanup` - Sweep expired entries now
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(global_stats_handler))
        .route("/namespaces/:name", delete(clear_namespace_handler))
        .route("/namespaces/:name/stats", get(namespace_stats_handler))
        .route("/namespaces/:name/debug", get(debug_handler))
        .route("/namespaces/:name/invalidate", post(pattern_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/cleanup", post(cleanup_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
