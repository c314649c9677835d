//! API Module
//!
//! HTTP handlers and routing for the cache admin surface: statistics, debug
//! dumps and manual invalidation for operators.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
