//! Lotto Cache - client-side caching for lottery retail data
//!
//! Namespaced in-memory stores with TTL expiration, usage-based eviction,
//! optional durable mirroring and domain-aware invalidation, plus a small
//! admin HTTP surface for inspecting and flushing them.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod manager;
pub mod models;
pub mod namespace;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::{Config, NamespaceConfig};
pub use error::{CacheError, Result};
pub use manager::{CacheManager, DateScope, DomainEvent, InvalidationReport};
pub use namespace::{Namespace, NamespaceCache, NamespaceRegistry};
pub use tasks::spawn_cleanup_task;
