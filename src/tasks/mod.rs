//! Background Tasks Module
//!
//! Contains background tasks that run periodically while stores are alive.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired cache entries at a configured interval

mod cleanup;

pub use cleanup::{spawn_cleanup_task, DEFAULT_CLEANUP_INTERVAL};
