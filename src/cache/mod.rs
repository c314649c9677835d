//! Cache Module
//!
//! Provides the store engine: TTL expiry, scored eviction, pattern
//! invalidation and best-effort persistence.

mod clock;
mod entry;
pub mod eviction;
mod persistence;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, duration_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use persistence::{
    FileBackend, MemoryBackend, PersistedEntry, Persistence, PersistenceBackend, FORMAT_VERSION,
    KEY_PREFIX,
};
pub use stats::{efficiency_percent, CacheStats};
pub use store::{CacheStore, DebugEntry, DebugInfo};
