//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and access metadata.

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A single cached payload with its timestamps and access metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The stored payload
    pub data: T,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), always after `created_at`
    pub expires_at: u64,
    /// Number of reads plus the initial write
    pub access_count: u64,
    /// Last read or write timestamp (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Insertion order within the owning store, used to break eviction ties
    #[serde(skip)]
    pub(crate) sequence: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry at `now_ms` that lives for `ttl_ms`.
    ///
    /// A zero TTL is clamped to one millisecond so `expires_at > created_at`
    /// always holds.
    pub fn new(data: T, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            data,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms.max(1)),
            access_count: 1,
            last_accessed_at: now_ms,
            sequence: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// Boundary condition: an entry is expired once `now_ms >= expires_at`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Touch ==
    /// Records a read at `now_ms`. Expiry is not extended.
    pub fn touch(&mut self, now_ms: u64) {
        self.access_count += 1;
        self.last_accessed_at = now_ms;
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }

    /// Minutes since the entry was last read or written.
    pub fn idle_minutes(&self, now_ms: u64) -> f64 {
        now_ms.saturating_sub(self.last_accessed_at) as f64 / 60_000.0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("payload".to_string(), 1_000, 60_000);

        assert_eq!(entry.data, "payload");
        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.expires_at, 61_000);
        assert_eq!(entry.access_count, 1);
        assert_eq!(entry.last_accessed_at, 1_000);
        assert!(!entry.is_expired(1_000));
    }

    #[test]
    fn test_zero_ttl_is_clamped() {
        let entry = CacheEntry::new(1u32, 500, 0);
        assert!(entry.expires_at > entry.created_at);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new((), 0, 10);

        assert!(!entry.is_expired(9));
        assert!(entry.is_expired(10), "Entry should be expired at boundary");
        assert!(entry.is_expired(11));
    }

    #[test]
    fn test_touch_does_not_extend_expiry() {
        let mut entry = CacheEntry::new((), 0, 1_000);
        entry.touch(900);

        assert_eq!(entry.access_count, 2);
        assert_eq!(entry.last_accessed_at, 900);
        assert_eq!(entry.expires_at, 1_000);
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new((), 0, 10_000);

        assert_eq!(entry.ttl_remaining_ms(4_000), 6_000);
        assert_eq!(entry.ttl_remaining_ms(20_000), 0);
    }

    #[test]
    fn test_idle_minutes() {
        let entry = CacheEntry::new((), 0, 1_000_000);
        assert_eq!(entry.idle_minutes(90_000), 1.5);
    }

    #[test]
    fn test_sequence_is_not_serialized() {
        let mut entry = CacheEntry::new(7u8, 0, 10);
        entry.sequence = 99;

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("sequence").is_none());
        assert_eq!(json["access_count"], 1);
    }
}
