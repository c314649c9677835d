//! Cache Store Module
//!
//! Main cache engine: an ordered map of entries with TTL expiry, scored
//! eviction, pattern invalidation and an optional durable mirror.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::{
    duration_ms, eviction, CacheEntry, CacheStats, Clock, Persistence, SystemClock,
};
use crate::error::Result;

// == Cache Store ==
/// A bounded, named collection of entries keyed by string.
///
/// Keys are kept sorted so prefix invalidation only visits matching keys.
#[derive(Debug)]
pub struct CacheStore<T> {
    /// Namespace name, used in logs and the persistence prefix
    name: String,
    /// Key-value storage
    entries: BTreeMap<String, CacheEntry<T>>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// TTL applied when `set` gets none
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    /// Durable mirror, present only for persistent stores
    persistence: Option<Persistence>,
    next_sequence: u64,
}

/// Snapshot of one entry for operational tooling.
#[derive(Debug, Clone, Serialize)]
pub struct DebugEntry<T> {
    pub key: String,
    pub data: T,
    pub created_at: u64,
    pub expires_at: u64,
    pub access_count: u64,
    pub last_accessed_at: u64,
    pub ttl_remaining_ms: u64,
    pub expired: bool,
}

/// Full dump of a store, including entries that expired but were not swept yet.
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo<T> {
    pub name: String,
    pub capacity: usize,
    pub default_ttl_ms: u64,
    pub persistent: bool,
    pub stats: CacheStats,
    pub entries: Vec<DebugEntry<T>>,
}

impl<T> CacheStore<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Creates an in-memory store on the system clock.
    ///
    /// # Arguments
    /// * `name` - Namespace name
    /// * `capacity` - Maximum number of entries, at least 1
    /// * `default_ttl` - TTL for entries stored without an explicit one
    pub fn new(name: impl Into<String>, capacity: usize, default_ttl: Duration) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
            stats: CacheStats::new(),
            capacity: capacity.max(1),
            default_ttl,
            clock: Arc::new(SystemClock),
            persistence: None,
            next_sequence: 0,
        }
    }

    /// Replaces the time source. Call before [`with_persistence`](Self::with_persistence)
    /// so loaded entries are checked against the same clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Makes the store persistent and re-admits every live entry found in the
    /// durable medium.
    pub fn with_persistence(mut self, persistence: Persistence) -> Self {
        let loaded = persistence.load::<T>(self.clock.now_ms());
        self.persistence = Some(persistence);

        let now = self.clock.now_ms();
        for (key, mut entry) in loaded {
            if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
                self.evict_one(now);
            }
            entry.sequence = self.bump_sequence();
            self.entries.insert(key, entry);
        }
        self.stats.set_size(self.entries.len());

        if !self.entries.is_empty() {
            debug!(store = %self.name, restored = self.entries.len(), "Restored persisted entries");
        }
        self
    }

    // == Set ==
    /// Stores a payload, replacing any previous entry for the key.
    ///
    /// A new key arriving at a full store evicts the lowest-scoring entry
    /// first. Overwrites never evict and keep the key's insertion position.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `data` - The payload
    /// * `ttl` - Optional TTL (uses the store default if None)
    pub fn set(&mut self, key: impl Into<String>, data: T, ttl: Option<Duration>) {
        let key = key.into();
        let now = self.clock.now_ms();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_one(now);
        }

        let ttl_ms = duration_ms(ttl.unwrap_or(self.default_ttl));
        let mut entry = CacheEntry::new(data, now, ttl_ms);
        // An overwrite keeps its original place in the tie-break order
        entry.sequence = match self.entries.get(&key) {
            Some(previous) => previous.sequence,
            None => self.bump_sequence(),
        };

        if let Some(persistence) = &self.persistence {
            persistence.save(&key, &entry);
        }
        self.entries.insert(key, entry);
        self.stats.set_size(self.entries.len());
    }

    // == Get ==
    /// Retrieves a payload if present and not expired.
    ///
    /// Expired entries are removed and counted as misses. A hit bumps the
    /// entry's access count but does not extend its life.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_miss();
            return None;
        }

        let data = self.entries.get_mut(key).map(|entry| {
            entry.touch(now);
            entry.data.clone()
        });
        self.stats.record_hit();
        data
    }

    // == Has ==
    /// Checks for a live entry without touching stats or access metadata.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .map_or(false, |entry| !entry.is_expired(now))
    }

    // == Peek ==
    /// Like [`get`](Self::get) but read-only: no stats, no touch, no removal.
    pub fn peek(&self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.data.clone())
    }

    // == Delete ==
    /// Removes an entry and its persisted mirror. Returns whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    // == Clear ==
    /// Drops every entry, zeroes the stats and wipes the persisted mirror.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = CacheStats::new();
        if let Some(persistence) = &self.persistence {
            persistence.clear();
        }
    }

    // == Release ==
    /// Drops in-memory entries only, leaving the persisted mirror for the next
    /// process.
    pub fn release(&mut self) {
        self.entries.clear();
        self.stats.set_size(0);
    }

    // == Invalidate Pattern ==
    /// Removes every key matching a regular expression.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidPattern`](crate::error::CacheError::InvalidPattern)
    /// when `pattern` does not compile.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;
        Ok(self.invalidate_regex(&regex))
    }

    /// Removes every key matching a compiled regular expression.
    pub fn invalidate_regex(&mut self, regex: &Regex) -> usize {
        let keys: Vec<String> = self
            .entries
            .keys()
            .filter(|key| regex.is_match(key))
            .cloned()
            .collect();
        self.remove_keys(keys)
    }

    // == Invalidate Prefix ==
    /// Removes every key starting with `prefix`, visiting only those keys.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let keys: Vec<String> = self
            .entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        self.remove_keys(keys)
    }

    // == Cleanup ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        self.remove_keys(expired)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_size(self.entries.len());
        stats
    }

    // == Debug Info ==
    /// Dumps every entry with its computed expiry state.
    pub fn debug_info(&self) -> DebugInfo<T> {
        let now = self.clock.now_ms();
        DebugInfo {
            name: self.name.clone(),
            capacity: self.capacity,
            default_ttl_ms: duration_ms(self.default_ttl),
            persistent: self.persistence.is_some(),
            stats: self.stats(),
            entries: self
                .entries
                .iter()
                .map(|(key, entry)| DebugEntry {
                    key: key.clone(),
                    data: entry.data.clone(),
                    created_at: entry.created_at,
                    expires_at: entry.expires_at,
                    access_count: entry.access_count,
                    last_accessed_at: entry.last_accessed_at,
                    ttl_remaining_ms: entry.ttl_remaining_ms(now),
                    expired: entry.is_expired(now),
                })
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    // == Length ==
    /// Number of entries held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_one(&mut self, now: u64) {
        let victim = eviction::select_victim(&self.entries, now).cloned();
        if let Some(key) = victim {
            self.remove_entry(&key);
            self.stats.record_eviction();
            debug!(store = %self.name, key = %key, "Evicted entry to stay within capacity");
        }
    }

    fn remove_keys(&mut self, keys: Vec<String>) -> usize {
        let count = keys.len();
        for key in keys {
            self.remove_entry(&key);
        }
        count
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            if let Some(persistence) = &self.persistence {
                persistence.remove(key);
            }
            self.stats.set_size(self.entries.len());
        }
        existed
    }

    fn bump_sequence(&mut self) -> u64 {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }
}
