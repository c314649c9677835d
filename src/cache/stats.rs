//! Cache Statistics Module
//!
//! Tracks per-store hit/miss counters and the derived efficiency figure.

use serde::Serialize;

// == Cache Stats ==
/// Performance counters for one store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful retrievals
    pub hits: u64,
    /// Number of failed retrievals (key not found or expired)
    pub misses: u64,
    /// Every `get` call, hit or miss
    pub total_requests: u64,
    /// Remote fetches avoided thanks to a hit
    pub saved_requests: u64,
    /// Entries removed to stay within capacity
    pub evictions: u64,
    /// Current number of entries in the store
    pub size: usize,
    /// `round(100 * hits / total_requests)`, 0 with no requests
    pub efficiency_percent: u8,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.saved_requests += 1;
        self.total_requests += 1;
        self.recompute();
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.total_requests += 1;
        self.recompute();
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Update Entry Count ==
    pub fn set_size(&mut self, size: usize) {
        self.size = size;
    }

    // == Hit Rate ==
    /// Returns hits / total_requests, or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_requests as f64
        }
    }

    fn recompute(&mut self) {
        self.efficiency_percent = efficiency_percent(self.hits, self.total_requests);
    }
}

/// Rounded hit percentage, 0 when nothing was requested.
pub fn efficiency_percent(hits: u64, total_requests: u64) -> u8 {
    if total_requests == 0 {
        return 0;
    }
    (100.0 * hits as f64 / total_requests as f64).round() as u8
}
