//! Eviction Module
//!
//! Picks the entry to drop when a full store receives a new key.
//!
//! Each entry is scored as `access_count - 0.1 * minutes_since_last_access`
//! and the lowest score loses. A heavily read entry can therefore survive a
//! while without reads, unlike plain LRU.

use crate::cache::CacheEntry;

/// Weight applied to idle minutes when scoring.
pub const IDLE_MINUTE_WEIGHT: f64 = 0.1;

// == Score ==
/// Recency/frequency score of an entry at `now_ms`. Higher is kept longer.
pub fn score<T>(entry: &CacheEntry<T>, now_ms: u64) -> f64 {
    entry.access_count as f64 - IDLE_MINUTE_WEIGHT * entry.idle_minutes(now_ms)
}

// == Select Victim ==
/// Returns the key with the lowest score.
///
/// Ties go to the entry inserted first. Returns None for an empty iterator.
pub fn select_victim<'a, T: 'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a CacheEntry<T>)>,
    now_ms: u64,
) -> Option<&'a String> {
    let mut victim: Option<(&String, f64, u64)> = None;

    for (key, entry) in entries {
        let candidate = score(entry, now_ms);
        let replace = match victim {
            None => true,
            Some((_, best, seq)) => {
                candidate < best || (candidate == best && entry.sequence < seq)
            }
        };
        if replace {
            victim = Some((key, candidate, entry.sequence));
        }
    }

    victim.map(|(key, _, _)| key)
}
