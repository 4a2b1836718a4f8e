//! Cache Statistics Module
//!
//! Lifetime counters for hits, misses, puts, evictions and expirations.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
///
/// Counters only ever grow for the life of one cache instance; clearing the
/// cache does not reset them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that returned a live value
    pub hit_count: u64,
    /// Number of lookups that found nothing (absent or expired)
    pub miss_count: u64,
    /// Number of put calls, inserts and updates alike
    pub put_count: u64,
    /// Number of entries evicted due to LRU policy
    pub eviction_count: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expired_count: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Derived Values ==
    /// Returns hits + misses.
    pub fn total_requests(&self) -> u64 {
        self.hit_count + self.miss_count
    }

    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }

    // == Recorders ==
    pub(crate) fn record_hit(&mut self) {
        self.hit_count += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.miss_count += 1;
    }

    pub(crate) fn record_put(&mut self) {
        self.put_count += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.eviction_count += 1;
    }

    /// Adds a batch of expirations at once.
    pub(crate) fn record_expired(&mut self, count: u64) {
        self.expired_count += count;
    }
}
