//! Statistics report
//!
//! Point-in-time telemetry snapshot of a cache, ready for JSON output.

use std::hash::Hash;

use serde::Serialize;

use crate::cache::{CacheStats, LruTtlCache};

/// Snapshot of cache statistics and occupancy.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Number of cache hits
    pub hit_count: u64,
    /// Number of cache misses
    pub miss_count: u64,
    /// Number of put calls
    pub put_count: u64,
    /// Number of LRU evictions
    pub eviction_count: u64,
    /// Number of entries dropped after their TTL elapsed
    pub expired_count: u64,
    /// Hits plus misses
    pub total_requests: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Current number of entries in cache
    pub entries: usize,
    /// Maximum number of entries
    pub capacity: usize,
    /// Whether operations are serialized by a lock
    pub thread_safe: bool,
    /// Capture time in ISO 8601 format
    pub captured_at: String,
}

impl StatsReport {
    /// Captures the current state of `cache`.
    pub fn capture<K, V>(cache: &LruTtlCache<K, V>) -> Self
    where
        K: Hash + Eq + Clone,
        V: Clone,
    {
        Self::new(cache.stats(), cache.len(), cache.capacity(), cache.is_thread_safe())
    }

    /// Builds a report from raw parts, stamped with the current time.
    pub fn new(stats: CacheStats, entries: usize, capacity: usize, thread_safe: bool) -> Self {
        Self {
            hit_count: stats.hit_count,
            miss_count: stats.miss_count,
            put_count: stats.put_count,
            eviction_count: stats.eviction_count,
            expired_count: stats.expired_count,
            total_requests: stats.total_requests(),
            hit_rate: stats.hit_rate(),
            entries,
            capacity,
            thread_safe,
            captured_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_capture() {
        let cache = LruTtlCache::new(4, true).unwrap();
        cache.put("a", 1);
        cache.get("a");
        cache.get("b");

        let report = StatsReport::capture(&cache);

        assert_eq!(report.hit_count, 1);
        assert_eq!(report.miss_count, 1);
        assert_eq!(report.put_count, 1);
        assert_eq!(report.total_requests, 2);
        assert!((report.hit_rate - 0.5).abs() < 0.001);
        assert_eq!(report.entries, 1);
        assert_eq!(report.capacity, 4);
        assert!(report.thread_safe);
    }

    #[test]
    fn test_report_zero_requests() {
        let report = StatsReport::new(CacheStats::default(), 0, 10, false);
        assert_eq!(report.hit_rate, 0.0);
        assert_eq!(report.total_requests, 0);
    }

    #[test]
    fn test_report_serialize() {
        let report = StatsReport::new(CacheStats::default(), 3, 10, true);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["entries"], 3);
        assert_eq!(json["capacity"], 10);
        assert!(json["captured_at"].is_string());
        assert!(chrono::DateTime::parse_from_rfc3339(json["captured_at"].as_str().unwrap()).is_ok());
    }
}
