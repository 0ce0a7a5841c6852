//! Cache Statistics Module
//!
//! Tracks hits, misses, evictions and admission rejections, and carries the
//! point-in-time snapshot returned by `stats()`.

use serde::{Deserialize, Serialize};

/// Name of the eviction policy reported in snapshots.
pub const POLICY_NAME: &str = "LRU";

// == Cache Counters ==
/// Monotonic counters kept by the store. `clear()` does not reset them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub rejections: u64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Rejection ==
    /// Counts a new key turned away by the admission estimator.
    pub fn record_rejection(&mut self) {
        self.rejections += 1;
    }
}

// == Cache Stats ==
/// Snapshot of the cache state, serialized as the `/v1/stats` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Live entries
    pub items: usize,
    /// Sum of live entry sizes
    pub total_size_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub rejections: u64,
    /// Configured byte capacity
    pub capacity_bytes: u64,
    pub policy: String,
    /// Creation time of the cache (Unix milliseconds)
    pub started_at: u64,
    /// Whether frequency-based admission is enabled
    pub lfu_enabled: bool,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(hits: u64, misses: u64) -> CacheStats {
        CacheStats {
            items: 0,
            total_size_bytes: 0,
            hits,
            misses,
            evictions: 0,
            rejections: 0,
            capacity_bytes: 1024,
            policy: POLICY_NAME.to_string(),
            started_at: 0,
            lfu_enabled: false,
        }
    }

    #[test]
    fn test_counters_new() {
        let counters = CacheCounters::new();
        assert_eq!(counters, CacheCounters::default());
    }

    #[test]
    fn test_record_counters() {
        let mut counters = CacheCounters::new();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        counters.record_eviction();
        counters.record_rejection();

        assert_eq!(counters.hits, 2);
        assert_eq!(counters.misses, 1);
        assert_eq!(counters.evictions, 1);
        assert_eq!(counters.rejections, 1);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(snapshot(0, 0).hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        assert_eq!(snapshot(1, 1).hit_rate(), 0.5);
        assert_eq!(snapshot(3, 0).hit_rate(), 1.0);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_value(snapshot(1, 2)).unwrap();
        assert_eq!(json["totalSizeBytes"], 0);
        assert_eq!(json["capacityBytes"], 1024);
        assert_eq!(json["lfuEnabled"], false);
        assert_eq!(json["policy"], "LRU");
    }
}
