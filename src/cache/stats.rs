//! Cache Statistics Module
//!
//! Tracks per-region counters and builds read-only snapshots for telemetry.

use serde::Serialize;

use crate::cache::{EvictionPath, EvictionStrategy};

// == Cache Stats ==
/// Running counters of one region's cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Successful reads
    pub hits: u64,
    /// Reads of missing or expired keys
    pub misses: u64,
    pub sets: u64,
    /// Explicit deletes that removed an entry
    pub deletes: u64,
    /// Capacity-triggered removals
    pub evictions: u64,
    /// Evictions that took a fallback branch
    pub fallback_evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    /// Entries removed by tag or pattern invalidation
    pub invalidations: u64,
}

impl CacheStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_eviction(&mut self, path: EvictionPath) {
        self.evictions += 1;
        if matches!(
            path,
            EvictionPath::RecencyFallback | EvictionPath::FirstKeyFallback
        ) {
            self.fallback_evictions += 1;
        }
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }
}

// == Stats Snapshot ==
/// Point-in-time view of a region's cache.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub strategy: EvictionStrategy,
    /// Live entry count (expired-but-not-yet-collected entries included)
    pub size: usize,
    pub max_size: usize,
    /// Entries past their TTL that have not been collected yet
    pub expired_count: usize,
    /// Regions owning at least one entry, sorted
    pub regions: Vec<String>,
    /// Mean TTL of current entries, in seconds
    pub average_ttl_secs: f64,
    /// hits / (hits + misses) since creation
    pub approximate_hit_rate: f64,
    pub tag_count: usize,
    pub counters: CacheStats,
}
