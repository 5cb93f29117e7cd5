//! Frequency Tracker Module
//!
//! Per-key access counters for LFU and adaptive eviction.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct Counter {
    hits: u64,
    /// Insertion sequence, breaks ties between equal counters
    seq: u64,
}

// == Frequency Tracker ==
/// Counts reads per key since its last full write.
#[derive(Debug, Default, Clone)]
pub struct FrequencyTracker {
    counters: HashMap<String, Counter>,
    next_seq: u64,
}

impl FrequencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) counting for a key at zero.
    pub fn insert(&mut self, key: &str) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.counters
            .insert(key.to_string(), Counter { hits: 0, seq });
    }

    /// Records one read of `key`. Untracked keys are ignored.
    pub fn record(&mut self, key: &str) {
        if let Some(counter) = self.counters.get_mut(key) {
            counter.hits += 1;
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.counters.remove(key);
    }

    /// Current count for a key, zero when untracked.
    pub fn count(&self, key: &str) -> u64 {
        self.counters.get(key).map(|c| c.hits).unwrap_or(0)
    }

    /// Key with the smallest count; the earliest inserted wins ties.
    pub fn least_frequent(&self) -> Option<&str> {
        self.counters
            .iter()
            .min_by_key(|(_, c)| (c.hits, c.seq))
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
        self.next_seq = 0;
    }
}
