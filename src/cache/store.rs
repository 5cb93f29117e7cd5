//! Cache Store Module
//!
//! Single-region cache engine combining the entry table, tag index and
//! access tracking with pluggable eviction and lazy TTL expiry.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{
    select_victim, CacheEntry, CacheStats, Clock, EntryInfo, Eviction, EvictionStrategy,
    FrequencyTracker, KeyPattern, LruTracker, StatsSnapshot, TagIndex,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Cache storage for one region.
///
/// Not synchronized on its own; [`crate::cache::EdgeCache`] wraps it in a
/// mutex for shared use.
///
/// Internally every table is keyed by the storage key, which is the caller's
/// key prefixed with `"{region}:"` under the geographic strategy.
#[derive(Debug)]
pub struct CacheStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruTracker,
    frequency: FrequencyTracker,
    tags: TagIndex,
    stats: CacheStats,
    config: CacheConfig,
    region: Option<String>,
    clock: Arc<dyn Clock>,
    last_eviction: Option<Eviction>,
}

impl<V: Clone + Serialize> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store, rejecting invalid configuration.
    pub fn new(config: CacheConfig, region: Option<String>, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            frequency: FrequencyTracker::new(),
            tags: TagIndex::new(),
            stats: CacheStats::new(),
            config,
            region,
            clock,
            last_eviction: None,
        })
    }

    // == Set ==
    /// Stores a value, replacing any entry under the same key.
    ///
    /// When the key is new and the store is full, one entry is evicted
    /// first. Replacing an entry resets its access metadata and re-derives
    /// its tag associations.
    pub fn set(
        &mut self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
        tags: BTreeSet<String>,
    ) -> Result<()> {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        if ttl.is_zero() {
            return Err(CacheError::config("ttl must be greater than zero"));
        }

        let storage_key = self.storage_key(key);
        let is_overwrite = self.entries.contains_key(&storage_key);

        if !is_overwrite && self.entries.len() >= self.config.max_size {
            self.evict_one();
        }

        let now = self.clock.now_ms();
        let region = self.entry_region();
        let entry = CacheEntry::new(key, value, ttl, region, tags, now);

        self.tags.attach(&storage_key, &entry.tags);
        self.lru.touch(&storage_key);
        self.frequency.insert(&storage_key);
        self.entries.insert(storage_key, entry);
        self.stats.record_set();

        Ok(())
    }

    // == Get ==
    /// Returns a copy of the value if present and not expired.
    ///
    /// An expired entry is removed as a side effect.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let storage_key = self.storage_key(key);
        let now = self.clock.now_ms();

        let expired = match self.entries.get(&storage_key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            debug!(key = %storage_key, "Lazily expiring entry on read");
            self.remove_entry(&storage_key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        let entry = self.entries.get_mut(&storage_key)?;
        entry.record_access(now);
        let value = entry.value.clone();

        self.lru.touch(&storage_key);
        self.frequency.record(&storage_key);
        self.stats.record_hit();
        Some(value)
    }

    // == Delete ==
    /// Removes an entry and its tag associations.
    ///
    /// Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let storage_key = self.storage_key(key);
        let removed = self.remove_entry(&storage_key).is_some();
        if removed {
            self.stats.record_delete();
        }
        removed
    }

    // == Invalidate By Tag ==
    /// Removes every entry carrying `tag`; returns how many were removed.
    pub fn invalidate_by_tag(&mut self, tag: &str) -> usize {
        let keys = self.tags.keys_for(tag);
        let count = keys
            .iter()
            .filter(|k| self.remove_entry(k).is_some())
            .count();

        if count > 0 {
            info!(tag, count, region = ?self.region, "Invalidated entries by tag");
        }
        self.stats.record_invalidations(count);
        count
    }

    // == Invalidate By Pattern ==
    /// Removes every entry whose key matches a `*` wildcard pattern.
    ///
    /// The pattern is matched against the caller's key, anchored at both ends.
    pub fn invalidate_by_pattern(&mut self, pattern: &str) -> usize {
        let matcher = KeyPattern::new(pattern);
        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| matcher.matches(&entry.key))
            .map(|(storage_key, _)| storage_key.clone())
            .collect();

        let count = matching
            .iter()
            .filter(|k| self.remove_entry(k).is_some())
            .count();

        if count > 0 {
            info!(pattern, count, region = ?self.region, "Invalidated entries by pattern");
        }
        self.stats.record_invalidations(count);
        count
    }

    // == Clear ==
    /// Removes all entries, tag associations and access tracking.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.tags.clear();
        self.lru.clear();
        self.frequency.clear();
    }

    // == Purge Expired ==
    /// Removes all expired entries; returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }

        self.stats.record_expirations(expired.len());
        expired.len()
    }
}

impl<V> CacheStore<V> {
    // == Inspect ==
    /// Metadata for a live entry. Does not count as an access.
    pub fn inspect(&self, key: &str) -> Option<EntryInfo> {
        let now = self.clock.now_ms();
        self.entries
            .get(&self.storage_key(key))
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.info(now))
    }

    /// Whether a live entry exists. Does not count as an access.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(&self.storage_key(key))
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Keys of all stored entries, as supplied by callers.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.values().map(|e| e.key.clone()).collect();
        keys.sort();
        keys
    }

    // == Stats ==
    /// Returns a snapshot of the current state.
    pub fn stats(&self) -> StatsSnapshot {
        let now = self.clock.now_ms();
        let size = self.entries.len();

        let expired_count = self
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .count();

        let regions: Vec<String> = self
            .entries
            .values()
            .filter_map(|entry| entry.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let average_ttl_secs = if size == 0 {
            0.0
        } else {
            self.entries
                .values()
                .map(|entry| entry.ttl.as_secs_f64())
                .sum::<f64>()
                / size as f64
        };

        StatsSnapshot {
            strategy: self.config.strategy,
            size,
            max_size: self.config.max_size,
            expired_count,
            regions,
            average_ttl_secs,
            approximate_hit_rate: self.stats.hit_rate(),
            tag_count: self.tags.tag_count(),
            counters: self.stats.clone(),
        }
    }

    /// The most recent capacity eviction, if any.
    pub fn last_eviction(&self) -> Option<&Eviction> {
        self.last_eviction.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn strategy(&self) -> EvictionStrategy {
        self.config.strategy
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Keys currently indexed under `tag`, as supplied by callers.
    pub fn keys_for_tag(&self, tag: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .tags
            .keys_for(tag)
            .iter()
            .filter_map(|k| self.entries.get(k).map(|e| e.key.clone()))
            .collect();
        keys.sort();
        keys
    }

    // == Key Derivation ==
    fn storage_key(&self, key: &str) -> String {
        match (&self.config.strategy, &self.region) {
            (EvictionStrategy::Geo, Some(region)) => format!("{}:{}", region, key),
            _ => key.to_string(),
        }
    }

    fn entry_region(&self) -> Option<String> {
        match self.config.strategy {
            EvictionStrategy::Geo => self.region.clone(),
            _ => None,
        }
    }

    // == Removal ==
    /// Removes an entry from every structure in one step.
    fn remove_entry(&mut self, storage_key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(storage_key)?;
        self.tags.detach(storage_key);
        self.lru.remove(storage_key);
        self.frequency.remove(storage_key);
        Some(entry)
    }

    // == Eviction ==
    /// Evicts exactly one entry chosen by the configured strategy.
    ///
    /// With nothing to evict (only possible with a zero capacity) this is a
    /// no-op and the following insert leaves the store one entry over its
    /// nominal limit.
    fn evict_one(&mut self) {
        let now = self.clock.now_ms();
        let Some(eviction) = select_victim(
            self.config.strategy,
            &self.config.adaptive,
            &self.entries,
            &self.lru,
            &self.frequency,
            now,
        ) else {
            warn!(
                max_size = self.config.max_size,
                "Nothing to evict, insert will exceed capacity"
            );
            return;
        };

        self.remove_entry(&eviction.key);
        self.stats.record_eviction(eviction.path);
        debug!(
            key = %eviction.key,
            path = ?eviction.path,
            strategy = self.config.strategy.as_str(),
            "Evicted entry"
        );
        self.last_eviction = Some(eviction);
    }
}
