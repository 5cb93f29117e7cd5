//! Edge Cache Module
//!
//! Thread-safe handle to a single-region [`CacheStore`].
//!
//! Every operation, reads included, runs under one exclusive lock: reads
//! update access metadata and may lazily delete, so they mutate too. Caller
//! supplied generators always run with the lock released.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

use crate::cache::{CacheStore, Clock, EntryInfo, Eviction, EvictionStrategy, StatsSnapshot};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Edge Cache ==
/// Shared single-region cache. Cloning yields another handle to the same data.
#[derive(Debug)]
pub struct EdgeCache<V> {
    inner: Arc<Mutex<CacheStore<V>>>,
}

impl<V> Clone for EdgeCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone + Serialize> EdgeCache<V> {
    /// Creates a cache with no region binding.
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::with_region(config, None, clock)
    }

    /// Creates a cache owned by `region`. Under the geographic strategy its
    /// keys are namespaced by the region name.
    pub fn with_region(
        config: CacheConfig,
        region: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let store = CacheStore::new(config, region, clock)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(store)),
        })
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().get(key)
    }

    pub fn set<I, S>(&self, key: &str, value: V, ttl: Option<Duration>, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        self.inner.lock().set(key, value, ttl, tags)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().delete(key)
    }

    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        self.inner.lock().invalidate_by_tag(tag)
    }

    pub fn invalidate_by_pattern(&self, pattern: &str) -> usize {
        self.inner.lock().invalidate_by_pattern(pattern)
    }

    pub fn clear(&self) {
        self.inner.lock().clear()
    }

    pub fn purge_expired(&self) -> usize {
        self.inner.lock().purge_expired()
    }

    // == Get Or Insert ==
    /// Returns the cached value, or generates, stores and returns a new one.
    ///
    /// The generator runs at most once and without the lock held, so it may
    /// call back into this cache. Concurrent misses on the same key may each
    /// run their own generator; the last write wins.
    pub fn get_or_insert_with<F, E, I, S>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        tags: I,
        generator: F,
    ) -> Result<V>
    where
        F: FnOnce() -> std::result::Result<V, E>,
        E: Display,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = generator().map_err(|e| {
            warn!(key, error = %e, "Value generator failed");
            CacheError::generator(key, e)
        })?;
        self.set(key, value.clone(), ttl, tags)?;
        Ok(value)
    }
}

impl<V> EdgeCache<V> {
    pub fn inspect(&self, key: &str) -> Option<EntryInfo> {
        self.inner.lock().inspect(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().keys()
    }

    pub fn keys_for_tag(&self, tag: &str) -> Vec<String> {
        self.inner.lock().keys_for_tag(tag)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.lock().stats()
    }

    pub fn last_eviction(&self) -> Option<Eviction> {
        self.inner.lock().last_eviction().cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn strategy(&self) -> EvictionStrategy {
        self.inner.lock().strategy()
    }

    pub fn region(&self) -> Option<String> {
        self.inner.lock().region().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use std::thread;

    const NO_TAGS: [&str; 0] = [];

    fn cache(max_size: usize) -> EdgeCache<u64> {
        let config = CacheConfig {
            strategy: EvictionStrategy::Lru,
            max_size,
            ..CacheConfig::default()
        };
        EdgeCache::new(config, Arc::new(ManualClock::new(0))).unwrap()
    }

    #[test]
    fn test_clones_share_state() {
        let a = cache(10);
        let b = a.clone();
        a.set("k", 1, None, NO_TAGS).unwrap();

        assert_eq!(b.get("k"), Some(1));
    }

    #[test]
    fn test_get_or_insert_runs_generator_once() {
        let c = cache(10);
        let mut calls = 0;

        let first = c
            .get_or_insert_with("k", None, ["t"], || {
                calls += 1;
                Ok::<_, String>(7)
            })
            .unwrap();
        let second = c
            .get_or_insert_with("k", None, ["t"], || Ok::<_, String>(99))
            .unwrap();

        assert_eq!((first, second, calls), (7, 7, 1));
        assert_eq!(c.keys_for_tag("t"), vec!["k".to_string()]);
    }

    #[test]
    fn test_get_or_insert_generator_failure() {
        let c = cache(10);
        let result = c.get_or_insert_with("k", None, NO_TAGS, || Err::<u64, _>("db down"));

        assert!(matches!(result, Err(CacheError::Generator { .. })));
        assert!(!c.contains("k"));
    }

    #[test]
    fn test_generator_may_reenter_cache() {
        let c = cache(10);
        c.set("dep", 5, None, NO_TAGS).unwrap();

        let inner = c.clone();
        let value = c
            .get_or_insert_with("k", None, NO_TAGS, move || {
                Ok::<_, String>(inner.get("dep").unwrap_or(0) * 2)
            })
            .unwrap();

        assert_eq!(value, 10);
    }

    #[test]
    fn test_concurrent_writers_respect_capacity() {
        let c = cache(16);
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let c = c.clone();
                thread::spawn(move || {
                    for i in 0..100u64 {
                        c.set(&format!("{}-{}", t, i), i, None, NO_TAGS).unwrap();
                        c.get(&format!("{}-{}", t, i / 2));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(c.len(), 16);
        assert_eq!(c.stats().counters.evictions, 800 - 16);
    }
}
