//! Eviction Module
//!
//! Strategy selection and victim choice when a write would exceed capacity.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheEntry, FrequencyTracker, LruTracker};
use crate::error::CacheError;

// == Eviction Strategy ==
/// Eviction strategy, fixed for the lifetime of a cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Least recently used
    Lru,
    /// Least frequently used, ties broken by insertion order
    Lfu,
    /// Any expired entry first, otherwise least recently used
    #[default]
    Ttl,
    /// Lowest adaptive score
    Adaptive,
    /// Region-namespaced keys, least recently used eviction
    Geo,
}

impl EvictionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionStrategy::Lru => "lru",
            EvictionStrategy::Lfu => "lfu",
            EvictionStrategy::Ttl => "ttl",
            EvictionStrategy::Adaptive => "adaptive",
            EvictionStrategy::Geo => "geo",
        }
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionStrategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lru" => Ok(EvictionStrategy::Lru),
            "lfu" => Ok(EvictionStrategy::Lfu),
            "ttl" => Ok(EvictionStrategy::Ttl),
            "adaptive" => Ok(EvictionStrategy::Adaptive),
            "geo" => Ok(EvictionStrategy::Geo),
            other => Err(CacheError::config(format!(
                "unknown eviction strategy '{}'",
                other
            ))),
        }
    }
}

// == Adaptive Weights ==
/// Coefficients of the adaptive score
/// `frequency * frequency_weight - age_secs * age_weight - (age / ttl) * ttl_ratio_weight`.
///
/// The defaults are empirical and have not been tuned against real traffic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveWeights {
    pub frequency_weight: f64,
    pub age_weight: f64,
    pub ttl_ratio_weight: f64,
}

impl Default for AdaptiveWeights {
    fn default() -> Self {
        Self {
            frequency_weight: 10.0,
            age_weight: 0.1,
            ttl_ratio_weight: 100.0,
        }
    }
}

impl AdaptiveWeights {
    /// Score of one entry; lower scores are evicted first.
    pub fn score<V>(&self, entry: &CacheEntry<V>, frequency: u64, now_ms: u64) -> f64 {
        let age = entry.age(now_ms).as_secs_f64();
        let ttl = entry.ttl.as_secs_f64();
        let ttl_ratio = if ttl > 0.0 { age / ttl } else { 1.0 };
        frequency as f64 * self.frequency_weight
            - age * self.age_weight
            - ttl_ratio * self.ttl_ratio_weight
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        let all_finite = [self.frequency_weight, self.age_weight, self.ttl_ratio_weight]
            .iter()
            .all(|w| w.is_finite());
        if !all_finite {
            return Err(CacheError::config("adaptive weights must be finite"));
        }
        Ok(())
    }
}

// == Eviction Path ==
/// Which branch of the selector chose the victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPath {
    /// Head of the recency order
    Recency,
    /// Minimum access counter
    Frequency,
    /// An already-expired entry
    Expired,
    /// Minimum adaptive score
    AdaptiveScore,
    /// TTL-first found nothing expired and fell back to recency
    RecencyFallback,
    /// Access tracking was empty while entries existed; smallest key chosen
    FirstKeyFallback,
}

/// The victim chosen by [`select_victim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    pub key: String,
    pub path: EvictionPath,
}

// == Victim Selection ==
/// Chooses exactly one entry to evict, or `None` when `entries` is empty.
///
/// Keys in `entries`, `lru` and `frequency` are storage keys. Candidates are
/// scanned in recency order so that ties resolve deterministically towards
/// the least recently used entry.
pub fn select_victim<V>(
    strategy: EvictionStrategy,
    weights: &AdaptiveWeights,
    entries: &HashMap<String, CacheEntry<V>>,
    lru: &LruTracker,
    frequency: &FrequencyTracker,
    now_ms: u64,
) -> Option<Eviction> {
    if entries.is_empty() {
        debug!("Eviction requested on an empty cache");
        return None;
    }

    let chosen = match strategy {
        EvictionStrategy::Lru | EvictionStrategy::Geo => {
            lru.oldest().map(|k| (k.to_string(), EvictionPath::Recency))
        }
        EvictionStrategy::Lfu => frequency
            .least_frequent()
            .map(|k| (k.to_string(), EvictionPath::Frequency)),
        EvictionStrategy::Ttl => {
            let expired = lru
                .iter()
                .find(|k| entries.get(*k).is_some_and(|e| e.is_expired(now_ms)));
            match expired {
                Some(k) => Some((k.to_string(), EvictionPath::Expired)),
                None => {
                    debug!("No expired entry, falling back to recency eviction");
                    lru.oldest()
                        .map(|k| (k.to_string(), EvictionPath::RecencyFallback))
                }
            }
        }
        EvictionStrategy::Adaptive => lru
            .iter()
            .filter_map(|k| {
                entries
                    .get(k)
                    .map(|e| (k, weights.score(e, frequency.count(k), now_ms)))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(k, _)| (k.to_string(), EvictionPath::AdaptiveScore)),
    };

    let (key, path) = match chosen {
        Some(found) => found,
        None => {
            warn!(
                strategy = strategy.as_str(),
                "Access tracking is empty while entries exist, evicting smallest key"
            );
            let key = entries.keys().min()?.clone();
            (key, EvictionPath::FirstKeyFallback)
        }
    };

    Some(Eviction { key, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::time::Duration;

    struct Fixture {
        entries: HashMap<String, CacheEntry<u32>>,
        lru: LruTracker,
        freq: FrequencyTracker,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                freq: FrequencyTracker::new(),
            }
        }

        fn insert(&mut self, key: &str, ttl_secs: u64, now: u64) {
            let entry = CacheEntry::new(
                key,
                0,
                Duration::from_secs(ttl_secs),
                None,
                BTreeSet::new(),
                now,
            );
            self.entries.insert(key.to_string(), entry);
            self.lru.touch(key);
            self.freq.insert(key);
        }

        fn read(&mut self, key: &str, times: u64) {
            for _ in 0..times {
                self.lru.touch(key);
                self.freq.record(key);
            }
        }

        fn select(&self, strategy: EvictionStrategy, now: u64) -> Option<Eviction> {
            select_victim(
                strategy,
                &AdaptiveWeights::default(),
                &self.entries,
                &self.lru,
                &self.freq,
                now,
            )
        }
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("LRU".parse::<EvictionStrategy>().unwrap(), EvictionStrategy::Lru);
        assert_eq!(
            "adaptive".parse::<EvictionStrategy>().unwrap(),
            EvictionStrategy::Adaptive
        );
        assert!(matches!(
            "random".parse::<EvictionStrategy>(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_cache_selects_nothing() {
        let fx = Fixture::new();
        assert_eq!(fx.select(EvictionStrategy::Lru, 0), None);
    }

    #[test]
    fn test_lru_selects_least_recent() {
        let mut fx = Fixture::new();
        fx.insert("a", 60, 0);
        fx.insert("b", 60, 0);
        fx.read("a", 1);

        let victim = fx.select(EvictionStrategy::Lru, 0).unwrap();
        assert_eq!(victim.key, "b");
        assert_eq!(victim.path, EvictionPath::Recency);
    }

    #[test]
    fn test_lfu_selects_least_frequent() {
        let mut fx = Fixture::new();
        fx.insert("a", 60, 0);
        fx.insert("b", 60, 0);
        fx.insert("c", 60, 0);
        fx.read("a", 3);
        fx.read("b", 1);
        fx.read("c", 2);

        let victim = fx.select(EvictionStrategy::Lfu, 0).unwrap();
        assert_eq!(victim.key, "b");
        assert_eq!(victim.path, EvictionPath::Frequency);
    }

    #[test]
    fn test_ttl_prefers_expired_entry() {
        let mut fx = Fixture::new();
        fx.insert("long", 600, 0);
        fx.insert("short", 1, 0);

        let victim = fx.select(EvictionStrategy::Ttl, 5_000).unwrap();
        assert_eq!(victim.key, "short");
        assert_eq!(victim.path, EvictionPath::Expired);
    }

    #[test]
    fn test_ttl_falls_back_to_recency() {
        let mut fx = Fixture::new();
        fx.insert("a", 600, 0);
        fx.insert("b", 600, 0);

        let victim = fx.select(EvictionStrategy::Ttl, 1_000).unwrap();
        assert_eq!(victim.key, "a");
        assert_eq!(victim.path, EvictionPath::RecencyFallback);
    }

    #[test]
    fn test_geo_defers_to_recency() {
        let mut fx = Fixture::new();
        fx.insert("a", 60, 0);
        fx.insert("b", 60, 0);

        let victim = fx.select(EvictionStrategy::Geo, 0).unwrap();
        assert_eq!(victim.key, "a");
        assert_eq!(victim.path, EvictionPath::Recency);
    }

    #[test]
    fn test_adaptive_protects_hot_young_entries() {
        let mut fx = Fixture::new();
        // Old relative to its TTL, rarely read
        fx.insert("stale", 100, 0);
        // Young and hot
        fx.insert("hot", 100, 80_000);
        fx.read("hot", 5);

        let victim = fx.select(EvictionStrategy::Adaptive, 90_000).unwrap();
        assert_eq!(victim.key, "stale");
        assert_eq!(victim.path, EvictionPath::AdaptiveScore);
    }

    #[test]
    fn test_adaptive_score_formula() {
        let entry = CacheEntry::new(
            "k",
            0u32,
            Duration::from_secs(100),
            None,
            BTreeSet::new(),
            0,
        );
        let score = AdaptiveWeights::default().score(&entry, 3, 50_000);
        // 3*10 - 50*0.1 - 0.5*100
        assert!((score - (-25.0)).abs() < 1e-9);
    }

    #[test]
    fn test_untracked_entries_use_first_key_fallback() {
        let mut fx = Fixture::new();
        fx.insert("b", 60, 0);
        fx.insert("a", 60, 0);
        fx.lru.clear();

        let victim = fx.select(EvictionStrategy::Lru, 0).unwrap();
        assert_eq!(victim.key, "a");
        assert_eq!(victim.path, EvictionPath::FirstKeyFallback);
    }

    #[test]
    fn test_weights_validation() {
        let weights = AdaptiveWeights {
            age_weight: f64::NAN,
            ..AdaptiveWeights::default()
        };
        assert!(weights.validate().is_err());
        assert!(AdaptiveWeights::default().validate().is_ok());
    }
}
