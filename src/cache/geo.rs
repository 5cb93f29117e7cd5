//! Geo Cache Module
//!
//! Region router owning one independent [`EdgeCache`] per configured region.
//! Reads go to one region; writes and invalidations fan out to a chosen set
//! of regions with no cross-region transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{Clock, EdgeCache, StatsSnapshot};
use crate::config::{GeoConfig, UnknownRegionPolicy};
use crate::error::{CacheError, Result};

// == Region Selection ==
/// Target regions of a fan-out operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Regions {
    /// Every configured region
    #[default]
    All,
    /// Only the named regions; unknown names are skipped
    Only(Vec<String>),
}

impl Regions {
    pub fn only<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Regions::Only(regions.into_iter().map(Into::into).collect())
    }
}

// == Geo Cache ==
#[derive(Debug)]
pub struct GeoCache<V> {
    /// Configured order; the first region is the default
    regions: Vec<String>,
    caches: HashMap<String, EdgeCache<V>>,
    unknown_region: UnknownRegionPolicy,
}

impl<V: Clone + Serialize> GeoCache<V> {
    // == Constructor ==
    /// Builds one cache per configured region.
    pub fn new(config: GeoConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let mut caches = HashMap::with_capacity(config.regions.len());
        for region in &config.regions {
            let cache =
                EdgeCache::with_region(config.cache.clone(), Some(region.clone()), clock.clone())?;
            caches.insert(region.clone(), cache);
        }

        Ok(Self {
            regions: config.regions,
            caches,
            unknown_region: config.unknown_region,
        })
    }

    // == Get ==
    /// Reads `key` from `region`.
    ///
    /// An unconfigured region follows the unknown-region policy: either the
    /// default (first) region answers, or the read is a miss.
    pub fn get(&self, key: &str, region: &str) -> Option<V> {
        self.route(region)?.get(key)
    }

    // == Set ==
    /// Writes `key` independently into each target region.
    ///
    /// Returns the number of regions written. A failure in one region is
    /// logged and does not undo writes already made to others.
    pub fn set<S: AsRef<str>>(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
        tags: &[S],
        regions: &Regions,
    ) -> Result<usize> {
        if ttl.is_some_and(|t| t.is_zero()) {
            return Err(CacheError::config("ttl must be greater than zero"));
        }

        let mut written = 0;
        for cache in self.targets(regions) {
            let tags = tags.iter().map(|t| t.as_ref().to_string());
            match cache.set(key, value.clone(), ttl, tags) {
                Ok(()) => written += 1,
                Err(e) => warn!(key, region = ?cache.region(), error = %e, "Regional write failed"),
            }
        }
        Ok(written)
    }

    // == Invalidate ==
    /// Deletes `key` from each target region; returns how many held it.
    pub fn invalidate(&self, key: &str, regions: &Regions) -> usize {
        self.targets(regions)
            .filter(|cache| cache.delete(key))
            .count()
    }

    /// Tag invalidation across target regions; returns the total removed.
    pub fn invalidate_by_tag(&self, tag: &str, regions: &Regions) -> usize {
        self.targets(regions)
            .map(|cache| cache.invalidate_by_tag(tag))
            .sum()
    }

    /// Pattern invalidation across target regions; returns the total removed.
    pub fn invalidate_by_pattern(&self, pattern: &str, regions: &Regions) -> usize {
        self.targets(regions)
            .map(|cache| cache.invalidate_by_pattern(pattern))
            .sum()
    }

    /// Expiry sweep over every region; returns the total removed.
    pub fn purge_expired(&self) -> usize {
        self.caches.values().map(EdgeCache::purge_expired).sum()
    }

    pub fn clear(&self) {
        for cache in self.caches.values() {
            cache.clear();
        }
    }
}

impl<V> GeoCache<V> {
    // == Stats ==
    /// Per-region statistics snapshots.
    pub fn stats(&self) -> BTreeMap<String, StatsSnapshot> {
        self.caches
            .iter()
            .map(|(region, cache)| (region.clone(), cache.stats()))
            .collect()
    }

    /// Configured region names in order.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// The region that answers reads for unknown regions.
    pub fn default_region(&self) -> &str {
        &self.regions[0]
    }

    /// Direct handle to one region's cache.
    pub fn region(&self, name: &str) -> Option<&EdgeCache<V>> {
        self.caches.get(name)
    }

    pub fn unknown_region_policy(&self) -> UnknownRegionPolicy {
        self.unknown_region
    }

    /// Summary of entry counts per region.
    pub fn sizes(&self) -> RegionSizes {
        RegionSizes {
            regions: self
                .caches
                .iter()
                .map(|(region, cache)| (region.clone(), cache.len()))
                .collect(),
        }
    }

    /// The region that answers reads addressed to `region`, or `None` when
    /// the unknown-region policy turns the read into a miss.
    pub fn resolve_region<'a>(&'a self, region: &'a str) -> Option<&'a str> {
        if self.caches.contains_key(region) {
            return Some(region);
        }
        match self.unknown_region {
            UnknownRegionPolicy::Default => {
                debug!(
                    region,
                    default = self.default_region(),
                    "Unknown region, routing to default region"
                );
                Some(self.default_region())
            }
            UnknownRegionPolicy::Miss => {
                debug!(region, "Unknown region, treating read as a miss");
                None
            }
        }
    }

    fn route(&self, region: &str) -> Option<&EdgeCache<V>> {
        self.resolve_region(region)
            .and_then(|served| self.caches.get(served))
    }

    fn targets<'a>(&'a self, regions: &'a Regions) -> Box<dyn Iterator<Item = &'a EdgeCache<V>> + 'a> {
        match regions {
            Regions::All => Box::new(self.regions.iter().filter_map(|r| self.caches.get(r))),
            Regions::Only(names) => Box::new(names.iter().filter_map(|name| {
                let cache = self.caches.get(name);
                if cache.is_none() {
                    debug!(region = %name, "Skipping unknown target region");
                }
                cache
            })),
        }
    }
}

/// Entry counts keyed by region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionSizes {
    pub regions: BTreeMap<String, usize>,
}
