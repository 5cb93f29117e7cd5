//! Configuration Module
//!
//! Cache, region and server configuration. Server settings load from
//! environment variables; invalid values fail fast.

use std::collections::HashSet;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{AdaptiveWeights, EvictionStrategy};
use crate::error::{CacheError, Result};

/// Regions used when none are configured.
pub const DEFAULT_REGIONS: [&str; 4] = ["us-east", "us-west", "eu-west", "ap-southeast"];

// == Cache Config ==
/// Settings of one region's cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub strategy: EvictionStrategy,
    /// Maximum number of entries
    pub max_size: usize,
    /// TTL applied when a write does not specify one
    pub default_ttl: Duration,
    /// Coefficients of the adaptive eviction score
    pub adaptive: AdaptiveWeights,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: EvictionStrategy::default(),
            max_size: 1000,
            default_ttl: Duration::from_secs(3600),
            adaptive: AdaptiveWeights::default(),
        }
    }
}

impl CacheConfig {
    /// Rejects zero capacity, zero default TTL and non-finite weights.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::config("max_size must be greater than zero"));
        }
        if self.default_ttl.is_zero() {
            return Err(CacheError::config("default_ttl must be greater than zero"));
        }
        self.adaptive.validate()
    }
}

// == Unknown Region Policy ==
/// What a read against an unconfigured region does.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRegionPolicy {
    /// Route to the first configured region
    #[default]
    Default,
    /// Treat as a cache miss
    Miss,
}

impl FromStr for UnknownRegionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(UnknownRegionPolicy::Default),
            "miss" => Ok(UnknownRegionPolicy::Miss),
            other => Err(CacheError::config(format!(
                "unknown region policy '{}'",
                other
            ))),
        }
    }
}

// == Geo Config ==
/// Settings of a region router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Region names in priority order; the first is the default region
    pub regions: Vec<String>,
    pub unknown_region: UnknownRegionPolicy,
    /// Applied to every region's cache
    pub cache: CacheConfig,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
            unknown_region: UnknownRegionPolicy::default(),
            cache: CacheConfig {
                strategy: EvictionStrategy::Geo,
                ..CacheConfig::default()
            },
        }
    }
}

impl GeoConfig {
    /// Rejects an empty, blank or duplicated region list and invalid cache settings.
    pub fn validate(&self) -> Result<()> {
        if self.regions.is_empty() {
            return Err(CacheError::config("at least one region is required"));
        }
        let mut seen = HashSet::new();
        for region in &self.regions {
            if region.trim().is_empty() {
                return Err(CacheError::config("region names must not be blank"));
            }
            if !seen.insert(region.as_str()) {
                return Err(CacheError::config(format!("duplicate region '{}'", region)));
            }
        }
        self.cache.validate()
    }
}

// == Server Config ==
/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    pub geo: GeoConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum entries per region (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `EVICTION_STRATEGY` - `lru|lfu|ttl|adaptive|geo` (default: geo)
    /// - `REGIONS` - Comma-separated region names (default: us-east,us-west,eu-west,ap-southeast)
    /// - `UNKNOWN_REGION_POLICY` - `default|miss` (default: default)
    /// - `ADAPTIVE_FREQUENCY_WEIGHT`, `ADAPTIVE_AGE_WEIGHT`, `ADAPTIVE_TTL_RATIO_WEIGHT`
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();
        let mut geo = defaults.geo;

        if let Some(max) = parse_var("MAX_ENTRIES")? {
            geo.cache.max_size = max;
        }
        if let Some(ttl) = parse_var::<u64>("DEFAULT_TTL")? {
            geo.cache.default_ttl = Duration::from_secs(ttl);
        }
        if let Some(strategy) = parse_var("EVICTION_STRATEGY")? {
            geo.cache.strategy = strategy;
        }
        if let Some(policy) = parse_var("UNKNOWN_REGION_POLICY")? {
            geo.unknown_region = policy;
        }
        if let Some(weight) = parse_var("ADAPTIVE_FREQUENCY_WEIGHT")? {
            geo.cache.adaptive.frequency_weight = weight;
        }
        if let Some(weight) = parse_var("ADAPTIVE_AGE_WEIGHT")? {
            geo.cache.adaptive.age_weight = weight;
        }
        if let Some(weight) = parse_var("ADAPTIVE_TTL_RATIO_WEIGHT")? {
            geo.cache.adaptive.ttl_ratio_weight = weight;
        }
        if let Ok(regions) = env::var("REGIONS") {
            geo.regions = regions
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }

        let config = Self {
            geo,
            server_port: parse_var("SERVER_PORT")?.unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL")?.unwrap_or(defaults.cleanup_interval),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects a zero cleanup interval and invalid region settings.
    pub fn validate(&self) -> Result<()> {
        if self.cleanup_interval == 0 {
            return Err(CacheError::config("cleanup_interval must be greater than zero"));
        }
        self.geo.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geo: GeoConfig::default(),
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}

/// Reads and parses an optional environment variable.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CacheError::config(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.geo.cache.max_size, 1000);
        assert_eq!(config.geo.cache.default_ttl, Duration::from_secs(3600));
        assert_eq!(config.geo.cache.strategy, EvictionStrategy::Geo);
        assert_eq!(config.geo.regions.len(), 4);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 1);
    }

    #[test]
    fn test_cache_config_rejects_zero_values() {
        let zero_size = CacheConfig {
            max_size: 0,
            ..CacheConfig::default()
        };
        assert!(zero_size.validate().is_err());

        let zero_ttl = CacheConfig {
            default_ttl: Duration::ZERO,
            ..CacheConfig::default()
        };
        assert!(zero_ttl.validate().is_err());
    }

    #[test]
    fn test_geo_config_rejects_bad_regions() {
        let empty = GeoConfig {
            regions: vec![],
            ..GeoConfig::default()
        };
        assert!(empty.validate().is_err());

        let duplicate = GeoConfig {
            regions: vec!["us-east".into(), "us-east".into()],
            ..GeoConfig::default()
        };
        assert!(duplicate.validate().is_err());

        let blank = GeoConfig {
            regions: vec!["  ".into()],
            ..GeoConfig::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_config_rejects_zero_cleanup_interval() {
        let config = Config {
            cleanup_interval: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_region_policy_parse() {
        assert_eq!(
            "MISS".parse::<UnknownRegionPolicy>().unwrap(),
            UnknownRegionPolicy::Miss
        );
        assert!("nearest".parse::<UnknownRegionPolicy>().is_err());
    }

    #[test]
    fn test_config_from_env() {
        // All env-dependent assertions live in one test to avoid races
        // between parallel tests touching the same variables.
        env::set_var("MAX_ENTRIES", "42");
        env::set_var("EVICTION_STRATEGY", "lfu");
        env::set_var("REGIONS", "eu-west, ap-south");
        let config = Config::from_env().unwrap();
        assert_eq!(config.geo.cache.max_size, 42);
        assert_eq!(config.geo.cache.strategy, EvictionStrategy::Lfu);
        assert_eq!(config.geo.regions, vec!["eu-west", "ap-south"]);

        env::set_var("EVICTION_STRATEGY", "random");
        assert!(matches!(
            Config::from_env(),
            Err(CacheError::InvalidConfig(_))
        ));

        env::set_var("EVICTION_STRATEGY", "lru");
        env::set_var("MAX_ENTRIES", "0");
        assert!(Config::from_env().is_err());

        env::set_var("MAX_ENTRIES", "42");
        env::set_var("CLEANUP_INTERVAL", "0");
        assert!(matches!(
            Config::from_env(),
            Err(CacheError::InvalidConfig(_))
        ));

        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("MAX_ENTRIES");
        env::remove_var("EVICTION_STRATEGY");
        env::remove_var("REGIONS");
    }
}
