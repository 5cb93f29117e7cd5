//! Response DTOs for the edge cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::cache::StatsSnapshot;

/// Response body for the GET operation (GET /get/:region/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    /// Region the read was addressed to
    pub region: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, region: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            region: region.into(),
            value,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Number of regions the value was written to
    pub regions_written: usize,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, regions_written: usize) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set in {} region(s)", key, regions_written),
            key,
            regions_written,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
    /// Number of regions that held the key
    pub removed: usize,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, removed: usize) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted from {} region(s)", key, removed),
            key,
            removed,
        }
    }
}

/// Response body for tag and pattern invalidation
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// The tag or pattern that was invalidated
    pub target: String,
    /// Entries removed across all target regions
    pub invalidated: usize,
}

impl InvalidateResponse {
    pub fn new(target: impl Into<String>, invalidated: usize) -> Self {
        Self {
            target: target.into(),
            invalidated,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Entries across all regions
    pub total_entries: usize,
    /// Hit rate over all regions (hits / (hits + misses))
    pub hit_rate: f64,
    pub regions: BTreeMap<String, StatsSnapshot>,
}

impl StatsResponse {
    pub fn new(regions: BTreeMap<String, StatsSnapshot>) -> Self {
        let total_entries = regions.values().map(|s| s.size).sum();
        let hits: u64 = regions.values().map(|s| s.counters.hits).sum();
        let misses: u64 = regions.values().map(|s| s.counters.misses).sum();
        let total_requests = hits + misses;
        let hit_rate = if total_requests > 0 {
            hits as f64 / total_requests as f64
        } else {
            0.0
        };
        Self {
            total_entries,
            hit_rate,
            regions,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Configured regions
    pub regions: Vec<String>,
}

impl HealthResponse {
    pub fn healthy(regions: Vec<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            regions,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStats, EvictionStrategy};
    use serde_json::json;

    fn snapshot(size: usize, hits: u64, misses: u64) -> StatsSnapshot {
        let mut counters = CacheStats::new();
        counters.hits = hits;
        counters.misses = misses;
        StatsSnapshot {
            strategy: EvictionStrategy::Geo,
            size,
            max_size: 100,
            expired_count: 0,
            regions: vec![],
            average_ttl_secs: 0.0,
            approximate_hit_rate: counters.hit_rate(),
            tag_count: 0,
            counters,
        }
    }

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", "eu-west", json!({"a": 1}));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test_key"));
        assert!(json.contains("eu-west"));
        assert!(json.contains(r#""a":1"#));
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key", 3);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains(r#""regions_written":3"#));
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("deleted_key", 2);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("deleted_key"));
        assert!(json.contains(r#""removed":2"#));
    }

    #[test]
    fn test_stats_response_aggregates_regions() {
        let mut regions = BTreeMap::new();
        regions.insert("us-east".to_string(), snapshot(3, 6, 2));
        regions.insert("eu-west".to_string(), snapshot(1, 2, 0));

        let resp = StatsResponse::new(regions);
        assert_eq!(resp.total_entries, 4);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::new(BTreeMap::new());
        assert_eq!(resp.hit_rate, 0.0);
        assert_eq!(resp.total_entries, 0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy(vec!["us-east".into()]);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
        assert!(json.contains("us-east"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
