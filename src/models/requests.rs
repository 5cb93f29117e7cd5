//! Request DTOs for the edge cache API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{Regions, MAX_KEY_LENGTH, MAX_TAGS_PER_ENTRY};

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds (uses default if not specified)
/// - `tags`: Tags for group invalidation
/// - `regions`: Target regions (all configured regions if omitted)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        if self.ttl == Some(0) {
            return Some("TTL must be greater than zero".to_string());
        }
        if self.tags.len() > MAX_TAGS_PER_ENTRY {
            return Some(format!("At most {} tags per entry", MAX_TAGS_PER_ENTRY));
        }
        if self.tags.iter().any(|t| t.is_empty()) {
            return Some("Tags cannot be empty".to_string());
        }
        if self.regions.as_ref().is_some_and(|r| r.is_empty()) {
            return Some("Regions cannot be an empty list".to_string());
        }
        None
    }

    pub fn target_regions(&self) -> Regions {
        to_regions(self.regions.clone())
    }
}

/// Request body for POST /invalidate/pattern
#[derive(Debug, Clone, Deserialize)]
pub struct PatternRequest {
    /// Glob pattern where `*` matches any run of characters
    pub pattern: String,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
}

impl PatternRequest {
    pub fn validate(&self) -> Option<String> {
        if self.pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        None
    }

    pub fn target_regions(&self) -> Regions {
        to_regions(self.regions.clone())
    }
}

/// Query string for fan-out endpoints: `?regions=us-east,eu-west`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionsQuery {
    #[serde(default)]
    pub regions: Option<String>,
}

impl RegionsQuery {
    pub fn target_regions(&self) -> Regions {
        let names = self.regions.as_ref().map(|raw| {
            raw.split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect::<Vec<_>>()
        });
        to_regions(names)
    }
}

fn to_regions(names: Option<Vec<String>>) -> Regions {
    match names {
        Some(names) if !names.is_empty() => Regions::Only(names),
        _ => Regions::All,
    }
}
