//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL, access
//! metadata, tags and a value fingerprint.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cache::duration_ms;

/// Number of hex characters kept from the SHA-256 digest.
const FINGERPRINT_LEN: usize = 16;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Key as supplied by the caller (without region namespace)
    pub key: String,
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds) of the last full write
    pub created_at: u64,
    /// Time to live
    pub ttl: Duration,
    /// Owning region, set only under the geographic strategy
    pub region: Option<String>,
    /// Successful reads since the last full write
    pub access_count: u64,
    /// Timestamp (Unix milliseconds) of the last successful read or write
    pub last_access: u64,
    /// Labels used for bulk invalidation
    pub tags: BTreeSet<String>,
    /// Short content hash, recomputed on every write
    pub fingerprint: String,
}

impl<V: Serialize> CacheEntry<V> {
    // == Constructor ==
    /// Creates a fresh entry written at `now_ms`.
    pub fn new(
        key: impl Into<String>,
        value: V,
        ttl: Duration,
        region: Option<String>,
        tags: BTreeSet<String>,
        now_ms: u64,
    ) -> Self {
        let fingerprint = compute_fingerprint(&value);
        Self {
            key: key.into(),
            value,
            created_at: now_ms,
            ttl,
            region,
            access_count: 0,
            last_access: now_ms,
            tags,
            fingerprint,
        }
    }
}

impl<V> CacheEntry<V> {
    // == Expiry ==
    /// Expiration timestamp in Unix milliseconds, saturating at `u64::MAX`.
    pub fn expires_at_ms(&self) -> u64 {
        self.created_at.saturating_add(duration_ms(self.ttl))
    }

    /// Checks if the entry has expired.
    ///
    /// An entry is expired once strictly more than `ttl` has passed since it
    /// was written; at exactly `created_at + ttl` it is still live.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at_ms()
    }

    /// Time elapsed since the last full write.
    pub fn age(&self, now_ms: u64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(self.created_at))
    }

    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.expires_at_ms().saturating_sub(now_ms))
    }

    // == Touch ==
    /// Records a successful read.
    pub fn record_access(&mut self, now_ms: u64) {
        self.access_count += 1;
        self.last_access = now_ms;
    }

    /// Read-only metadata snapshot.
    pub fn info(&self, now_ms: u64) -> EntryInfo {
        EntryInfo {
            key: self.key.clone(),
            region: self.region.clone(),
            tags: self.tags.iter().cloned().collect(),
            fingerprint: self.fingerprint.clone(),
            access_count: self.access_count,
            created_at: self.created_at,
            last_access: self.last_access,
            ttl_secs: self.ttl.as_secs_f64(),
            ttl_remaining_secs: self.ttl_remaining(now_ms).as_secs_f64(),
        }
    }
}

// == Entry Info ==
/// Metadata about a cached entry, without its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub region: Option<String>,
    pub tags: Vec<String>,
    pub fingerprint: String,
    pub access_count: u64,
    pub created_at: u64,
    pub last_access: u64,
    pub ttl_secs: f64,
    pub ttl_remaining_secs: f64,
}

// == Utility Functions ==
/// Computes a short SHA-256 fingerprint over the JSON encoding of `value`.
///
/// Values that cannot be encoded hash as the empty input.
pub fn compute_fingerprint<V: Serialize>(value: &V) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    let mut encoded = hex::encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}
