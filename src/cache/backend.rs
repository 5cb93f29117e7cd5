//! Backend Module
//!
//! Contract for the durable key/value store behind versioned and
//! stale-while-revalidate caching, plus an in-memory implementation.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};

use crate::cache::{duration_ms, Clock};
use crate::error::Result;

// == Backend Trait ==
/// Storage collaborator. It only stores bytes; key construction belongs to
/// the caller.
pub trait CacheBackend: Send + Sync + Debug {
    /// Returns the stored bytes, or `None` if absent or expired.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores bytes; a `ttl` of `None` never expires.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Removes a key; returns whether it existed.
    fn delete(&self, key: &str) -> Result<bool>;
}

// == Typed Access ==
/// JSON-encoded typed access on top of any backend.
pub trait BackendExt: CacheBackend {
    fn get_value<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_value<V: Serialize>(&self, key: &str, value: &V, ttl: Option<Duration>) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes, ttl)
    }
}

impl<B: CacheBackend + ?Sized> BackendExt for B {}

// == In-Memory Backend ==
#[derive(Debug)]
struct Stored {
    bytes: Vec<u8>,
    /// Unix milliseconds; `None` never expires
    expires_at: Option<u64>,
}

/// Process-local backend with per-key expiry.
#[derive(Debug)]
pub struct InMemoryBackend {
    entries: Mutex<HashMap<String, Stored>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryBackend {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Removes all expired keys; returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, stored| stored.expires_at.map_or(true, |at| now < at));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl CacheBackend for InMemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            Some(stored) => stored.expires_at.is_some_and(|at| now >= at),
            None => return Ok(None),
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|stored| stored.bytes.clone()))
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|t| self.clock.now_ms().saturating_add(duration_ms(t)));
        self.entries.lock().insert(
            key.to_string(),
            Stored {
                bytes: value,
                expires_at,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.lock().remove(key).is_some())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::error::CacheError;

    /// Backend that rejects every operation.
    #[derive(Debug, Default)]
    pub(crate) struct FailingBackend;

    impl CacheBackend for FailingBackend {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(CacheError::Backend("connection refused".into()))
        }

        fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<()> {
            Err(CacheError::Backend("connection refused".into()))
        }

        fn delete(&self, _key: &str) -> Result<bool> {
            Err(CacheError::Backend("connection refused".into()))
        }
    }

    #[test]
    fn test_typed_roundtrip_and_delete() {
        let backend = InMemoryBackend::new(Arc::new(ManualClock::new(0)));
        backend.set_value("n", &42u64, None).unwrap();

        assert_eq!(backend.get_value::<u64>("n").unwrap(), Some(42));
        assert!(backend.delete("n").unwrap());
        assert!(!backend.delete("n").unwrap());
        assert_eq!(backend.get_value::<u64>("n").unwrap(), None);
    }

    #[test]
    fn test_expiry() {
        let clock = Arc::new(ManualClock::new(0));
        let backend = InMemoryBackend::new(clock.clone());
        backend.set("short", b"a".to_vec(), Some(Duration::from_secs(1))).unwrap();
        backend.set("forever", b"b".to_vec(), None).unwrap();

        clock.advance(Duration::from_secs(2));

        assert_eq!(backend.get("short").unwrap(), None);
        assert_eq!(backend.get("forever").unwrap(), Some(b"b".to_vec()));
    }

    #[test]
    fn test_huge_ttl_does_not_expire() {
        let clock = Arc::new(ManualClock::new(5_000));
        let backend = InMemoryBackend::new(clock.clone());
        backend
            .set("k", b"v".to_vec(), Some(Duration::from_secs(u64::MAX)))
            .unwrap();
        clock.advance(Duration::from_secs(1));

        assert_eq!(backend.get("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(backend.cleanup_expired(), 0);
    }

    #[test]
    fn test_cleanup_expired() {
        let clock = Arc::new(ManualClock::new(0));
        let backend = InMemoryBackend::new(clock.clone());
        backend.set("a", vec![], Some(Duration::from_secs(1))).unwrap();
        backend.set("b", vec![], Some(Duration::from_secs(10))).unwrap();
        clock.advance(Duration::from_secs(5));

        assert_eq!(backend.cleanup_expired(), 1);
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_type_mismatch_is_serialization_error() {
        let backend = InMemoryBackend::new(Arc::new(ManualClock::new(0)));
        backend.set_value("s", &"text", None).unwrap();

        assert!(matches!(
            backend.get_value::<u64>("s"),
            Err(CacheError::Serialization(_))
        ));
    }
}
