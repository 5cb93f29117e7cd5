//! Stale-While-Revalidate Module
//!
//! Serves a value past its freshness window for up to `stale_window` more,
//! flagging it as stale so the caller can trigger regeneration.
//!
//! Per key: fresh until `written + ttl`, then stale until
//! `written + ttl + stale_window`, then absent. A failed revalidation keeps
//! the stale value until that final deadline.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{duration_ms, BackendExt, CacheBackend, Clock};
use crate::error::{CacheError, Result};

const STALE_SUFFIX: &str = ":stale_at";

// == SWR Cache ==
#[derive(Debug, Clone)]
pub struct StaleWhileRevalidate {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
}

impl StaleWhileRevalidate {
    pub fn new(backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    // == Read ==
    /// Returns `(value, is_stale)`.
    ///
    /// On a miss the generator runs synchronously and its value is cached.
    /// A stale hit returns immediately without running the generator;
    /// revalidating is up to the caller.
    pub fn read<V, F, E>(
        &self,
        key: &str,
        generator: F,
        ttl: Duration,
        stale_window: Duration,
    ) -> Result<(V, bool)>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> std::result::Result<V, E>,
        E: Display,
    {
        validate_ttl(ttl)?;
        if let Some(hit) = self.cached(key)? {
            return Ok(hit);
        }

        let value = generator().map_err(|e| CacheError::generator(key, e))?;
        self.store(key, &value, ttl, stale_window)?;
        Ok((value, false))
    }

    /// Async variant of [`read`](Self::read).
    pub async fn read_async<V, F, Fut, E>(
        &self,
        key: &str,
        generator: F,
        ttl: Duration,
        stale_window: Duration,
    ) -> Result<(V, bool)>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
        E: Display,
    {
        validate_ttl(ttl)?;
        if let Some(hit) = self.cached(key)? {
            return Ok(hit);
        }

        let value = generator()
            .await
            .map_err(|e| CacheError::generator(key, e))?;
        self.store(key, &value, ttl, stale_window)?;
        Ok((value, false))
    }

    // == Revalidate ==
    /// Regenerates `key`.
    ///
    /// Returns `Ok(true)` when a fresh value was stored. A generator failure
    /// is logged and leaves the current value in place (`Ok(false)`); backend
    /// failures propagate.
    pub fn revalidate<V, F, E>(
        &self,
        key: &str,
        generator: F,
        ttl: Duration,
        stale_window: Duration,
    ) -> Result<bool>
    where
        V: Serialize,
        F: FnOnce() -> std::result::Result<V, E>,
        E: Display,
    {
        validate_ttl(ttl)?;
        match generator() {
            Ok(value) => {
                self.store(key, &value, ttl, stale_window)?;
                debug!(key, "Revalidated entry");
                Ok(true)
            }
            Err(e) => {
                warn!(key, error = %e, "Revalidation failed, keeping stale value");
                Ok(false)
            }
        }
    }

    /// Removes the value and its staleness marker.
    pub fn invalidate(&self, key: &str) -> Result<bool> {
        let removed = self.backend.delete(key)?;
        self.backend.delete(&stale_key(key))?;
        Ok(removed)
    }

    fn cached<V: DeserializeOwned>(&self, key: &str) -> Result<Option<(V, bool)>> {
        let Some(value) = self.backend.get_value::<V>(key)? else {
            return Ok(None);
        };
        let stale_at = self.backend.get_value::<u64>(&stale_key(key))?;
        let is_stale = stale_at.is_some_and(|at| self.clock.now_ms() > at);
        Ok(Some((value, is_stale)))
    }

    fn store<V: Serialize>(
        &self,
        key: &str,
        value: &V,
        ttl: Duration,
        stale_window: Duration,
    ) -> Result<()> {
        let lifetime = Some(ttl.saturating_add(stale_window));
        let stale_at = self.clock.now_ms().saturating_add(duration_ms(ttl));
        self.backend.set_value(key, value, lifetime)?;
        self.backend.set_value(&stale_key(key), &stale_at, lifetime)
    }
}

fn stale_key(key: &str) -> String {
    format!("{}{}", key, STALE_SUFFIX)
}

fn validate_ttl(ttl: Duration) -> Result<()> {
    if ttl.is_zero() {
        return Err(CacheError::config("ttl must be greater than zero"));
    }
    Ok(())
}
