//! Cache Warmer Module
//!
//! Registered generators that pre-populate a cache. A failing generator is
//! logged and skipped; it never aborts the rest of the batch. Generators are
//! either plain closures or closures returning a future; both run with no
//! cache lock held.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::EdgeCache;

/// Error type returned by warming generators.
pub type GeneratorError = Box<dyn std::error::Error + Send + Sync>;

/// Future produced by an async warming generator.
pub type BoxFuture<V> = Pin<Box<dyn Future<Output = Result<V, GeneratorError>> + Send>>;

enum Generator<V> {
    Sync(Box<dyn Fn() -> Result<V, GeneratorError> + Send + Sync>),
    Async(Box<dyn Fn() -> BoxFuture<V> + Send + Sync>),
}

struct WarmingTask<V> {
    key: String,
    ttl: Option<Duration>,
    tags: BTreeSet<String>,
    generator: Generator<V>,
    last_run: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl<V: Clone + Serialize> WarmingTask<V> {
    /// Stores a generated value and records the outcome. Returns whether the
    /// key was warmed.
    fn record(&mut self, cache: &EdgeCache<V>, generated: Result<V, GeneratorError>) -> bool {
        let outcome = generated.map_err(|e| e.to_string()).and_then(|value| {
            cache
                .set(&self.key, value, self.ttl, self.tags.iter().cloned())
                .map_err(|e| e.to_string())
        });

        match outcome {
            Ok(()) => {
                self.last_run = Some(Utc::now());
                self.last_error = None;
                true
            }
            Err(message) => {
                warn!(key = %self.key, error = %message, "Cache warming failed");
                self.last_error = Some(message);
                false
            }
        }
    }
}

/// Status of one registered warming task.
#[derive(Debug, Clone, Serialize)]
pub struct WarmingStatus {
    pub key: String,
    pub last_run: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

// == Cache Warmer ==
pub struct CacheWarmer<V> {
    tasks: Vec<WarmingTask<V>>,
}

impl<V> Default for CacheWarmer<V> {
    fn default() -> Self {
        Self { tasks: Vec::new() }
    }
}

impl<V> std::fmt::Debug for CacheWarmer<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheWarmer")
            .field("tasks", &self.tasks.iter().map(|t| &t.key).collect::<Vec<_>>())
            .finish()
    }
}

impl<V: Clone + Serialize + 'static> CacheWarmer<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a generator for `key`.
    pub fn register<F, E, I, S>(
        &mut self,
        key: impl Into<String>,
        ttl: Option<Duration>,
        tags: I,
        generator: F,
    ) where
        F: Fn() -> Result<V, E> + Send + Sync + 'static,
        E: Into<GeneratorError>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Generator::Sync(Box::new(move || -> Result<V, GeneratorError> {
            generator().map_err(Into::into)
        }));
        self.push(key.into(), ttl, tags, generator);
    }

    /// Registers an async generator for `key`. Only `warm_async` runs it.
    pub fn register_async<F, Fut, E, I, S>(
        &mut self,
        key: impl Into<String>,
        ttl: Option<Duration>,
        tags: I,
        generator: F,
    ) where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<GeneratorError> + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Generator::Async(Box::new(move || -> BoxFuture<V> {
            let fut = generator();
            Box::pin(async move { fut.await.map_err(Into::into) })
        }));
        self.push(key.into(), ttl, tags, generator);
    }

    fn push<I, S>(&mut self, key: String, ttl: Option<Duration>, tags: I, generator: Generator<V>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tasks.push(WarmingTask {
            key,
            ttl,
            tags: tags.into_iter().map(Into::into).collect(),
            generator,
            last_run: None,
            last_error: None,
        });
    }

    // == Warm ==
    /// Runs every registered sync task, or only those for `only_key`, and
    /// stores the results in `cache`. Returns the number of keys warmed.
    ///
    /// Async tasks are skipped with a warning; use `warm_async` for them.
    pub fn warm(&mut self, cache: &EdgeCache<V>, only_key: Option<&str>) -> usize {
        let mut warmed = 0;

        for task in self
            .tasks
            .iter_mut()
            .filter(|t| only_key.map_or(true, |k| t.key == k))
        {
            let generated = match &task.generator {
                Generator::Sync(generate) => generate(),
                Generator::Async(_) => {
                    warn!(key = %task.key, "Async warming task skipped by synchronous warm");
                    continue;
                }
            };
            if task.record(cache, generated) {
                warmed += 1;
            }
        }

        info!(warmed, "Cache warming finished");
        warmed
    }

    /// Runs every registered task, sync and async, or only those for
    /// `only_key`. Futures are awaited one at a time with no lock held.
    pub async fn warm_async(&mut self, cache: &EdgeCache<V>, only_key: Option<&str>) -> usize {
        let mut warmed = 0;

        for task in self
            .tasks
            .iter_mut()
            .filter(|t| only_key.map_or(true, |k| t.key == k))
        {
            let generated = match &task.generator {
                Generator::Sync(generate) => generate(),
                Generator::Async(generate) => generate().await,
            };
            if task.record(cache, generated) {
                warmed += 1;
            }
        }

        info!(warmed, "Async cache warming finished");
        warmed
    }

    pub fn status(&self) -> Vec<WarmingStatus> {
        self.tasks
            .iter()
            .map(|t| WarmingStatus {
                key: t.key.clone(),
                last_run: t.last_run,
                last_error: t.last_error.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
