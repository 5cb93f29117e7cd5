//! TTL Cleanup Task
//!
//! Background task that periodically purges expired entries from every
//! region. Reads already expire entries lazily; the sweep bounds memory held
//! by keys that are never read again.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::GeoCache;

/// Spawns a background task that periodically purges expired entries.
///
/// Each sweep locks one region at a time. The returned handle is aborted
/// during graceful shutdown. `Config::validate` rejects a zero interval;
/// one passed directly is raised to one second with a warning.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(GeoCache::new(GeoConfig::default(), Arc::new(SystemClock))?);
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    cache: Arc<GeoCache<Value>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    if cleanup_interval_secs == 0 {
        warn!("Cleanup interval of 0 seconds raised to 1 second");
    }
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired();
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, Regions};
    use crate::config::GeoConfig;
    use serde_json::json;

    const NO_TAGS: [&str; 0] = [];

    fn geo(clock: Arc<ManualClock>) -> Arc<GeoCache<Value>> {
        Arc::new(GeoCache::new(GeoConfig::default(), clock).unwrap())
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = geo(clock.clone());
        cache
            .set("expire_soon", json!("value"), Some(Duration::from_secs(1)), &NO_TAGS, &Regions::All)
            .unwrap();

        clock.advance(Duration::from_secs(2));
        let handle = spawn_cleanup_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        // Collected by the sweep, not by a read
        assert_eq!(cache.sizes().regions.values().sum::<usize>(), 0);
        let expirations: u64 = cache.stats().values().map(|s| s.counters.expirations).sum();
        assert_eq!(expirations, cache.regions().len() as u64);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = geo(clock.clone());
        cache
            .set("long_lived", json!(1), Some(Duration::from_secs(3600)), &NO_TAGS, &Regions::All)
            .unwrap();

        clock.advance(Duration::from_secs(60));
        let handle = spawn_cleanup_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.get("long_lived", "us-east"), Some(json!(1)));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let cache = geo(Arc::new(ManualClock::new(0)));
        let handle = spawn_cleanup_task(cache, 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
