//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries, so
//! entries nobody reads again after expiry do not pile up.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Default sweep period.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Spawns a background task that periodically sweeps expired entries from one store.
///
/// The task sleeps for `interval` between runs and takes the store's write
/// lock only for the sweep itself. It runs until the returned handle is
/// aborted.
///
/// # Arguments
/// * `store` - Shared reference to the store
/// * `name` - Namespace name for log lines
/// * `interval` - Time between sweeps
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(CacheStore::new("sales", 500, ttl)));
/// let handle = spawn_cleanup_task(store.clone(), "sales", DEFAULT_CLEANUP_INTERVAL);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task<T>(
    store: Arc<RwLock<CacheStore<T>>>,
    name: &str,
    interval: Duration,
) -> JoinHandle<()>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let name = name.to_string();

    tokio::spawn(async move {
        debug!(namespace = %name, interval_secs = interval.as_secs(), "Starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.write().await.cleanup();

            if removed > 0 {
                info!(namespace = %name, removed, "TTL cleanup removed expired entries");
            } else {
                debug!(namespace = %name, "TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn shared_store(clock: &ManualClock) -> Arc<RwLock<CacheStore<String>>> {
        Arc::new(RwLock::new(
            CacheStore::new("test", 100, Duration::from_secs(300)).with_clock(Arc::new(clock.clone())),
        ))
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let clock = ManualClock::new(0);
        let store = shared_store(&clock);
        store
            .write()
            .await
            .set("expire_soon", "value".to_string(), Some(Duration::from_secs(1)));

        let handle = spawn_cleanup_task(store.clone(), "test", Duration::from_millis(50));
        clock.advance(Duration::from_secs(2));

        tokio::time::sleep(Duration::from_millis(200)).await;

        // Swept without anyone reading it
        assert_eq!(store.read().await.len(), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let clock = ManualClock::new(0);
        let store = shared_store(&clock);
        store
            .write()
            .await
            .set("long_lived", "value".to_string(), Some(Duration::from_secs(3600)));

        let handle = spawn_cleanup_task(store.clone(), "test", Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(200)).await;

        let value = store.write().await.get("long_lived");
        assert_eq!(value.as_deref(), Some("value"), "Valid entry should not be removed");
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let clock = ManualClock::new(0);
        let handle = spawn_cleanup_task(shared_store(&clock), "test", Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
