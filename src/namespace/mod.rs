//! Namespace Module
//!
//! One independently configured store per category of domain data, and the
//! registry that owns them.
//!
//! A [`NamespaceRegistry`] is built once from [`Config`] and handed to whoever
//! needs it; there is no global instance, so tests and embedders can run as
//! many isolated registries as they like.

mod flight;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{
    CacheStats, CacheStore, Clock, DebugInfo, Persistence, PersistenceBackend, SystemClock,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::keys::DataKind;
use crate::tasks::spawn_cleanup_task;

pub use flight::SingleFlight;

/// Store shared between a namespace handle and its cleanup task.
pub type SharedStore = Arc<RwLock<CacheStore<Value>>>;

// == Namespace ==
/// The fixed set of cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Namespace {
    /// Hourly sales and ticket counts
    Sales,
    /// Commissions and paid prizes
    Finances,
    /// Roll changes
    Rolls,
    UserProfile,
    /// Pre-aggregated supervisor views
    Dashboard,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [
        Namespace::Sales,
        Namespace::Finances,
        Namespace::Rolls,
        Namespace::UserProfile,
        Namespace::Dashboard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Sales => "sales",
            Namespace::Finances => "finances",
            Namespace::Rolls => "rolls",
            Namespace::UserProfile => "user-profile",
            Namespace::Dashboard => "dashboard",
        }
    }

    /// Upper-case form used in environment variable names.
    pub fn env_key(&self) -> &'static str {
        match self {
            Namespace::Sales => "SALES",
            Namespace::Finances => "FINANCES",
            Namespace::Rolls => "ROLLS",
            Namespace::UserProfile => "USER_PROFILE",
            Namespace::Dashboard => "DASHBOARD",
        }
    }

    /// Namespace holding keys of a data kind.
    pub fn for_kind(kind: DataKind) -> Namespace {
        match kind {
            DataKind::Sales | DataKind::Tickets => Namespace::Sales,
            DataKind::Commissions | DataKind::Prizes => Namespace::Finances,
            DataKind::Rolls => Namespace::Rolls,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Namespace::ALL
            .into_iter()
            .find(|ns| ns.as_str() == s)
            .ok_or_else(|| CacheError::UnknownNamespace(s.to_string()))
    }
}

// == Namespace Cache ==
/// Handle to one namespace's store.
///
/// Payloads are kept as JSON values so one registry can hold differently
/// typed data; `get_as`/`set_as` convert at the edge.
#[derive(Debug)]
pub struct NamespaceCache {
    namespace: Namespace,
    store: SharedStore,
    flight: SingleFlight<Value>,
    cleanup_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl NamespaceCache {
    pub fn new(namespace: Namespace, store: CacheStore<Value>) -> Self {
        Self {
            namespace,
            store: Arc::new(RwLock::new(store)),
            flight: SingleFlight::new(),
            cleanup_task: parking_lot::Mutex::new(None),
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// The underlying store, for callers that need several operations under one lock.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.store.write().await.get(key)
    }

    pub async fn set(&self, key: impl Into<String>, data: Value, ttl: Option<Duration>) {
        self.store.write().await.set(key, data, ttl);
    }

    /// Typed read. A payload that does not decode as `T` is an error.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Typed write.
    pub async fn set_as<T: Serialize>(
        &self,
        key: impl Into<String>,
        data: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let value = serde_json::to_value(data)?;
        self.set(key, value, ttl).await;
        Ok(())
    }

    pub async fn has(&self, key: &str) -> bool {
        self.store.read().await.has(key)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        self.store.write().await.invalidate_pattern(pattern)
    }

    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.store.write().await.invalidate_prefix(prefix)
    }

    pub async fn cleanup(&self) -> usize {
        self.store.write().await.cleanup()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn debug_info(&self) -> DebugInfo<Value> {
        self.store.read().await.debug_info()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    // == Get Or Fetch ==
    /// Cache-aside read with miss coalescing.
    ///
    /// Counts as exactly one `get`. On a miss, concurrent callers for the same
    /// key share a single call to `fetch`; its result is stored with `ttl`
    /// (or the namespace default) before being returned. Fetch errors are
    /// returned as-is and nothing is stored.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            match serde_json::from_value(value) {
                Ok(data) => return Ok(data),
                Err(e) => {
                    warn!(
                        namespace = %self.namespace,
                        key,
                        error = %e,
                        "Cached payload has unexpected shape, refetching"
                    );
                    self.delete(key).await;
                }
            }
        }

        let value = self
            .flight
            .run(key, || self.fill(key, ttl, fetch))
            .await?;

        serde_json::from_value(value).map_err(|e| CacheError::from(e).into())
    }

    /// Leader side of [`get_or_fetch`](Self::get_or_fetch).
    async fn fill<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> std::result::Result<Value, E>
    where
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        // Another leader may have filled the key since our miss
        let cached = self.store.read().await.peek(key);
        if let Some(value) = cached {
            return Ok(value);
        }

        let fetched = fetch().await?;
        let value = serde_json::to_value(&fetched).map_err(CacheError::from)?;
        self.set(key, value.clone(), ttl).await;
        debug!(namespace = %self.namespace, key, "Filled cache miss");
        Ok(value)
    }

    // == Cleanup Timer ==
    /// Starts the periodic sweep, replacing any running one.
    pub fn start_cleanup(&self, interval: Duration) {
        let handle = spawn_cleanup_task(self.store.clone(), self.namespace.as_str(), interval);
        if let Some(previous) = self.cleanup_task.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Cancels the periodic sweep. Returns whether one was running.
    pub fn stop_cleanup(&self) -> bool {
        match self.cleanup_task.lock().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn has_cleanup_timer(&self) -> bool {
        self.cleanup_task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the sweep and drops in-memory entries. Persisted entries stay.
    pub async fn destroy(&self) {
        self.stop_cleanup();
        self.store.write().await.release();
        debug!(namespace = %self.namespace, "Namespace destroyed");
    }
}

impl Drop for NamespaceCache {
    fn drop(&mut self) {
        if let Some(handle) = self.cleanup_task.get_mut().take() {
            handle.abort();
        }
    }
}

// == Namespace Registry ==
/// Owns one [`NamespaceCache`] per [`Namespace`].
#[derive(Debug)]
pub struct NamespaceRegistry {
    caches: BTreeMap<Namespace, Arc<NamespaceCache>>,
}

impl NamespaceRegistry {
    /// Builds every namespace from `config`. Persistent namespaces mirror to
    /// `backend` when one is given and run memory-only otherwise.
    pub fn new(config: &Config, backend: Option<Arc<dyn PersistenceBackend>>) -> Self {
        Self::with_clock(config, backend, Arc::new(SystemClock))
    }

    /// Registry without any durable medium.
    pub fn in_memory(config: &Config) -> Self {
        Self::new(config, None)
    }

    pub fn with_clock(
        config: &Config,
        backend: Option<Arc<dyn PersistenceBackend>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let caches = Namespace::ALL
            .into_iter()
            .map(|namespace| {
                let ns_config = config.namespace(namespace);
                let mut store = CacheStore::new(
                    namespace.as_str(),
                    ns_config.capacity,
                    ns_config.default_ttl(),
                )
                .with_clock(Arc::clone(&clock));

                match (&backend, ns_config.persistent) {
                    (Some(backend), true) => {
                        store = store.with_persistence(Persistence::new(
                            Arc::clone(backend),
                            namespace.as_str(),
                        ));
                    }
                    (None, true) => {
                        debug!(namespace = %namespace, "No durable medium, running memory-only");
                    }
                    _ => {}
                }

                info!(
                    namespace = %namespace,
                    capacity = ns_config.capacity,
                    default_ttl_minutes = ns_config.default_ttl_minutes,
                    persistent = store.is_persistent(),
                    restored = store.len(),
                    "Namespace ready"
                );
                (namespace, Arc::new(NamespaceCache::new(namespace, store)))
            })
            .collect();

        Self { caches }
    }

    /// Handle for a namespace. Every namespace is always registered.
    pub fn get(&self, namespace: Namespace) -> &Arc<NamespaceCache> {
        &self.caches[&namespace]
    }

    /// Handle by name, as used on the admin API.
    pub fn lookup(&self, name: &str) -> Result<&Arc<NamespaceCache>> {
        let namespace: Namespace = name.parse()?;
        Ok(self.get(namespace))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<NamespaceCache>> {
        self.caches.values()
    }

    /// Starts a sweep timer on every namespace.
    pub fn start_cleanup_timers(&self, interval: Duration) {
        for cache in self.iter() {
            cache.start_cleanup(interval);
        }
        info!(interval_secs = interval.as_secs(), "Cleanup timers started");
    }
}
