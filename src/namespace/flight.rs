//! Single-flight coalescing of concurrent cache misses.
//!
//! The first caller for a key runs the work; callers arriving while it runs
//! wait for the same result. If the running work fails or is dropped, the
//! next waiter runs its own work instead.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

/// Per-key in-flight computations.
pub struct SingleFlight<V> {
    calls: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V> Default for SingleFlight<V> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> fmt::Debug for SingleFlight<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.calls.lock().len())
            .finish()
    }
}

impl<V: Clone> SingleFlight<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` for `key` unless another caller is already running it, in
    /// which case this call waits for and clones that caller's result.
    pub async fn run<F, Fut, E>(&self, key: &str, work: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut calls = self.calls.lock();
            Arc::clone(calls.entry(key.to_string()).or_default())
        };

        let result = cell.get_or_try_init(work).await.cloned();

        // A failed run leaves the slot to whichever waiter takes over the
        // work; only a filled cell or the last holder clears it.
        let mut calls = self.calls.lock();
        let finished = cell.initialized() || Arc::strong_count(&cell) <= 2;
        if finished && calls.get(key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            calls.remove(key);
        }
        result
    }

    /// Number of keys with work currently running.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}
