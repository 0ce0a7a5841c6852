//! Shared Cache Engine
//!
//! Thread-safe handle over [`CacheStore`]. Every operation takes the store
//! lock for its whole duration, so operations are atomic with respect to each
//! other and to the background sweep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{CacheOptions, CacheStats, CacheStore, CacheValue, SetOptions, SetOutcome};
use crate::tasks::spawn_sweep_task;

// == Cache ==
/// Capacity-bounded cache with a background expiry sweeper.
///
/// Cheap to share behind an `Arc`. Dropping the cache stops the sweeper.
#[derive(Debug)]
pub struct Cache {
    store: Arc<Mutex<CacheStore>>,
    sweeping: Arc<AtomicBool>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Cache {
    // == Constructor ==
    /// Creates a cache and starts its sweep task.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn new(options: CacheOptions) -> Self {
        let store = Arc::new(Mutex::new(CacheStore::new(options)));
        let sweeping = Arc::new(AtomicBool::new(true));
        let interval = Duration::from_millis(options.sweep_interval_ms.max(1));
        let handle = spawn_sweep_task(Arc::downgrade(&store), sweeping.clone(), interval);

        Self {
            store,
            sweeping,
            sweeper: Mutex::new(Some(handle)),
        }
    }

    /// Returns the value for `key`, recording a hit or a miss.
    pub fn get(&self, key: &str) -> Option<CacheValue> {
        self.store.lock().get(key)
    }

    /// Returns true if `key` is live and unexpired. Touches no counters.
    pub fn has(&self, key: &str) -> bool {
        self.store.lock().has(key)
    }

    /// Stores `value` under `key`. See [`CacheStore::set`].
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<CacheValue>,
        options: SetOptions,
    ) -> SetOutcome {
        self.store.lock().set(key.into(), value.into(), options)
    }

    /// Removes `key`. Returns false if it was absent.
    pub fn del(&self, key: &str) -> bool {
        self.store.lock().delete(key)
    }

    /// Drops every entry, keeping the counters.
    pub fn clear(&self) {
        self.store.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    /// Remaining TTL of `key` in milliseconds, if it exists and expires.
    pub fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        self.store.lock().ttl_remaining_ms(key)
    }

    // == Stop ==
    /// Stops the background sweep. Idempotent.
    ///
    /// No sweep pass runs after this returns; expired entries are still
    /// purged lazily on access.
    pub fn stop(&self) {
        {
            let _store = self.store.lock();
            self.sweeping.store(false, Ordering::Release);
        }
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
            debug!("Expiry sweeper stopped");
        }
    }

    /// Returns true until [`Cache::stop`] is called.
    pub fn is_sweeping(&self) -> bool {
        self.sweeping.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.store.lock().check_invariants();
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        self.stop();
    }
}
