//! Expiry Sweep Task
//!
//! Background task that periodically purges expired cache entries, so keys
//! nobody reads again still give their memory back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::cache::CacheStore;

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// The task holds the store lock for one whole sweep pass. It exits when the
/// store is dropped, or at its next pass after `active` is cleared. Clearing
/// `active` while holding the store lock guarantees no pass starts afterwards.
///
/// # Arguments
/// * `store` - weak reference to the shared store
/// * `active` - cleared to stop the task
/// * `interval` - time between sweep passes
///
/// # Returns
/// A JoinHandle for the spawned task, which can be aborted on shutdown.
pub fn spawn_sweep_task(
    store: Weak<Mutex<CacheStore>>,
    active: Arc<AtomicBool>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Starting expiry sweep task with interval of {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(shared) = store.upgrade() else {
                break;
            };
            let removed = {
                let mut guard = shared.lock();
                if !active.load(Ordering::Acquire) {
                    break;
                }
                guard.sweep_expired()
            };

            if removed > 0 {
                debug!(removed, "Expiry sweep removed entries");
            } else {
                trace!("Expiry sweep found nothing to remove");
            }
        }

        debug!("Expiry sweep task exited");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheOptions, CacheValue, SetOptions};

    fn shared_store() -> Arc<Mutex<CacheStore>> {
        Arc::new(Mutex::new(CacheStore::new(CacheOptions::new(1024))))
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let store = shared_store();
        store.lock().set(
            "expire_soon".to_string(),
            CacheValue::from("value"),
            SetOptions::new().with_ttl_ms(20),
        );

        let active = Arc::new(AtomicBool::new(true));
        let handle = spawn_sweep_task(Arc::downgrade(&store), active, Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(150)).await;

        // gone without any read touching it
        assert_eq!(store.lock().len(), 0, "Expired entry should have been swept");
        assert_eq!(store.lock().stats().misses, 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let store = shared_store();
        store.lock().set(
            "long_lived".to_string(),
            CacheValue::from("value"),
            SetOptions::new().with_ttl_ms(3_600_000),
        );
        store
            .lock()
            .set("no_ttl".to_string(), CacheValue::from("value"), SetOptions::new());

        let active = Arc::new(AtomicBool::new(true));
        let handle = spawn_sweep_task(Arc::downgrade(&store), active, Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.lock().len(), 2, "Valid entries should not be removed");

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_exits_when_deactivated() {
        let store = shared_store();
        let active = Arc::new(AtomicBool::new(true));
        let handle = spawn_sweep_task(
            Arc::downgrade(&store),
            active.clone(),
            Duration::from_millis(5),
        );

        {
            let _guard = store.lock();
            active.store(false, Ordering::Release);
        }

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("Task should exit after deactivation")
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_exits_when_store_dropped() {
        let store = shared_store();
        let active = Arc::new(AtomicBool::new(true));
        let handle = spawn_sweep_task(Arc::downgrade(&store), active, Duration::from_millis(5));

        drop(store);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("Task should exit once the store is gone")
            .unwrap();
    }
}
