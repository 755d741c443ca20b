//! Per-call serialization boundary.
//!
//! Every mutation of a call runs load -> mutate -> save -> publish while
//! holding that call's lock, so concurrent requests against the same call are
//! applied in submission order and a `leave` racing a `join` at the capacity
//! boundary cannot lose an update. Operations on different calls do not
//! contend.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-key async mutexes.
#[derive(Default)]
pub struct CallLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CallLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `key`, creating it on first use.
    ///
    /// The guard is owned so it can be held across await points for the
    /// duration of the operation.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drops the lock entry for `key` (used after a call ends).
    ///
    /// The entry is only removed while the registry holds the sole reference
    /// to it. If the lock is still held or awaited elsewhere the entry stays,
    /// so every late-comer keeps contending on the same mutex instead of a
    /// freshly created one.
    pub async fn remove(&self, key: &str) {
        let mut map = self.inner.lock().await;
        if map.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(key);
        }
    }
}
