//! Keyed async mutexes.
//!
//! The cart manager, checkout engine and order lifecycle manager all need
//! critical sections that span `.await` points: load a document, validate
//! against other collaborators, mutate, store. A `KeyedLocks` hands out one
//! async mutex per key so those sequences are linearized per cart / per
//! customer / per order without serializing unrelated keys.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A table of lazily-created async mutexes, one per key.
pub struct KeyedLocks<K> {
    inner: StdMutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            inner: StdMutex::new(HashMap::new()),
        }
    }

    /// Acquire the mutex for `key`, creating it on first use. The returned
    /// guard owns the lock and may be held across `.await` points.
    ///
    /// Each acquisition also sweeps entries nobody holds or waits on
    /// (strong count of 1, ours), so the table tracks the working set
    /// instead of every key ever locked.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, mutex| Arc::strong_count(mutex) > 1);
            Arc::clone(map.entry(key.clone()).or_default())
        };
        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
