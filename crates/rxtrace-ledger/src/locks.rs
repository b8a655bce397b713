//! Per-key async write locks.
//!
//! Holding the guard for `read → decide → write` makes each item a single
//! writer. Different keys never contend. A key's entry lives only while
//! someone holds or waits for it, so ids that are locked once and rejected
//! leave nothing behind.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

type Table = parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>;

/// A map of one async mutex per key, populated on demand.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Arc<Table>,
}

/// Exclusive access to one key. Dropping it releases the key and prunes
/// the entry when nobody else is queued on it.
#[derive(Debug)]
pub struct KeyGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    table: Arc<Table>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters clone the slot under the table lock, so a count of one
        // here means the table holds the only reference.
        let mut table = self.table.lock();
        if table
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            table.remove(&self.key);
        }
    }
}

impl KeyedLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let slot = {
            let mut table = self.locks.lock();
            Arc::clone(table.entry(key.to_string()).or_default())
        };
        let guard = slot.lock_owned().await;
        KeyGuard {
            guard: Some(guard),
            key: key.to_string(),
            table: Arc::clone(&self.locks),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Whether no key is held or awaited.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
