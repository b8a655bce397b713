//! In-memory keyed record store.
//!
//! Thread-safe map behind `Arc<RwLock>`; clones share the same data. Keys
//! are ordered, so listings are stable across calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Thread-safe in-memory store for records keyed by `K`.
#[derive(Debug)]
pub struct Store<K: Ord + Clone, T: Clone + Send + Sync> {
    data: Arc<RwLock<BTreeMap<K, T>>>,
}

impl<K: Ord + Clone, T: Clone + Send + Sync> Clone for Store<K, T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Ord + Clone, T: Clone + Send + Sync> Store<K, T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: K, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Insert only if the key is absent. Returns `false` if it was present.
    pub fn insert_new(&self, id: K, value: T) -> bool {
        let mut guard = self.data.write();
        if guard.contains_key(&id) {
            return false;
        }
        guard.insert(id, value);
        true
    }

    /// Retrieve a record by key.
    pub fn get(&self, id: &K) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records in key order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// List records matching a predicate, in key order.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| pred(v))
            .cloned()
            .collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under a single write lock. Returns `None` if the
    /// record doesn't exist, or `Some(result)` with the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &K,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &K) -> bool {
        self.data.read().contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Ord + Clone, T: Clone + Send + Sync> Default for Store<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_new_refuses_existing_key() {
        let store: Store<String, u32> = Store::new();
        assert!(store.insert_new("a".into(), 1));
        assert!(!store.insert_new("a".into(), 2));
        assert_eq!(store.get(&"a".into()), Some(1));
    }

    #[test]
    fn clones_share_data() {
        let store: Store<String, u32> = Store::new();
        let other = store.clone();
        store.insert("a".into(), 1);
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn try_update_is_conditional() {
        let store: Store<String, u32> = Store::new();
        store.insert("a".into(), 1);
        let res: Option<Result<(), &str>> = store.try_update(&"a".into(), |v| {
            if *v != 1 {
                return Err("stale");
            }
            *v = 2;
            Ok(())
        });
        assert_eq!(res, Some(Ok(())));
        let res: Option<Result<(), &str>> =
            store.try_update(&"a".into(), |v| if *v != 1 { Err("stale") } else { Ok(()) });
        assert_eq!(res, Some(Err("stale")));
        assert!(store.try_update::<(), ()>(&"zz".into(), |_| Ok(())).is_none());
    }

    #[test]
    fn list_is_key_ordered() {
        let store: Store<String, &str> = Store::new();
        store.insert("b".into(), "second");
        store.insert("a".into(), "first");
        assert_eq!(store.list(), vec!["first", "second"]);
        assert_eq!(store.filter(|v| v.starts_with('s')), vec!["second"]);
    }
}
