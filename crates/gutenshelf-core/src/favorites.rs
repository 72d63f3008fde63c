//! Locally bookmarked books.
//!
//! The store is read once when opened and then owns the truth for the
//! session. Every mutation writes through to the backing
//! [`KeyValueStore`]; when that write fails the failure is logged and kept
//! for inspection, but the in-memory set still changes.

use std::fmt;

use crate::error::PersistenceError;
use crate::storage::KeyValueStore;

/// Storage key holding the JSON array of favorite ids.
pub const FAVORITES_KEY: &str = "book-favorites";

pub struct FavoritesStore {
    ids: Vec<u32>,
    storage: Box<dyn KeyValueStore>,
    last_error: Option<PersistenceError>,
}

impl fmt::Debug for FavoritesStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("ids", &self.ids)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl FavoritesStore {
    /// Load the persisted set, starting empty if there is none or it can't
    /// be read.
    pub fn open(storage: impl KeyValueStore + 'static) -> Self {
        let mut store = Self {
            ids: Vec::new(),
            storage: Box::new(storage),
            last_error: None,
        };

        match store.load() {
            Ok(ids) => store.ids = ids,
            Err(e) => {
                tracing::warn!(error = %e, "could not load favorites, starting empty");
                store.last_error = Some(e);
            }
        }
        store
    }

    fn load(&self) -> Result<Vec<u32>, PersistenceError> {
        let Some(raw) = self.storage.get(FAVORITES_KEY)? else {
            return Ok(Vec::new());
        };
        let parsed: Vec<u32> =
            serde_json::from_str(&raw).map_err(|source| PersistenceError::Corrupt {
                key: FAVORITES_KEY.to_string(),
                source,
            })?;

        let mut ids = Vec::with_capacity(parsed.len());
        for id in parsed {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.ids)
            .map_err(|source| PersistenceError::Corrupt {
                key: FAVORITES_KEY.to_string(),
                source,
            })
            .and_then(|json| self.storage.set(FAVORITES_KEY, &json));

        match result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                tracing::warn!(error = %e, "favorites not persisted, keeping in-memory copy");
                self.last_error = Some(e);
            }
        }
    }

    /// Add `id`. Returns `false` if it was already a favorite.
    pub fn add(&mut self, id: u32) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        self.persist();
        true
    }

    /// Remove `id`. Returns `false` if it was not a favorite.
    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&x| x != id);
        if self.ids.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Flip membership of `id`; returns whether it is a favorite afterwards.
    pub fn toggle(&mut self, id: u32) -> bool {
        if self.contains(id) {
            self.remove(id);
            false
        } else {
            self.add(id);
            true
        }
    }

    pub fn clear(&mut self) {
        if self.ids.is_empty() {
            return;
        }
        self.ids.clear();
        self.persist();
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    /// Ids in the order they were added.
    pub fn list(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Most recent load or write failure, cleared by the next good write.
    pub fn last_persistence_error(&self) -> Option<&PersistenceError> {
        self.last_error.as_ref()
    }

    pub fn take_persistence_error(&mut self) -> Option<PersistenceError> {
        self.last_error.take()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::storage::{JsonFileStore, MemoryStore};
    use tempfile::TempDir;

    /// Memory store whose contents stay visible to the test after the
    /// favorites store takes ownership.
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<MemoryStore>>);

    impl SharedStore {
        fn raw(&self) -> Option<String> {
            self.0.lock().unwrap().raw(FAVORITES_KEY).map(str::to_string)
        }
    }

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            self.0.lock().unwrap().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
            self.0.lock().unwrap().set(key, value)
        }
    }

    #[test]
    fn test_starts_empty_without_persisted_key() {
        let shared = SharedStore::default();
        let mut favs = FavoritesStore::open(shared.clone());
        assert!(favs.list().is_empty());
        assert!(favs.last_persistence_error().is_none());

        assert!(favs.toggle(42));
        assert_eq!(favs.list(), &[42]);
        assert_eq!(shared.raw().as_deref(), Some("[42]"));
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut favs = FavoritesStore::open(MemoryStore::new());
        favs.add(1);
        for id in [1, 2, 3] {
            let before = favs.contains(id);
            favs.toggle(id);
            favs.toggle(id);
            assert_eq!(favs.contains(id), before, "id {id}");
        }
        assert_eq!(favs.list(), &[1]);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut favs = FavoritesStore::open(MemoryStore::new());
        assert!(favs.add(7));
        assert!(!favs.add(7));
        assert_eq!(favs.list(), &[7]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut favs = FavoritesStore::open(MemoryStore::new());
        favs.add(7);
        assert!(favs.remove(7));
        assert!(!favs.remove(7));
        assert!(favs.is_empty());
    }

    #[test]
    fn test_list_never_has_duplicates() {
        let store = MemoryStore::new().with_entry(FAVORITES_KEY, "[5, 3, 5, 9, 3]");
        let mut favs = FavoritesStore::open(store);
        assert_eq!(favs.list(), &[5, 3, 9]);

        for id in [9, 1, 5, 1, 1, 2] {
            favs.add(id);
        }
        let mut sorted = favs.list().to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), favs.len());
    }

    #[test]
    fn test_order_is_insertion_order() {
        let mut favs = FavoritesStore::open(MemoryStore::new());
        for id in [30, 10, 20] {
            favs.add(id);
        }
        favs.remove(10);
        favs.add(10);
        assert_eq!(favs.list(), &[30, 20, 10]);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut favs = FavoritesStore::open(MemoryStore::read_only());
        assert!(favs.toggle(11));
        assert!(favs.contains(11));
        assert!(matches!(
            favs.last_persistence_error(),
            Some(PersistenceError::Unavailable(_))
        ));
        assert!(favs.take_persistence_error().is_some());
        assert!(favs.last_persistence_error().is_none());
    }

    #[test]
    fn test_corrupt_value_starts_empty() {
        let store = MemoryStore::new().with_entry(FAVORITES_KEY, "not json");
        let mut favs = FavoritesStore::open(store);
        assert!(favs.is_empty());
        assert!(matches!(
            favs.last_persistence_error(),
            Some(PersistenceError::Corrupt { .. })
        ));

        // A good write replaces the corrupt value and clears the error.
        favs.add(1);
        assert!(favs.last_persistence_error().is_none());
    }

    #[test]
    fn test_survives_reopen_from_disk() {
        let dir = TempDir::new().unwrap();
        {
            let mut favs = FavoritesStore::open(JsonFileStore::new(dir.path()));
            favs.add(84);
            favs.add(1342);
            favs.toggle(84);
        }
        let favs = FavoritesStore::open(JsonFileStore::new(dir.path()));
        assert_eq!(favs.list(), &[1342]);
    }

    #[test]
    fn test_clear() {
        let shared = SharedStore::default();
        let mut favs = FavoritesStore::open(shared.clone());
        favs.add(1);
        favs.add(2);
        favs.clear();
        assert!(favs.is_empty());
        assert_eq!(shared.raw().as_deref(), Some("[]"));
    }
}
