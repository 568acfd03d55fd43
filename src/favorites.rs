//! User favorites with change notification and blob persistence
//!
//! The favorites set is owned outside the view. The view only observes it
//! through a `watch` subscription. Every change is written through to an
//! optional [`BlobStore`] as a JSON array under [`FAVORITES_STORAGE_KEY`].

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};

/// Blob store key holding the favorites array
pub const FAVORITES_STORAGE_KEY: &str = "pokemon-favorites";

/// Minimal key-value store for string blobs
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local blob store
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Blob store keeping one `<key>.json` file per key in a directory
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// The set of favorite entity ids
pub struct FavoritesSet {
    ids: watch::Sender<BTreeSet<u32>>,
    store: Option<Arc<dyn BlobStore>>,
}

impl FavoritesSet {
    /// In-memory favorites with no persistence
    pub fn new() -> Self {
        let (ids, _) = watch::channel(BTreeSet::new());
        Self { ids, store: None }
    }

    /// Favorites loaded from and written through to `store`.
    ///
    /// A missing, unreadable or corrupt blob starts an empty set.
    pub fn with_store(store: Arc<dyn BlobStore>) -> Self {
        let initial = Self::load(store.as_ref());
        let (ids, _) = watch::channel(initial);
        Self {
            ids,
            store: Some(store),
        }
    }

    fn load(store: &dyn BlobStore) -> BTreeSet<u32> {
        match store.get(FAVORITES_STORAGE_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<u32>>(&blob) {
                Ok(ids) => {
                    debug!("Loaded {} favorites", ids.len());
                    ids.into_iter().collect()
                }
                Err(e) => {
                    warn!("Failed to parse stored favorites: {}", e);
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("Failed to load favorites: {}", e);
                BTreeSet::new()
            }
        }
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let ids: Vec<u32> = self.ids.borrow().iter().copied().collect();
        let result = serde_json::to_string(&ids)
            .map_err(CatalogError::from)
            .and_then(|blob| store.set(FAVORITES_STORAGE_KEY, &blob));
        if let Err(e) = result {
            warn!("Failed to save favorites: {}", e);
        }
    }

    /// Flip `id`; returns whether it is now a favorite
    pub fn toggle(&self, id: u32) -> bool {
        let mut now_favorite = false;
        self.ids.send_modify(|ids| {
            now_favorite = if ids.remove(&id) { false } else { ids.insert(id) };
        });
        self.persist();
        now_favorite
    }

    /// Returns whether the set changed
    pub fn add(&self, id: u32) -> bool {
        let changed = self.ids.send_if_modified(|ids| ids.insert(id));
        if changed {
            self.persist();
        }
        changed
    }

    /// Returns whether the set changed
    pub fn remove(&self, id: u32) -> bool {
        let changed = self.ids.send_if_modified(|ids| ids.remove(&id));
        if changed {
            self.persist();
        }
        changed
    }

    pub fn clear_all(&self) {
        let changed = self.ids.send_if_modified(|ids| {
            let had_any = !ids.is_empty();
            ids.clear();
            had_any
        });
        if changed {
            self.persist();
        }
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.ids.borrow().contains(&id)
    }

    pub fn count(&self) -> usize {
        self.ids.borrow().len()
    }

    /// Copy of the current set
    pub fn snapshot(&self) -> BTreeSet<u32> {
        self.ids.borrow().clone()
    }

    /// Receiver notified on every change
    pub fn subscribe(&self) -> watch::Receiver<BTreeSet<u32>> {
        self.ids.subscribe()
    }
}

impl Default for FavoritesSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_queries() {
        let favorites = FavoritesSet::new();

        assert!(favorites.toggle(7));
        assert!(favorites.is_favorite(7));
        assert_eq!(favorites.count(), 1);

        assert!(!favorites.toggle(7));
        assert!(!favorites.is_favorite(7));
        assert_eq!(favorites.count(), 0);
    }

    #[test]
    fn test_subscribers_see_changes() {
        let favorites = FavoritesSet::new();
        let mut rx = favorites.subscribe();

        assert!(!rx.has_changed().unwrap());
        favorites.add(3);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().contains(&3));

        // no-op changes are not broadcast
        favorites.add(3);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_persists_through_store() {
        let store = Arc::new(MemoryBlobStore::new());

        let favorites = FavoritesSet::with_store(store.clone());
        favorites.add(12);
        favorites.add(3);
        assert_eq!(
            store.get(FAVORITES_STORAGE_KEY).unwrap().as_deref(),
            Some("[3,12]")
        );

        let reloaded = FavoritesSet::with_store(store.clone());
        assert_eq!(reloaded.snapshot(), BTreeSet::from([3, 12]));

        reloaded.clear_all();
        assert_eq!(store.get(FAVORITES_STORAGE_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_blob_starts_empty() {
        let store = Arc::new(MemoryBlobStore::new());
        store.set(FAVORITES_STORAGE_KEY, "{not json").unwrap();

        let favorites = FavoritesSet::with_store(store);
        assert_eq!(favorites.count(), 0);
    }
}
