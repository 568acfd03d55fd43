//! Name directory: the id/name index of the managed universe

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::notify::{Notification, Notifier};
use crate::source::CatalogSource;
use crate::types::{NameDirectoryEntry, Universe};

/// Id/name index for the whole universe.
///
/// Populated by the first successful [`NameDirectory::load`] and immutable
/// afterwards, even when that load yielded no entries. A failed load leaves
/// the directory unloaded so the next call retries.
pub struct NameDirectory {
    source: Arc<dyn CatalogSource>,
    universe: Universe,
    notifier: Arc<dyn Notifier>,
    entries: RwLock<Vec<NameDirectoryEntry>>,
    loaded: AtomicBool,
    /// Serializes loads so concurrent callers share one fetch
    load_guard: Mutex<()>,
}

impl NameDirectory {
    pub fn new(source: Arc<dyn CatalogSource>, universe: Universe, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            source,
            universe,
            notifier,
            entries: RwLock::new(Vec::new()),
            loaded: AtomicBool::new(false),
            load_guard: Mutex::new(()),
        }
    }

    /// Fetch the directory unless it is already populated.
    ///
    /// Failures are reported to the notifier and returned; the directory
    /// stays empty.
    pub async fn load(&self) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }

        let _guard = self.load_guard.lock().await;
        if self.is_loaded() {
            return Ok(());
        }

        let fetched = match self.source.fetch_directory(self.universe.size()).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to load name directory: {}", e);
                self.notifier.notify(Notification::directory_failed());
                return Err(e);
            }
        };

        let mut seen = HashSet::new();
        let entries: Vec<NameDirectoryEntry> = fetched
            .into_iter()
            .filter(|entry| self.universe.contains(entry.id) && seen.insert(entry.id))
            .collect();

        info!("Loaded name directory with {} entries", entries.len());
        *self.entries.write().await = entries;
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    /// Whether a fetch has succeeded
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Every id in the directory, ascending
    pub async fn all_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.entries.read().await.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        ids
    }

    /// Ids whose name starts with `text` (case-insensitive), in directory order.
    ///
    /// A blank `text` matches everything.
    pub async fn match_prefix(&self, text: &str) -> Vec<u32> {
        let prefix = text.trim().to_lowercase();
        let entries = self.entries.read().await;
        let matches: Vec<u32> = entries
            .iter()
            .filter(|e| e.name.to_lowercase().starts_with(&prefix))
            .map(|e| e.id)
            .collect();
        debug!("Prefix '{}' matched {} entries", prefix, matches.len());
        matches
    }

    /// Case-insensitive exact name match
    pub async fn contains_name(&self, name: &str) -> bool {
        self.id_of(name).await.is_some()
    }

    /// Resolve a name to its id (case-insensitive)
    pub async fn id_of(&self, name: &str) -> Option<u32> {
        let name = name.trim();
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .map(|e| e.id)
    }

    /// Resolve an id to its name
    pub async fn name_of(&self, id: u32) -> Option<String> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.name.clone())
    }
}
