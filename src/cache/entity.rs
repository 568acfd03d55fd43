//! Entity cache: id-keyed store of hydrated entities
//!
//! Entities are fetched lazily and never evicted. Batch lookups fan out one
//! request per missing id and join them; a failure anywhere in the batch
//! abandons the rest of the round and degrades to what is already cached.

use futures::future::try_join_all;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::NameDirectory;
use crate::error::{CatalogError, Result};
use crate::notify::{Notification, Notifier};
use crate::source::CatalogSource;
use crate::types::{Entity, Universe};

pub struct EntityCache {
    source: Arc<dyn CatalogSource>,
    directory: Arc<NameDirectory>,
    universe: Universe,
    notifier: Arc<dyn Notifier>,
    entries: RwLock<HashMap<u32, Entity>>,
}

impl EntityCache {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        directory: Arc<NameDirectory>,
        universe: Universe,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            directory,
            universe,
            notifier,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get one entity, fetching it on a miss.
    ///
    /// Fails with `OutOfUniverse` before any fetch when `id` is not managed,
    /// and surfaces fetch failures to the caller.
    pub async fn get(&self, id: u32) -> Result<Entity> {
        if !self.universe.contains(id) {
            return Err(CatalogError::OutOfUniverse(id));
        }
        if let Some(entity) = self.peek(id).await {
            debug!("Entity cache hit: {}", id);
            return Ok(entity);
        }
        self.fetch_and_admit(id).await
    }

    /// Get one entity by name.
    ///
    /// The name must be in the directory; anything else is `NotFound` even if
    /// the remote API would know it.
    pub async fn get_by_name(&self, name: &str) -> Result<Entity> {
        if let Err(e) = self.directory.load().await {
            debug!("Directory unavailable for name lookup: {}", e);
        }

        let id = self
            .directory
            .id_of(name)
            .await
            .ok_or_else(|| CatalogError::NotFound(format!("'{}' is not in the directory", name.trim())))?;

        if let Some(entity) = self.peek(id).await {
            debug!("Entity cache hit by name: {}", name);
            return Ok(entity);
        }

        let entity = self.source.fetch_entity_by_name(name).await?;
        self.admit(entity, id).await
    }

    /// Get many entities, ascending by id, each id at most once.
    ///
    /// Never fails: ids outside the universe are skipped, and if any fetch
    /// in the batch fails the notifier is told and only entities already
    /// cached (including fetches that completed first) are returned.
    pub async fn get_many(&self, ids: &[u32]) -> Vec<Entity> {
        let requested: BTreeSet<u32> = ids
            .iter()
            .copied()
            .filter(|id| {
                let managed = self.universe.contains(*id);
                if !managed {
                    debug!("Skipping id {} outside the managed universe", id);
                }
                managed
            })
            .collect();

        if requested.is_empty() {
            return Vec::new();
        }

        let missing: Vec<u32> = {
            let entries = self.entries.read().await;
            requested
                .iter()
                .copied()
                .filter(|id| !entries.contains_key(id))
                .collect()
        };

        if !missing.is_empty() {
            debug!(
                "Entity cache: {} cached, fetching {}",
                requested.len() - missing.len(),
                missing.len()
            );
            let fetches = missing.iter().map(|&id| self.fetch_and_admit(id));
            if let Err(e) = try_join_all(fetches).await {
                warn!("Entity batch of {} abandoned: {}", missing.len(), e);
                self.notifier.notify(Notification::entity_batch_failed());
            }
        }

        let entries = self.entries.read().await;
        requested
            .iter()
            .filter_map(|id| entries.get(id).cloned())
            .collect()
    }

    /// Cached entity without fetching
    pub async fn peek(&self, id: u32) -> Option<Entity> {
        self.entries.read().await.get(&id).cloned()
    }

    /// Cached entities for `ids`, in the given order, skipping misses
    pub async fn peek_many(&self, ids: &[u32]) -> Vec<Entity> {
        let entries = self.entries.read().await;
        ids.iter().filter_map(|id| entries.get(id).cloned()).collect()
    }

    /// The subset of `ids` that is cached
    pub async fn cached_ids(&self, ids: &[u32]) -> HashSet<u32> {
        let entries = self.entries.read().await;
        ids.iter().copied().filter(|id| entries.contains_key(id)).collect()
    }

    pub async fn contains(&self, id: u32) -> bool {
        self.entries.read().await.contains_key(&id)
    }

    pub async fn size(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    async fn fetch_and_admit(&self, id: u32) -> Result<Entity> {
        let entity = self.source.fetch_entity(id).await?;
        self.admit(entity, id).await
    }

    /// Validate a fetched entity and insert it.
    async fn admit(&self, entity: Entity, expected_id: u32) -> Result<Entity> {
        if !self.universe.contains(entity.id) {
            return Err(CatalogError::OutOfUniverse(entity.id));
        }
        if entity.id != expected_id {
            return Err(CatalogError::Parse(format!(
                "requested entity {} but received {}",
                expected_id, entity.id
            )));
        }

        // Overlapping batches may fetch the same id twice; the overwrite is identical.
        self.entries.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::source::mock::{sample_entity, MockCatalogSource};
    use crate::types::NameDirectoryEntry;
    use std::time::{Duration, Instant};

    struct Fixture {
        source: Arc<MockCatalogSource>,
        notifier: Arc<RecordingNotifier>,
        cache: EntityCache,
    }

    fn fixture(source: MockCatalogSource) -> Fixture {
        let source = Arc::new(source);
        let notifier = Arc::new(RecordingNotifier::new());
        let universe = Universe::new(151);
        let directory = Arc::new(NameDirectory::new(source.clone(), universe, notifier.clone()));
        let cache = EntityCache::new(source.clone(), directory, universe, notifier.clone());
        Fixture { source, notifier, cache }
    }

    #[tokio::test]
    async fn test_repeat_batches_fetch_once() {
        let f = fixture(MockCatalogSource::seeded(151));

        f.cache.get_many(&[4]).await;
        f.cache.get_many(&[4]).await;

        assert_eq!(f.source.entity_calls(4), 1);
        assert_eq!(f.cache.size().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_fetched_once_and_sorted() {
        let f = fixture(MockCatalogSource::seeded(151));

        let entities = f.cache.get_many(&[2, 1, 1]).await;

        let ids: Vec<u32> = entities.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(f.source.total_entity_calls(), 2);
    }

    #[tokio::test]
    async fn test_out_of_universe_ids_never_cached() {
        let f = fixture(MockCatalogSource::seeded(160));

        assert!(f.cache.get_many(&[152]).await.is_empty());
        assert_eq!(f.source.entity_calls(152), 0);
        assert!(!f.cache.contains(152).await);

        let err = f.cache.get(152).await.unwrap_err();
        assert!(matches!(err, CatalogError::OutOfUniverse(152)));
    }

    #[tokio::test]
    async fn test_missing_ids_are_fetched_concurrently() {
        let f = fixture(MockCatalogSource::seeded(151).with_latency(Duration::from_millis(50)));
        let ids: Vec<u32> = (1..=20).collect();

        let started = Instant::now();
        let entities = f.cache.get_many(&ids).await;
        let elapsed = started.elapsed();

        assert_eq!(entities.len(), 20);
        assert_eq!(f.source.total_entity_calls(), 20);
        // one at a time would take a full second
        assert!(elapsed < Duration::from_millis(500), "batch took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_partial_failure_notifies_and_returns_cached() {
        let f = fixture(MockCatalogSource::seeded(151));
        f.cache.get_many(&[1]).await;
        f.source.set_entity_failing(3, true);

        let entities = f.cache.get_many(&[1, 3]).await;

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, 1);
        assert_eq!(f.notifier.count(), 1);
        assert_eq!(f.notifier.received()[0].title, "Failed to load entities");
        assert!(!f.cache.contains(3).await);
    }

    #[tokio::test]
    async fn test_single_get_surfaces_failure() {
        let f = fixture(MockCatalogSource::seeded(151));
        f.source.set_entity_failing(9, true);

        assert!(f.cache.get(9).await.is_err());
        assert_eq!(f.notifier.count(), 0);

        f.source.set_entity_failing(9, false);
        assert_eq!(f.cache.get(9).await.unwrap().id, 9);
    }

    #[tokio::test]
    async fn test_get_by_name() {
        let f = fixture(MockCatalogSource::seeded(151).with_entity(sample_entity(25, "pikachu", &["electric"])));

        let entity = f.cache.get_by_name("Pikachu").await.unwrap();
        assert_eq!(entity.id, 25);
        assert!(f.cache.contains(25).await);

        // second lookup is served from the cache
        f.cache.get_by_name("pikachu").await.unwrap();
        assert_eq!(f.source.name_calls(), 1);

        let err = f.cache.get_by_name("chikorita").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_by_name_rejects_entity_outside_universe() {
        let f = fixture(
            MockCatalogSource::new()
                .with_entity(sample_entity(200, "oddball", &[]))
                .with_directory(vec![NameDirectoryEntry { id: 10, name: "oddball".into() }]),
        );

        let err = f.cache.get_by_name("oddball").await.unwrap_err();
        assert!(matches!(err, CatalogError::OutOfUniverse(200)));
        assert_eq!(f.cache.size().await, 0);
    }
}
