//! In-memory catalog source for tests and offline demos.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::CatalogSource;
use crate::error::{CatalogError, Result};
use crate::types::{normalize_category, Entity, EntityTrait, NameDirectoryEntry, Stat};

/// Mock catalog source.
///
/// Seeded with entities and category memberships, counts every call and can
/// be told to fail individual ids, categories or the directory.
pub struct MockCatalogSource {
    entities: BTreeMap<u32, Entity>,
    categories: HashMap<String, Vec<u32>>,
    directory: Option<Vec<NameDirectoryEntry>>,
    latency: Option<Duration>,
    directory_available: AtomicBool,
    failing_entities: Mutex<HashSet<u32>>,
    failing_categories: Mutex<HashSet<String>>,
    entity_calls: Mutex<HashMap<u32, u32>>,
    category_calls: Mutex<HashMap<String, u32>>,
    name_calls: AtomicU32,
    directory_calls: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Build a plausible entity for seeding
pub fn sample_entity(id: u32, name: &str, categories: &[&str]) -> Entity {
    Entity {
        id,
        name: name.to_string(),
        sprite_url: format!("https://img.example/artwork/{}.png", id),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        stats: vec![
            Stat { name: "hp".into(), value: 40 + id % 60 },
            Stat { name: "attack".into(), value: 50 + id % 50 },
        ],
        traits: vec![EntityTrait { name: "overgrow".into(), hidden: false }],
        height: 3 + id % 20,
        weight: 20 + id * 3,
    }
}

impl MockCatalogSource {
    /// Create an empty mock source.
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            categories: HashMap::new(),
            directory: None,
            latency: None,
            directory_available: AtomicBool::new(true),
            failing_entities: Mutex::new(HashSet::new()),
            failing_categories: Mutex::new(HashSet::new()),
            entity_calls: Mutex::new(HashMap::new()),
            category_calls: Mutex::new(HashMap::new()),
            name_calls: AtomicU32::new(0),
            directory_calls: AtomicU32::new(0),
        }
    }

    /// Create a source holding ids `1..=count`, named `mon001`, `mon002`, ...
    pub fn seeded(count: u32) -> Self {
        let mut source = Self::new();
        for id in 1..=count {
            source
                .entities
                .insert(id, sample_entity(id, &format!("mon{:03}", id), &[]));
        }
        source
    }

    /// Add or replace an entity.
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.insert(entity.id, entity);
        self
    }

    /// Set the member ids of a category.
    pub fn with_category(mut self, category: &str, ids: &[u32]) -> Self {
        self.categories
            .insert(normalize_category(category), ids.to_vec());
        self
    }

    /// Serve this directory instead of one derived from the entities.
    pub fn with_directory(mut self, entries: Vec<NameDirectoryEntry>) -> Self {
        self.directory = Some(entries);
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make fetches of `id` fail (or succeed again).
    pub fn set_entity_failing(&self, id: u32, failing: bool) {
        let mut failing_ids = lock(&self.failing_entities);
        if failing {
            failing_ids.insert(id);
        } else {
            failing_ids.remove(&id);
        }
    }

    /// Make fetches of `category` fail (or succeed again).
    pub fn set_category_failing(&self, category: &str, failing: bool) {
        let mut failing_categories = lock(&self.failing_categories);
        if failing {
            failing_categories.insert(normalize_category(category));
        } else {
            failing_categories.remove(&normalize_category(category));
        }
    }

    /// Make the directory endpoint fail (or succeed again).
    pub fn set_directory_available(&self, available: bool) {
        self.directory_available.store(available, Ordering::SeqCst);
    }

    /// Number of `fetch_entity` calls for `id`.
    pub fn entity_calls(&self, id: u32) -> u32 {
        lock(&self.entity_calls).get(&id).copied().unwrap_or(0)
    }

    /// Total number of `fetch_entity` calls.
    pub fn total_entity_calls(&self) -> u32 {
        lock(&self.entity_calls).values().sum()
    }

    /// Number of `fetch_category` calls for `category`.
    pub fn category_calls(&self, category: &str) -> u32 {
        lock(&self.category_calls)
            .get(&normalize_category(category))
            .copied()
            .unwrap_or(0)
    }

    pub fn name_calls(&self) -> u32 {
        self.name_calls.load(Ordering::SeqCst)
    }

    pub fn directory_calls(&self) -> u32 {
        self.directory_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MockCatalogSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    async fn fetch_entity(&self, id: u32) -> Result<Entity> {
        *lock(&self.entity_calls).entry(id).or_insert(0) += 1;
        self.simulate_latency().await;

        if lock(&self.failing_entities).contains(&id) {
            return Err(CatalogError::Server {
                status: 503,
                message: format!("mock failure for entity {}", id),
            });
        }

        self.entities
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("entity '{}'", id)))
    }

    async fn fetch_entity_by_name(&self, name: &str) -> Result<Entity> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        self.entities
            .values()
            .find(|e| e.has_name(name))
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("entity '{}'", name)))
    }

    async fn fetch_directory(&self, limit: u32) -> Result<Vec<NameDirectoryEntry>> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if !self.directory_available.load(Ordering::SeqCst) {
            return Err(CatalogError::Server {
                status: 503,
                message: "mock directory unavailable".into(),
            });
        }

        let entries = match &self.directory {
            Some(entries) => entries.clone(),
            None => self
                .entities
                .values()
                .map(|e| NameDirectoryEntry {
                    id: e.id,
                    name: e.name.clone(),
                })
                .collect(),
        };

        Ok(entries.into_iter().take(limit as usize).collect())
    }

    async fn fetch_category(&self, category: &str) -> Result<Vec<u32>> {
        let key = normalize_category(category);
        *lock(&self.category_calls).entry(key.clone()).or_insert(0) += 1;
        self.simulate_latency().await;

        if lock(&self.failing_categories).contains(&key) {
            return Err(CatalogError::Server {
                status: 503,
                message: format!("mock failure for category {}", key),
            });
        }

        self.categories
            .get(&key)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("category '{}'", key)))
    }
}
