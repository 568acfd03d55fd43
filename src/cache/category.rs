//! Category index cache: category name to ascending member ids

use futures::future::try_join_all;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::Result;
use crate::notify::{Notification, Notifier};
use crate::source::CatalogSource;
use crate::types::{normalize_category, Universe};

/// Write-once cache of category memberships.
///
/// A category is written only after a successful fetch, so a failed fetch is
/// retried the next time the category is resolved.
pub struct CategoryIndexCache {
    source: Arc<dyn CatalogSource>,
    universe: Universe,
    notifier: Arc<dyn Notifier>,
    entries: RwLock<HashMap<String, Vec<u32>>>,
}

impl CategoryIndexCache {
    pub fn new(source: Arc<dyn CatalogSource>, universe: Universe, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            source,
            universe,
            notifier,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Ids belonging to ALL of `categories`, ascending.
    ///
    /// An empty set resolves to an empty list. Any fetch failure notifies and
    /// resolves to an empty list as well.
    pub async fn resolve(&self, categories: &BTreeSet<String>) -> Vec<u32> {
        match self.try_resolve(categories).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Category resolution for {:?} failed: {}", categories, e);
                self.notifier.notify(Notification::category_failed());
                Vec::new()
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but surfaces the failure.
    pub async fn try_resolve(&self, categories: &BTreeSet<String>) -> Result<Vec<u32>> {
        let keys: BTreeSet<String> = categories
            .iter()
            .map(|c| normalize_category(c))
            .filter(|c| !c.is_empty())
            .collect();

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let lists = try_join_all(keys.iter().map(|key| self.ids_for(key))).await?;

        let mut lists = lists.into_iter();
        let first = lists.next().unwrap_or_default();
        let ids = lists.fold(first, |acc, list| {
            let members: HashSet<u32> = list.into_iter().collect();
            acc.into_iter().filter(|id| members.contains(id)).collect()
        });

        debug!("Categories {:?} intersect to {} ids", keys, ids.len());
        Ok(ids)
    }

    /// Member ids of one category, fetched on first use.
    pub async fn ids_for(&self, category: &str) -> Result<Vec<u32>> {
        let key = normalize_category(category);

        if let Some(ids) = self.entries.read().await.get(&key) {
            debug!("Category cache hit: {}", key);
            return Ok(ids.clone());
        }

        let mut ids: Vec<u32> = self
            .source
            .fetch_category(&key)
            .await?
            .into_iter()
            .filter(|id| self.universe.contains(*id))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let mut entries = self.entries.write().await;
        Ok(entries.entry(key).or_insert(ids).clone())
    }

    pub async fn is_cached(&self, category: &str) -> bool {
        self.entries
            .read()
            .await
            .contains_key(&normalize_category(category))
    }

    /// Number of cached categories
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
