//! View engine: a filtered, incrementally paginated window over the catalog
//!
//! The engine owns the filter criteria and the display window. The window is
//! always a prefix of the current filtered ordering and grows one page at a
//! time through [`ViewEngine::load_more`]. Every filter change resets it and
//! immediately loads the first page of the new ordering.
//!
//! ## Filter generations
//!
//! Each filter change bumps a generation counter. A page fetch remembers the
//! generation it was issued under, and its result is dropped on arrival if
//! the filters have moved on since.
//!
//! ## Favorites
//!
//! The engine subscribes to the [`FavoritesSet`]. Changes are reconciled at
//! the start of every engine call: with the favorites-only filter on, the
//! window is re-filtered locally and never triggers a fetch.

mod filter;

pub use filter::{filtered_ids, FilterInputs};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{watch, RwLock, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CategoryIndexCache, EntityCache, NameDirectory};
use crate::config::CatalogConfig;
use crate::error::Result;
use crate::favorites::FavoritesSet;
use crate::notify::Notifier;
use crate::source::CatalogSource;
use crate::types::{normalize_category, Entity, FilterCriteria, Universe};

/// Initialization progress of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    Idle,
    Initializing,
    Ready,
}

struct ViewState {
    criteria: FilterCriteria,
    /// The universe as listed by the directory, ascending
    all_ids: Vec<u32>,
    search_matches: Option<Vec<u32>>,
    category_matches: Option<Vec<u32>>,
    window: Vec<u32>,
    has_more: bool,
    loading_state: LoadingState,
    loading_more: bool,
    error: Option<String>,
    generation: u64,
    favorites_rx: watch::Receiver<BTreeSet<u32>>,
}

impl ViewState {
    fn filtered_ids(&self) -> Vec<u32> {
        let favorites = self.favorites_rx.borrow();
        filtered_ids(FilterInputs {
            all_ids: &self.all_ids,
            favorites: self.criteria.favorites_only.then_some(&*favorites),
            search_matches: self.search_matches.as_deref(),
            category_matches: self.category_matches.as_deref(),
        })
    }

    fn reset_window(&mut self) {
        self.generation += 1;
        self.window.clear();
        self.loading_more = false;
        self.error = None;
        self.has_more = !self.filtered_ids().is_empty();
    }
}

/// The catalog view service.
///
/// Construct once and share by `Arc`; all state sits behind the engine's
/// own methods.
///
/// # Example
///
/// ```rust,no_run
/// use pokedex_core::{
///     CatalogConfig, FavoritesSet, HttpCatalogSource, TracingNotifier, ViewEngine,
/// };
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CatalogConfig::default();
/// let engine = ViewEngine::new(
///     &config,
///     Arc::new(HttpCatalogSource::new(&config)?),
///     Arc::new(FavoritesSet::new()),
///     Arc::new(TracingNotifier),
/// );
///
/// engine.initialize().await;
/// engine.set_category_filter(["fire", "flying"]).await;
/// for entity in engine.entities().await {
///     println!("#{:03} {}", entity.id, entity.name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ViewEngine {
    universe: Universe,
    page_size: usize,
    directory: Arc<NameDirectory>,
    entities: Arc<EntityCache>,
    categories: Arc<CategoryIndexCache>,
    favorites: Arc<FavoritesSet>,
    state: RwLock<ViewState>,
}

impl ViewEngine {
    /// Create an engine and its caches over `source`.
    pub fn new(
        config: &CatalogConfig,
        source: Arc<dyn CatalogSource>,
        favorites: Arc<FavoritesSet>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let universe = Universe::new(config.universe_size);
        let directory = Arc::new(NameDirectory::new(
            source.clone(),
            universe,
            notifier.clone(),
        ));
        let entities = Arc::new(EntityCache::new(
            source.clone(),
            directory.clone(),
            universe,
            notifier.clone(),
        ));
        let categories = Arc::new(CategoryIndexCache::new(source, universe, notifier));

        let state = ViewState {
            criteria: FilterCriteria::default(),
            all_ids: Vec::new(),
            search_matches: None,
            category_matches: None,
            window: Vec::new(),
            has_more: true,
            loading_state: LoadingState::Idle,
            loading_more: false,
            error: None,
            generation: 0,
            favorites_rx: favorites.subscribe(),
        };

        Self {
            universe,
            page_size: config.page_size.max(1),
            directory,
            entities,
            categories,
            favorites,
            state: RwLock::new(state),
        }
    }

    // === Lifecycle ===

    /// Load the directory (once), reset pagination and load the first page.
    ///
    /// If the directory cannot be loaded the view falls back to every id of
    /// the universe so it is never left permanently empty.
    pub async fn initialize(&self) {
        let prefix = {
            let mut state = self.state.write().await;
            state.loading_state = LoadingState::Initializing;
            state.error = None;
            state.criteria.search_prefix.trim().to_string()
        };

        if let Err(e) = self.directory.load().await {
            warn!(
                "Directory unavailable, falling back to ids 1..={}: {}",
                self.universe.size(),
                e
            );
        }

        let mut all_ids = self.directory.all_ids().await;
        if all_ids.is_empty() {
            all_ids = self.universe.ids();
        }

        let search_matches = if prefix.is_empty() {
            None
        } else {
            Some(self.directory.match_prefix(&prefix).await)
        };

        {
            let mut state = self.lock_state().await;
            state.all_ids = all_ids;
            state.search_matches = search_matches;
            state.reset_window();
        }

        let first_page = self.load_more().await;

        let mut state = self.state.write().await;
        state.loading_state = LoadingState::Ready;
        info!(
            "View initialized: {} ids, first page of {}",
            state.all_ids.len(),
            first_page.len()
        );
    }

    /// Append the next page of the filtered ordering to the window.
    ///
    /// No-op while a page is in flight, when nothing is left, or while an
    /// error is set. Returns the entities appended.
    pub async fn load_more(&self) -> Vec<Entity> {
        let (generation, batch) = {
            let mut state = self.lock_state().await;
            if !state.has_more || state.loading_more || state.error.is_some() {
                return Vec::new();
            }

            let batch: Vec<u32> = state
                .filtered_ids()
                .into_iter()
                .skip(state.window.len())
                .take(self.page_size)
                .collect();

            if batch.is_empty() {
                state.has_more = false;
                return Vec::new();
            }

            state.loading_more = true;
            (state.generation, batch)
        };

        debug!("Loading page of {} ids (generation {})", batch.len(), generation);
        self.fetch_page(generation, batch).await
    }

    async fn fetch_page(&self, generation: u64, batch: Vec<u32>) -> Vec<Entity> {
        let fetched = self.entities.get_many(&batch).await;
        let mut state = self.lock_state().await;

        if state.generation != generation {
            debug!(
                "Discarding page from filter generation {} (now {})",
                generation, state.generation
            );
            return Vec::new();
        }
        state.loading_more = false;

        // Only the leading run of successes is appended so the window stays a
        // prefix; the first failed id heads the next page.
        let mut by_id: HashMap<u32, Entity> = fetched.into_iter().map(|e| (e.id, e)).collect();
        let page: Vec<Entity> = batch.iter().map_while(|id| by_id.remove(id)).collect();

        if page.is_empty() {
            let message = format!("Failed to load {} entities", batch.len());
            warn!("{}", message);
            state.error = Some(message);
            return Vec::new();
        }
        if page.len() < batch.len() {
            warn!(
                "Loaded {} of {} entities, the rest is retried with the next page",
                page.len(),
                batch.len()
            );
        }

        let filtered = state.filtered_ids();
        let start = state.window.len();
        let continues_window = filtered
            .get(start..start + page.len())
            .map_or(false, |next| next.iter().zip(&page).all(|(id, e)| *id == e.id));

        if !continues_window {
            debug!("Favorites changed while loading, dropping page");
            state.has_more = start < filtered.len();
            return Vec::new();
        }

        state.window.extend(page.iter().map(|e| e.id));
        state.has_more = state.window.len() < filtered.len();
        page
    }

    // === Filters ===

    /// Filter by case-insensitive name prefix. Setting the current value is a no-op.
    pub async fn set_search_filter(&self, query: &str) {
        if self.state.read().await.criteria.search_prefix == query {
            return;
        }

        let prefix = query.trim();
        let matches = if prefix.is_empty() {
            None
        } else {
            Some(self.directory.match_prefix(prefix).await)
        };

        info!("Search filter: '{}'", prefix);
        let query = query.to_string();
        self.apply_filter(move |state| {
            state.criteria.search_prefix = query;
            state.search_matches = matches;
        })
        .await;
    }

    /// Show only favorites, or everything.
    pub async fn set_favorites_only(&self, favorites_only: bool) {
        info!("Favorites-only filter: {}", favorites_only);
        self.apply_filter(move |state| {
            state.criteria.favorites_only = favorites_only;
        })
        .await;
    }

    /// Show only entities belonging to ALL of `categories`. An empty
    /// selection removes the category filter.
    pub async fn set_category_filter<I, S>(&self, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let categories: BTreeSet<String> = categories
            .into_iter()
            .map(|c| normalize_category(c.as_ref()))
            .filter(|c| !c.is_empty())
            .collect();

        let matches = if categories.is_empty() {
            None
        } else {
            Some(self.categories.resolve(&categories).await)
        };

        info!("Category filter: {:?}", categories);
        self.apply_filter(move |state| {
            state.criteria.categories = categories;
            state.category_matches = matches;
        })
        .await;
    }

    /// Drop every filter.
    pub async fn clear_all_filters(&self) {
        info!("Clearing all filters");
        self.set_criteria(FilterCriteria::default()).await;
    }

    /// Replace every filter at once, loading a single first page.
    ///
    /// Before [`initialize`](Self::initialize) this only records the
    /// criteria; the first page is then loaded by `initialize` itself.
    pub async fn set_criteria(&self, criteria: FilterCriteria) {
        let prefix = criteria.search_prefix.trim().to_string();
        let search_matches = if prefix.is_empty() {
            None
        } else {
            Some(self.directory.match_prefix(&prefix).await)
        };

        let categories: BTreeSet<String> = criteria
            .categories
            .iter()
            .map(|c| normalize_category(c))
            .filter(|c| !c.is_empty())
            .collect();
        let category_matches = if categories.is_empty() {
            None
        } else {
            Some(self.categories.resolve(&categories).await)
        };

        info!(
            "Filters: search '{}', favorites only {}, categories {:?}",
            prefix, criteria.favorites_only, categories
        );
        self.apply_filter(move |state| {
            state.criteria = FilterCriteria {
                categories,
                ..criteria
            };
            state.search_matches = search_matches;
            state.category_matches = category_matches;
        })
        .await;
    }

    async fn apply_filter<F>(&self, update: F)
    where
        F: FnOnce(&mut ViewState) + Send,
    {
        {
            let mut state = self.lock_state().await;
            update(&mut state);
            state.reset_window();
        }
        self.load_more().await;
    }

    /// Clear the sticky error so paging can resume.
    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    // === Favorites ===

    /// Reconcile the window with the current favorites.
    pub async fn sync_favorites(&self) {
        drop(self.lock_state().await);
    }

    /// Run [`sync_favorites`](Self::sync_favorites) on every favorites change.
    ///
    /// The task holds the engine alive; abort the handle to stop it.
    pub fn spawn_favorites_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut rx = self.favorites.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                engine.sync_favorites().await;
            }
        })
    }

    async fn lock_state(&self) -> RwLockWriteGuard<'_, ViewState> {
        let mut state = self.state.write().await;
        self.reconcile_favorites(&mut state).await;
        state
    }

    async fn reconcile_favorites(&self, state: &mut ViewState) {
        if !state.favorites_rx.has_changed().unwrap_or(false) {
            return;
        }
        drop(state.favorites_rx.borrow_and_update());

        if !state.criteria.favorites_only {
            return;
        }

        let filtered = state.filtered_ids();
        let shown: HashSet<u32> = state.window.iter().copied().collect();
        let before = state.window.len();

        // Rebuild the window as the prefix of the new ordering up to the last
        // id already shown, stopping at the first entity that is not cached.
        let window: Vec<u32> = match filtered.iter().rposition(|id| shown.contains(id)) {
            Some(last) => {
                let candidates = &filtered[..=last];
                let cached = self.entities.cached_ids(candidates).await;
                candidates
                    .iter()
                    .copied()
                    .take_while(|id| shown.contains(id) || cached.contains(id))
                    .collect()
            }
            None => Vec::new(),
        };

        state.window = window;
        state.has_more = state.window.len() < filtered.len();
        debug!(
            "Favorites changed: window {} -> {} ids",
            before,
            state.window.len()
        );
    }

    // === Lookups ===

    pub async fn lookup_by_id(&self, id: u32) -> Result<Entity> {
        self.entities.get(id).await
    }

    pub async fn lookup_by_name(&self, name: &str) -> Result<Entity> {
        self.entities.get_by_name(name).await
    }

    // === Read accessors ===

    /// Entities of the display window, in window order
    pub async fn entities(&self) -> Vec<Entity> {
        let window = self.window_ids().await;
        self.entities.peek_many(&window).await
    }

    pub async fn window_ids(&self) -> Vec<u32> {
        self.lock_state().await.window.clone()
    }

    /// The full filtered ordering the window is a prefix of
    pub async fn filtered_ids(&self) -> Vec<u32> {
        self.lock_state().await.filtered_ids()
    }

    pub async fn criteria(&self) -> FilterCriteria {
        self.lock_state().await.criteria.clone()
    }

    pub async fn has_more(&self) -> bool {
        self.lock_state().await.has_more
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading_state == LoadingState::Initializing
    }

    pub async fn is_loading_more(&self) -> bool {
        self.state.read().await.loading_more
    }

    pub async fn loading_state(&self) -> LoadingState {
        self.state.read().await.loading_state
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn entity_cache(&self) -> &Arc<EntityCache> {
        &self.entities
    }

    pub fn favorites(&self) -> &Arc<FavoritesSet> {
        &self.favorites
    }
}
