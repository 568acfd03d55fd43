//! Pokedex Core - catalog caching, filtering and pagination
//!
//! Client-side engine over a fixed catalog of 151 entities served by a
//! PokeAPI-shaped JSON API.
//!
//! # Architecture
//!
//! ```text
//! ViewEngine ──► EntityCache ─────────┐
//!     │      ──► CategoryIndexCache ──┼──► CatalogSource (HTTP / mock)
//!     │      ──► NameDirectory ───────┘
//!     └──watch── FavoritesSet ──► BlobStore
//! ```
//!
//! - Caches are write-once: nothing is ever evicted or refreshed.
//! - The view shows a prefix of the filtered ordering and grows it one page
//!   at a time.
//! - Background failures go to a [`Notifier`]; the view degrades instead of
//!   failing.
//!
//! # Example
//!
//! ```rust,ignore
//! use pokedex_core::{CatalogConfig, FavoritesSet, MockCatalogSource, TracingNotifier, ViewEngine};
//! use std::sync::Arc;
//!
//! let engine = ViewEngine::new(
//!     &CatalogConfig::default(),
//!     Arc::new(MockCatalogSource::seeded(151)),
//!     Arc::new(FavoritesSet::new()),
//!     Arc::new(TracingNotifier),
//! );
//! engine.initialize().await;
//! engine.set_search_filter("mon01").await;
//! ```

// Error types
pub mod error;

// Environment-driven configuration
pub mod config;

// Entities, directory rows and filter criteria
pub mod types;

// Remote catalog access (HTTP and mock)
pub mod source;

// Non-fatal failure notifications
pub mod notify;

// Write-once caches
pub mod cache;

// Favorites set and its persistence
pub mod favorites;

// Filtered, paginated view
pub mod view;

// Re-export error types
pub use error::{CatalogError, Result};

// Re-export configuration
pub use config::CatalogConfig;

// Re-export core types
pub use types::{
    is_known_category, normalize_category, Entity, EntityTrait, FilterCriteria,
    NameDirectoryEntry, Stat, Universe, KNOWN_CATEGORIES,
};

// Re-export sources
pub use source::mock::sample_entity;
pub use source::{CatalogSource, HttpCatalogSource, MockCatalogSource};

// Re-export notification types
pub use notify::{Notification, Notifier, RecordingNotifier, TracingNotifier};

// Re-export caches
pub use cache::{CategoryIndexCache, EntityCache, NameDirectory};

// Re-export favorites
pub use favorites::{BlobStore, FavoritesSet, FileBlobStore, MemoryBlobStore, FAVORITES_STORAGE_KEY};

// Re-export view types
pub use view::{filtered_ids, FilterInputs, LoadingState, ViewEngine};
