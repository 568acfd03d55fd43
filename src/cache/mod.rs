//! Write-once caches in front of the catalog source
//!
//! - [`NameDirectory`]: id/name index of the whole universe, fetched once
//! - [`EntityCache`]: hydrated entities, fetched lazily, never evicted
//! - [`CategoryIndexCache`]: category name to member ids, fetched once per category

mod category;
mod directory;
mod entity;

pub use category::CategoryIndexCache;
pub use directory::NameDirectory;
pub use entity::EntityCache;
