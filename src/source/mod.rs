//! Remote catalog source abstraction.
//!
//! The caches never talk HTTP directly. They go through [`CatalogSource`],
//! which has two implementations:
//! - [`HttpCatalogSource`] for the live PokeAPI-shaped JSON API
//! - [`MockCatalogSource`] for tests and offline demos

pub mod http;
pub mod mock;
mod wire;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Entity, NameDirectoryEntry};

pub use http::HttpCatalogSource;
pub use mock::MockCatalogSource;

/// Read-only access to the remote catalog.
///
/// Every successful call returns already validated, strongly typed data.
/// Any transport failure, non-success status or malformed payload is an `Err`.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// `GET /pokemon/{id}`
    async fn fetch_entity(&self, id: u32) -> Result<Entity>;

    /// `GET /pokemon/{name}`
    async fn fetch_entity_by_name(&self, name: &str) -> Result<Entity>;

    /// `GET /pokemon?limit={limit}`: the name/id directory
    async fn fetch_directory(&self, limit: u32) -> Result<Vec<NameDirectoryEntry>>;

    /// `GET /type/{category}`: ids of every member, unfiltered and unsorted
    async fn fetch_category(&self, category: &str) -> Result<Vec<u32>>;
}
