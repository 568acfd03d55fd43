//! HTTP client for the PokeAPI-shaped catalog API

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::wire::{decode, RawCategory, RawDirectory, RawEntity};
use super::CatalogSource;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::types::{Entity, NameDirectoryEntry};

const ENTITY_PATH: &str = "pokemon";
const CATEGORY_PATH: &str = "type";

/// HTTP catalog source
///
/// # Example
///
/// ```rust,no_run
/// use pokedex_core::{CatalogConfig, CatalogSource, HttpCatalogSource};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = HttpCatalogSource::new(&CatalogConfig::default())?;
/// let pikachu = source.fetch_entity(25).await?;
/// assert_eq!(pikachu.name, "pikachu");
/// # Ok(())
/// # }
/// ```
pub struct HttpCatalogSource {
    base_url: String,
    client: Client,
}

impl HttpCatalogSource {
    /// Create a new source from the catalog config
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_body(&self, url: &str, what: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(what.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Server {
                status,
                message: body,
            });
        }

        Ok(response.text().await?)
    }

    async fn get_entity(&self, key: &str) -> Result<Entity> {
        let url = format!(
            "{}/{}/{}",
            self.base_url,
            ENTITY_PATH,
            urlencoding::encode(key)
        );
        let body = self.get_body(&url, &format!("entity '{}'", key)).await?;
        Entity::try_from(decode::<RawEntity>(&body)?)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_entity(&self, id: u32) -> Result<Entity> {
        self.get_entity(&id.to_string()).await
    }

    async fn fetch_entity_by_name(&self, name: &str) -> Result<Entity> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return Err(CatalogError::NotFound(format!("entity '{}'", name)));
        }
        self.get_entity(&key).await
    }

    async fn fetch_directory(&self, limit: u32) -> Result<Vec<NameDirectoryEntry>> {
        let url = format!("{}/{}?limit={}", self.base_url, ENTITY_PATH, limit);
        let body = self.get_body(&url, "directory").await?;
        decode::<RawDirectory>(&body)?.into_entries()
    }

    async fn fetch_category(&self, category: &str) -> Result<Vec<u32>> {
        let url = format!(
            "{}/{}/{}",
            self.base_url,
            CATEGORY_PATH,
            urlencoding::encode(category)
        );
        let body = self
            .get_body(&url, &format!("category '{}'", category))
            .await?;
        decode::<RawCategory>(&body)?.into_ids()
    }
}
