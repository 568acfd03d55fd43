//! Catalog configuration
//!
//! Defaults target the public PokeAPI and the Generation 1 universe.
//! Every field can be overridden from the environment.

/// Default catalog API base URL
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Number of entities in the managed universe (Generation 1)
pub const GEN_1_LIMIT: u32 = 151;

/// Number of entities materialized per "load more"
pub const PAGE_SIZE: usize = 20;

/// Catalog configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL for the catalog HTTP API
    pub base_url: String,
    /// Size of the fixed universe (ids `1..=universe_size`)
    pub universe_size: u32,
    /// Entities per page
    pub page_size: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            universe_size: GEN_1_LIMIT,
            page_size: PAGE_SIZE,
            timeout_secs: 30,
        }
    }
}

impl CatalogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("POKEDEX_BASE_URL") {
            if !val.trim().is_empty() {
                config.base_url = val.trim().trim_end_matches('/').to_string();
            }
        }

        if let Ok(val) = std::env::var("POKEDEX_UNIVERSE_SIZE") {
            if let Ok(size) = val.parse::<u32>() {
                config.universe_size = size;
            }
        }

        if let Ok(val) = std::env::var("POKEDEX_PAGE_SIZE") {
            if let Ok(size) = val.parse::<usize>() {
                if size > 0 {
                    config.page_size = size;
                }
            }
        }

        if let Ok(val) = std::env::var("POKEDEX_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.timeout_secs = secs;
            }
        }

        config
    }

    /// Point the config at a different API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the page size (values below 1 are clamped to 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}
