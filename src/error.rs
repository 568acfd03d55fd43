//! Error types for the catalog core

use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Catalog error types
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Name is not in the directory, or the API answered 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// Entity resolved but lies outside the managed universe
    #[error("Entity {0} is not in the managed universe")]
    OutOfUniverse(u32),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Payload could not be decoded into the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Favorites blob store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    /// Whether the failure came from the transport or the remote server
    /// rather than from validation of a well-formed response.
    pub fn is_network(&self) -> bool {
        matches!(self, CatalogError::Http(_) | CatalogError::Server { .. })
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Storage(err.to_string())
    }
}
