//! Metadata lookup.
//!
//! Resolves a free-text title or an external ID into candidate title records
//! before any torrent search runs. The TMDB client is the only backend.

mod tmdb;
mod types;

pub use tmdb::{TmdbClient, TmdbConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when querying the metadata service.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// A service that turns titles or IDs into title records.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Search by free-text title, returning at most `max_results` candidates.
    async fn search_by_title(
        &self,
        title: &str,
        max_results: usize,
        include_tv: bool,
    ) -> Result<Vec<TitleSummary>, MetadataError>;

    /// Look up a single record by ID. IMDb IDs (`tt...`) and numeric
    /// service IDs are accepted. Unknown IDs yield `None`.
    async fn search_by_id(&self, id: &str) -> Result<Option<TitleDetails>, MetadataError>;

    /// Fetch the full record for a search candidate.
    async fn details(&self, summary: &TitleSummary) -> Result<TitleDetails, MetadataError>;
}
