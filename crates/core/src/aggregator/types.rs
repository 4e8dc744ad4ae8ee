//! Types for aggregation runs.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::metadata::{is_imdb_id, TitleDetails};
use crate::provider::ProviderResult;

/// Errors raised while configuring or starting a run.
///
/// Provider failures during a run are not errors at this level; they are
/// collected into [`RunOutcome::errors`].
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// Meta-search was requested without an API key.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// A provider could not be constructed.
    #[error("Failed to set up {provider}: {message}")]
    ProviderSetup { provider: String, message: String },

    /// `run` was called before any `configure`.
    #[error("No search target configured")]
    NoTarget,
}

/// The title being searched for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchTarget {
    /// Store key for the run (IMDb ID when known, else the TMDB ID).
    pub id: String,
    /// Free-text query for the meta-search proxy.
    pub title: String,
    /// IMDb ID for the curated index. Without one the curated index is
    /// not queried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
}

impl SearchTarget {
    /// Build a target; `id` doubles as the IMDb ID when it is one.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        let imdb_id = is_imdb_id(&id).then(|| id.clone());
        Self {
            id,
            title: title.into(),
            imdb_id,
        }
    }
}

impl From<&TitleDetails> for SearchTarget {
    fn from(details: &TitleDetails) -> Self {
        Self {
            id: details.search_id(),
            title: details.title().to_string(),
            imdb_id: details.imdb_id.clone().filter(|id| is_imdb_id(id)),
        }
    }
}

/// Which providers a run uses, and the meta-search credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSelection {
    pub curated_index: bool,
    pub meta_search: bool,
    pub meta_search_api_key: Option<String>,
    /// Overrides the configured Jackett URL when set.
    pub meta_search_host: Option<String>,
}

impl ProviderSelection {
    /// Only the curated index.
    pub fn curated_only() -> Self {
        Self {
            curated_index: true,
            ..Self::default()
        }
    }

    /// Selection from configuration. `all` (or `search.all_providers`)
    /// enables the meta-search proxy alongside the curated index.
    pub fn from_config(config: &Config, all: bool) -> Self {
        Self {
            curated_index: true,
            meta_search: all || config.search.all_providers,
            meta_search_api_key: config.jackett.api_key.clone(),
            meta_search_host: Some(config.jackett.url.clone()),
        }
    }
}

/// Merged results for one searched ID.
///
/// The same record is reused when its ID is searched again; only the
/// results are replaced.
#[derive(Debug)]
pub struct AggregationRecord {
    id: String,
    results: RwLock<Vec<ProviderResult>>,
}

impl AggregationRecord {
    pub(crate) fn new(id: impl Into<String>, results: Vec<ProviderResult>) -> Self {
        Self {
            id: id.into(),
            results: RwLock::new(results),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Snapshot of the current results.
    pub async fn results(&self) -> Vec<ProviderResult> {
        self.results.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.results.read().await.is_empty()
    }

    pub(crate) async fn replace_results(&self, results: Vec<ProviderResult>) {
        *self.results.write().await = results;
    }
}

/// A provider that failed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub message: String,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.message)
    }
}

/// Result of [`Aggregator::run`](super::Aggregator::run).
#[derive(Debug)]
pub struct RunOutcome {
    pub record: std::sync::Arc<AggregationRecord>,
    /// One entry per failed provider, in configuration order.
    pub errors: Vec<ProviderFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_from_config() {
        let mut config = Config::default();
        config.jackett.api_key = Some("k".to_string());

        let selection = ProviderSelection::from_config(&config, false);
        assert!(selection.curated_index);
        assert!(!selection.meta_search);

        let selection = ProviderSelection::from_config(&config, true);
        assert!(selection.meta_search);
        assert_eq!(selection.meta_search_api_key.as_deref(), Some("k"));
        assert_eq!(
            selection.meta_search_host.as_deref(),
            Some("http://localhost:9117")
        );

        config.search.all_providers = true;
        assert!(ProviderSelection::from_config(&config, false).meta_search);
    }

    #[test]
    fn test_target_imdb_id_only_for_imdb_ids() {
        let target = SearchTarget::new("tt0083658", "Blade Runner");
        assert_eq!(target.imdb_id.as_deref(), Some("tt0083658"));

        let target = SearchTarget::new("78", "Blade Runner");
        assert_eq!(target.id, "78");
        assert!(target.imdb_id.is_none());
    }

    #[test]
    fn test_target_from_details() {
        let mut details = crate::testing::fixtures::movie("Blade Runner", 1982, "tt0083658");
        let target = SearchTarget::from(&details);
        assert_eq!(target.id, "tt0083658");
        assert_eq!(target.imdb_id.as_deref(), Some("tt0083658"));

        details.imdb_id = None;
        let target = SearchTarget::from(&details);
        assert_eq!(target.id, details.summary.tmdb_id.to_string());
        assert_eq!(target.title, "Blade Runner");
        assert!(target.imdb_id.is_none());
    }

    #[test]
    fn test_curated_only() {
        let selection = ProviderSelection::curated_only();
        assert!(selection.curated_index);
        assert!(!selection.meta_search);
        assert!(selection.meta_search_api_key.is_none());
    }

    #[test]
    fn test_failure_display() {
        let failure = ProviderFailure {
            provider: "YTS".to_string(),
            message: "Request timeout".to_string(),
        };
        assert_eq!(failure.to_string(), "YTS: Request timeout");
    }

    #[tokio::test]
    async fn test_record_replace() {
        let record = AggregationRecord::new("tt1", Vec::new());
        assert!(record.is_empty().await);
        record
            .replace_results(vec![ProviderResult::new("a", "720p", Some(1), "1 GB", "YTS", "u")])
            .await;
        assert_eq!(record.len().await, 1);
        assert_eq!(record.id(), "tt1");
    }
}
