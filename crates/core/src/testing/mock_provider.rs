//! Mock torrent provider for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::provider::{ProviderError, ProviderResult, TorrentProvider};

/// Mock implementation of the TorrentProvider trait.
///
/// Clones share state, so a test can keep a handle after boxing a clone
/// into an aggregator:
///
/// ```rust,ignore
/// let yts = MockProvider::succeeding("YTS", vec![fixtures::result("A", 10)]);
/// aggregator.add_provider(Box::new(yts.clone())).await;
/// aggregator.run().await?;
/// assert_eq!(yts.fetch_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    /// Results returned by successful fetches.
    results: Arc<RwLock<Vec<ProviderResult>>>,
    /// If set, every fetch fails with this message.
    error: Arc<RwLock<Option<String>>>,
    fetches: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a mock provider returning no results.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_state(name, Vec::new(), None)
    }

    /// Create a mock provider returning `results`.
    pub fn succeeding(name: impl Into<String>, results: Vec<ProviderResult>) -> Self {
        Self::with_state(name, results, None)
    }

    /// Create a mock provider whose fetches fail with `message`.
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_state(name, Vec::new(), Some(message.into()))
    }

    fn with_state(
        name: impl Into<String>,
        results: Vec<ProviderResult>,
        error: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            results: Arc::new(RwLock::new(results)),
            error: Arc::new(RwLock::new(error)),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn set_results(&self, results: Vec<ProviderResult>) {
        *self.results.write().await = results;
    }

    /// Make subsequent fetches fail (`Some`) or succeed (`None`).
    pub async fn set_error(&self, message: Option<String>) {
        *self.error.write().await = message;
    }

    /// Number of fetches made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TorrentProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<ProviderResult>, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.error.read().await.clone() {
            return Err(ProviderError::Api(message));
        }
        Ok(self.results.read().await.clone())
    }
}
