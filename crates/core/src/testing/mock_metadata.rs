//! Mock metadata lookup for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::metadata::{
    MediaKind, MetadataError, MetadataLookup, TitleDetails, TitleId, TitleSummary,
};

/// Mock implementation of the MetadataLookup trait.
///
/// Title searches match case-insensitively on a substring of the stored
/// titles. ID searches accept the same forms as the TMDB client: an IMDb
/// ID (with or without `tt`) or `tmdb:<n>`.
#[derive(Debug, Clone, Default)]
pub struct MockMetadataLookup {
    titles: Arc<RwLock<Vec<TitleDetails>>>,
    /// If set, the next call fails with this message.
    next_error: Arc<RwLock<Option<String>>>,
    queries: Arc<RwLock<Vec<String>>>,
}

impl MockMetadataLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a lookup that knows `titles`.
    pub fn with_titles(titles: Vec<TitleDetails>) -> Self {
        Self {
            titles: Arc::new(RwLock::new(titles)),
            ..Self::default()
        }
    }

    pub async fn add_title(&self, title: TitleDetails) {
        self.titles.write().await.push(title);
    }

    /// Make the next call fail.
    pub async fn set_next_error(&self, message: impl Into<String>) {
        *self.next_error.write().await = Some(message.into());
    }

    /// Every title or ID queried so far.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }

    async fn record(&self, query: &str) -> Result<(), MetadataError> {
        self.queries.write().await.push(query.to_string());
        match self.next_error.write().await.take() {
            Some(message) => Err(MetadataError::ApiError {
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MetadataLookup for MockMetadataLookup {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search_by_title(
        &self,
        title: &str,
        max_results: usize,
        include_tv: bool,
    ) -> Result<Vec<TitleSummary>, MetadataError> {
        self.record(title).await?;
        let needle = title.to_lowercase();
        Ok(self
            .titles
            .read()
            .await
            .iter()
            .filter(|t| include_tv || t.summary.kind == MediaKind::Movie)
            .filter(|t| t.summary.title.to_lowercase().contains(&needle))
            .take(max_results)
            .map(|t| t.summary.clone())
            .collect())
    }

    async fn search_by_id(&self, id: &str) -> Result<Option<TitleDetails>, MetadataError> {
        self.record(id).await?;
        let Some(title_id) = TitleId::parse(id) else {
            return Ok(None);
        };
        Ok(self
            .titles
            .read()
            .await
            .iter()
            .find(|t| match &title_id {
                TitleId::Imdb(imdb_id) => t.imdb_id.as_ref() == Some(imdb_id),
                TitleId::Tmdb(tmdb_id) => t.summary.tmdb_id == *tmdb_id,
            })
            .cloned())
    }

    async fn details(&self, summary: &TitleSummary) -> Result<TitleDetails, MetadataError> {
        self.record(&summary.tmdb_id.to_string()).await?;
        self.titles
            .read()
            .await
            .iter()
            .find(|t| t.summary.tmdb_id == summary.tmdb_id && t.summary.kind == summary.kind)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(format!("{}/{}", summary.kind, summary.tmdb_id)))
    }
}
