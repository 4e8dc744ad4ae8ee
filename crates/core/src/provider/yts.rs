//! YTS curated index provider.
//!
//! Queries the public `list_movies.json` endpoint by IMDb id. Transient
//! failures (connection errors, timeouts, 5xx gateway statuses) are retried
//! with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::YtsConfig;

use super::http::{build_client, get_with_retry};
use super::{format_bytes, ProviderError, ProviderResult, TorrentProvider};

/// Provider label stamped on every YTS result.
pub const YTS_PROVIDER_NAME: &str = "YTS";

/// YTS provider for a single IMDb id.
pub struct YtsProvider {
    client: Client,
    config: YtsConfig,
    imdb_id: String,
}

impl YtsProvider {
    /// Create a provider for `id` (an IMDb id, with or without `tt`).
    pub fn new(config: YtsConfig, id: &str) -> Result<Self, ProviderError> {
        let client = build_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            client,
            config,
            imdb_id: normalize_imdb_id(id),
        })
    }

    pub fn imdb_id(&self) -> &str {
        &self.imdb_id
    }

    /// Build the movie listing URL for this provider's id.
    pub fn build_search_url(&self) -> String {
        format!(
            "{}/list_movies.json?query_term={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.imdb_id)
        )
    }
}

#[async_trait]
impl TorrentProvider for YtsProvider {
    fn name(&self) -> &str {
        YTS_PROVIDER_NAME
    }

    async fn fetch(&self) -> Result<Vec<ProviderResult>, ProviderError> {
        let url = self.build_search_url();
        debug!(imdb_id = %self.imdb_id, "Searching YTS");

        let response = get_with_retry(&self.client, &url, &self.config.retry).await?;
        let body = response.text().await?;
        let results = parse_movie_list(&body)?;

        debug!(imdb_id = %self.imdb_id, results = results.len(), "YTS search complete");
        Ok(results)
    }
}

/// Prefix bare numeric ids with `tt`.
pub fn normalize_imdb_id(id: &str) -> String {
    let id = id.trim();
    if id.starts_with("tt") {
        id.to_string()
    } else {
        format!("tt{}", id)
    }
}

/// Parse a `list_movies.json` body into results.
///
/// A missing `data` object is an error. A listing without `movies` is an
/// empty result only when the API reports `movie_count == 0`. Results are
/// collected across every movie in the listing.
pub fn parse_movie_list(body: &str) -> Result<Vec<ProviderResult>, ProviderError> {
    let response: YtsResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    if let Some(status) = response.status.as_deref() {
        if status != "ok" {
            return Err(ProviderError::Api(
                response
                    .status_message
                    .unwrap_or_else(|| format!("status {}", status)),
            ));
        }
    }

    let data = response
        .data
        .ok_or_else(|| ProviderError::MalformedResponse("missing data object".to_string()))?;

    let movies = match data.movies {
        Some(movies) => movies,
        None if data.movie_count == Some(0) => {
            debug!("YTS has no movie for this id");
            return Ok(Vec::new());
        }
        None => {
            return Err(ProviderError::MalformedResponse(
                "missing data.movies".to_string(),
            ))
        }
    };

    let mut results = Vec::new();
    for movie in movies {
        let title = movie.title_long.or(movie.title).unwrap_or_default();
        let Some(torrents) = movie.torrents else {
            info!(title = %title, "No torrent for this movie, skipping");
            continue;
        };
        info!(title = %title, torrents = torrents.len(), "Found torrents on YTS");

        for torrent in torrents {
            let size = torrent
                .size
                .or_else(|| torrent.size_bytes.map(format_bytes))
                .unwrap_or_default();
            let published = torrent
                .date_uploaded_unix
                .and_then(|secs| DateTime::from_timestamp(secs, 0));

            let mut result = ProviderResult::with_type_hint(
                title.clone(),
                torrent.kind.as_deref().unwrap_or_default(),
                torrent.quality.unwrap_or_else(|| super::UNKNOWN_QUALITY.to_string()),
                torrent.seeds,
                size,
                YTS_PROVIDER_NAME,
                torrent.url,
            )
            .with_published(published);
            if let Some(peers) = torrent.peers {
                result = result.with_peers(peers);
            }
            results.push(result);
        }
    }

    Ok(results)
}

// YTS API response types
#[derive(Debug, Deserialize)]
struct YtsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    data: Option<YtsData>,
}

#[derive(Debug, Deserialize)]
struct YtsData {
    #[serde(default)]
    movie_count: Option<u64>,
    #[serde(default)]
    movies: Option<Vec<YtsMovie>>,
}

#[derive(Debug, Deserialize)]
struct YtsMovie {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    title_long: Option<String>,
    #[serde(default)]
    torrents: Option<Vec<YtsTorrent>>,
}

#[derive(Debug, Deserialize)]
struct YtsTorrent {
    url: String,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    seeds: Option<u32>,
    #[serde(default)]
    peers: Option<u32>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    size_bytes: Option<u64>,
    #[serde(default)]
    date_uploaded_unix: Option<i64>,
}
