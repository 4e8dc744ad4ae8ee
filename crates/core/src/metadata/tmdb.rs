//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{year_from_date, MediaKind, TitleDetails, TitleId, TitleSummary};
use super::{MetadataError, MetadataLookup};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const POSTER_SIZE: &str = "w342";

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    image_base_url: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, MetadataError> {
        if config.api_key.is_empty() {
            return Err(MetadataError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let image_base_url = config
            .image_base_url
            .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            image_base_url,
        })
    }

    /// Search movies, or movies and TV series together when `include_tv`.
    pub async fn search(
        &self,
        query: &str,
        include_tv: bool,
    ) -> Result<Vec<TitleSummary>, MetadataError> {
        let endpoint = if include_tv { "search/multi" } else { "search/movie" };
        debug!(query = %query, include_tv = include_tv, "TMDB search");

        let response: SearchResponse = self
            .get_json(endpoint, &[("query", query), ("include_adult", "false")])
            .await?;

        Ok(response
            .results
            .into_iter()
            .filter_map(|r| {
                let kind = match r.media_type.as_deref() {
                    None | Some("movie") => MediaKind::Movie,
                    Some("tv") => MediaKind::Tv,
                    // People and collections show up in multi search
                    Some(_) => return None,
                };
                Some(self.summary(r, kind))
            })
            .collect())
    }

    /// Resolve an IMDb ID through the `find` endpoint.
    pub async fn find_by_imdb_id(
        &self,
        imdb_id: &str,
    ) -> Result<Option<TitleSummary>, MetadataError> {
        debug!(imdb_id = %imdb_id, "TMDB find");

        let response: FindResponse = self
            .get_json(
                &format!("find/{}", imdb_id),
                &[("external_source", "imdb_id")],
            )
            .await?;

        let movie = response
            .movie_results
            .into_iter()
            .next()
            .map(|r| self.summary(r, MediaKind::Movie));
        let found = match movie {
            Some(m) => Some(m),
            None => response
                .tv_results
                .into_iter()
                .next()
                .map(|r| self.summary(r, MediaKind::Tv)),
        };
        Ok(found)
    }

    /// Fetch a movie or series with its external IDs.
    pub async fn get_details(
        &self,
        tmdb_id: u32,
        kind: MediaKind,
    ) -> Result<TitleDetails, MetadataError> {
        debug!(tmdb_id = tmdb_id, kind = %kind, "TMDB get details");

        let endpoint = format!("{}/{}", kind, tmdb_id);
        let details: DetailsResponse = self
            .get_json(&endpoint, &[("append_to_response", "external_ids")])
            .await?;

        Ok(self.details_from(details, kind))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MetadataError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(MetadataError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == 404 {
            return Err(MetadataError::NotFound(endpoint.to_string()));
        }
        if status == 429 {
            return Err(MetadataError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            MetadataError::ParseError(format!("Failed to parse {} response: {}", endpoint, e))
        })
    }

    fn cover_url(&self, poster_path: Option<String>) -> Option<String> {
        poster_path.map(|p| format!("{}/{}{}", self.image_base_url, POSTER_SIZE, p))
    }

    fn summary(&self, r: SearchResult, kind: MediaKind) -> TitleSummary {
        let date = r.release_date.or(r.first_air_date);
        TitleSummary {
            tmdb_id: r.id,
            kind,
            title: r.title.or(r.name).unwrap_or_default(),
            year: year_from_date(date.as_deref()),
            cover_url: self.cover_url(r.poster_path),
            rating: r.vote_average,
        }
    }

    fn details_from(&self, d: DetailsResponse, kind: MediaKind) -> TitleDetails {
        let date = d.release_date.or(d.first_air_date);
        let imdb_id = d
            .imdb_id
            .or_else(|| d.external_ids.and_then(|ids| ids.imdb_id))
            .filter(|id| !id.is_empty());
        let runtime_minutes = d
            .runtime
            .or_else(|| d.episode_run_time.first().copied());

        TitleDetails {
            summary: TitleSummary {
                tmdb_id: d.id,
                kind,
                title: d.title.or(d.name).unwrap_or_default(),
                year: year_from_date(date.as_deref()),
                cover_url: self.cover_url(d.poster_path),
                rating: d.vote_average,
            },
            imdb_id,
            overview: d.overview.filter(|o| !o.is_empty()),
            genres: d.genres.into_iter().map(|g| g.name).collect(),
            runtime_minutes,
        }
    }
}

#[async_trait]
impl MetadataLookup for TmdbClient {
    fn name(&self) -> &str {
        "TMDB"
    }

    async fn search_by_title(
        &self,
        title: &str,
        max_results: usize,
        include_tv: bool,
    ) -> Result<Vec<TitleSummary>, MetadataError> {
        let mut results = self.search(title, include_tv).await?;
        results.truncate(max_results);
        Ok(results)
    }

    async fn search_by_id(&self, id: &str) -> Result<Option<TitleDetails>, MetadataError> {
        let (tmdb_id, kind) = match TitleId::parse(id) {
            Some(TitleId::Imdb(imdb_id)) => match self.find_by_imdb_id(&imdb_id).await? {
                Some(summary) => (summary.tmdb_id, summary.kind),
                None => return Ok(None),
            },
            Some(TitleId::Tmdb(tmdb_id)) => (tmdb_id, MediaKind::Movie),
            None => {
                debug!(id = %id, "Unrecognized title ID");
                return Ok(None);
            }
        };

        match self.get_details(tmdb_id, kind).await {
            Ok(details) => Ok(Some(details)),
            Err(MetadataError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn details(&self, summary: &TitleSummary) -> Result<TitleDetails, MetadataError> {
        self.get_details(summary.tmdb_id, summary.kind).await
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<SearchResult>,
    #[serde(default)]
    tv_results: Vec<SearchResult>,
}

/// Movie and TV results share one shape; movies use `title`/`release_date`,
/// series use `name`/`first_air_date`.
#[derive(Debug, Deserialize)]
struct SearchResult {
    id: u32,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    vote_average: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    id: u32,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    vote_average: Option<f32>,
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    episode_run_time: Vec<u32>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    external_ids: Option<ExternalIds>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    #[serde(default)]
    imdb_id: Option<String>,
}
