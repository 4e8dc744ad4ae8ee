//! Types shared by all torrent providers.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::release;

/// Placeholder quality used when a provider reports none.
pub const UNKNOWN_QUALITY: &str = "?";

/// Release type of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReleaseType {
    /// Catalog tags found in the release name, in catalog order.
    Tags(Vec<String>),
    /// No tag matched; the provider's quality label is used instead.
    Quality(String),
}

impl ReleaseType {
    /// Classify `text`, falling back to `quality` when no tag matches.
    pub fn classify(text: &str, quality: &str) -> Self {
        let tags = release::classify(text);
        if tags.is_empty() {
            ReleaseType::Quality(quality.to_string())
        } else {
            ReleaseType::Tags(tags.into_iter().map(String::from).collect())
        }
    }

    /// Whether the given catalog tag was matched.
    pub fn has_tag(&self, tag: &str) -> bool {
        match self {
            ReleaseType::Tags(tags) => tags.iter().any(|t| t == tag),
            ReleaseType::Quality(_) => false,
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseType::Tags(tags) => write!(f, "[{}]", tags.join(", ")),
            ReleaseType::Quality(quality) => f.write_str(quality),
        }
    }
}

/// A torrent found by a provider, normalized across backends.
///
/// `name`, `release_type` and `description` are fixed at construction:
/// the description is always `name + " " + release_type` and there is no
/// way to change any of them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderResult {
    name: String,
    quality: String,
    release_type: ReleaseType,
    seeds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    peers: Option<u32>,
    size: String,
    provider: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    published: Option<DateTime<Utc>>,
    description: String,
}

impl ProviderResult {
    /// Build a result, classifying `name` to derive its release type.
    pub fn new(
        name: impl Into<String>,
        quality: impl Into<String>,
        seeds: Option<u32>,
        size: impl Into<String>,
        provider: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let quality = quality.into();
        let release_type = ReleaseType::classify(&name, &quality);
        Self::assemble(
            name,
            quality,
            release_type,
            seeds,
            size.into(),
            provider.into(),
            url.into(),
        )
    }

    /// Build a result whose release type is classified from `name` plus an
    /// extra hint (e.g. a source medium reported separately by the provider).
    pub fn with_type_hint(
        name: impl Into<String>,
        type_hint: &str,
        quality: impl Into<String>,
        seeds: Option<u32>,
        size: impl Into<String>,
        provider: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let quality = quality.into();
        let release_type = ReleaseType::classify(&format!("{} {}", name, type_hint), &quality);
        Self::assemble(
            name,
            quality,
            release_type,
            seeds,
            size.into(),
            provider.into(),
            url.into(),
        )
    }

    fn assemble(
        name: String,
        quality: String,
        release_type: ReleaseType,
        seeds: Option<u32>,
        size: String,
        provider: String,
        url: String,
    ) -> Self {
        let description = format!("{} {}", name, release_type);
        Self {
            name,
            quality,
            release_type,
            seeds,
            peers: None,
            size,
            provider,
            url,
            published: None,
            description,
        }
    }

    /// Replace the quality label with the derived release type.
    ///
    /// Used by providers that report no quality of their own.
    pub fn with_inferred_quality(mut self) -> Self {
        self.quality = self.release_type.to_string();
        self
    }

    /// Attach a peer count.
    pub fn with_peers(mut self, peers: u32) -> Self {
        self.peers = Some(peers);
        self
    }

    /// Attach a publish timestamp.
    pub fn with_published(mut self, published: Option<DateTime<Utc>>) -> Self {
        self.published = published;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quality(&self) -> &str {
        &self.quality
    }

    pub fn release_type(&self) -> &ReleaseType {
        &self.release_type
    }

    pub fn seeds(&self) -> Option<u32> {
        self.seeds
    }

    pub fn peers(&self) -> Option<u32> {
        self.peers
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Magnet or direct link handed to the download daemon.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.published
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether this looks like a camcorder capture.
    pub fn is_cam(&self) -> bool {
        release::is_cam(&self.release_type.to_string()) || release::is_cam(&self.quality)
    }
}

/// Errors a provider can report for a single fetch.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider API error: {0}")]
    Api(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_connect() {
            ProviderError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            ProviderError::MalformedResponse(e.to_string())
        } else if e.is_request() || e.is_body() {
            ProviderError::ConnectionFailed(e.to_string())
        } else if let Some(status) = e.status() {
            ProviderError::HttpStatus {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            // Builder and redirect errors fail the same way on every attempt.
            ProviderError::InvalidRequest(e.to_string())
        }
    }
}

/// A torrent search backend queried for one target.
///
/// Implementations own their per-run configuration (target id, title,
/// credentials) and report either the full result list or a single error.
#[async_trait]
pub trait TorrentProvider: Send + Sync {
    /// Provider name for logging and error reporting.
    fn name(&self) -> &str;

    /// Query the backend and return normalized results.
    async fn fetch(&self) -> Result<Vec<ProviderResult>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_error_is_not_transient() {
        let e = reqwest::Client::new().get("not a url").build().unwrap_err();
        assert!(e.is_builder());

        let err = ProviderError::from(e);
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_description_uses_tags() {
        let r = ProviderResult::new(
            "Arrival.2016.1080p.BluRay",
            "1080p",
            Some(10),
            "2.1 GB",
            "YTS",
            "magnet:?xt=urn:btih:abc",
        );
        assert_eq!(
            r.release_type(),
            &ReleaseType::Tags(vec!["bluray".to_string(), "1080p".to_string()])
        );
        assert_eq!(r.description(), "Arrival.2016.1080p.BluRay [bluray, 1080p]");
        assert_eq!(
            r.description(),
            format!("{} {}", r.name(), r.release_type())
        );
    }

    #[test]
    fn test_description_falls_back_to_quality() {
        let r = ProviderResult::new("Arrival (2016)", "720p", Some(3), "1 GB", "YTS", "url");
        assert_eq!(r.release_type(), &ReleaseType::Quality("720p".to_string()));
        assert_eq!(r.description(), "Arrival (2016) 720p");
    }

    #[test]
    fn test_builders_keep_description() {
        let r = ProviderResult::new("Movie 2160p", UNKNOWN_QUALITY, Some(1), "1 GB", "x", "u");
        let before = r.description().to_string();
        let r = r.with_peers(4).with_published(None).with_inferred_quality();
        assert_eq!(r.description(), before);
        assert_eq!(r.quality(), "[2160p]");
        assert_eq!(r.peers(), Some(4));
    }

    #[test]
    fn test_type_hint_feeds_classifier() {
        let r = ProviderResult::with_type_hint(
            "Arrival (2016)",
            "bluray",
            "1080p",
            Some(5),
            "2 GB",
            "YTS",
            "url",
        );
        assert_eq!(r.release_type(), &ReleaseType::Tags(vec!["bluray".to_string()]));
        assert_eq!(r.name(), "Arrival (2016)");
        assert_eq!(r.description(), "Arrival (2016) [bluray]");
    }

    #[test]
    fn test_is_cam() {
        let cam = ProviderResult::new("Movie HDCAM", UNKNOWN_QUALITY, Some(9), "", "x", "u");
        assert!(cam.is_cam());
        assert!(cam.release_type().has_tag("cam"));
        let web = ProviderResult::new("Movie WEBRip", UNKNOWN_QUALITY, Some(9), "", "x", "u");
        assert!(!web.is_cam());
    }

    #[test]
    fn test_serialize_skips_missing_extras() {
        let r = ProviderResult::new("Movie", "720p", None, "1 GB", "YTS", "url");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["release_type"], "720p");
        assert!(json["seeds"].is_null());
        assert!(json.get("peers").is_none());
        assert!(json.get("published").is_none());
    }

    #[test]
    fn test_transient_errors() {
        assert!(ProviderError::Timeout.is_transient());
        assert!(!ProviderError::MalformedResponse("x".into()).is_transient());
        assert!(!ProviderError::InvalidRequest("x".into()).is_transient());
    }
}
