//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the provider, metadata and
//! daemon traits, allowing aggregation and CLI flows to be tested without
//! real services.
//!
//! # Example
//!
//! ```rust,ignore
//! use moviefinder_core::testing::{fixtures, MockProvider};
//!
//! let yts = MockProvider::succeeding("YTS", vec![fixtures::result("Alien 1080p", 20)]);
//! let jackett = MockProvider::failing("Jackett", "connection refused");
//!
//! aggregator.configure(target, &ProviderSelection::default()).await?;
//! aggregator.add_provider(Box::new(yts.clone())).await;
//! aggregator.add_provider(Box::new(jackett)).await;
//! let outcome = aggregator.run().await?;
//! ```

mod mock_daemon;
mod mock_metadata;
mod mock_provider;

pub use mock_daemon::MockTorrentDaemon;
pub use mock_metadata::MockMetadataLookup;
pub use mock_provider::MockProvider;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::metadata::{MediaKind, TitleDetails, TitleSummary};
    use crate::provider::ProviderResult;

    /// Create a provider result with reasonable defaults.
    pub fn result(name: &str, seeds: u32) -> ProviderResult {
        ProviderResult::new(
            name,
            "1080p",
            Some(seeds),
            "1.5 GB",
            "mock",
            format!("magnet:?xt=urn:btih:{}", name.to_lowercase().replace(' ', ".")),
        )
    }

    /// Create a movie record.
    pub fn movie(title: &str, year: u32, imdb_id: &str) -> TitleDetails {
        details(title, year, imdb_id, MediaKind::Movie)
    }

    /// Create a TV series record.
    pub fn series(title: &str, year: u32, imdb_id: &str) -> TitleDetails {
        details(title, year, imdb_id, MediaKind::Tv)
    }

    fn details(title: &str, year: u32, imdb_id: &str, kind: MediaKind) -> TitleDetails {
        TitleDetails {
            summary: TitleSummary {
                tmdb_id: (year * 100 + title.len() as u32) % 100000,
                kind,
                title: title.to_string(),
                year: Some(year),
                cover_url: Some("https://image.tmdb.org/t/p/w342/poster.jpg".to_string()),
                rating: Some(7.5),
            },
            imdb_id: Some(imdb_id.to_string()),
            overview: Some(format!("A story about {}.", title.to_lowercase())),
            genres: vec!["Drama".to_string()],
            runtime_minutes: Some(120),
        }
    }

    /// A YTS `list_movies.json` body with one movie and the given torrents
    /// as `(quality, type, seeds)`.
    pub fn yts_body(title_long: &str, torrents: &[(&str, &str, u32)]) -> String {
        let torrents: Vec<serde_json::Value> = torrents
            .iter()
            .enumerate()
            .map(|(i, (quality, kind, seeds))| {
                serde_json::json!({
                    "url": format!("https://yts.example/torrent/download/{}", i),
                    "hash": format!("{:040X}", i),
                    "quality": quality,
                    "type": kind,
                    "seeds": seeds,
                    "peers": 1,
                    "size": "1.2 GB",
                    "size_bytes": 1288490189u64,
                    "date_uploaded_unix": 1_600_000_000i64,
                })
            })
            .collect();

        serde_json::json!({
            "status": "ok",
            "status_message": "Query was successful",
            "data": {
                "movie_count": 1,
                "limit": 20,
                "page_number": 1,
                "movies": [{
                    "title": title_long,
                    "title_long": title_long,
                    "torrents": torrents,
                }],
            },
        })
        .to_string()
    }

    /// A torznab feed with the given items as `(title, seeders)`.
    pub fn torznab_feed(items: &[(&str, u32)]) -> String {
        let items: String = items
            .iter()
            .enumerate()
            .map(|(i, (title, seeders))| {
                format!(
                    r#"<item>
      <title>{title}</title>
      <pubDate>Mon, 01 Jan 2024 10:00:00 +0000</pubDate>
      <size>{size}</size>
      <link>magnet:?xt=urn:btih:{i:040x}</link>
      <jackettindexer id="idx">Indexer</jackettindexer>
      <torznab:attr name="seeders" value="{seeders}" />
      <torznab:attr name="peers" value="{peers}" />
    </item>"#,
                    title = title,
                    size = 2_000_000_000u64,
                    i = i,
                    seeders = seeders,
                    peers = seeders + 1,
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:torznab="http://torznab.com/schemas/2015/feed">
  <channel>
    <title>Jackett</title>
    {}
  </channel>
</rss>"#,
            items
        )
    }
}
