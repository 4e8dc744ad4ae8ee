//! Torrent providers.
//!
//! This module provides a `TorrentProvider` trait implemented by each search
//! backend (the YTS curated index and the Jackett meta-search proxy), plus the
//! normalized `ProviderResult` they all map into.

mod http;
mod torznab;
mod types;
mod yts;

pub use http::{backoff_delay, build_client, USER_AGENT};
pub use torznab::{
    build_url, extract_uploader, parse_feed, JackettProvider, JACKETT_PROVIDER_NAME, TORZNAB_NS,
};
pub use types::*;
pub use yts::{normalize_imdb_id, parse_movie_list, YtsProvider, YTS_PROVIDER_NAME};

use humansize::{format_size, FormatSizeOptions, DECIMAL};

/// Drop results known to have no seeders and sort by seeders, descending.
///
/// Results without a seed count are kept and sorted last.
pub fn rank_by_seeds(results: Vec<ProviderResult>) -> Vec<ProviderResult> {
    let mut kept: Vec<ProviderResult> = results
        .into_iter()
        .filter(|r| r.seeds() != Some(0))
        .collect();
    kept.sort_by(|a, b| b.seeds().cmp(&a.seeds()));
    kept
}

/// Format a byte count the way release listings do (`1.5 GB`).
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, FormatSizeOptions::from(DECIMAL).decimal_places(1))
}

/// Humanize a raw size if it is a byte count, otherwise return it unchanged.
pub fn humanize_size(raw: &str) -> String {
    match raw.trim().parse::<u64>() {
        Ok(bytes) => format_bytes(bytes),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, seeds: Option<u32>) -> ProviderResult {
        ProviderResult::new(name, "1080p", seeds, "1 GB", "test", "magnet:?")
    }

    #[test]
    fn test_rank_filters_zero_and_sorts() {
        let ranked = rank_by_seeds(vec![
            result("a", Some(0)),
            result("b", Some(5)),
            result("c", Some(0)),
            result("d", Some(12)),
        ]);
        let seeds: Vec<_> = ranked.iter().map(|r| r.seeds()).collect();
        assert_eq!(seeds, vec![Some(12), Some(5)]);
    }

    #[test]
    fn test_rank_keeps_unknown_seeds_last() {
        let ranked = rank_by_seeds(vec![result("a", None), result("b", Some(1))]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name(), "b");
        assert_eq!(ranked[1].seeds(), None);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank_by_seeds(Vec::new()).is_empty());
    }

    #[test]
    fn test_humanize_size_bytes() {
        let size = humanize_size("1500000000");
        assert!(size.starts_with("1.5"), "got {}", size);
        assert!(size.ends_with("GB"), "got {}", size);
    }

    #[test]
    fn test_humanize_size_passthrough() {
        assert_eq!(humanize_size("1.4 GB"), "1.4 GB");
        assert_eq!(humanize_size(""), "");
    }
}
