//! Non-interactive steps of the search flow.
//!
//! Lookup failures are logged and turned into "nothing found" so the
//! prompts in `main` only deal with present or absent values.

use moviefinder_core::{MetadataLookup, SearchTarget, TitleSummary, TorrentDaemon};
use tracing::{info, warn};

/// Search candidates by title. Errors are logged and yield no candidates.
pub async fn search_titles(
    lookup: &dyn MetadataLookup,
    title: &str,
    max_results: usize,
    include_tv: bool,
) -> Vec<TitleSummary> {
    match lookup.search_by_title(title, max_results, include_tv).await {
        Ok(results) => {
            info!(backend = lookup.name(), results = results.len(), "Metadata search complete");
            results
        }
        Err(e) => {
            warn!(backend = lookup.name(), error = %e, "Metadata search failed");
            Vec::new()
        }
    }
}

/// Resolve an ID into a search target. Errors are logged and yield `None`.
pub async fn target_by_id(lookup: &dyn MetadataLookup, id: &str) -> Option<SearchTarget> {
    match lookup.search_by_id(id).await {
        Ok(Some(details)) => Some(SearchTarget::from(&details)),
        Ok(None) => None,
        Err(e) => {
            warn!(backend = lookup.name(), id = %id, error = %e, "Metadata lookup failed");
            None
        }
    }
}

/// Turn a picked candidate into a search target.
///
/// The curated index needs an IMDb ID, which only the full record carries.
/// When the record can't be fetched, the service ID is used instead and the
/// target has no IMDb ID.
pub async fn target_for(lookup: &dyn MetadataLookup, summary: &TitleSummary) -> SearchTarget {
    match lookup.details(summary).await {
        Ok(details) => SearchTarget::from(&details),
        Err(e) => {
            warn!(tmdb_id = summary.tmdb_id, error = %e, "Failed to fetch title details");
            SearchTarget::new(summary.tmdb_id.to_string(), summary.title.clone())
        }
    }
}

/// Hand `url` to the daemon and describe the outcome.
pub async fn hand_off(daemon: &dyn TorrentDaemon, url: &str) -> anyhow::Result<String> {
    let added = daemon
        .add_magnet(url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to send torrent to {}: {}", daemon.endpoint(), e))?;

    let name = if added.name.is_empty() { url } else { added.name.as_str() };
    if added.duplicate {
        Ok(format!("{} is already on {}", name, daemon.endpoint()))
    } else {
        Ok(format!("Successfully added {} to {}", name, daemon.endpoint()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviefinder_core::testing::{fixtures, MockMetadataLookup, MockTorrentDaemon};

    fn lookup() -> MockMetadataLookup {
        MockMetadataLookup::with_titles(vec![
            fixtures::movie("Blade Runner", 1982, "tt0083658"),
            fixtures::movie("Blade Runner 2049", 2017, "tt1856101"),
        ])
    }

    #[tokio::test]
    async fn test_search_titles() {
        let results = search_titles(&lookup(), "blade runner", 8, false).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_titles_error_is_empty() {
        let lookup = lookup();
        lookup.set_next_error("service down").await;
        assert!(search_titles(&lookup, "blade runner", 8, false).await.is_empty());
    }

    #[tokio::test]
    async fn test_target_by_id() {
        let target = target_by_id(&lookup(), "tt0083658").await.unwrap();
        assert_eq!(target.id, "tt0083658");
        assert_eq!(target.title, "Blade Runner");
        assert_eq!(target.imdb_id.as_deref(), Some("tt0083658"));

        assert!(target_by_id(&lookup(), "tt404").await.is_none());
    }

    #[tokio::test]
    async fn test_target_by_numeric_id() {
        let lookup = lookup();
        let target = target_by_id(&lookup, "0083658").await.unwrap();
        assert_eq!(target.imdb_id.as_deref(), Some("tt0083658"));

        let by_imdb = target_by_id(&lookup, "tt1856101").await.unwrap();
        let details = lookup.search_by_id("tt1856101").await.unwrap().unwrap();
        let by_tmdb = target_by_id(&lookup, &format!("tmdb:{}", details.summary.tmdb_id))
            .await
            .unwrap();
        assert_eq!(by_tmdb, by_imdb);
    }

    #[tokio::test]
    async fn test_target_for_uses_imdb_id() {
        let lookup = lookup();
        let summaries = search_titles(&lookup, "2049", 8, false).await;
        let target = target_for(&lookup, &summaries[0]).await;
        assert_eq!(target.id, "tt1856101");
    }

    #[tokio::test]
    async fn test_target_for_falls_back_to_service_id() {
        let lookup = lookup();
        let summaries = search_titles(&lookup, "2049", 8, false).await;
        lookup.set_next_error("timeout").await;

        let target = target_for(&lookup, &summaries[0]).await;
        assert_eq!(target.id, summaries[0].tmdb_id.to_string());
        assert_eq!(target.title, "Blade Runner 2049");
        assert!(target.imdb_id.is_none());
    }

    #[tokio::test]
    async fn test_hand_off() {
        let daemon = MockTorrentDaemon::new();
        let message = hand_off(&daemon, "magnet:?xt=urn:btih:a").await.unwrap();
        assert!(message.starts_with("Successfully added"));

        let message = hand_off(&daemon, "magnet:?xt=urn:btih:a").await.unwrap();
        assert!(message.contains("already"));

        daemon.reject_next("duplicate torrent").await;
        let err = hand_off(&daemon, "magnet:?xt=urn:btih:b").await.unwrap_err();
        assert!(err.to_string().contains("duplicate torrent"));
    }
}
