//! Mock torrent daemon for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::downloader::{AddedTorrent, DownloaderError, TorrentDaemon};

/// Mock implementation of the TorrentDaemon trait.
///
/// Records every magnet handed to it. Adding the same URL twice reports a
/// duplicate, like Transmission does.
#[derive(Debug, Clone, Default)]
pub struct MockTorrentDaemon {
    added: Arc<RwLock<Vec<String>>>,
    /// If set, the next add is rejected with this result string.
    next_rejection: Arc<RwLock<Option<String>>>,
}

impl MockTorrentDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs accepted so far, in order.
    pub async fn added(&self) -> Vec<String> {
        self.added.read().await.clone()
    }

    /// Reject the next add with `result`.
    pub async fn reject_next(&self, result: impl Into<String>) {
        *self.next_rejection.write().await = Some(result.into());
    }
}

#[async_trait]
impl TorrentDaemon for MockTorrentDaemon {
    fn endpoint(&self) -> &str {
        "mock://transmission"
    }

    async fn add_magnet(&self, url: &str) -> Result<AddedTorrent, DownloaderError> {
        if let Some(result) = self.next_rejection.write().await.take() {
            return Err(DownloaderError::Rejected(result));
        }

        let mut added = self.added.write().await;
        let duplicate = added.iter().any(|u| u == url);
        if !duplicate {
            added.push(url.to_string());
        }

        Ok(AddedTorrent {
            hash: format!("{:040x}", added.len()),
            name: url.to_string(),
            duplicate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_duplicate() {
        let daemon = MockTorrentDaemon::new();
        let first = daemon.add_magnet("magnet:?xt=urn:btih:a").await.unwrap();
        assert!(!first.duplicate);
        assert_eq!(first.hash.len(), 40);

        let again = daemon.add_magnet("magnet:?xt=urn:btih:a").await.unwrap();
        assert!(again.duplicate);
        assert_eq!(daemon.added().await.len(), 1);
    }

    #[tokio::test]
    async fn test_reject_next() {
        let daemon = MockTorrentDaemon::new();
        daemon.reject_next("invalid or corrupt torrent file").await;

        let err = daemon.add_magnet("magnet:?").await.unwrap_err();
        assert!(
            matches!(err, DownloaderError::Rejected(ref r) if r == "invalid or corrupt torrent file")
        );
        assert!(daemon.add_magnet("magnet:?").await.is_ok());
    }
}
