//! Download daemon hand-off.
//!
//! A selected result's magnet link is handed to a torrent daemon, which
//! either accepts it or rejects it. Transmission is the only backend.

mod transmission;

pub use transmission::{TransmissionClient, SESSION_ID_HEADER};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when handing a torrent to the daemon.
#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The daemon never produced a usable session ID.
    #[error("Session handshake failed: {0}")]
    SessionHandshake(String),

    /// The daemon answered with a result other than success.
    #[error("Daemon rejected the torrent: {0}")]
    Rejected(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for DownloaderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DownloaderError::Timeout
        } else if e.is_connect() {
            DownloaderError::ConnectionFailed(e.to_string())
        } else {
            DownloaderError::ApiError(e.to_string())
        }
    }
}

/// A torrent the daemon accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedTorrent {
    /// Info hash as reported by the daemon.
    pub hash: String,
    pub name: String,
    /// The daemon already had this torrent.
    pub duplicate: bool,
}

/// A daemon that accepts magnet links.
#[async_trait]
pub trait TorrentDaemon: Send + Sync {
    /// Daemon endpoint, for user-facing messages.
    fn endpoint(&self) -> &str;

    /// Hand a magnet link (or torrent URL) to the daemon.
    async fn add_magnet(&self, url: &str) -> Result<AddedTorrent, DownloaderError>;
}
