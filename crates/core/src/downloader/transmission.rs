//! Transmission RPC client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::TransmissionConfig;

use super::{AddedTorrent, DownloaderError, TorrentDaemon};

/// Header carrying Transmission's CSRF session token.
pub const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// Transmission RPC client.
pub struct TransmissionClient {
    client: Client,
    config: TransmissionConfig,
    /// Session ID (refreshed when the daemon answers 409).
    session: RwLock<Option<String>>,
}

impl TransmissionClient {
    /// Create a new Transmission client.
    pub fn new(config: TransmissionConfig) -> Result<Self, DownloaderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                DownloaderError::ConnectionFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            session: RwLock::new(None),
        })
    }

    /// Session ID currently cached, if any.
    pub async fn session_id(&self) -> Option<String> {
        self.session.read().await.clone()
    }

    async fn post(&self, body: &RpcRequest<'_>) -> Result<Response, DownloaderError> {
        let mut request = self.client.post(&self.config.url).json(body);
        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }
        if let Some(session_id) = self.session.read().await.as_deref() {
            request = request.header(SESSION_ID_HEADER, session_id);
        }
        Ok(request.send().await?)
    }

    /// Send an RPC call, replaying it once after a session handshake.
    async fn call(&self, body: &RpcRequest<'_>) -> Result<RpcResponse, DownloaderError> {
        let mut response = self.post(body).await?;

        if response.status() == StatusCode::CONFLICT {
            let session_id = response
                .headers()
                .get(SESSION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| {
                    DownloaderError::SessionHandshake(format!(
                        "409 response without {} header, check the RPC URL",
                        SESSION_ID_HEADER
                    ))
                })?;
            debug!("Refreshed Transmission session ID");
            *self.session.write().await = Some(session_id);

            response = self.post(body).await?;
            if response.status() == StatusCode::CONFLICT {
                return Err(DownloaderError::SessionHandshake(
                    "session ID rejected after refresh".to_string(),
                ));
            }
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DownloaderError::AuthenticationFailed(format!(
                "HTTP {}, check username and password",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DownloaderError::ApiError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DownloaderError::ApiError(format!("Invalid RPC response: {}", e)))
    }
}

#[async_trait]
impl TorrentDaemon for TransmissionClient {
    fn endpoint(&self) -> &str {
        &self.config.url
    }

    async fn add_magnet(&self, url: &str) -> Result<AddedTorrent, DownloaderError> {
        let request = RpcRequest {
            method: "torrent-add",
            arguments: TorrentAddArguments {
                filename: url,
                download_dir: self.config.download_dir.as_deref(),
            },
        };

        let response = self.call(&request).await?;
        if response.result != "success" {
            warn!(result = %response.result, "Transmission rejected torrent");
            return Err(DownloaderError::Rejected(response.result));
        }

        let arguments = response.arguments.unwrap_or_default();
        let (added, duplicate) = match (arguments.torrent_added, arguments.torrent_duplicate) {
            (Some(added), _) => (added, false),
            (None, Some(existing)) => (existing, true),
            (None, None) => {
                return Err(DownloaderError::ApiError(
                    "success response without torrent details".to_string(),
                ))
            }
        };

        debug!(name = %added.name, duplicate = duplicate, "Torrent handed to Transmission");
        Ok(AddedTorrent {
            hash: added.hash_string,
            name: added.name,
            duplicate,
        })
    }
}

// Transmission RPC wire types
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    arguments: TorrentAddArguments<'a>,
}

#[derive(Debug, Serialize)]
struct TorrentAddArguments<'a> {
    filename: &'a str,
    #[serde(rename = "download-dir", skip_serializing_if = "Option::is_none")]
    download_dir: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: String,
    #[serde(default)]
    arguments: Option<TorrentAddResponse>,
}

#[derive(Debug, Default, Deserialize)]
struct TorrentAddResponse {
    #[serde(default, rename = "torrent-added")]
    torrent_added: Option<TorrentRef>,
    #[serde(default, rename = "torrent-duplicate")]
    torrent_duplicate: Option<TorrentRef>,
}

#[derive(Debug, Deserialize)]
struct TorrentRef {
    #[serde(default, rename = "hashString")]
    hash_string: String,
    #[serde(default)]
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let request = RpcRequest {
            method: "torrent-add",
            arguments: TorrentAddArguments {
                filename: "magnet:?xt=urn:btih:abc",
                download_dir: None,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "torrent-add");
        assert_eq!(json["arguments"]["filename"], "magnet:?xt=urn:btih:abc");
        assert!(json["arguments"].get("download-dir").is_none());

        let request = RpcRequest {
            method: "torrent-add",
            arguments: TorrentAddArguments {
                filename: "magnet:?",
                download_dir: Some("/srv/movies"),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["arguments"]["download-dir"], "/srv/movies");
    }

    #[test]
    fn test_response_parsing() {
        let response: RpcResponse = serde_json::from_str(
            r#"{"result": "success", "arguments": {"torrent-duplicate":
                {"hashString": "abc", "id": 4, "name": "Blade Runner"}}}"#,
        )
        .unwrap();
        let arguments = response.arguments.unwrap();
        assert!(arguments.torrent_added.is_none());
        assert_eq!(arguments.torrent_duplicate.unwrap().hash_string, "abc");

        let response: RpcResponse =
            serde_json::from_str(r#"{"result": "invalid or corrupt torrent file"}"#).unwrap();
        assert!(response.arguments.is_none());
    }

    #[tokio::test]
    async fn test_new_client_has_no_session() {
        let client = TransmissionClient::new(TransmissionConfig {
            url: "http://localhost:9091/transmission/rpc".to_string(),
            username: None,
            password: None,
            download_dir: None,
            timeout_secs: 5,
        })
        .unwrap();
        assert!(client.session_id().await.is_none());
        assert_eq!(client.endpoint(), "http://localhost:9091/transmission/rpc");
    }
}
