//! HTTP plumbing shared by the providers: client construction, plain GET and
//! GET with exponential-backoff retry.

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, warn};

use crate::config::RetryConfig;

use super::ProviderError;

/// Some indexer proxies refuse requests without a browser-like agent.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Maximum characters of an error body kept in error messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Build an HTTP client with the given request timeout.
pub fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))
}

/// Delay before retry number `retry` (1-based): `factor * 2^(retry - 1)`.
pub fn backoff_delay(config: &RetryConfig, retry: u32) -> Duration {
    let exponent = retry.saturating_sub(1).min(16);
    Duration::from_millis(config.backoff_factor_ms.saturating_mul(1u64 << exponent))
}

/// Perform a single GET and fail on non-success statuses.
pub async fn get(client: &Client, url: &str) -> Result<Response, ProviderError> {
    debug!(url = %url, "HTTP GET");
    let response = client.get(url).send().await?;
    ensure_success(response).await
}

/// Perform a GET, retrying transport failures and the configured statuses.
pub async fn get_with_retry(
    client: &Client,
    url: &str,
    retry: &RetryConfig,
) -> Result<Response, ProviderError> {
    let attempts = retry.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        debug!(url = %url, attempt = attempt, "HTTP GET");
        match client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let retryable = retry.status_forcelist.contains(&status);
                if !retryable || attempt >= attempts {
                    return ensure_success(response).await;
                }
                warn!(status = status, attempt = attempt, "Retryable HTTP status");
            }
            Err(e) => {
                let err = ProviderError::from(e);
                if !err.is_transient() || attempt >= attempts {
                    return Err(err);
                }
                warn!(error = %err, attempt = attempt, "Transient HTTP failure");
            }
        }

        tokio::time::sleep(backoff_delay(retry, attempt)).await;
        attempt += 1;
    }
}

async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::HttpStatus {
        status: status.as_u16(),
        body: body.chars().take(ERROR_BODY_LIMIT).collect(),
    })
}
