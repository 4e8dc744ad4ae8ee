use serde::{Deserialize, Serialize};

use crate::metadata::TmdbConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub yts: YtsConfig,
    #[serde(default)]
    pub jackett: JackettConfig,
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
    #[serde(default)]
    pub transmission: Option<TransmissionConfig>,
}

/// Defaults for an interactive search session
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Maximum number of metadata results to offer
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Include TV series in title searches
    #[serde(default)]
    pub include_tv: bool,
    /// Query every provider instead of only the curated index
    #[serde(default)]
    pub all_providers: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            include_tv: false,
            all_providers: false,
        }
    }
}

fn default_max_results() -> usize {
    8
}

/// Curated index (YTS) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YtsConfig {
    /// API base URL (e.g., "https://yts.mx/api/v2")
    #[serde(default = "default_yts_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 120)
    #[serde(default = "default_yts_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for YtsConfig {
    fn default() -> Self {
        Self {
            base_url: default_yts_url(),
            timeout_secs: default_yts_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_yts_url() -> String {
    "https://yts.mx/api/v2".to_string()
}

fn default_yts_timeout() -> u64 {
    120
}

/// Retry configuration for transient HTTP failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff in milliseconds; doubled after every retry.
    #[serde(default = "default_backoff_factor_ms")]
    pub backoff_factor_ms: u64,
    /// HTTP statuses that trigger a retry.
    #[serde(default = "default_status_forcelist")]
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_factor_ms: default_backoff_factor_ms(),
            status_forcelist: default_status_forcelist(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_factor_ms() -> u64 {
    300
}

fn default_status_forcelist() -> Vec<u16> {
    vec![500, 502, 504]
}

/// Jackett meta-search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JackettConfig {
    /// Jackett server URL (e.g., "http://localhost:9117")
    #[serde(default = "default_jackett_url")]
    pub url: String,
    /// Jackett API key
    #[serde(default)]
    pub api_key: Option<String>,
    /// Torznab endpoint path, '/' separated
    #[serde(default = "default_jackett_path")]
    pub path: String,
    /// Page size requested from Jackett
    #[serde(default = "default_jackett_limit")]
    pub limit: u32,
    /// Force https
    #[serde(default)]
    pub ssl: bool,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_jackett_timeout")]
    pub timeout_secs: u64,
}

impl Default for JackettConfig {
    fn default() -> Self {
        Self {
            url: default_jackett_url(),
            api_key: None,
            path: default_jackett_path(),
            limit: default_jackett_limit(),
            ssl: false,
            timeout_secs: default_jackett_timeout(),
        }
    }
}

pub(crate) fn default_jackett_url() -> String {
    "http://localhost:9117".to_string()
}

fn default_jackett_path() -> String {
    "api/v2.0/indexers/all/results/torznab/api".to_string()
}

fn default_jackett_limit() -> u32 {
    25
}

fn default_jackett_timeout() -> u64 {
    60
}

/// Transmission RPC configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransmissionConfig {
    /// RPC endpoint (e.g., "http://localhost:9091/transmission/rpc")
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Download directory override
    #[serde(default)]
    pub download_dir: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_transmission_timeout")]
    pub timeout_secs: u64,
}

fn default_transmission_timeout() -> u64 {
    30
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub search: SearchConfig,
    pub yts: YtsConfig,
    pub jackett: SanitizedJackettConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<SanitizedTmdbConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<SanitizedTransmissionConfig>,
}

/// Sanitized Jackett config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedJackettConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub path: String,
    pub limit: u32,
    pub ssl: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTmdbConfig {
    pub api_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTransmissionConfig {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            search: config.search.clone(),
            yts: config.yts.clone(),
            jackett: SanitizedJackettConfig {
                url: config.jackett.url.clone(),
                api_key_configured: config
                    .jackett
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                path: config.jackett.path.clone(),
                limit: config.jackett.limit,
                ssl: config.jackett.ssl,
                timeout_secs: config.jackett.timeout_secs,
            },
            tmdb: config.tmdb.as_ref().map(|t| SanitizedTmdbConfig {
                api_key_configured: !t.api_key.is_empty(),
                base_url: t.base_url.clone(),
            }),
            transmission: config
                .transmission
                .as_ref()
                .map(|t| SanitizedTransmissionConfig {
                    url: t.url.clone(),
                    username: t.username.clone(),
                    password_configured: t.password.as_ref().is_some_and(|p| !p.is_empty()),
                    download_dir: t.download_dir.clone(),
                }),
        }
    }
}
