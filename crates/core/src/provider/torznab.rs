//! Jackett (torznab) meta-search provider.
//!
//! Jackett fans a free-text query out to every configured indexer and answers
//! with an RSS feed. Each `channel/item` carries the release title, link and
//! size, plus `torznab:attr` name/value pairs for seeders and peers.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use regex::Regex;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::JackettConfig;

use super::http::{build_client, get};
use super::{humanize_size, rank_by_seeds, ProviderError, ProviderResult, TorrentProvider};

/// Provider label used in logs and error reports.
pub const JACKETT_PROVIDER_NAME: &str = "Jackett";

/// Namespace of the torznab attribute extension.
pub const TORZNAB_NS: &str = "http://torznab.com/schemas/2015/feed";

/// Release group suffix such as `-GROUP` or `-1 GROUP`.
static UPLOADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-1? *\w*").expect("valid regex"));

/// Jackett provider for a single title query.
pub struct JackettProvider {
    client: Client,
    config: JackettConfig,
    api_key: String,
    id: String,
    title: String,
}

impl JackettProvider {
    /// Create a provider querying `title` with the given credentials.
    ///
    /// `id` is only used to correlate log lines with the search target.
    pub fn new(
        config: JackettConfig,
        api_key: impl Into<String>,
        id: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = build_client(Duration::from_secs(config.timeout_secs))?;
        let id = id.into();
        debug!(id = %id, host = %config.url, "Configured Jackett provider");
        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
            id,
            title: title.into(),
        })
    }

    /// Build the torznab search URL for this provider's title.
    pub fn build_search_url(&self) -> Result<String, ProviderError> {
        let path: Vec<&str> = self
            .config
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        let limit = self.config.limit.to_string();
        build_url(
            self.config.ssl,
            &self.config.url,
            &path,
            &[
                ("apikey", self.api_key.as_str()),
                ("limit", limit.as_str()),
                ("q", self.title.as_str()),
            ],
        )
    }

    /// Run the search and return every parsed item, unfiltered.
    pub async fn search(&self) -> Result<Vec<ProviderResult>, ProviderError> {
        let url = self.build_search_url()?;
        debug!(id = %self.id, query = %self.title, "Searching Jackett");

        let response = get(&self.client, &url).await?;
        let body = response.bytes().await?;
        parse_feed(&body)
    }
}

#[async_trait]
impl TorrentProvider for JackettProvider {
    fn name(&self) -> &str {
        JACKETT_PROVIDER_NAME
    }

    /// Search, then drop seedless results and rank the rest by seeders.
    async fn fetch(&self) -> Result<Vec<ProviderResult>, ProviderError> {
        let parsed = self.search().await?;
        let total = parsed.len();
        let ranked = rank_by_seeds(parsed);
        debug!(
            id = %self.id,
            parsed = total,
            kept = ranked.len(),
            "Jackett search complete"
        );
        Ok(ranked)
    }
}

/// Join host, path segments and query arguments into a URL.
///
/// Arguments are form-encoded, then every `+` is rewritten to `%20`: the
/// torznab endpoint does not decode `+` as a space.
pub fn build_url(
    ssl: bool,
    host: &str,
    path: &[&str],
    args: &[(&str, &str)],
) -> Result<String, ProviderError> {
    let base = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };
    let mut url = Url::parse(&base)
        .map_err(|e| ProviderError::InvalidRequest(format!("Invalid host {:?}: {}", host, e)))?;
    url.set_scheme(if ssl { "https" } else { "http" })
        .map_err(|_| ProviderError::InvalidRequest(format!("Invalid host {:?}", host)))?;
    url.set_path(&path.join("/"));

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(args)
        .finish();
    url.set_query(Some(&query));

    Ok(url.to_string().replace('+', "%20"))
}

/// Last release-group suffix in `title`, without its leading `-`.
pub fn extract_uploader(title: &str) -> String {
    UPLOADER_RE
        .find_iter(title)
        .last()
        .map(|m| m.as_str()[1..].trim().to_string())
        .unwrap_or_default()
}

/// Parse a torznab feed into results.
///
/// Parsing keeps every item except camcorder captures; seed filtering and
/// ranking are left to the caller.
pub fn parse_feed(xml: &[u8]) -> Result<Vec<ProviderResult>, ProviderError> {
    let mut reader = NsReader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut saw_channel = false;
    let mut item: Option<FeedItem> = None;
    let mut item_depth = 0usize;
    let mut field: Option<ItemField> = None;
    let mut results = Vec::new();

    loop {
        let (ns, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| ProviderError::MalformedResponse(format!("XML parse error: {}", e)))?;

        match event {
            Event::Start(e) => {
                depth += 1;
                if let Some(current) = item.as_mut() {
                    if is_torznab_attr(&ns, &e) {
                        current.apply_attr(&e)?;
                    } else if depth == item_depth + 1 {
                        field = ItemField::from_local_name(e.local_name().as_ref());
                    }
                } else {
                    match e.local_name().as_ref() {
                        b"channel" => saw_channel = true,
                        b"item" if saw_channel => {
                            item = Some(FeedItem::default());
                            item_depth = depth;
                        }
                        b"error" => return Err(torznab_error(&e)),
                        _ => {}
                    }
                }
            }
            Event::Empty(e) => {
                if let Some(current) = item.as_mut() {
                    if is_torznab_attr(&ns, &e) {
                        current.apply_attr(&e)?;
                    }
                } else if e.local_name().as_ref() == b"error" {
                    return Err(torznab_error(&e));
                }
            }
            Event::Text(e) => {
                if let (Some(current), Some(f)) = (item.as_mut(), field) {
                    let text = e.unescape().map_err(|e| {
                        ProviderError::MalformedResponse(format!("XML text error: {}", e))
                    })?;
                    current.push_text(f, &text);
                }
            }
            Event::CData(e) => {
                if let (Some(current), Some(f)) = (item.as_mut(), field) {
                    current.push_text(f, &String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if depth == item_depth {
                    if let Some(done) = item.take() {
                        if let Some(result) = done.into_result() {
                            results.push(result);
                        }
                    }
                }
                field = None;
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_channel {
        return Err(ProviderError::MalformedResponse(
            "feed has no channel element".to_string(),
        ));
    }

    Ok(results)
}

fn is_torznab_attr(ns: &ResolveResult, e: &BytesStart) -> bool {
    if e.local_name().as_ref() != b"attr" {
        return false;
    }
    match ns {
        ResolveResult::Bound(Namespace(uri)) => *uri == TORZNAB_NS.as_bytes(),
        _ => e
            .name()
            .prefix()
            .is_some_and(|prefix| prefix.as_ref() == b"torznab"),
    }
}

fn attr_value(e: &BytesStart, key: &str) -> Result<Option<String>, ProviderError> {
    let attr = e
        .try_get_attribute(key)
        .map_err(|err| ProviderError::MalformedResponse(format!("XML attribute error: {}", err)))?;
    match attr {
        Some(attr) => attr
            .unescape_value()
            .map(|v| Some(v.into_owned()))
            .map_err(|err| ProviderError::MalformedResponse(format!("XML attribute error: {}", err))),
        None => Ok(None),
    }
}

/// Torznab reports failures as `<error code=".." description=".."/>`.
fn torznab_error(e: &BytesStart) -> ProviderError {
    let code = attr_value(e, "code").ok().flatten().unwrap_or_default();
    let description = attr_value(e, "description")
        .ok()
        .flatten()
        .unwrap_or_else(|| "unknown error".to_string());
    ProviderError::Api(format!("torznab error {}: {}", code, description))
}

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    PubDate,
    Link,
    Size,
    Indexer,
}

impl ItemField {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"pubDate" => Some(Self::PubDate),
            b"link" => Some(Self::Link),
            b"size" => Some(Self::Size),
            b"jackettindexer" | b"prowlarrindexer" => Some(Self::Indexer),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct FeedItem {
    title: Option<String>,
    pub_date: Option<String>,
    link: Option<String>,
    size: Option<String>,
    indexer: Option<String>,
    seeders: Option<u32>,
    peers: Option<u32>,
}

impl FeedItem {
    fn push_text(&mut self, field: ItemField, text: &str) {
        let slot = match field {
            ItemField::Title => &mut self.title,
            ItemField::PubDate => &mut self.pub_date,
            ItemField::Link => &mut self.link,
            ItemField::Size => &mut self.size,
            ItemField::Indexer => &mut self.indexer,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn apply_attr(&mut self, e: &BytesStart) -> Result<(), ProviderError> {
        let name = attr_value(e, "name")?;
        let value = attr_value(e, "value")?;
        let parsed = value.and_then(|v| v.trim().parse::<u32>().ok());
        match name.as_deref() {
            Some("seeders") => self.seeders = parsed,
            Some("peers") => self.peers = parsed,
            _ => {}
        }
        Ok(())
    }

    fn into_result(self) -> Option<ProviderResult> {
        let title = self.title.unwrap_or_default();
        if title.is_empty() {
            debug!("Feed item without title");
        }
        let uploader = extract_uploader(&title);
        let indexer = self.indexer.unwrap_or_default();
        let size = humanize_size(self.size.as_deref().unwrap_or_default());
        let published = self.pub_date.as_deref().and_then(parse_pub_date);

        let result = ProviderResult::new(
            title,
            super::UNKNOWN_QUALITY,
            Some(self.seeders.unwrap_or(0)),
            size,
            format!("{} - {}", indexer, uploader),
            self.link.unwrap_or_default(),
        )
        .with_inferred_quality()
        .with_peers(self.peers.unwrap_or(0))
        .with_published(published);

        if result.is_cam() {
            debug!(title = %result.name(), "Skipping camcorder release");
            return None;
        }

        debug!(
            title = %result.name(),
            size = %result.size(),
            seeders = ?result.seeds(),
            peers = ?result.peers(),
            "Found torrent"
        );
        Some(result)
    }
}
