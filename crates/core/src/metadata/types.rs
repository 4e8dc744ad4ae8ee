//! Title records returned by metadata lookups.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of title a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Tv => write!(f, "tv"),
        }
    }
}

/// A candidate title from a search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleSummary {
    /// Metadata service ID.
    pub tmdb_id: u32,
    pub kind: MediaKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// Full poster URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Average vote (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

impl TitleSummary {
    /// One-line label for selection menus, e.g. `Blade Runner (1982) [movie] 7.9`.
    pub fn label(&self) -> String {
        let mut label = self.title.clone();
        if let Some(year) = self.year {
            label.push_str(&format!(" ({})", year));
        }
        label.push_str(&format!(" [{}]", self.kind));
        if let Some(rating) = self.rating {
            label.push_str(&format!(" {:.1}", rating));
        }
        label
    }
}

/// A fully populated title record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleDetails {
    #[serde(flatten)]
    pub summary: TitleSummary,
    /// IMDb ID (`tt...`), needed by the curated index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
}

impl TitleDetails {
    /// ID to search torrents with: the IMDb ID when known, else the TMDB ID.
    pub fn search_id(&self) -> String {
        match &self.imdb_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => self.summary.tmdb_id.to_string(),
        }
    }

    pub fn title(&self) -> &str {
        &self.summary.title
    }
}

/// Whether `id` is an IMDb title ID (`tt` followed by digits).
pub fn is_imdb_id(id: &str) -> bool {
    id.strip_prefix("tt")
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// A title ID given on the command line.
///
/// Bare numbers are IMDb IDs without their `tt` prefix. TMDB IDs need an
/// explicit `tmdb:` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleId {
    Imdb(String),
    Tmdb(u32),
}

impl TitleId {
    /// Parse `raw`, returning `None` when it is neither form.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(tmdb) = raw.strip_prefix("tmdb:") {
            return tmdb.trim().parse().ok().map(TitleId::Tmdb);
        }
        let imdb = if raw.starts_with("tt") {
            raw.to_string()
        } else {
            format!("tt{}", raw)
        };
        is_imdb_id(&imdb).then_some(TitleId::Imdb(imdb))
    }
}

/// Year from a `YYYY-MM-DD` (or partial) date.
pub(crate) fn year_from_date(date: Option<&str>) -> Option<u32> {
    date.and_then(|d| d.split('-').next())
        .and_then(|y| y.parse().ok())
}
