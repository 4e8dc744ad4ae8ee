//! Release type classification from free-text torrent titles.
//!
//! Titles are matched against a fixed catalog of rip/source/resolution tags.
//! Matching is a case-insensitive substring test, so a single title commonly
//! yields several tags (`"WEB-DL"` hits both `web` and `web-dl`). Every tag
//! that occurs is reported, in catalog order, so a specific tag is never
//! masked by a broader one.

/// Known release tags, in reporting order.
///
/// Remux first, then disc sources, web variants, broadcast captures, disc
/// images, theatrical captures and finally resolutions.
pub const RELEASE_TAGS: &[&str] = &[
    // Remux
    "bdremux",
    "brremux",
    "remux",
    // Blu-ray
    "bdrip",
    "brrip",
    "blu-ray",
    "bluray",
    "bdmv",
    "bdr",
    "bd5",
    // Web capture
    "web-cap",
    "webcap",
    "web cap",
    // Web rip / download
    "webrip",
    "web rip",
    "web-rip",
    "web",
    "webdl",
    "web dl",
    "web-dl",
    "hdrip",
    // Broadcast
    "dsr",
    "dsrip",
    "satrip",
    "dthrip",
    "dvbrip",
    "hdtv",
    "pdtv",
    "tvrip",
    "hdtvrip",
    // Disc image
    "dvdr",
    "dvd-full",
    "full-rip",
    "iso",
    // Telesync / pre-release
    "hdts",
    "telesync",
    "pdvd",
    "predvdrip",
    // Camcorder
    "camrip",
    "cam",
    // Resolution
    "720p",
    "1080p",
    "2160p",
];

/// Tag that marks camcorder captures.
pub const CAM_TAG: &str = "cam";

/// Return every catalog tag found in `text`, in catalog order.
///
/// An empty result means the title carries no recognizable tag; callers
/// substitute a provider supplied quality in that case.
pub fn classify(text: &str) -> Vec<&'static str> {
    let haystack = text.to_lowercase();
    RELEASE_TAGS
        .iter()
        .copied()
        .filter(|tag| haystack.contains(tag))
        .collect()
}

/// Whether `text` looks like a camcorder capture.
pub fn is_cam(text: &str) -> bool {
    text.to_lowercase().contains(CAM_TAG)
}
