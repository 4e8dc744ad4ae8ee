//! Terminal rendering of torrent results.

use moviefinder_core::ProviderResult;

/// One selection-menu row: `name (quality) (provider) seeders: N`.
pub fn torrent_row(result: &ProviderResult) -> String {
    let seeds = result
        .seeds()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "?".to_string());
    let mut row = format!(
        "{} ({}) ({}) seeders: {}",
        result.name(),
        result.quality(),
        result.provider(),
        seeds
    );
    if !result.size().is_empty() {
        row.push_str(&format!(" [{}]", result.size()));
    }
    row
}
