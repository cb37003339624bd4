//! Beatport web URLs → media type and id.
//!
//! `https://www.beatport.com/{kind}/{slug}/{id}`, where `kind` is one of
//! `track`, `release`, `artist`, `playlists`, `chart`, `label`.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::error::{ModuleError, Result};

static BEATPORT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://(www\.)?beatport\.com/(?P<type>track|release|artist|playlists|chart|label)/.+?/(?P<id>\d+)",
    )
    .expect("static regex")
});

/// Kind of media the host asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadType {
    Track,
    Album,
    Playlist,
    Artist,
    Label,
}

/// A parsed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaIdentification {
    pub media_type: DownloadType,
    pub media_id: u64,
    /// DJ charts are playlists on the host side but use chart endpoints.
    pub is_chart: bool,
}

/// Parse a Beatport web URL.
pub fn parse_url(link: &str) -> Result<MediaIdentification> {
    let caps = BEATPORT_URL
        .captures(link)
        .ok_or_else(|| ModuleError::UnsupportedUrl(link.to_owned()))?;
    let kind = &caps["type"];
    let media_type = match kind {
        "track" => DownloadType::Track,
        "release" => DownloadType::Album,
        "artist" => DownloadType::Artist,
        "playlists" | "chart" => DownloadType::Playlist,
        _ => DownloadType::Label,
    };
    let media_id = caps["id"]
        .parse()
        .map_err(|_| ModuleError::UnsupportedUrl(link.to_owned()))?;
    Ok(MediaIdentification {
        media_type,
        media_id,
        is_chart: kind == "chart",
    })
}
