//! Cover URL templating.
//!
//! Release images come with a `dynamic_uri` such as
//! `https://geo-media.beatport.com/image_size/{w}x{h}/<uuid>.jpg`. Fixed-size
//! URIs (`.../image_size/500x500/...`) are turned into templates first so
//! any size can be requested.

use regex::Regex;
use std::sync::LazyLock;

/// Largest cover the CDN serves.
pub const DEFAULT_MAX_COVER_SIZE: u32 = 1400;

static RESOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3,4}x\d{3,4}").expect("static regex"));

/// Cover URL at `size`x`size`, with `size` capped at `max_size`.
///
/// URLs without a resolution or placeholders are returned unchanged.
pub fn artwork_url(cover_url: &str, size: u32, max_size: u32) -> String {
    let size = size.min(max_size).to_string();
    RESOLUTION
        .replace_all(cover_url, "{w}x{h}")
        .replace("{w}", &size)
        .replace("{h}", &size)
}
