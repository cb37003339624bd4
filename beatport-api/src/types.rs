//! Typed records for Beatport catalog responses.
//!
//! Every record is validated at the boundary by serde. The catalog omits or
//! nulls fields freely, so anything that is not an id is optional or
//! defaulted. Field names match the wire (`snake_case` already).

use serde::{Deserialize, Deserializer, Serialize};

/// Read `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A named reference to another entity (`{ "id": 1, "name": "..." }`).
///
/// Used for track/release artists, labels, genres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Artwork reference.
///
/// `dynamic_uri` carries `{w}x{h}` placeholders; `uri` a fixed resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub dynamic_uri: Option<String>,
}

impl Image {
    /// The templated URI when present, the fixed one otherwise.
    pub fn best_uri(&self) -> Option<&str> {
        self.dynamic_uri.as_deref().or(self.uri.as_deref())
    }
}

/// Musical key (`{ "id": 7, "name": "A Minor" }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicalKey {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// The release a track belongs to, as embedded in track records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRef {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub label: Option<Named>,
}

/// A track.
///
/// Returned by `catalog/tracks/{id}/`, inside release/chart/artist track
/// listings and in search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Beatport track id.
    pub id: u64,
    /// Title without the mix.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Mix/version, e.g. `Original Mix`. Often empty.
    #[serde(default)]
    pub mix_name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<Named>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remixers: Vec<Named>,
    #[serde(default)]
    pub release: Option<ReleaseRef>,
    #[serde(default)]
    pub genre: Option<Named>,
    #[serde(default)]
    pub sub_genre: Option<Named>,
    #[serde(default)]
    pub key: Option<MusicalKey>,
    #[serde(default)]
    pub bpm: Option<u32>,
    #[serde(default)]
    pub isrc: Option<String>,
    /// Duration in milliseconds.
    #[serde(default)]
    pub length_ms: Option<u64>,
    /// ISO date, `YYYY-MM-DD`.
    #[serde(default)]
    pub publish_date: Option<String>,
    /// Position on its release, as sent by the catalog.
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_available_for_streaming: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preorder: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclusive: bool,
}

/// A release (album, EP, single).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<Named>,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub upc: Option<String>,
    #[serde(default)]
    pub catalog_number: Option<String>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub label: Option<Named>,
    #[serde(default)]
    pub track_count: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclusive: bool,
}

/// A user playlist.
///
/// User playlists have no `dynamic_uri`; `release_images` holds up to four
/// fixed-size cover URLs of the contained releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub updated_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_images: Vec<String>,
    #[serde(default)]
    pub track_count: Option<u32>,
}

/// One row of a playlist track listing: `{ "id": 9, "position": 1, "track": {...} }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub position: Option<u32>,
    pub track: Track,
}

/// Chart owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub owner_name: Option<String>,
}

/// A DJ chart (curated track list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Curator; absent for charts published by Beatport itself.
    #[serde(default)]
    pub person: Option<Person>,
    #[serde(default)]
    pub change_date: Option<String>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub track_count: Option<u32>,
}

/// An artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub image: Option<Image>,
}

/// A record label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub image: Option<Image>,
}

/// Result of `catalog/search/`. Every list may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tracks: Vec<Track>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub releases: Vec<Release>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub charts: Vec<Chart>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<Artist>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<Label>,
}

/// `catalog/tracks/{id}/stream/`: a 128k AAC HLS manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackStream {
    #[serde(default)]
    pub stream_url: Option<String>,
}

/// `catalog/tracks/{id}/download/`: a direct 256k AAC MP4 link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDownload {
    #[serde(default)]
    pub location: Option<String>,
}

/// Token introspection (`auth/o/introspect/`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    /// Subscription code, e.g. `bp_link_pro`. Absent for free accounts.
    #[serde(default)]
    pub subscription: Option<String>,
}
