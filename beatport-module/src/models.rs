//! Normalized projections handed to the host.
//!
//! Batch projections (album, playlist, artist, label) carry a [`Preloaded`]
//! set so that resolving their tracks later does not hit the network again.

use beatport_api::types::{Release, Track};
use serde::Serialize;
use std::collections::HashMap;

use crate::quality::{Codec, QualityTier};

/// Where a track sits in the listing it was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackPosition {
    /// 1-based index in the aggregated listing.
    pub number: u32,
    /// Size of the listing, when the listing is not a release.
    pub total: Option<u32>,
}

/// Records already fetched, looked up by exact id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preloaded {
    pub tracks: HashMap<u64, Track>,
    pub releases: HashMap<u64, Release>,
    pub positions: HashMap<u64, TrackPosition>,
}

impl Preloaded {
    /// Remember `tracks` with their positional numbers.
    pub(crate) fn number_tracks(&mut self, tracks: &[Track], total: Option<u32>) {
        for (i, track) in tracks.iter().enumerate() {
            let number = u32::try_from(i + 1).unwrap_or(u32::MAX);
            self.positions.insert(track.id, TrackPosition { number, total });
            self.tracks.insert(track.id, track.clone());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tags {
    pub album_artist: Option<String>,
    pub track_number: Option<u32>,
    pub total_tracks: Option<u32>,
    pub upc: Option<String>,
    pub isrc: Option<String>,
    pub genres: Vec<String>,
    pub release_date: Option<String>,
    pub copyright: Option<String>,
    pub bpm: Option<u32>,
    pub key: Option<String>,
}

/// Everything the host needs to tag and fetch one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    pub id: u64,
    pub name: String,
    pub album: Option<String>,
    pub album_id: Option<u64>,
    pub artists: Vec<String>,
    pub artist_id: Option<u64>,
    pub release_year: Option<String>,
    /// Seconds.
    pub duration: Option<u64>,
    /// kbps.
    pub bitrate: u32,
    pub codec: Codec,
    pub cover_url: Option<String>,
    pub tags: Tags,
    pub quality: QualityTier,
    /// Why the track cannot be downloaded. The rest of the batch is unaffected.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumInfo {
    pub name: String,
    pub release_year: Option<String>,
    pub duration: u64,
    pub upc: Option<String>,
    pub cover_url: Option<String>,
    pub artist: Option<String>,
    pub artist_id: Option<u64>,
    pub tracks: Vec<u64>,
    #[serde(skip)]
    pub preloaded: Preloaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistInfo {
    pub name: String,
    pub creator: String,
    pub release_year: Option<String>,
    pub duration: u64,
    pub cover_url: Option<String>,
    pub tracks: Vec<u64>,
    #[serde(skip)]
    pub preloaded: Preloaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistInfo {
    pub name: String,
    pub tracks: Vec<u64>,
    #[serde(skip)]
    pub preloaded: Preloaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelInfo {
    pub name: String,
    pub albums: Vec<u64>,
    #[serde(skip)]
    pub preloaded: Preloaded,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub result_id: u64,
    pub name: String,
    pub artists: Option<Vec<String>>,
    pub year: Option<String>,
    pub duration: Option<u64>,
    /// Extra annotations such as `124BPM` or `Exclusive`.
    pub additional: Vec<String>,
    #[serde(skip)]
    pub preloaded: Preloaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageFileType {
    Jpg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverInfo {
    pub url: String,
    pub file_type: ImageFileType,
}

/// How the host obtains the audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TrackDownloadInfo {
    /// Download this URL as-is (MP4 container, AAC).
    Url(String),
    /// Remux this HLS manifest into an MP4 file locally (e.g. with ffmpeg,
    /// audio copied).
    Remux { manifest_url: String },
}
