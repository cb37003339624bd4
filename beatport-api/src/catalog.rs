//! Single-entity catalog endpoints.
//!
//! | Method                               | Endpoint                              |
//! |--------------------------------------|---------------------------------------|
//! | [`BeatportClient::track`]            | `catalog/tracks/{id}/`                |
//! | [`BeatportClient::release`]          | `catalog/releases/{id}/`              |
//! | [`BeatportClient::playlist`]         | `catalog/playlists/{id}/`             |
//! | [`BeatportClient::chart`]            | `catalog/charts/{id}/`                |
//! | [`BeatportClient::artist`]           | `catalog/artists/{id}/`               |
//! | [`BeatportClient::label`]            | `catalog/labels/{id}/`                |
//! | [`BeatportClient::search`]           | `catalog/search/?q=...`               |
//! | [`BeatportClient::track_stream`]     | `catalog/tracks/{id}/stream/`         |
//! | [`BeatportClient::track_download`]   | `catalog/tracks/{id}/download/`       |
//!
//! Listing endpoints (`.../tracks/`, `.../releases/`) live in
//! [`paginate`](crate::paginate).

use crate::client::BeatportClient;
use crate::error::Result;
use crate::types::{
    Artist, Chart, Label, Playlist, Release, SearchResults, Track, TrackDownload, TrackStream,
};

impl BeatportClient {
    pub fn track(&self, id: u64) -> Result<Track> {
        self.get(&format!("catalog/tracks/{id}/"), &[])
    }

    pub fn release(&self, id: u64) -> Result<Release> {
        self.get(&format!("catalog/releases/{id}/"), &[])
    }

    pub fn playlist(&self, id: u64) -> Result<Playlist> {
        self.get(&format!("catalog/playlists/{id}/"), &[])
    }

    pub fn chart(&self, id: u64) -> Result<Chart> {
        self.get(&format!("catalog/charts/{id}/"), &[])
    }

    pub fn artist(&self, id: u64) -> Result<Artist> {
        self.get(&format!("catalog/artists/{id}/"), &[])
    }

    pub fn label(&self, id: u64) -> Result<Label> {
        self.get(&format!("catalog/labels/{id}/"), &[])
    }

    /// Search tracks, releases, charts, artists and labels at once.
    pub fn search(&self, query: &str) -> Result<SearchResults> {
        self.get("catalog/search/", &[("q", query.to_owned())])
    }

    /// The 128k AAC HLS manifest of a track.
    ///
    /// The manifest has to be remuxed into an MP4 container by the caller.
    pub fn track_stream(&self, id: u64) -> Result<TrackStream> {
        self.get(&format!("catalog/tracks/{id}/stream/"), &[])
    }

    /// A direct link to the track as an MP4 file.
    ///
    /// `quality` is passed through as the `quality` query parameter
    /// (e.g. `256k`).
    pub fn track_download(&self, id: u64, quality: &str) -> Result<TrackDownload> {
        self.get(
            &format!("catalog/tracks/{id}/download/"),
            &[("quality", quality.to_owned())],
        )
    }
}
