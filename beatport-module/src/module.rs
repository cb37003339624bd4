//! The Beatport module: session lifecycle plus entity resolution.
//!
//! Construction loads the persisted session and brings it to a usable
//! state:
//!
//! 1. no credentials → log in with the stored username/password
//! 2. expired → refresh; a rejected refresh token (`invalid_grant`) falls
//!    back to a fresh login
//! 3. unless disabled, check the account has an active subscription (every
//!    login checks it too, including a fallback login mid-session)
//!
//! After every login or refresh the session is written back to the host's
//! temporary settings. A catalog call answered with 401 is retried once
//! after a refresh; a territory restriction never triggers re-login.

use beatport_api::types::{Account, Release, Track};
use beatport_api::{
    AuthState, BeatportClient, BeatportError, DEFAULT_PAGE_SIZE, Listing, PersistedSession,
    SessionStore,
};
use tracing::{debug, info, warn};

use crate::artwork::{DEFAULT_MAX_COVER_SIZE, artwork_url};
use crate::derive::{availability_error, display_name, duration_secs, release_year, total_duration};
use crate::error::{ModuleError, Result};
use crate::host::{ModuleController, TemporarySettings};
use crate::media::DownloadType;
use crate::models::{
    AlbumInfo, ArtistInfo, CoverInfo, ImageFileType, LabelInfo, PlaylistInfo, Preloaded,
    SearchResult, Tags, TrackDownloadInfo, TrackInfo,
};
use crate::quality::{Codec, QualityTier};

/// `quality` parameter of the download endpoint for the 256k MP4.
const DOWNLOAD_QUALITY: &str = "256k";

/// A logged-in Beatport module bound to its host.
pub struct BeatportModule<S> {
    client: BeatportClient,
    controller: ModuleController<S>,
    /// Set while a refresh (or its login fallback) is running.
    renewing: bool,
}

impl<S: TemporarySettings> BeatportModule<S> {
    /// Load the persisted session and make it usable (see module docs).
    pub fn new(controller: ModuleController<S>) -> Result<Self> {
        let fields = controller.options.session_fields.clone();
        let persisted: PersistedSession = fields
            .iter()
            .map(|f| (f.key().to_owned(), controller.temporary_settings.read(f.key())))
            .collect();
        let store = SessionStore::load(fields, &persisted);
        let client = BeatportClient::with_session(controller.client_config.clone(), store)?;
        let mut module = Self {
            client,
            controller,
            renewing: false,
        };

        let checked = match module.client.auth_state() {
            AuthState::Unauthenticated => {
                debug!("no session found, logging in");
                module.login()?;
                true
            }
            AuthState::Expired => module.renew_session()?,
            AuthState::Authenticated => {
                debug!("reusing persisted session");
                false
            }
        };
        if !checked {
            module.valid_account()?;
        }
        Ok(module)
    }

    /// The underlying API client.
    pub fn client(&self) -> &BeatportClient {
        &self.client
    }

    /// The host's temporary settings, as last written by the module.
    pub fn temporary_settings(&self) -> &S {
        &self.controller.temporary_settings
    }

    /// Log in with the stored credentials, persist the new session and check
    /// the subscription.
    pub fn login(&mut self) -> Result<()> {
        let username = self.controller.module_settings.username.clone();
        let password = self.controller.module_settings.password.clone();
        match self.client.login(&username, &password) {
            Ok(_) => self.persist_session()?,
            Err(BeatportError::Auth { message, .. }) => return Err(self.fail(message)),
            Err(e) => return Err(e.into()),
        }
        self.valid_account()
    }

    /// Refresh the access token, logging in again if the refresh token
    /// itself is no longer accepted.
    pub fn refresh_session(&mut self) -> Result<()> {
        self.renew_session().map(|_| ())
    }

    /// Require an active subscription unless the host disabled the check.
    pub fn valid_account(&mut self) -> Result<()> {
        if self.controller.options.disable_subscription_check {
            return Ok(());
        }
        let account = self.account()?;
        if account.subscription.is_none() {
            return Err(self.fail("Account does not have an active \"Link\" subscription"));
        }
        Ok(())
    }

    /// The logged-in account (user and subscription).
    pub fn account(&mut self) -> Result<Account> {
        self.call(BeatportClient::account)
    }

    /// Search the catalog and project the hits of one kind.
    pub fn search(
        &mut self,
        query_type: DownloadType,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let results = self.call(|c| c.search(query))?;
        let hits: Vec<SearchResult> = match query_type {
            DownloadType::Track => results.tracks.iter().map(search_track).collect(),
            DownloadType::Album => results.releases.iter().map(search_release).collect(),
            DownloadType::Playlist => results
                .charts
                .iter()
                .map(|chart| SearchResult {
                    result_id: chart.id,
                    name: chart.name.clone(),
                    artists: Some(vec![chart_creator(chart.person.as_ref())]),
                    year: release_year(chart.change_date.as_deref()),
                    duration: None,
                    additional: Vec::new(),
                    preloaded: Preloaded::default(),
                })
                .collect(),
            DownloadType::Artist => results
                .artists
                .iter()
                .map(|artist| named_hit(artist.id, &artist.name))
                .collect(),
            DownloadType::Label => results
                .labels
                .iter()
                .map(|label| named_hit(label.id, &label.name))
                .collect(),
        };
        Ok(hits.into_iter().take(limit).collect())
    }

    /// A DJ chart or user playlist with all of its tracks.
    pub fn get_playlist_info(&mut self, playlist_id: u64, is_chart: bool) -> Result<PlaylistInfo> {
        let mut progress = |done: usize, total: u64| debug!("fetched {done}/{total} tracks");
        let (name, creator, year, cover, tracks, total) = if is_chart {
            let chart = self.call(|c| c.chart(playlist_id))?;
            let listing = Listing::chart_tracks(playlist_id);
            let (tracks, total) = self.call(|c| {
                c.fetch_all_with_total(&listing, DEFAULT_PAGE_SIZE, Some(&mut progress))
            })?;
            let cover = chart
                .image
                .as_ref()
                .and_then(|i| i.best_uri())
                .map(str::to_owned);
            (
                chart.name,
                chart_creator(chart.person.as_ref()),
                release_year(chart.change_date.as_deref()),
                cover,
                tracks,
                total,
            )
        } else {
            let playlist = self.call(|c| c.playlist(playlist_id))?;
            let listing = Listing::playlist_tracks(playlist_id);
            let (entries, total) = self.call(|c| {
                c.fetch_all_with_total(&listing, DEFAULT_PAGE_SIZE, Some(&mut progress))
            })?;
            let tracks: Vec<Track> = entries.into_iter().map(|e| e.track).collect();
            // user playlists only carry fixed-size covers of their releases
            let cover = playlist.release_images.first().cloned();
            (
                playlist.name,
                "User".to_owned(),
                release_year(playlist.updated_date.as_deref()),
                cover,
                tracks,
                total,
            )
        };

        // total_tracks is the size the listing reported, not what was walked
        let mut preloaded = Preloaded::default();
        preloaded.number_tracks(&tracks, u32::try_from(total).ok());

        Ok(PlaylistInfo {
            name,
            creator,
            release_year: year,
            duration: total_duration(&tracks),
            cover_url: cover.map(|url| self.cover(&url)),
            tracks: tracks.iter().map(|t| t.id).collect(),
            preloaded,
        })
    }

    /// An artist with every track they appear on.
    pub fn get_artist_info(&mut self, artist_id: u64) -> Result<ArtistInfo> {
        let artist = self.call(|c| c.artist(artist_id))?;
        let listing = Listing::artist_tracks(artist_id);
        let mut progress = |done: usize, total: u64| debug!("fetched {done}/{total} tracks");
        let tracks =
            self.call(|c| c.fetch_all(&listing, DEFAULT_PAGE_SIZE, Some(&mut progress)))?;

        let mut preloaded = Preloaded::default();
        preloaded
            .tracks
            .extend(tracks.iter().map(|t| (t.id, t.clone())));
        Ok(ArtistInfo {
            name: artist.name,
            tracks: tracks.iter().map(|t| t.id).collect(),
            preloaded,
        })
    }

    /// A label with all of its releases.
    pub fn get_label_info(&mut self, label_id: u64) -> Result<LabelInfo> {
        let label = self.call(|c| c.label(label_id))?;
        let listing = Listing::label_releases(label_id);
        let mut progress = |done: usize, total: u64| debug!("fetched {done}/{total} releases");
        let releases =
            self.call(|c| c.fetch_all(&listing, DEFAULT_PAGE_SIZE, Some(&mut progress)))?;

        let mut preloaded = Preloaded::default();
        preloaded
            .releases
            .extend(releases.iter().map(|r| (r.id, r.clone())));
        Ok(LabelInfo {
            name: label.name,
            albums: releases.iter().map(|r| r.id).collect(),
            preloaded,
        })
    }

    /// A release with all of its tracks, numbered by position.
    pub fn get_album_info(&mut self, album_id: u64, preloaded: Option<&Preloaded>) -> Result<AlbumInfo> {
        let album = match preloaded.and_then(|p| p.releases.get(&album_id)) {
            Some(release) => release.clone(),
            None => self.call(|c| c.release(album_id))?,
        };
        let listing = Listing::release_tracks(album_id);
        let mut progress = |done: usize, total: u64| debug!("fetched {done}/{total} tracks");
        let tracks =
            self.call(|c| c.fetch_all(&listing, DEFAULT_PAGE_SIZE, Some(&mut progress)))?;

        let mut cache = Preloaded::default();
        cache.number_tracks(&tracks, None);
        cache.releases.insert(album_id, album.clone());

        let first_artist = album.artists.first();
        Ok(AlbumInfo {
            release_year: release_year(album.publish_date.as_deref()),
            duration: total_duration(&tracks),
            upc: album.upc.clone(),
            cover_url: album
                .image
                .as_ref()
                .and_then(|i| i.best_uri())
                .map(|url| self.cover(url)),
            artist: first_artist.map(|a| a.name.clone()),
            artist_id: first_artist.map(|a| a.id),
            tracks: tracks.iter().map(|t| t.id).collect(),
            name: album.name,
            preloaded: cache,
        })
    }

    /// Everything needed to tag and download one track.
    ///
    /// Unavailability (not streamable, preorder, region-locked release) is
    /// reported in [`TrackInfo::error`] instead of failing.
    pub fn get_track_info(
        &mut self,
        track_id: u64,
        quality: QualityTier,
        preloaded: Option<&Preloaded>,
    ) -> Result<TrackInfo> {
        let track = self.preloaded_track(track_id, preloaded)?;
        let mut error = None;

        let album = match &track.release {
            Some(release_ref) => match preloaded.and_then(|p| p.releases.get(&release_ref.id)) {
                Some(release) => Some(release.clone()),
                None => match self.call(|c| c.release(release_ref.id)) {
                    Ok(release) => Some(release),
                    Err(ModuleError::Api(e)) if e.is_region_locked() => {
                        warn!("release {} is region locked", release_ref.id);
                        error = Some(format!("Album {} is region locked", release_ref.id));
                        None
                    }
                    Err(e) => return Err(e),
                },
            },
            None => None,
        };

        if let Some(reason) = availability_error(&track) {
            error = Some(reason);
        }

        let position = preloaded.and_then(|p| p.positions.get(&track_id));
        let year = release_year(track.publish_date.as_deref());
        let label = track
            .release
            .as_ref()
            .and_then(|r| r.label.as_ref())
            .map(|l| l.name.as_str());
        let genres = [track.genre.as_ref(), track.sub_genre.as_ref()]
            .into_iter()
            .flatten()
            .map(|g| g.name.clone())
            .collect();

        let tags = Tags {
            album_artist: album
                .as_ref()
                .and_then(|a| a.artists.first())
                .map(|a| a.name.clone()),
            track_number: position.map(|p| p.number).or(track.number),
            total_tracks: position
                .and_then(|p| p.total)
                .or_else(|| album.as_ref().and_then(|a| a.track_count)),
            upc: album.as_ref().and_then(|a| a.upc.clone()),
            isrc: track.isrc.clone(),
            genres,
            release_date: track.publish_date.clone(),
            copyright: label.map(|l| copyright(year.as_deref(), l)),
            bpm: track.bpm,
            key: track.key.as_ref().map(|k| k.name.clone()),
        };

        let cover_url = track_cover(&track).map(|url| self.cover(url));
        Ok(TrackInfo {
            id: track.id,
            name: display_name(&track.name, track.mix_name.as_deref()),
            album: album.as_ref().map(|a| a.name.clone()),
            album_id: album.as_ref().map(|a| a.id),
            artists: track.artists.iter().map(|a| a.name.clone()).collect(),
            artist_id: track.artists.first().map(|a| a.id),
            release_year: year,
            duration: duration_secs(track.length_ms),
            bitrate: quality.bitrate(),
            codec: Codec::Aac,
            cover_url,
            tags,
            quality,
            error,
        })
    }

    /// Cover of a track at `resolution`.
    pub fn get_track_cover(
        &mut self,
        track_id: u64,
        resolution: u32,
        preloaded: Option<&Preloaded>,
    ) -> Result<CoverInfo> {
        let track = self.preloaded_track(track_id, preloaded)?;
        let url = track_cover(&track)
            .ok_or_else(|| self.fail(format!("Track {track_id} has no cover")))?;
        Ok(CoverInfo {
            url: artwork_url(url, resolution, DEFAULT_MAX_COVER_SIZE),
            file_type: ImageFileType::Jpg,
        })
    }

    /// Where to get the audio of a track at `quality`.
    ///
    /// 128 kbps is an HLS manifest the host has to remux; 256 kbps is a
    /// direct MP4 link.
    pub fn get_track_download(&mut self, track_id: u64, quality: QualityTier) -> Result<TrackDownloadInfo> {
        if quality.bitrate() == 128 {
            let stream = self.call(|c| c.track_stream(track_id))?;
            let manifest_url = stream
                .stream_url
                .ok_or_else(|| self.fail("Could not get 128k HLS stream, exiting"))?;
            Ok(TrackDownloadInfo::Remux { manifest_url })
        } else {
            let download = self.call(|c| c.track_download(track_id, DOWNLOAD_QUALITY))?;
            let location = download
                .location
                .ok_or_else(|| self.fail("Could not get 256k MP4 stream, exiting"))?;
            Ok(TrackDownloadInfo::Url(location))
        }
    }

    /// Refresh, falling back to a login. `true` when the fallback ran, which
    /// already checked the subscription.
    fn renew_session(&mut self) -> Result<bool> {
        self.renewing = true;
        let renewed = self.refresh_or_login();
        self.renewing = false;
        renewed
    }

    fn refresh_or_login(&mut self) -> Result<bool> {
        match self.client.refresh() {
            Ok(_) => {
                self.persist_session()?;
                Ok(false)
            }
            Err(e) if e.is_invalid_grant() || matches!(e, BeatportError::NotLoggedIn) => {
                info!("refresh token rejected, logging in again");
                self.login()?;
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run `f`, refreshing once and retrying if the token was rejected.
    fn call<T>(
        &mut self,
        mut f: impl FnMut(&BeatportClient) -> beatport_api::Result<T>,
    ) -> Result<T> {
        match f(&self.client) {
            Err(e) if e.is_auth_expired() && !self.renewing => {
                warn!("access token rejected, refreshing: {e}");
                self.refresh_session()?;
                Ok(f(&self.client)?)
            }
            other => Ok(other?),
        }
    }

    fn preloaded_track(&mut self, track_id: u64, preloaded: Option<&Preloaded>) -> Result<Track> {
        match preloaded.and_then(|p| p.tracks.get(&track_id)) {
            Some(track) => Ok(track.clone()),
            None => self.call(|c| c.track(track_id)),
        }
    }

    fn persist_session(&mut self) -> Result<()> {
        for (key, value) in self.client.session().snapshot() {
            self.controller
                .temporary_settings
                .set(&key, value.as_deref())?;
        }
        Ok(())
    }

    fn cover(&self, url: &str) -> String {
        artwork_url(url, self.controller.options.cover_size, DEFAULT_MAX_COVER_SIZE)
    }

    /// Report `message` to the host and turn it into an error.
    fn fail(&self, message: impl Into<String>) -> ModuleError {
        let message = message.into();
        (self.controller.report_error)(&message);
        ModuleError::Module(message)
    }
}

fn track_cover(track: &Track) -> Option<&str> {
    track.release.as_ref()?.image.as_ref()?.best_uri()
}

fn chart_creator(person: Option<&beatport_api::types::Person>) -> String {
    person
        .and_then(|p| p.owner_name.clone())
        .unwrap_or_else(|| "Beatport".to_owned())
}

fn copyright(year: Option<&str>, label: &str) -> String {
    match year {
        Some(year) => format!("\u{a9} {year} {label}"),
        None => format!("\u{a9} {label}"),
    }
}

fn search_track(track: &Track) -> SearchResult {
    let mut additional = Vec::new();
    if let Some(bpm) = track.bpm {
        additional.push(format!("{bpm}BPM"));
    }
    if track.exclusive {
        additional.push("Exclusive".to_owned());
    }
    let mut preloaded = Preloaded::default();
    preloaded.tracks.insert(track.id, track.clone());
    SearchResult {
        result_id: track.id,
        name: display_name(&track.name, track.mix_name.as_deref()),
        artists: Some(track.artists.iter().map(|a| a.name.clone()).collect()),
        year: release_year(track.publish_date.as_deref()),
        duration: duration_secs(track.length_ms),
        additional,
        preloaded,
    }
}

fn search_release(release: &Release) -> SearchResult {
    let mut preloaded = Preloaded::default();
    preloaded.releases.insert(release.id, release.clone());
    SearchResult {
        result_id: release.id,
        name: release.name.clone(),
        artists: Some(release.artists.iter().map(|a| a.name.clone()).collect()),
        year: release_year(release.publish_date.as_deref()),
        duration: None,
        additional: if release.exclusive {
            vec!["Exclusive".to_owned()]
        } else {
            Vec::new()
        },
        preloaded,
    }
}

fn named_hit(id: u64, name: &str) -> SearchResult {
    SearchResult {
        result_id: id,
        name: name.to_owned(),
        artists: None,
        year: None,
        duration: None,
        additional: Vec::new(),
        preloaded: Preloaded::default(),
    }
}
