//! Host-facing Beatport module.
//!
//! Wraps [`beatport_api`] in the contract a download host expects: the host
//! injects a [`ModuleController`] (temporary settings, credentials, options,
//! error reporter) and gets back normalized projections of tracks, albums,
//! playlists, artists and labels.
//!
//! ```no_run
//! use beatport_module::{BeatportModule, MemorySettings, ModuleController, ModuleSettings, QualityTier, parse_url};
//!
//! let controller = ModuleController::new(
//!     MemorySettings::new(),
//!     ModuleSettings { username: "dj".into(), password: "secret".into() },
//! );
//! let mut module = BeatportModule::new(controller).unwrap();
//! let media = parse_url("https://www.beatport.com/track/darkside/10844269").unwrap();
//! let info = module.get_track_info(media.media_id, QualityTier::High, None).unwrap();
//! println!("{} {:?}", info.name, info.error);
//! ```

pub mod artwork;
pub mod derive;
pub mod error;
pub mod host;
pub mod media;
pub mod models;
mod module;
pub mod quality;

pub use artwork::{DEFAULT_MAX_COVER_SIZE, artwork_url};
pub use error::{ModuleError, Result};
pub use host::{
    ErrorReporter, MemorySettings, ModuleController, ModuleOptions, ModuleSettings,
    TemporarySettings,
};
pub use media::{DownloadType, MediaIdentification, parse_url};
pub use models::{
    AlbumInfo, ArtistInfo, CoverInfo, ImageFileType, LabelInfo, PlaylistInfo, Preloaded,
    SearchResult, Tags, TrackDownloadInfo, TrackInfo, TrackPosition,
};
pub use module::BeatportModule;
pub use quality::{Codec, QualityTier};
