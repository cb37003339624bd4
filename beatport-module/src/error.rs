//! Errors surfaced by the module.

use beatport_api::BeatportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModuleError {
    /// Failure reported by the API client.
    #[error(transparent)]
    Api(#[from] BeatportError),
    /// A failure surfaced to the host (already passed to its error reporter).
    #[error("Beatport: {0}")]
    Module(String),
    #[error("unsupported URL: {0}")]
    UnsupportedUrl(String),
    /// The host could not persist temporary settings.
    #[error("failed to persist settings: {0}")]
    Settings(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ModuleError>;
