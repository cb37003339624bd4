//! What the host hands the module at construction.
//!
//! The module never reaches into global state: settings storage, the user's
//! credentials, display options and error reporting all come in through
//! [`ModuleController`].

use beatport_api::{ClientConfig, SessionField};
use std::collections::BTreeMap;
use std::io;

use crate::artwork::DEFAULT_MAX_COVER_SIZE;

/// Key/value store the host persists between runs (the session lives here).
pub trait TemporarySettings {
    fn read(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`; `None` removes the key.
    fn set(&mut self, key: &str, value: Option<&str>) -> io::Result<()>;
}

/// In-memory [`TemporarySettings`], for hosts that persist elsewhere and for
/// tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySettings {
    values: BTreeMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl TemporarySettings for MemorySettings {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Option<&str>) -> io::Result<()> {
        match value {
            Some(v) => self.values.insert(key.to_owned(), v.to_owned()),
            None => self.values.remove(key),
        };
        Ok(())
    }
}

/// Per-user settings (`username`, `password`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSettings {
    pub username: String,
    pub password: String,
}

/// Host-wide options relevant to this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOptions {
    /// Skip the "active Link subscription" check after login.
    pub disable_subscription_check: bool,
    /// Default cover resolution, in pixels.
    pub cover_size: u32,
    /// Session keys the host persists.
    pub session_fields: Vec<SessionField>,
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self {
            disable_subscription_check: false,
            cover_size: DEFAULT_MAX_COVER_SIZE,
            session_fields: SessionField::ALL.to_vec(),
        }
    }
}

/// Callback receiving every error message the module surfaces.
pub type ErrorReporter = Box<dyn Fn(&str)>;

/// Everything the host injects into [`BeatportModule`](crate::BeatportModule).
pub struct ModuleController<S> {
    pub temporary_settings: S,
    pub module_settings: ModuleSettings,
    pub options: ModuleOptions,
    /// API root, client id, timeout and auth strategy of this deployment.
    pub client_config: ClientConfig,
    pub report_error: ErrorReporter,
}

impl<S: TemporarySettings> ModuleController<S> {
    pub fn new(temporary_settings: S, module_settings: ModuleSettings) -> Self {
        Self {
            temporary_settings,
            module_settings,
            options: ModuleOptions::default(),
            client_config: ClientConfig::default(),
            report_error: Box::new(|_| {}),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ModuleOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_client_config(mut self, client_config: ClientConfig) -> Self {
        self.client_config = client_config;
        self
    }

    #[must_use]
    pub fn with_error_reporter(mut self, report_error: impl Fn(&str) + 'static) -> Self {
        self.report_error = Box::new(report_error);
        self
    }
}
