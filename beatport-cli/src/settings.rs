//! On-disk configuration and session storage.
//!
//! Both files live under `~/.config/beatdump/`:
//!
//! - `config.json`: account credentials and module options
//! - `session.json`: the persisted session, written by the module after
//!   every login or refresh
//!
//! ```json
//! { "username": "dj", "password": "...", "cover_size": 1400, "auth": { "kind": "password" } }
//! ```

use anyhow::{Context, Result};
use beatport_api::{AuthStrategy, ClientConfig};
use beatport_module::{ModuleOptions, ModuleSettings, TemporarySettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default directory of both files.
pub fn config_dir() -> Result<PathBuf> {
    let config = dirs::config_dir().context("cannot determine config directory")?;
    Ok(config.join("beatdump"))
}

/// Login strategy as written in `config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthConfig {
    #[default]
    Password,
    Cookie,
    AuthorizationCode {
        redirect_uri: String,
    },
    Embed {
        token: String,
    },
}

impl From<AuthConfig> for AuthStrategy {
    fn from(auth: AuthConfig) -> Self {
        match auth {
            AuthConfig::Password => Self::PasswordGrant,
            AuthConfig::Cookie => Self::CookieLogin,
            AuthConfig::AuthorizationCode { redirect_uri } => {
                Self::AuthorizationCodeGrant { redirect_uri }
            }
            AuthConfig::Embed { token } => Self::EmbedToken { token },
        }
    }
}

/// Contents of `config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub username: String,
    pub password: String,
    pub cover_size: Option<u32>,
    pub disable_subscription_check: bool,
    /// Overrides the production API root.
    pub api_url: Option<String>,
    pub auth: AuthConfig,
}

impl Config {
    /// Load `path`, or an empty config if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn module_settings(&self) -> ModuleSettings {
        ModuleSettings {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    pub fn module_options(&self) -> ModuleOptions {
        let defaults = ModuleOptions::default();
        ModuleOptions {
            disable_subscription_check: self.disable_subscription_check,
            cover_size: self.cover_size.unwrap_or(defaults.cover_size),
            ..defaults
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut config = match &self.api_url {
            Some(url) => ClientConfig::with_base_url(url),
            None => ClientConfig::default(),
        };
        config.strategy = self.auth.clone().into();
        config
    }
}

/// [`TemporarySettings`] backed by a JSON file, rewritten on every change.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileSettings {
    /// Load `path`; a missing file is an empty session.
    pub fn load(path: PathBuf) -> Result<Self> {
        let values = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("invalid session file {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    /// Delete the session file.
    pub fn clear(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.values)?)
    }
}

impl TemporarySettings for FileSettings {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Option<&str>) -> io::Result<()> {
        match value {
            Some(v) => self.values.insert(key.to_owned(), v.to_owned()),
            None => self.values.remove(key),
        };
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("beatdump-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn file_settings_survive_reload() {
        let path = temp_path("session.json");
        FileSettings::clear(&path).unwrap();

        let mut settings = FileSettings::load(path.clone()).unwrap();
        settings.set("access_token", Some("tok")).unwrap();
        settings.set("refresh_token", Some("ref")).unwrap();
        settings.set("refresh_token", None).unwrap();

        let reloaded = FileSettings::load(path.clone()).unwrap();
        assert_eq!(reloaded.read("access_token").as_deref(), Some("tok"));
        assert!(reloaded.read("refresh_token").is_none());

        FileSettings::clear(&path).unwrap();
        assert!(FileSettings::load(path).unwrap().read("access_token").is_none());
    }

    #[test]
    fn config_defaults_to_password_grant() {
        let config: Config = serde_json::from_str(r#"{"username":"dj","password":"pw"}"#).unwrap();
        assert_eq!(config.client_config().strategy, AuthStrategy::PasswordGrant);
        assert_eq!(config.module_options().cover_size, 1400);
    }

    #[test]
    fn config_reads_embed_strategy() {
        let config: Config =
            serde_json::from_str(r#"{"auth":{"kind":"embed","token":"abc"}}"#).unwrap();
        assert_eq!(
            config.client_config().strategy,
            AuthStrategy::EmbedToken { token: "abc".into() }
        );
    }
}
