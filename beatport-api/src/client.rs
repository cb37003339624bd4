//! HTTP client for the Beatport v4 REST API.
//!
//! Every catalog request is a `GET` under `{base_url}catalog/...` carrying
//! `Authorization: Bearer <access_token>` (and the `sessionid` cookie when
//! the session came from a browser-style login).
//!
//! # Status mapping
//!
//! | Status          | Result                                   |
//! |-----------------|------------------------------------------|
//! | 200, 201, 202   | JSON body                                |
//! | 401             | [`BeatportError::AuthExpired`]           |
//! | 403 + territory | [`BeatportError::RegionLocked`]          |
//! | anything else   | [`BeatportError::Request`]               |

use crate::auth::AuthStrategy;
use crate::error::{BeatportError, Result};
use crate::session::SessionStore;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Production API root. Endpoints are joined without a leading slash.
pub const API_URL: &str = "https://api.beatport.com/v4/";
/// Public client id of the Beatport Android app.
pub const CLIENT_ID: &str = "nBQh4XCUqE0cpoy609mC8GoyjCcJHBwbI374FYmE";
const USER_AGENT: &str = concat!("beatport-api/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`BeatportClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, with a trailing slash.
    pub base_url: String,
    /// OAuth2 client id.
    pub client_id: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// How `login` obtains credentials.
    pub strategy: AuthStrategy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_URL.to_owned(),
            client_id: CLIENT_ID.to_owned(),
            timeout: Duration::from_secs(30),
            strategy: AuthStrategy::PasswordGrant,
        }
    }
}

impl ClientConfig {
    /// Default config against another API root (a mock server in tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            ..Self::default()
        }
    }
}

/// Blocking HTTP client for the Beatport API.
///
/// Holds two [`reqwest::blocking::Client`]s (one following redirects, one
/// not, for the authorization-code request), the [`ClientConfig`] and the
/// [`SessionStore`]. API methods are implemented in separate modules
/// (`auth`, `catalog`, `paginate`) as `impl BeatportClient` blocks.
pub struct BeatportClient {
    pub(crate) http: Client,
    pub(crate) no_redirect: Client,
    pub(crate) config: ClientConfig,
    pub(crate) store: SessionStore,
}

impl BeatportClient {
    /// Create a client against the production API with an empty session.
    pub fn new() -> Result<Self> {
        Self::with_session(ClientConfig::default(), SessionStore::default())
    }

    /// Create a client with an explicit config and a previously persisted
    /// [`SessionStore`].
    pub fn with_session(config: ClientConfig, store: SessionStore) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        let no_redirect = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self {
            http,
            no_redirect,
            config,
            store,
        })
    }

    /// Return a reference to the current session.
    pub fn session(&self) -> &SessionStore {
        &self.store
    }

    /// Return the active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.config.base_url)
    }

    /// Attach the bearer token and session cookie, if any.
    pub(crate) fn authorize(&self, mut req: RequestBuilder) -> RequestBuilder {
        let bundle = self.store.bundle();
        if let Some(token) = bundle.access_token.as_deref() {
            req = req.bearer_auth(token);
        }
        if let Some(cookie) = bundle.cookie_header() {
            req = req.header(reqwest::header::COOKIE, cookie);
        }
        req
    }

    /// Send an authenticated `GET` to `endpoint` and decode the JSON body.
    ///
    /// `endpoint` is relative to the API root, e.g. `catalog/tracks/1/`.
    pub fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T> {
        if !self.store.bundle().has_credentials() {
            return Err(BeatportError::NotLoggedIn);
        }
        debug!("GET {endpoint} {query:?}");
        let req = self.authorize(self.http.get(self.url(endpoint)).query(query));
        let resp = check_status(req.send()?)?;
        Ok(resp.json()?)
    }

    /// Download a file from `url` and write it to `dest`.
    ///
    /// Used for track MP4 files and cover images. Returns the number of
    /// bytes written.
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let resp = check_status(self.http.get(url).send()?)?;
        let bytes = resp.bytes()?;
        let mut file = File::create(dest)?;
        file.write_all(&bytes)?;
        Ok(bytes.len() as u64)
    }
}

/// Pass 200/201/202 responses through, map everything else.
pub(crate) fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status().as_u16();
    if matches!(status, 200..=202) {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(BeatportError::from_status(status, body))
}
