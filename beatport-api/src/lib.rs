//! Beatport v4 API client library.
//!
//! Provides blocking, authenticated access to the Beatport catalog: session
//! handling, login/refresh, typed entity lookups and paginated listings.
//!
//! # Authentication
//!
//! The client holds a [`SessionStore`]. The host loads it from whatever it
//! persisted last time and saves [`SessionStore::snapshot`] after every
//! [`login`](BeatportClient::login) or [`refresh`](BeatportClient::refresh).
//!
//! ```no_run
//! use beatport_api::{BeatportClient, ClientConfig, SessionStore};
//!
//! let mut client = BeatportClient::with_session(ClientConfig::default(), SessionStore::default()).unwrap();
//! client.login("user@example.com", "hunter2").unwrap();
//! let track = client.track(10844269).unwrap();
//! println!("{}", track.name);
//! ```
//!
//! # API endpoint mapping
//!
//! | Method                              | Endpoint                        | Description            |
//! |-------------------------------------|---------------------------------|------------------------|
//! | [`BeatportClient::login`]           | `auth/o/token/`, `auth/login/`  | Obtain credentials     |
//! | [`BeatportClient::refresh`]         | `auth/o/token/`                 | Refresh access token   |
//! | [`BeatportClient::account`]         | `auth/o/introspect/`            | Subscription check     |
//! | [`BeatportClient::track`]           | `catalog/tracks/{id}/`          | Track metadata         |
//! | [`BeatportClient::release`]         | `catalog/releases/{id}/`        | Release metadata       |
//! | [`BeatportClient::fetch_all`]       | `catalog/*/{id}/tracks/`        | Paginated listings     |
//! | [`BeatportClient::search`]          | `catalog/search/`               | Search everything      |
//! | [`BeatportClient::track_stream`]    | `catalog/tracks/{id}/stream/`   | 128k HLS manifest      |
//! | [`BeatportClient::track_download`]  | `catalog/tracks/{id}/download/` | 256k MP4 link          |

pub mod auth;
mod catalog;
pub mod client;
pub mod error;
pub mod paginate;
pub mod session;
pub mod types;

pub use auth::{AuthState, AuthStrategy};
pub use client::{BeatportClient, ClientConfig};
pub use error::{BeatportError, Result};
pub use paginate::{DEFAULT_PAGE_SIZE, Listing, PageRequest, PageResult};
pub use session::{CredentialBundle, PersistedSession, SessionField, SessionStore};
