//! Session store: the credential bundle and its persisted form.
//!
//! The host owns persistence. It hands the store a flat string map at
//! startup and asks for a [`snapshot`](SessionStore::snapshot) after every
//! login or refresh. Which keys end up in that map is decided by the host
//! through the [`SessionField`] list, e.g.:
//!
//! ```json
//! {
//!   "access_token": "eyJ0eXAiOi...",
//!   "refresh_token": "8Zk1...",
//!   "expires": "2026-10-18T12:00:00+00:00"
//! }
//! ```

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::warn;

/// Flat key/value form of a session, as stored by the host.
///
/// A `None` value means "clear this key".
pub type PersistedSession = BTreeMap<String, Option<String>>;

/// Credentials obtained from a login or refresh exchange.
///
/// If `refresh_token` came from a login or refresh, `expires_at` is set too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialBundle {
    /// Bearer token sent on catalog calls.
    pub access_token: Option<String>,
    /// OAuth2 refresh token.
    pub refresh_token: Option<String>,
    /// `sessionid` cookie from a browser-style login.
    pub session_cookie: Option<String>,
    /// Access token expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CredentialBundle {
    /// Whether the access token is past its expiry at `now`.
    ///
    /// Strict comparison with no grace window: exactly at `expires_at` the
    /// token still counts as valid. A bundle without expiry never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| now > expires)
    }

    /// [`is_expired_at`](Self::is_expired_at) against the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether any credential at all is held.
    pub fn has_credentials(&self) -> bool {
        self.refresh_token.is_some() || self.session_cookie.is_some() || self.access_token.is_some()
    }

    /// `Cookie` header value for cookie-based sessions.
    pub fn cookie_header(&self) -> Option<String> {
        let cookie = self.session_cookie.as_deref()?;
        Some(format!("sessionid={cookie}"))
    }
}

/// A persisted session key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionField {
    AccessToken,
    RefreshToken,
    SessionCookie,
    ExpiresAt,
}

impl SessionField {
    /// Every field, in persistence order.
    pub const ALL: [SessionField; 4] = [
        Self::AccessToken,
        Self::RefreshToken,
        Self::SessionCookie,
        Self::ExpiresAt,
    ];

    /// Key under which the host stores this field.
    pub fn key(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::SessionCookie => "session_cookie",
            Self::ExpiresAt => "expires",
        }
    }
}

/// Holds the current [`CredentialBundle`] and the set of fields the host
/// persists.
#[derive(Debug, Clone)]
pub struct SessionStore {
    bundle: CredentialBundle,
    fields: Vec<SessionField>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionField::ALL.to_vec())
    }
}

impl SessionStore {
    /// Empty store persisting `fields`.
    pub fn new(fields: Vec<SessionField>) -> Self {
        Self {
            bundle: CredentialBundle::default(),
            fields,
        }
    }

    /// Rebuild a store from what the host persisted.
    ///
    /// Only `fields` are read. Missing keys, `None` values and unparsable
    /// timestamps all become absent; loading never fails.
    pub fn load(fields: Vec<SessionField>, persisted: &PersistedSession) -> Self {
        let mut bundle = CredentialBundle::default();
        for field in &fields {
            let Some(value) = persisted.get(field.key()).cloned().flatten() else {
                continue;
            };
            match field {
                SessionField::AccessToken => bundle.access_token = Some(value),
                SessionField::RefreshToken => bundle.refresh_token = Some(value),
                SessionField::SessionCookie => bundle.session_cookie = Some(value),
                SessionField::ExpiresAt => match DateTime::parse_from_rfc3339(&value) {
                    Ok(ts) => bundle.expires_at = Some(ts.with_timezone(&Utc)),
                    Err(e) => warn!("ignoring unparsable session expiry {value:?}: {e}"),
                },
            }
        }
        Self { bundle, fields }
    }

    /// Exactly the configured fields, absent ones as `None`.
    pub fn snapshot(&self) -> PersistedSession {
        self.fields
            .iter()
            .map(|field| {
                let value = match field {
                    SessionField::AccessToken => self.bundle.access_token.clone(),
                    SessionField::RefreshToken => self.bundle.refresh_token.clone(),
                    SessionField::SessionCookie => self.bundle.session_cookie.clone(),
                    SessionField::ExpiresAt => self.bundle.expires_at.map(|ts| ts.to_rfc3339()),
                };
                (field.key().to_owned(), value)
            })
            .collect()
    }

    /// Current credentials.
    pub fn bundle(&self) -> &CredentialBundle {
        &self.bundle
    }

    /// Fields the host persists.
    pub fn fields(&self) -> &[SessionField] {
        &self.fields
    }

    /// Replace the credentials after a login or refresh.
    pub fn replace(&mut self, bundle: CredentialBundle) {
        self.bundle = bundle;
    }

    /// Forget all credentials.
    pub fn clear(&mut self) {
        self.bundle = CredentialBundle::default();
    }
}
