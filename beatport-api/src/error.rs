//! Error types for the Beatport API client.

use thiserror::Error;

/// Marker the catalog puts in a 403 body when a resource is geo-blocked.
pub(crate) const TERRITORY_MARKER: &str = "Territory Restricted.";

/// Errors that can occur when interacting with the Beatport API.
#[derive(Debug, Error)]
pub enum BeatportError {
    /// HTTP transport error (connection refused, timeout, TLS failure, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A login or refresh exchange was rejected by the token endpoint.
    ///
    /// `code` is the OAuth2 `error` field (e.g. `invalid_grant`), `message`
    /// the human-readable `error_description` when the backend sends one.
    #[error("authentication failed: {message}")]
    Auth {
        /// OAuth2 error code, if the response carried one.
        code: Option<String>,
        /// Message from the backend.
        message: String,
    },

    /// The access token was rejected mid-request (HTTP 401).
    ///
    /// The caller is expected to refresh and retry once.
    #[error("access token expired or invalid: {0}")]
    AuthExpired(String),

    /// The resource is not available in the account's territory (HTTP 403
    /// carrying `Territory Restricted.`). Not a token problem.
    #[error("resource is region locked: {0}")]
    RegionLocked(String),

    /// Any other non-success status.
    #[error("request failed (HTTP {status}): {message}")]
    Request {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        message: String,
    },

    /// No credentials are held. Call `login` first.
    #[error("not logged in")]
    NotLoggedIn,

    /// File I/O error (download write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a JSON response from the API.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors (e.g. a missing redirect code).
    #[error("{0}")]
    Other(String),
}

impl BeatportError {
    /// Map a non-success catalog response to the error taxonomy.
    ///
    /// | Status | Body                      | Variant          |
    /// |--------|---------------------------|------------------|
    /// | 401    | any                       | `AuthExpired`    |
    /// | 403    | contains territory marker | `RegionLocked`   |
    /// | other  | any                       | `Request`        |
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Self::AuthExpired(body),
            403 if body.contains(TERRITORY_MARKER) => Self::RegionLocked(body),
            _ => Self::Request {
                status,
                message: body,
            },
        }
    }

    /// Whether the token endpoint rejected the refresh token itself.
    ///
    /// When true the only recovery is a fresh login with stored credentials.
    pub fn is_invalid_grant(&self) -> bool {
        matches!(self, Self::Auth { code: Some(code), .. } if code == "invalid_grant")
    }

    /// Whether this is a mid-request token rejection.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired(_))
    }

    /// Whether this is a territory restriction.
    pub fn is_region_locked(&self) -> bool {
        matches!(self, Self::RegionLocked(_))
    }
}

/// Convenience alias for `Result<T, BeatportError>`.
pub type Result<T> = std::result::Result<T, BeatportError>;
