//! Login and token refresh.
//!
//! # Strategies
//!
//! | Strategy                 | Exchange                                                        |
//! |--------------------------|-----------------------------------------------------------------|
//! | `PasswordGrant`          | `POST auth/o/token/` `grant_type=password`                      |
//! | `CookieLogin`            | `POST auth/login/` (JSON) → `sessionid` cookie                  |
//! | `AuthorizationCodeGrant` | cookie login → `GET auth/o/authorize/` (no redirect) → `POST auth/o/token/` `grant_type=authorization_code` |
//! | `EmbedToken`             | none, the deployment supplies the bearer token                  |
//!
//! Token endpoint success response:
//!
//! ```json
//! { "access_token": "...", "refresh_token": "...", "expires_in": 36000, "token_type": "Bearer" }
//! ```
//!
//! Failure response (HTTP 400/401):
//!
//! ```json
//! { "error": "invalid_grant", "error_description": "Invalid credentials given." }
//! ```

use crate::client::{BeatportClient, check_status};
use crate::error::{BeatportError, Result};
use crate::session::CredentialBundle;
use crate::types::Account;
use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

const TOKEN_ENDPOINT: &str = "auth/o/token/";
const LOGIN_ENDPOINT: &str = "auth/login/";
const AUTHORIZE_ENDPOINT: &str = "auth/o/authorize/";
const INTROSPECT_ENDPOINT: &str = "auth/o/introspect/";
const SESSION_COOKIE: &str = "sessionid";

/// How credentials are obtained for a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// OAuth2 resource-owner password grant.
    PasswordGrant,
    /// Browser-style login; the session is the `sessionid` cookie.
    CookieLogin,
    /// Cookie login followed by an authorization-code exchange.
    AuthorizationCodeGrant {
        /// Redirect URI registered for the client id.
        redirect_uri: String,
    },
    /// A fixed bearer token handed to the deployment. Cannot be refreshed.
    EmbedToken {
        /// The bearer token.
        token: String,
    },
}

/// Where the session stands relative to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
    Expired,
}

impl AuthState {
    /// Classify `bundle` at `now`.
    pub fn of(bundle: &CredentialBundle, now: DateTime<Utc>) -> Self {
        if !bundle.has_credentials() {
            Self::Unauthenticated
        } else if bundle.is_expired_at(now) {
            Self::Expired
        } else {
            Self::Authenticated
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Debug, Default, Deserialize)]
struct OAuthError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl BeatportClient {
    /// Current state of the held session.
    pub fn auth_state(&self) -> AuthState {
        AuthState::of(self.store.bundle(), Utc::now())
    }

    /// Log in with the configured [`AuthStrategy`].
    ///
    /// On success the session is replaced and the new bundle returned; the
    /// host should persist [`SessionStore::snapshot`](crate::SessionStore::snapshot).
    /// On failure the held session is left untouched.
    ///
    /// # Errors
    ///
    /// - [`BeatportError::Auth`]: the backend rejected the credentials
    /// - [`BeatportError::Http`]: network failure
    pub fn login(&mut self, username: &str, password: &str) -> Result<CredentialBundle> {
        info!("logging in to Beatport as {username}");
        let bundle = match self.config.strategy.clone() {
            AuthStrategy::PasswordGrant => {
                let token = self.exchange(&[
                    ("client_id", self.config.client_id.as_str()),
                    ("username", username),
                    ("password", password),
                    ("grant_type", "password"),
                ])?;
                bundle_from_token(token, None, None)
            }
            AuthStrategy::CookieLogin => CredentialBundle {
                session_cookie: Some(self.cookie_login(username, password)?),
                ..CredentialBundle::default()
            },
            AuthStrategy::AuthorizationCodeGrant { redirect_uri } => {
                let cookie = self.cookie_login(username, password)?;
                let code = self.authorization_code(&cookie, &redirect_uri)?;
                let token = self.exchange(&[
                    ("client_id", self.config.client_id.as_str()),
                    ("code", code.as_str()),
                    ("grant_type", "authorization_code"),
                    ("redirect_uri", redirect_uri.as_str()),
                ])?;
                bundle_from_token(token, None, Some(cookie))
            }
            AuthStrategy::EmbedToken { token } => CredentialBundle {
                access_token: Some(token),
                ..CredentialBundle::default()
            },
        };
        debug!("login succeeded, token expires at {:?}", bundle.expires_at);
        self.store.replace(bundle.clone());
        Ok(bundle)
    }

    /// Exchange the held refresh token for a new bundle.
    ///
    /// # Errors
    ///
    /// - [`BeatportError::NotLoggedIn`]: no refresh token is held
    /// - [`BeatportError::Auth`]: rejected; check
    ///   [`is_invalid_grant`](BeatportError::is_invalid_grant) to decide
    ///   whether to log in again
    pub fn refresh(&mut self) -> Result<CredentialBundle> {
        debug!("access token expired, refreshing");
        if let AuthStrategy::EmbedToken { .. } = self.config.strategy {
            return Err(BeatportError::Auth {
                code: None,
                message: "embedded tokens cannot be refreshed".into(),
            });
        }
        let current = self.store.bundle().clone();
        let refresh_token = current.refresh_token.ok_or(BeatportError::NotLoggedIn)?;
        let token = self.exchange(&[
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])?;
        let bundle = bundle_from_token(token, Some(refresh_token), current.session_cookie);
        self.store.replace(bundle.clone());
        Ok(bundle)
    }

    /// Forget the held session.
    pub fn logout(&mut self) {
        debug!("logging out");
        self.store.clear();
    }

    /// Introspect the current token (user and subscription).
    pub fn account(&self) -> Result<Account> {
        self.get(INTROSPECT_ENDPOINT, &[])
    }

    fn exchange(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let body = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let resp = self
            .http
            .post(self.url(TOKEN_ENDPOINT))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()?;
        let status = resp.status();
        let text = resp.text()?;
        if status.as_u16() != 200 {
            return Err(auth_error(&text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Browser-style login, returning the `sessionid` cookie value.
    fn cookie_login(&self, username: &str, password: &str) -> Result<String> {
        let resp = self
            .http
            .post(self.url(LOGIN_ENDPOINT))
            .json(&json!({ "username": username, "password": password }))
            .send()?;
        if !resp.status().is_success() {
            return Err(auth_error(&resp.text().unwrap_or_default()));
        }
        resp.cookies()
            .find(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
            .map(|c| c.value().to_owned())
            .ok_or_else(|| BeatportError::Auth {
                code: None,
                message: "login response did not set a session cookie".into(),
            })
    }

    /// Call the authorize endpoint without following the redirect and pull
    /// the `code` out of its `Location`.
    fn authorization_code(&self, cookie: &str, redirect_uri: &str) -> Result<String> {
        let resp = self
            .no_redirect
            .get(self.url(AUTHORIZE_ENDPOINT))
            .query(&[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", redirect_uri),
            ])
            .header(reqwest::header::COOKIE, format!("{SESSION_COOKIE}={cookie}"))
            .send()?;
        if !resp.status().is_redirection() {
            check_status(resp)?;
            return Err(BeatportError::Other("authorize did not redirect".into()));
        }
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| BeatportError::Other("authorize redirect has no location".into()))?;
        code_from_location(&self.config.base_url, location)
            .ok_or_else(|| BeatportError::Other(format!("no authorization code in {location}")))
    }
}

fn bundle_from_token(
    token: TokenResponse,
    previous_refresh: Option<String>,
    session_cookie: Option<String>,
) -> CredentialBundle {
    CredentialBundle {
        access_token: Some(token.access_token),
        refresh_token: token.refresh_token.or(previous_refresh),
        session_cookie,
        expires_at: Some(Utc::now() + Duration::seconds(token.expires_in)),
    }
}

fn auth_error(body: &str) -> BeatportError {
    let parsed: OAuthError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error_description
        .or(parsed.detail)
        .or_else(|| parsed.error.clone())
        .unwrap_or_else(|| body.to_owned());
    BeatportError::Auth {
        code: parsed.error,
        message,
    }
}

fn code_from_location(base_url: &str, location: &str) -> Option<String> {
    let url = Url::parse(base_url).ok()?.join(location).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine() {
        let now = Utc::now();
        assert_eq!(
            AuthState::of(&CredentialBundle::default(), now),
            AuthState::Unauthenticated
        );

        let mut bundle = CredentialBundle {
            access_token: Some("a".into()),
            refresh_token: Some("r".into()),
            expires_at: Some(now + Duration::hours(1)),
            ..Default::default()
        };
        assert_eq!(AuthState::of(&bundle, now), AuthState::Authenticated);

        bundle.expires_at = Some(now - Duration::seconds(1));
        assert_eq!(AuthState::of(&bundle, now), AuthState::Expired);
    }

    #[test]
    fn cookie_only_session_is_authenticated() {
        let bundle = CredentialBundle {
            session_cookie: Some("s".into()),
            ..Default::default()
        };
        assert_eq!(AuthState::of(&bundle, Utc::now()), AuthState::Authenticated);
    }

    #[test]
    fn auth_error_prefers_description() {
        let err = auth_error(r#"{"error":"invalid_grant","error_description":"Invalid credentials given."}"#);
        match err {
            BeatportError::Auth { code, message } => {
                assert_eq!(code.as_deref(), Some("invalid_grant"));
                assert_eq!(message, "Invalid credentials given.");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn auth_error_falls_back_to_body() {
        let err = auth_error("<html>bad gateway</html>");
        assert!(matches!(err, BeatportError::Auth { code: None, ref message } if message.contains("bad gateway")));
    }

    #[test]
    fn parses_code_from_relative_and_absolute_location() {
        let base = "https://api.beatport.com/v4/";
        assert_eq!(
            code_from_location(base, "/v4/auth/o/post-message/?code=XYZ").as_deref(),
            Some("XYZ")
        );
        assert_eq!(
            code_from_location(base, "https://example.com/cb?state=1&code=abc").as_deref(),
            Some("abc")
        );
        assert!(code_from_location(base, "/v4/somewhere/").is_none());
    }

    #[test]
    fn refresh_keeps_previous_refresh_token_when_omitted() {
        let token = TokenResponse {
            access_token: "new".into(),
            refresh_token: None,
            expires_in: 600,
        };
        let bundle = bundle_from_token(token, Some("old-refresh".into()), None);
        assert_eq!(bundle.refresh_token.as_deref(), Some("old-refresh"));
        assert!(bundle.expires_at.is_some_and(|t| t > Utc::now()));
    }
}
