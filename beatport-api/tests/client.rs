//! Blocking client against a local mock of the Beatport API.

use beatport_api::{
    AuthState, AuthStrategy, BeatportClient, BeatportError, ClientConfig, CredentialBundle,
    Listing, PageRequest, SessionStore,
};
use chrono::{Duration, Utc};
use mockito::{Matcher, Server};
use serde_json::json;

fn authed_client(server: &Server) -> BeatportClient {
    let mut store = SessionStore::default();
    store.replace(CredentialBundle {
        access_token: Some("tok".into()),
        refresh_token: Some("ref".into()),
        session_cookie: None,
        expires_at: Some(Utc::now() + Duration::hours(1)),
    });
    BeatportClient::with_session(ClientConfig::with_base_url(server.url()), store).unwrap()
}

fn anonymous_client(server: &Server, strategy: AuthStrategy) -> BeatportClient {
    let config = ClientConfig {
        strategy,
        ..ClientConfig::with_base_url(server.url())
    };
    BeatportClient::with_session(config, SessionStore::default()).unwrap()
}

fn tracks_page(ids: std::ops::Range<u64>, count: u64) -> String {
    let results: Vec<_> = ids.map(|id| json!({ "id": id, "name": format!("Track {id}") })).collect();
    json!({ "count": count, "results": results }).to_string()
}

fn page_query(page: u32) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("page".into(), page.to_string()),
        Matcher::UrlEncoded("per_page".into(), "100".into()),
    ])
}

#[test]
fn fetch_all_walks_every_page_in_order() {
    let mut server = Server::new();
    let pages: Vec<_> = [(1, 0..100), (2, 100..200), (3, 200..250)]
        .into_iter()
        .map(|(page, ids)| {
            server
                .mock("GET", "/catalog/releases/7/tracks/")
                .match_query(page_query(page))
                .match_header("authorization", "Bearer tok")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(tracks_page(ids, 250))
                .expect(1)
                .create()
        })
        .collect();

    let client = authed_client(&server);
    let tracks = client
        .fetch_all(&Listing::release_tracks(7), 100, None)
        .unwrap();

    for page in &pages {
        page.assert();
    }
    assert_eq!(tracks.len(), 250);
    assert_eq!(tracks.first().map(|t| t.id), Some(0));
    assert_eq!(tracks.last().map(|t| t.id), Some(249));
    assert!(tracks.windows(2).all(|w| w[0].id < w[1].id));
}

#[test]
fn fetch_all_with_zero_total_calls_once() {
    let mut server = Server::new();
    let first = server
        .mock("GET", "/catalog/charts/3/tracks/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "count": 0, "results": [] }).to_string())
        .expect(1)
        .create();

    let client = authed_client(&server);
    let tracks = client.fetch_all(&Listing::chart_tracks(3), 100, None).unwrap();

    first.assert();
    assert!(tracks.is_empty());
}

#[test]
fn playlist_entries_are_unwrapped_by_type() {
    let mut server = Server::new();
    let _m = server
        .mock("GET", "/catalog/playlists/9/tracks/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "count": 1,
                "results": [{ "id": 1, "position": 1, "track": { "id": 55, "name": "Inner" } }]
            })
            .to_string(),
        )
        .create();

    let client = authed_client(&server);
    let entries = client
        .fetch_page(&Listing::playlist_tracks(9), PageRequest::default())
        .unwrap();
    assert_eq!(entries.total_count, Some(1));
    assert_eq!(entries.items[0].track.id, 55);
}

#[test]
fn unauthorized_is_auth_expired() {
    let mut server = Server::new();
    let _m = server
        .mock("GET", "/catalog/tracks/1/")
        .with_status(401)
        .with_body(r#"{"detail":"Authentication credentials were not provided."}"#)
        .create();

    let err = authed_client(&server).track(1).unwrap_err();
    assert!(err.is_auth_expired(), "{err:?}");
}

#[test]
fn territory_restriction_is_region_locked() {
    let mut server = Server::new();
    let _m = server
        .mock("GET", "/catalog/releases/2/")
        .with_status(403)
        .with_body(r#"{"detail":"Territory Restricted."}"#)
        .create();

    let err = authed_client(&server).release(2).unwrap_err();
    assert!(err.is_region_locked(), "{err:?}");
    assert!(!err.is_auth_expired());
}

#[test]
fn other_failures_are_request_errors() {
    let mut server = Server::new();
    let _m = server
        .mock("GET", "/catalog/artists/4/")
        .with_status(404)
        .with_body(r#"{"detail":"Not found."}"#)
        .create();

    let err = authed_client(&server).artist(4).unwrap_err();
    assert!(matches!(err, BeatportError::Request { status: 404, .. }), "{err:?}");
}

#[test]
fn catalog_calls_require_credentials() {
    let server = Server::new();
    let client = anonymous_client(&server, AuthStrategy::PasswordGrant);
    assert_eq!(client.auth_state(), AuthState::Unauthenticated);
    assert!(matches!(client.track(1), Err(BeatportError::NotLoggedIn)));
}

#[test]
fn password_login_populates_the_session() {
    let mut server = Server::new();
    let token = server
        .mock("POST", "/auth/o/token/")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "password".into()),
            Matcher::UrlEncoded("username".into(), "dj@example.com".into()),
            Matcher::UrlEncoded("password".into(), "p&ss word".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "access_token": "new-access",
                "refresh_token": "new-refresh",
                "expires_in": 36000,
                "token_type": "Bearer"
            })
            .to_string(),
        )
        .expect(1)
        .create();
    let account = server
        .mock("GET", "/auth/o/introspect/")
        .match_header("authorization", "Bearer new-access")
        .with_status(200)
        .with_body(json!({ "user_id": 1, "username": "dj", "subscription": "bp_link_pro" }).to_string())
        .create();

    let mut client = anonymous_client(&server, AuthStrategy::PasswordGrant);
    let bundle = client.login("dj@example.com", "p&ss word").unwrap();

    token.assert();
    assert_eq!(bundle.access_token.as_deref(), Some("new-access"));
    assert_eq!(bundle.refresh_token.as_deref(), Some("new-refresh"));
    assert!(bundle.expires_at.is_some_and(|t| t > Utc::now()));
    assert_eq!(client.auth_state(), AuthState::Authenticated);

    let me = client.account().unwrap();
    account.assert();
    assert_eq!(me.subscription.as_deref(), Some("bp_link_pro"));
}

#[test]
fn rejected_login_leaves_session_untouched() {
    let mut server = Server::new();
    let _m = server
        .mock("POST", "/auth/o/token/")
        .with_status(401)
        .with_body(r#"{"error":"invalid_grant","error_description":"Invalid credentials given."}"#)
        .create();

    let mut client = anonymous_client(&server, AuthStrategy::PasswordGrant);
    let err = client.login("dj", "wrong").unwrap_err();
    match err {
        BeatportError::Auth { message, .. } => assert_eq!(message, "Invalid credentials given."),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(client.session().bundle(), &CredentialBundle::default());
    assert_eq!(client.auth_state(), AuthState::Unauthenticated);
}

#[test]
fn refresh_replaces_tokens_and_advances_expiry() {
    let mut server = Server::new();
    let _m = server
        .mock("POST", "/auth/o/token/")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "ref".into()),
        ]))
        .with_status(200)
        .with_body(json!({ "access_token": "a2", "refresh_token": "r2", "expires_in": 7200 }).to_string())
        .create();

    let mut client = authed_client(&server);
    let before = client.session().bundle().expires_at;
    let bundle = client.refresh().unwrap();

    assert_eq!(bundle.access_token.as_deref(), Some("a2"));
    assert_eq!(bundle.refresh_token.as_deref(), Some("r2"));
    assert!(bundle.expires_at > before);
    assert_eq!(client.session().bundle(), &bundle);
}

#[test]
fn refresh_with_revoked_token_reports_invalid_grant() {
    let mut server = Server::new();
    let _m = server
        .mock("POST", "/auth/o/token/")
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant"}"#)
        .create();

    let mut client = authed_client(&server);
    let err = client.refresh().unwrap_err();
    assert!(err.is_invalid_grant(), "{err:?}");
    assert_eq!(client.session().bundle().access_token.as_deref(), Some("tok"));
}

#[test]
fn cookie_login_keeps_the_session_cookie() {
    let mut server = Server::new();
    let _m = server
        .mock("POST", "/auth/login/")
        .match_body(Matcher::PartialJson(json!({ "username": "dj", "password": "pw" })))
        .with_status(200)
        .with_header("set-cookie", "sessionid=abc123; Path=/; HttpOnly")
        .with_body(r#"{"username":"dj"}"#)
        .create();
    let track = server
        .mock("GET", "/catalog/tracks/1/")
        .match_header("cookie", "sessionid=abc123")
        .with_status(200)
        .with_body(r#"{"id":1,"name":"Darkside"}"#)
        .create();

    let mut client = anonymous_client(&server, AuthStrategy::CookieLogin);
    let bundle = client.login("dj", "pw").unwrap();
    assert_eq!(bundle.session_cookie.as_deref(), Some("abc123"));
    assert!(bundle.access_token.is_none());

    assert_eq!(client.track(1).unwrap().name, "Darkside");
    track.assert();
}

#[test]
fn cookie_login_without_session_cookie_is_rejected() {
    let mut server = Server::new();
    let _m = server
        .mock("POST", "/auth/login/")
        .with_status(200)
        .with_header("set-cookie", "csrftoken=xyz; Path=/")
        .with_body("{}")
        .create();

    let mut client = anonymous_client(&server, AuthStrategy::CookieLogin);
    let err = client.login("dj", "pw").unwrap_err();
    assert!(matches!(err, BeatportError::Auth { code: None, ref message } if message.contains("session cookie")));
    assert!(client.session().bundle().session_cookie.is_none());
}

#[test]
fn authorization_code_flow_exchanges_the_redirect_code() {
    let mut server = Server::new();
    let _login = server
        .mock("POST", "/auth/login/")
        .with_status(200)
        .with_header("set-cookie", "sessionid=s1; Path=/")
        .with_body("{}")
        .create();
    let authorize = server
        .mock("GET", "/auth/o/authorize/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("response_type".into(), "code".into()),
            Matcher::UrlEncoded("redirect_uri".into(), "https://example.com/cb".into()),
        ]))
        .match_header("cookie", "sessionid=s1")
        .with_status(302)
        .with_header("location", "https://example.com/cb?code=XYZ")
        .expect(1)
        .create();
    let token = server
        .mock("POST", "/auth/o/token/")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "XYZ".into()),
        ]))
        .with_status(200)
        .with_body(json!({ "access_token": "a", "refresh_token": "r", "expires_in": 600 }).to_string())
        .expect(1)
        .create();

    let mut client = anonymous_client(
        &server,
        AuthStrategy::AuthorizationCodeGrant {
            redirect_uri: "https://example.com/cb".into(),
        },
    );
    let bundle = client.login("dj", "pw").unwrap();

    authorize.assert();
    token.assert();
    assert_eq!(bundle.access_token.as_deref(), Some("a"));
    assert_eq!(bundle.session_cookie.as_deref(), Some("s1"));
}

#[test]
fn embed_token_cannot_refresh() {
    let server = Server::new();
    let mut client = anonymous_client(
        &server,
        AuthStrategy::EmbedToken {
            token: "embedded".into(),
        },
    );
    let bundle = client.login("", "").unwrap();
    assert_eq!(bundle.access_token.as_deref(), Some("embedded"));
    assert!(matches!(client.refresh(), Err(BeatportError::Auth { .. })));
}
