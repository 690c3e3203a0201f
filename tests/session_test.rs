//! Integration tests for the authorization session against a mocked token endpoint

use mockito::{Matcher, Mock, Server, ServerGuard};
use reqwest::StatusCode;
use std::time::{Duration, Instant};

use spotexp::{
    config::Config,
    error::{AuthError, TransportError},
    management::{ApiClientHandle, AuthSession, SessionState},
};
use tokio::net::TcpListener;
use url::Url;

const REDIRECT_URI: &str = "http://localhost:8080/callback";

fn config(token_url: &str) -> Config {
    Config::new("abc", REDIRECT_URI, "user-read-email")
        .unwrap()
        .with_token_url(Url::parse(token_url).unwrap())
}

fn session(server: &ServerGuard) -> AuthSession {
    AuthSession::new(config(&format!("{}/api/token", server.url()))).unwrap()
}

fn state_of(auth_url: &Url) -> String {
    auth_url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

fn redirect(code: &str, state: &str) -> String {
    format!("{REDIRECT_URI}?code={code}&state={state}")
}

async fn mock_exchange(server: &mut ServerGuard, body: &str) -> Mock {
    server
        .mock("POST", "/api/token")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "AQD123".into()),
            Matcher::UrlEncoded("redirect_uri".into(), REDIRECT_URI.into()),
            Matcher::UrlEncoded("client_id".into(), "abc".into()),
            Matcher::Regex("code_verifier=[A-Za-z0-9_-]{128}".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(1)
        .create_async()
        .await
}

async fn authenticate(
    server: &mut ServerGuard,
    session: &mut AuthSession,
    body: &str,
) -> ApiClientHandle {
    let exchange = mock_exchange(server, body).await;
    let url = session.start_auth_flow().unwrap();
    let handle = session
        .complete_auth_flow(&redirect("AQD123", &state_of(&url)))
        .await
        .expect("authorization flow should complete");
    exchange.assert_async().await;
    handle
}

#[tokio::test]
async fn complete_flow_yields_access_token() {
    //* Given
    let mut server = Server::new_async().await;
    let exchange = mock_exchange(
        &mut server,
        r#"{
            "access_token": "a1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "r1"
        }"#,
    )
    .await;
    let mut session = session(&server);

    //* When
    let url = session.start_auth_flow().unwrap();
    assert_eq!(session.state(), SessionState::AwaitingRedirect);
    let handle = session
        .complete_auth_flow(&redirect("AQD123", &state_of(&url)))
        .await
        .expect("Failed to complete authorization flow");

    //* Then
    exchange.assert_async().await;
    assert_eq!(handle.access_token(), "a1");
    assert_eq!(handle.token_type(), "Bearer");
    assert!(!handle.is_expired());
    assert_eq!(session.state(), SessionState::Authenticated);
    assert!(session.is_authenticated());

    let tokens = session.token_set().unwrap();
    assert_eq!(tokens.refresh_token.as_deref(), Some("r1"));
    // Scope falls back to the requested one when not echoed back
    assert_eq!(tokens.scope, "user-read-email");
}

#[tokio::test]
async fn state_mismatch_issues_no_token_request() {
    //* Given
    let mut server = Server::new_async().await;
    let exchange = server
        .mock("POST", "/api/token")
        .expect(0)
        .create_async()
        .await;
    let mut session = session(&server);
    session.start_auth_flow().unwrap();

    //* When
    let err = session
        .complete_auth_flow(&redirect("AQD123", "forged"))
        .await
        .unwrap_err();

    //* Then
    exchange.assert_async().await;
    assert!(matches!(err, AuthError::StateMismatch));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.failure().is_some());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn second_start_invalidates_first_redirect() {
    //* Given
    let mut server = Server::new_async().await;
    let exchange = server
        .mock("POST", "/api/token")
        .expect(0)
        .create_async()
        .await;
    let mut session = session(&server);

    let first = session.start_auth_flow().unwrap();
    let second = session.start_auth_flow().unwrap();
    assert_ne!(state_of(&first), state_of(&second));

    //* When
    let err = session
        .complete_auth_flow(&redirect("AQD123", &state_of(&first)))
        .await
        .unwrap_err();

    //* Then
    exchange.assert_async().await;
    assert!(matches!(err, AuthError::StateMismatch));
}

#[tokio::test]
async fn remote_error_fails_flow_and_allows_restart() {
    //* Given
    let server = Server::new_async().await;
    let mut session = session(&server);
    let url = session.start_auth_flow().unwrap();

    //* When
    let err = session
        .complete_auth_flow(&format!(
            "{REDIRECT_URI}?error=access_denied&state={}",
            state_of(&url)
        ))
        .await
        .unwrap_err();

    //* Then
    assert!(matches!(err, AuthError::RemoteAuth { ref error, .. } if error == "access_denied"));
    assert_eq!(session.state(), SessionState::Failed);

    session.start_auth_flow().expect("restart from failed");
    assert_eq!(session.state(), SessionState::AwaitingRedirect);
}

#[tokio::test]
async fn rejected_code_fails_flow() {
    //* Given
    let mut server = Server::new_async().await;
    let exchange = server
        .mock("POST", "/api/token")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"invalid_grant","error_description":"Invalid authorization code"}"#)
        .expect(1)
        .create_async()
        .await;
    let mut session = session(&server);
    let url = session.start_auth_flow().unwrap();

    //* When
    let err = session
        .complete_auth_flow(&redirect("AQD123", &state_of(&url)))
        .await
        .unwrap_err();

    //* Then
    exchange.assert_async().await;
    match err {
        AuthError::TokenExchange(TransportError::Status { status, message }) => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "invalid_grant: Invalid authorization code");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.token_set().is_none());
}

#[tokio::test]
async fn unreachable_token_endpoint_fails_flow() {
    //* Given
    let mut session = AuthSession::new(config("http://127.0.0.1:1/api/token")).unwrap();
    let url = session.start_auth_flow().unwrap();

    //* When
    let err = session
        .complete_auth_flow(&redirect("AQD123", &state_of(&url)))
        .await
        .unwrap_err();

    //* Then
    assert!(matches!(
        err,
        AuthError::TokenExchange(TransportError::Request(_) | TransportError::Timeout(_))
    ));
    assert_eq!(session.state(), SessionState::Failed);
}

#[tokio::test]
async fn silent_token_endpoint_times_out() {
    //* Given
    // Accepts connections but never writes a response
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            open.push(stream);
        }
    });

    let config =
        config(&format!("http://{addr}/api/token")).with_timeout(Duration::from_millis(300));
    let mut session = AuthSession::new(config).unwrap();
    let url = session.start_auth_flow().unwrap();

    //* When
    let started = Instant::now();
    let err = session
        .complete_auth_flow(&redirect("AQD123", &state_of(&url)))
        .await
        .unwrap_err();

    //* Then
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(err, AuthError::TokenExchange(TransportError::Timeout(_))));
    assert_eq!(session.state(), SessionState::Failed);
    acceptor.abort();
}

#[tokio::test]
async fn complete_without_pending_flow_is_rejected() {
    let server = Server::new_async().await;
    let mut session = session(&server);

    let err = session
        .complete_auth_flow(&redirect("AQD123", "xyz"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AuthError::InvalidStateTransition {
            state: SessionState::Idle,
            ..
        }
    ));
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn refresh_replaces_tokens_and_keeps_refresh_token() {
    //* Given
    let mut server = Server::new_async().await;
    let mut session = session(&server);
    let previous = authenticate(
        &mut server,
        &mut session,
        r#"{"access_token":"a1","expires_in":3600,"refresh_token":"r1","scope":"user-read-email"}"#,
    )
    .await;
    let previous_expiry = previous.expires_at();

    let refresh = server
        .mock("POST", "/api/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "r1".into()),
            Matcher::UrlEncoded("client_id".into(), "abc".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"a2","token_type":"Bearer","expires_in":3600}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let handle = session.refresh_auth().await.expect("Failed to refresh");

    //* Then
    refresh.assert_async().await;
    assert_eq!(handle.access_token(), "a2");
    let tokens = session.token_set().unwrap();
    assert_eq!(tokens.access_token, "a2");
    assert_eq!(tokens.refresh_token.as_deref(), Some("r1"));
    assert_eq!(tokens.scope, "user-read-email");

    // Handles taken before the refresh keep their own snapshot
    assert_eq!(previous.access_token(), "a1");
    assert_eq!(previous.expires_at(), previous_expiry);
    assert_eq!(previous.scope(), "user-read-email");
}

#[tokio::test]
async fn failed_refresh_keeps_previous_tokens() {
    //* Given
    let mut server = Server::new_async().await;
    let mut session = session(&server);
    authenticate(
        &mut server,
        &mut session,
        r#"{"access_token":"a1","expires_in":3600,"refresh_token":"r1"}"#,
    )
    .await;

    let refresh = server
        .mock("POST", "/api/token")
        .match_body(Matcher::UrlEncoded(
            "grant_type".into(),
            "refresh_token".into(),
        ))
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant","error_description":"Refresh token revoked"}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let err = session.refresh_auth().await.unwrap_err();

    //* Then
    refresh.assert_async().await;
    assert!(matches!(
        err,
        AuthError::Transport(TransportError::Status { status, .. }) if status == StatusCode::BAD_REQUEST
    ));
    assert_eq!(session.state(), SessionState::Authenticated);
    assert_eq!(session.token_set().unwrap().access_token, "a1");
}

#[tokio::test]
async fn handle_refreshes_tokens_inside_margin() {
    //* Given
    let mut server = Server::new_async().await;
    let mut session = session(&server);
    // Expires well within the 60 second refresh margin
    authenticate(
        &mut server,
        &mut session,
        r#"{"access_token":"a1","expires_in":30,"refresh_token":"r1"}"#,
    )
    .await;

    let refresh = server
        .mock("POST", "/api/token")
        .match_body(Matcher::UrlEncoded(
            "grant_type".into(),
            "refresh_token".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"a2","expires_in":3600,"refresh_token":"r2"}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let handle = session
        .api_client_handle()
        .await
        .expect("Failed to get handle")
        .expect("session should be authenticated");

    //* Then
    refresh.assert_async().await;
    assert_eq!(handle.access_token(), "a2");
    assert_eq!(
        session.token_set().unwrap().refresh_token.as_deref(),
        Some("r2")
    );
}

#[tokio::test]
async fn handle_falls_back_to_valid_token_when_refresh_fails() {
    //* Given
    let mut server = Server::new_async().await;
    let mut session = session(&server);
    authenticate(
        &mut server,
        &mut session,
        r#"{"access_token":"a1","expires_in":30,"refresh_token":"r1"}"#,
    )
    .await;

    let refresh = server
        .mock("POST", "/api/token")
        .match_body(Matcher::UrlEncoded(
            "grant_type".into(),
            "refresh_token".into(),
        ))
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    //* When
    let handle = session.api_client_handle().await.unwrap().unwrap();

    //* Then
    refresh.assert_async().await;
    assert_eq!(handle.access_token(), "a1");
    assert_eq!(session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn unbounded_margin_refreshes_without_overflow() {
    //* Given
    let mut server = Server::new_async().await;
    let mut session = session(&server).with_refresh_margin(chrono::Duration::MAX);
    authenticate(
        &mut server,
        &mut session,
        r#"{"access_token":"a1","expires_in":3600,"refresh_token":"r1"}"#,
    )
    .await;

    let refresh = server
        .mock("POST", "/api/token")
        .match_body(Matcher::UrlEncoded(
            "grant_type".into(),
            "refresh_token".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"a2","expires_in":3600}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let handle = session.api_client_handle().await.unwrap().unwrap();

    //* Then
    refresh.assert_async().await;
    assert_eq!(handle.access_token(), "a2");
    assert_eq!(session.state(), SessionState::Authenticated);
}
