//! Integration tests for token refresh
//!
//! Verifies refresh-on-401 (at most once per call), env-file persistence
//! of the refreshed pair and behaviour when the token endpoint rejects
//! the refresh.

use reqwest::StatusCode;
use trakthook_trakt::{
    auth::{Credentials, EnvFileStore, TokenManager},
    client::ClientOptions,
};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::common;

async fn mount_settings_for_token(server: &MockServer, token: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/users/settings"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_401_refreshes_and_retries_with_new_token() {
    let (server, client) = common::setup_trakt_mock().await;
    mount_settings_for_token(&server, common::ACCESS_TOKEN, 401).await;
    mount_settings_for_token(&server, "fresh-access", 200).await;
    common::mount_token_refresh(&server, "fresh-access", Some("fresh-refresh")).await;

    let response = client.get("/users/settings", "check token").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client.tokens().access_token(), "fresh-access");
    assert_eq!(client.tokens().refresh_token(), "fresh-refresh");
    assert_eq!(common::hits(&server, "/oauth/token").await, 1);
}

#[tokio::test]
async fn test_refresh_does_not_consume_an_attempt() {
    let server = MockServer::start().await;
    let client = common::client_with(
        &server,
        common::credentials(),
        None,
        common::options(&server).with_max_retries(1),
    );
    mount_settings_for_token(&server, common::ACCESS_TOKEN, 401).await;
    mount_settings_for_token(&server, "fresh-access", 200).await;
    common::mount_token_refresh(&server, "fresh-access", None).await;

    let response = client.get("/users/settings", "check token").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_at_most_one_refresh_per_call() {
    let server = MockServer::start().await;
    let client = common::client_with(
        &server,
        common::credentials(),
        None,
        common::options(&server).with_max_retries(5),
    );

    Mock::given(method("GET"))
        .and(path("/users/settings"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    common::mount_token_refresh(&server, "fresh-access", None).await;

    let response = client.get("/users/settings", "check token").await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::hits(&server, "/oauth/token").await, 1);
}

#[tokio::test]
async fn test_failed_refresh_returns_401_and_keeps_tokens() {
    let (server, client) = common::setup_trakt_mock().await;
    mount_settings_for_token(&server, common::ACCESS_TOKEN, 401).await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let response = client.get("/users/settings", "check token").await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(client.tokens().access_token(), common::ACCESS_TOKEN);
    assert_eq!(client.tokens().refresh_token(), common::REFRESH_TOKEN);
}

#[tokio::test]
async fn test_refresh_without_new_refresh_token_keeps_old_one() {
    let server = MockServer::start().await;
    common::mount_token_refresh(&server, "fresh-access", None).await;
    let manager = TokenManager::new(common::credentials(), server.uri());

    assert!(manager.refresh().await);
    assert_eq!(manager.access_token(), "fresh-access");
    assert_eq!(manager.refresh_token(), common::REFRESH_TOKEN);
}

#[tokio::test]
async fn test_refresh_persists_only_token_lines() {
    let server = MockServer::start().await;
    common::mount_token_refresh(&server, "fresh-access", Some("fresh-refresh")).await;

    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join("config.env");
    let original = "# Trakt credentials\n\
                    TRAKT_CLIENT_ID=test-client-id\n\
                    TRAKT_ACCESS_TOKEN=test-access-token\n\
                    \n\
                    TRAKT_REFRESH_TOKEN=test-refresh-token\n\
                    LOG_LEVEL=info\n";
    std::fs::write(&env_path, original).unwrap();

    let manager = TokenManager::new(common::credentials(), server.uri())
        .with_store(EnvFileStore::new(&env_path));
    assert!(manager.refresh().await);

    let saved = std::fs::read_to_string(&env_path).unwrap();
    assert_eq!(
        saved,
        "# Trakt credentials\n\
         TRAKT_CLIENT_ID=test-client-id\n\
         TRAKT_ACCESS_TOKEN=fresh-access\n\
         \n\
         TRAKT_REFRESH_TOKEN=fresh-refresh\n\
         LOG_LEVEL=info\n"
    );
    assert_eq!(manager.access_token(), "fresh-access");
}

#[tokio::test]
async fn test_refresh_with_missing_env_file_stays_in_memory() {
    let server = MockServer::start().await;
    common::mount_token_refresh(&server, "fresh-access", Some("fresh-refresh")).await;

    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join("missing.env");
    let manager = TokenManager::new(common::credentials(), server.uri())
        .with_store(EnvFileStore::new(&env_path));

    assert!(manager.refresh().await);
    assert!(!env_path.exists());
    assert_eq!(manager.refresh_token(), "fresh-refresh");
}

#[tokio::test]
async fn test_refresh_without_refresh_token_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let credentials = Credentials {
        refresh_token: String::new(),
        ..common::credentials()
    };
    let client = common::client_with(&server, credentials, None, ClientOptions::default());
    assert!(!client.tokens().refresh().await);
}
