//! Integration tests for the account token check

use reqwest::StatusCode;
use trakthook_trakt::{auth::Credentials, sync, TraktError};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::common;

async fn mount_settings(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/users/settings"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_check_token_valid() {
    let (server, client) = common::setup_trakt_mock().await;
    mount_settings(&server, 200).await;

    sync::check_token(&client).await.expect("token should be valid");
}

#[tokio::test]
async fn test_check_token_unauthorized() {
    let (server, client) = common::setup_trakt_mock().await;
    mount_settings(&server, 401).await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = sync::check_token(&client).await.unwrap_err();
    assert!(matches!(err, TraktError::Unauthorized));
    assert_eq!(err.to_string(), "Token invalid or expired");
}

#[tokio::test]
async fn test_check_token_api_error() {
    let (server, client) = common::setup_trakt_mock().await;
    mount_settings(&server, 503).await;

    let err = sync::check_token(&client).await.unwrap_err();
    assert!(matches!(
        err,
        TraktError::RemoteRejected(status) if status == StatusCode::SERVICE_UNAVAILABLE
    ));
    assert_eq!(err.to_string(), "API error: 503");
}

#[tokio::test]
async fn test_check_token_without_access_token_makes_no_request() {
    let server = MockServer::start().await;
    let credentials = Credentials {
        access_token: String::new(),
        ..common::credentials()
    };
    let client = common::client_with(&server, credentials, None, common::options(&server));

    let err = sync::check_token(&client).await.unwrap_err();
    assert_eq!(err.to_string(), "No access token configured");
    assert_eq!(common::hits(&server, "/users/settings").await, 0);
}

#[tokio::test]
async fn test_check_token_not_configured() {
    let server = MockServer::start().await;
    let credentials = Credentials {
        client_secret: String::new(),
        ..common::credentials()
    };
    let client = common::client_with(&server, credentials, None, common::options(&server));

    let err = sync::check_token(&client).await.unwrap_err();
    assert_eq!(err.to_string(), "Trakt client_id/client_secret not configured");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
