//! Integration tests for the retrying client
//!
//! Covers 429 handling with Retry-After, retry exhaustion, transport
//! failures, pass-through of other statuses and write pacing.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::json;
use trakthook_trakt::{
    client::{ApiMethod, ClientOptions},
    TraktError,
};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::common;

#[tokio::test]
async fn test_429_then_success_is_retried() {
    let (server, client) = common::setup_trakt_mock().await;

    Mock::given(method("GET"))
        .and(path("/users/settings"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let response = client
        .get("/users/settings", "check token")
        .await
        .expect("call should succeed after retry");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::hits(&server, "/users/settings").await, 2);
}

#[tokio::test]
async fn test_429_honours_retry_after_seconds() {
    let (server, client) = common::setup_trakt_mock().await;

    Mock::given(method("GET"))
        .and(path("/users/settings"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/settings"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let start = Instant::now();
    let response = client.get("/users/settings", "check token").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_429_exhausts_max_retries() {
    let server = MockServer::start().await;
    let client = common::client_with(
        &server,
        common::credentials(),
        None,
        common::options(&server).with_max_retries(3),
    );

    Mock::given(method("POST"))
        .and(path("/sync/history"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let result = client
        .post("/sync/history", &json!({"movies": []}), "add to history")
        .await;

    assert!(matches!(result, Err(TraktError::RateLimited { attempts: 3 })));
}

#[tokio::test]
async fn test_other_statuses_are_not_retried() {
    let (server, client) = common::setup_trakt_mock().await;

    Mock::given(method("POST"))
        .and(path("/sync/history"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let response = client
        .post("/sync/history", &json!({"movies": []}), "add to history")
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_transport_failure_exhausts_attempts() {
    let server = MockServer::start().await;
    let options = ClientOptions::default()
        .with_base_url("http://127.0.0.1:1")
        .with_max_retries(2)
        .with_write_interval(common::FAST_WRITES);
    let client = common::client_with(&server, common::credentials(), None, options);

    let start = Instant::now();
    let result = client.get("/users/settings", "check token").await;

    assert!(matches!(result, Err(TraktError::Transport(_))));
    // One pause between the two attempts, none after the last
    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_requests_carry_trakt_headers() {
    let (server, client) = common::setup_trakt_mock().await;

    Mock::given(method("GET"))
        .and(path("/users/settings"))
        .and(header("trakt-api-version", "2"))
        .and(header("trakt-api-key", common::CLIENT_ID))
        .and(header(
            "authorization",
            format!("Bearer {}", common::ACCESS_TOKEN).as_str(),
        ))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let response = client.get("/users/settings", "check token").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_writes_are_spaced_by_write_interval() {
    let server = MockServer::start().await;
    let client = common::client_with(
        &server,
        common::credentials(),
        None,
        common::options(&server).with_write_interval(Duration::from_millis(1000)),
    );
    common::mount_sync(&server, "/sync/history", 201).await;

    let start = Instant::now();
    for _ in 0..2 {
        client
            .call(
                ApiMethod::Post,
                "/sync/history",
                Some(&json!({"movies": []})),
                "add to history",
            )
            .await
            .unwrap();
    }

    assert!(start.elapsed() >= Duration::from_millis(1000));
    assert_eq!(common::hits(&server, "/sync/history").await, 2);
}

#[tokio::test]
async fn test_reads_are_not_paced() {
    let server = MockServer::start().await;
    let client = common::client_with(
        &server,
        common::credentials(),
        None,
        common::options(&server).with_write_interval(Duration::from_secs(10)),
    );
    Mock::given(method("GET"))
        .and(path("/users/settings"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let start = Instant::now();
    for _ in 0..3 {
        client.get("/users/settings", "check token").await.unwrap();
    }

    assert!(start.elapsed() < Duration::from_secs(10));
}
