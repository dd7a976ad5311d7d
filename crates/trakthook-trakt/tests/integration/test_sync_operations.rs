//! Integration tests for sync operations
//!
//! Verifies request bodies, success status sets, the collection side
//! effect and search against a wiremock-based Trakt API mock server.

use reqwest::StatusCode;
use serde_json::json;
use trakthook_trakt::{
    auth::Credentials,
    payload::SyncPayload,
    sync::{self, SearchType},
    TraktError,
};
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use crate::common;

// ============================================================================
// History and collection
// ============================================================================

#[tokio::test]
async fn test_add_to_history_sends_exact_body_and_adds_to_collection() {
    let (server, client) = common::setup_trakt_mock().await;

    Mock::given(method("POST"))
        .and(path("/sync/history"))
        .and(body_json(common::inception_body()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"added": {"movies": 1}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sync/collection"))
        .and(body_json(common::inception_body()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let payload = SyncPayload::build(&common::inception(), None);
    sync::add_to_history(&client, &payload)
        .await
        .expect("history add should succeed");
}

#[tokio::test]
async fn test_collection_failure_does_not_undo_history_add() {
    let (server, client) = common::setup_trakt_mock().await;
    common::mount_sync(&server, "/sync/history", 201).await;
    common::mount_sync(&server, "/sync/collection", 500).await;

    let payload = SyncPayload::build(&common::inception(), None);
    assert!(sync::add_to_history(&client, &payload).await.is_ok());
    assert_eq!(common::hits(&server, "/sync/collection").await, 1);
}

#[tokio::test]
async fn test_rejected_history_add_skips_collection() {
    let (server, client) = common::setup_trakt_mock().await;
    common::mount_sync(&server, "/sync/history", 404).await;
    common::mount_sync(&server, "/sync/collection", 201).await;

    let payload = SyncPayload::build(&common::inception(), None);
    let err = sync::add_to_history(&client, &payload).await.unwrap_err();

    assert!(matches!(err, TraktError::RemoteRejected(status) if status == StatusCode::NOT_FOUND));
    assert_eq!(common::hits(&server, "/sync/collection").await, 0);
}

#[tokio::test]
async fn test_remove_from_history_accepts_204_and_removes_from_collection() {
    let (server, client) = common::setup_trakt_mock().await;
    common::mount_sync(&server, "/sync/history/remove", 204).await;
    common::mount_sync(&server, "/sync/collection/remove", 200).await;

    let payload = SyncPayload::build(&common::episode(), None);
    sync::remove_from_history(&client, &payload).await.unwrap();

    assert_eq!(common::hits(&server, "/sync/collection/remove").await, 1);
}

#[tokio::test]
async fn test_episode_body_shape() {
    let (server, client) = common::setup_trakt_mock().await;
    Mock::given(method("POST"))
        .and(path("/sync/collection"))
        .and(body_json(json!({"shows": [{
            "title": "Breaking Bad",
            "ids": {"tvdb": 349232},
            "seasons": [{"number": 1, "episodes": [{"number": 5}]}]
        }]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let payload = SyncPayload::build(&common::episode(), None);
    sync::add_to_collection(&client, &payload).await.unwrap();
}

// ============================================================================
// Favorites
// ============================================================================

#[tokio::test]
async fn test_add_to_favorites_also_adds_to_collection() {
    let (server, client) = common::setup_trakt_mock().await;
    common::mount_sync(&server, "/sync/favorites", 201).await;
    common::mount_sync(&server, "/sync/collection", 201).await;

    let payload = SyncPayload::build(&common::inception(), None);
    sync::add_to_favorites(&client, &payload).await.unwrap();

    assert_eq!(common::hits(&server, "/sync/favorites").await, 1);
    assert_eq!(common::hits(&server, "/sync/collection").await, 1);
}

#[tokio::test]
async fn test_remove_from_favorites_status_set() {
    let (server, client) = common::setup_trakt_mock().await;
    common::mount_sync(&server, "/sync/favorites/remove", 201).await;

    let payload = SyncPayload::build(&common::inception(), None);
    let err = sync::remove_from_favorites(&client, &payload)
        .await
        .unwrap_err();

    // 201 is not a success for favorites removal
    assert_eq!(err.to_string(), "API error: 201");
    assert_eq!(common::hits(&server, "/sync/collection/remove").await, 0);
}

#[tokio::test]
async fn test_missing_credentials_skip_every_operation() {
    let server = MockServer::start().await;
    let credentials = Credentials {
        client_id: String::new(),
        client_secret: String::new(),
        ..common::credentials()
    };
    let client = common::client_with(&server, credentials, None, common::options(&server));
    let payload = SyncPayload::build(&common::inception(), None);

    assert!(matches!(
        sync::add_to_history(&client, &payload).await,
        Err(TraktError::NotConfigured)
    ));
    assert!(matches!(
        sync::remove_from_history(&client, &payload).await,
        Err(TraktError::NotConfigured)
    ));
    assert!(matches!(
        sync::add_to_favorites(&client, &payload).await,
        Err(TraktError::NotConfigured)
    ));
    assert!(matches!(
        sync::remove_from_favorites(&client, &payload).await,
        Err(TraktError::NotConfigured)
    ));
    assert!(matches!(
        sync::search(&client, SearchType::Movie, "Inception").await,
        Err(TraktError::NotConfigured)
    ));

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_returns_first_nested_object() {
    let (server, client) = common::setup_trakt_mock().await;
    Mock::given(method("GET"))
        .and(path("/search/show"))
        .and(query_param("query", "Breaking Bad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"type": "show", "score": 1000.0, "show": {
                "title": "Breaking Bad", "year": 2008,
                "ids": {"trakt": 1388, "slug": "breaking-bad", "tvdb": 81189}
            }},
            {"type": "show", "score": 10.0, "show": {"title": "Breaking Bad Redux", "year": 2020}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let hit = sync::search(&client, SearchType::Show, "Breaking Bad")
        .await
        .unwrap()
        .expect("expected a search hit");

    assert_eq!(hit.title, "Breaking Bad");
    assert_eq!(hit.year, Some(2008));
    assert_eq!(hit.ids.trakt, Some(1388));
}

#[tokio::test]
async fn test_search_without_results_is_none() {
    let (server, client) = common::setup_trakt_mock().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let hit = sync::search(&client, SearchType::Movie, "Nothing & Nobody")
        .await
        .unwrap();
    assert!(hit.is_none());
}

#[tokio::test]
async fn test_search_error_status() {
    let (server, client) = common::setup_trakt_mock().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = sync::search(&client, SearchType::Movie, "Inception").await;
    assert!(matches!(result, Err(TraktError::RemoteRejected(_))));
}
