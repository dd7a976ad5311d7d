//! End-to-end webhook handling through the Trakt tracker adapter

use std::sync::Arc;

use serde_json::json;
use trakthook_core::usecases::{MaintenanceUseCase, ReplyStatus, WebhookHandler};
use trakthook_trakt::{auth::Credentials, provider::TraktTracker};
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use crate::common;

fn tracker_for(server: &MockServer) -> Arc<TraktTracker> {
    Arc::new(TraktTracker::new(Arc::new(common::client_for(server))))
}

fn inception_webhook() -> serde_json::Value {
    json!({
        "Event": "item.markplayed",
        "Item": {
            "Type": "Movie",
            "Name": "Inception",
            "ProductionYear": 2010,
            "ProviderIds": {"Tmdb": "27205", "Imdb": "tt1375666"}
        }
    })
}

#[tokio::test]
async fn test_markplayed_movie_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync/history"))
        .and(body_json(common::inception_body()))
        .respond_with(ResponseTemplate::new(201))
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

    let handler = WebhookHandler::new(tracker_for(&server));
    let reply = handler.handle(&inception_webhook()).await;

    assert_eq!(reply.status_code, 200);
    assert_eq!(
        reply.to_json(),
        json!({"status": "success", "message": "Marked as watched: Inception (2010)"})
    );
}

#[tokio::test]
async fn test_episode_progress_below_threshold_makes_no_call() {
    let server = MockServer::start().await;
    let handler = WebhookHandler::new(tracker_for(&server));

    let reply = handler
        .handle(&json!({
            "Event": "playback.progress",
            "PlaybackPositionTicks": 500,
            "Item": {
                "Type": "Episode",
                "SeriesName": "Breaking Bad",
                "ParentIndexNumber": 1,
                "IndexNumber": 5,
                "RunTimeTicks": 1000,
                "ProviderIds": {"Tvdb": "349232"}
            }
        }))
        .await;

    assert_eq!(reply.body.status, ReplyStatus::Pending);
    assert_eq!(reply.body.message, "Insufficient progress");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_sync_failure_maps_to_500() {
    let server = MockServer::start().await;
    common::mount_sync(&server, "/sync/history", 500).await;

    let handler = WebhookHandler::new(tracker_for(&server));
    let reply = handler.handle(&inception_webhook()).await;

    assert_eq!(reply.status_code, 500);
    assert_eq!(reply.body.message, "Error marked in Trakt");
}

#[tokio::test]
async fn test_unconfigured_credentials_skip_without_calls() {
    let server = MockServer::start().await;
    let credentials = Credentials {
        client_id: String::new(),
        ..common::credentials()
    };
    let client = common::client_with(&server, credentials, None, common::options(&server));
    let tracker = Arc::new(TraktTracker::new(Arc::new(client)));

    let reply = WebhookHandler::new(tracker.clone())
        .handle(&inception_webhook())
        .await;
    assert_eq!(reply.body.status, ReplyStatus::Skipped);

    let refresh = MaintenanceUseCase::new(tracker.clone()).refresh_token().await;
    assert_eq!(refresh.status_code, 503);

    let health = MaintenanceUseCase::new(tracker).health().await;
    assert_eq!(health.status_code(), 503);
    assert!(!health.trakt_configured);
    assert_eq!(
        health.error.as_deref(),
        Some("Trakt client_id/client_secret not configured")
    );

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_title_resolution_for_events_without_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("query", "Inception"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"type": "movie", "movie": {"title": "Inception (Canonical)", "year": 2010}}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sync/history"))
        .and(body_json(json!({"movies": [{
            "title": "Inception (Canonical)",
            "year": 2010,
            "ids": {}
        }]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    common::mount_sync(&server, "/sync/collection", 201).await;

    let tracker = Arc::new(
        TraktTracker::new(Arc::new(common::client_for(&server))).with_title_resolution(true),
    );
    let mut webhook = inception_webhook();
    webhook["Item"]["ProviderIds"] = json!({});

    let reply = WebhookHandler::new(tracker).handle(&webhook).await;
    assert_eq!(reply.body.status, ReplyStatus::Success);
}

#[tokio::test]
async fn test_manual_refresh_through_maintenance() {
    let server = MockServer::start().await;
    common::mount_token_refresh(&server, "fresh-access", Some("fresh-refresh")).await;

    let tracker = tracker_for(&server);
    let reply = MaintenanceUseCase::new(tracker.clone()).refresh_token().await;

    assert_eq!(reply.status_code, 200);
    assert_eq!(reply.body.message, "Token refreshed successfully");
    assert_eq!(tracker.client().tokens().access_token(), "fresh-access");
}
