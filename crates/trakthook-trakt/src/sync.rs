//! Trakt sync operations
//!
//! History, collection and favorites mutations, search and the account
//! token check. Every operation returns `Ok(())` only when Trakt answered
//! with a status in the operation's success set.
//!
//! Adding to history or favorites also adds the item to the collection, and
//! removing from history also removes it from the collection. A failure of
//! that follow-up call is logged and does not change the primary result.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{client::TraktClient, payload::SyncPayload, TraktError};

const OK_CREATED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];
const OK_CREATED_NO_CONTENT: &[StatusCode] =
    &[StatusCode::OK, StatusCode::CREATED, StatusCode::NO_CONTENT];
const OK_NO_CONTENT: &[StatusCode] = &[StatusCode::OK, StatusCode::NO_CONTENT];

// ============================================================================
// History
// ============================================================================

/// Marks the item as watched, then adds it to the collection
pub async fn add_to_history(client: &TraktClient, payload: &SyncPayload) -> Result<(), TraktError> {
    post_sync(client, "/sync/history", payload, OK_CREATED, "add to history").await?;
    if let Err(e) = add_to_collection(client, payload).await {
        warn!(error = %e, "History updated but collection add failed");
    }
    Ok(())
}

/// Unmarks the item as watched, then removes it from the collection
pub async fn remove_from_history(
    client: &TraktClient,
    payload: &SyncPayload,
) -> Result<(), TraktError> {
    post_sync(
        client,
        "/sync/history/remove",
        payload,
        OK_CREATED_NO_CONTENT,
        "remove from history",
    )
    .await?;
    if let Err(e) = remove_from_collection(client, payload).await {
        warn!(error = %e, "History updated but collection removal failed");
    }
    Ok(())
}

// ============================================================================
// Collection
// ============================================================================

pub async fn add_to_collection(
    client: &TraktClient,
    payload: &SyncPayload,
) -> Result<(), TraktError> {
    post_sync(client, "/sync/collection", payload, OK_CREATED, "add to collection").await
}

pub async fn remove_from_collection(
    client: &TraktClient,
    payload: &SyncPayload,
) -> Result<(), TraktError> {
    post_sync(
        client,
        "/sync/collection/remove",
        payload,
        OK_CREATED_NO_CONTENT,
        "remove from collection",
    )
    .await
}

// ============================================================================
// Favorites
// ============================================================================

/// Adds the item to favorites, then to the collection
pub async fn add_to_favorites(
    client: &TraktClient,
    payload: &SyncPayload,
) -> Result<(), TraktError> {
    post_sync(client, "/sync/favorites", payload, OK_CREATED, "add to favorites").await?;
    if let Err(e) = add_to_collection(client, payload).await {
        warn!(error = %e, "Favorites updated but collection add failed");
    }
    Ok(())
}

pub async fn remove_from_favorites(
    client: &TraktClient,
    payload: &SyncPayload,
) -> Result<(), TraktError> {
    post_sync(
        client,
        "/sync/favorites/remove",
        payload,
        OK_NO_CONTENT,
        "remove from favorites",
    )
    .await
}

async fn post_sync(
    client: &TraktClient,
    endpoint: &str,
    payload: &SyncPayload,
    accepted: &[StatusCode],
    operation: &str,
) -> Result<(), TraktError> {
    let response = client.post(endpoint, payload, operation).await?;
    let status = response.status();

    if accepted.contains(&status) {
        info!(operation, status = status.as_u16(), "Trakt sync succeeded");
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    warn!(operation, status = status.as_u16(), body = %body, "Trakt sync rejected");
    if status == StatusCode::UNAUTHORIZED {
        Err(TraktError::Unauthorized)
    } else {
        Err(TraktError::RemoteRejected(status))
    }
}

// ============================================================================
// Search
// ============================================================================

/// Kind of item to search for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Show,
    Movie,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Show => "show",
            SearchType::Movie => "movie",
        }
    }
}

/// Ids Trakt returns for a search hit
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchIds {
    #[serde(default)]
    pub trakt: Option<u64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub tmdb: Option<u64>,
    #[serde(default)]
    pub tvdb: Option<u64>,
    #[serde(default)]
    pub imdb: Option<String>,
}

/// The show or movie object of the first search result
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub ids: SearchIds,
}

/// Searches Trakt and returns the first hit
///
/// `Ok(None)` when there are no results or the first result lacks the
/// nested object for `search_type`.
pub async fn search(
    client: &TraktClient,
    search_type: SearchType,
    query: &str,
) -> Result<Option<SearchHit>, TraktError> {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let endpoint = format!("/search/{}?query={}", search_type.as_str(), encoded);
    let operation = format!("search {}", search_type.as_str());

    let response = client.get(&endpoint, &operation).await?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(if status == StatusCode::UNAUTHORIZED {
            TraktError::Unauthorized
        } else {
            TraktError::RemoteRejected(status)
        });
    }

    let results: Vec<Value> = response
        .json()
        .await
        .map_err(|e| TraktError::InvalidResponse(e.to_string()))?;

    let hit = results
        .into_iter()
        .next()
        .and_then(|mut first| first.get_mut(search_type.as_str()).map(Value::take))
        .and_then(|nested| match serde_json::from_value::<SearchHit>(nested) {
            Ok(hit) => Some(hit),
            Err(e) => {
                debug!(error = %e, "Search result has unexpected shape");
                None
            }
        });

    debug!(query, found = hit.is_some(), "Trakt search finished");
    Ok(hit)
}

// ============================================================================
// Token check
// ============================================================================

/// Verifies the access token against `/users/settings`
///
/// Missing credentials and a missing access token are reported without
/// any request being made.
pub async fn check_token(client: &TraktClient) -> Result<(), TraktError> {
    if !client.is_configured() {
        return Err(TraktError::NotConfigured);
    }
    if !client.tokens().has_access_token() {
        return Err(TraktError::MissingAccessToken);
    }

    let response = client.get("/users/settings", "health check").await?;
    match response.status() {
        StatusCode::OK => Ok(()),
        StatusCode::UNAUTHORIZED => Err(TraktError::Unauthorized),
        status => Err(TraktError::RemoteRejected(status)),
    }
}
