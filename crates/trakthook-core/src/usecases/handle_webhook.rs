//! Webhook handling use case
//!
//! Turns one inbound media-server webhook into at most one sync call on the
//! tracker port and maps the outcome to a `(status code, JSON body)` reply
//! for the HTTP layer.
//!
//! ## Flow
//!
//! 1. Decode and normalize the payload; anything unsupported is `ignored`
//! 2. Skip when the tracker has no credentials
//! 3. Route by [`EventCategory`] to the playback, played-status or favorite handler

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    domain::{normalize, EventCategory, EventKind, MediaEvent, WebhookPayload},
    ports::IMediaTracker,
};

/// Minimum watched percentage for a `playback.progress` event to count as watched
pub const PROGRESS_THRESHOLD_PERCENT: f64 = 80.0;

// ============================================================================
// Replies
// ============================================================================

/// Outcome category reported back to the media server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
    Skipped,
    Pending,
    Ignored,
}

/// JSON body of a reply: `{"status": ..., "message": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyBody {
    pub status: ReplyStatus,
    pub message: String,
}

/// A reply for the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookReply {
    /// HTTP status code (200, 500 or 503)
    pub status_code: u16,
    pub body: ReplyBody,
}

impl WebhookReply {
    /// Creates a reply with the given code, status and message
    pub fn new(status_code: u16, status: ReplyStatus, message: impl Into<String>) -> Self {
        Self {
            status_code,
            body: ReplyBody {
                status,
                message: message.into(),
            },
        }
    }

    fn ok(status: ReplyStatus, message: impl Into<String>) -> Self {
        Self::new(200, status, message)
    }

    fn sync_failed(message: impl Into<String>) -> Self {
        Self::new(500, ReplyStatus::Error, message)
    }

    fn ignored() -> Self {
        Self::ok(ReplyStatus::Ignored, "Unsupported event or media type")
    }

    /// Serializes the body to JSON
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "status": self.body.status,
            "message": self.body.message,
        })
    }

    /// Returns true for 2xx status codes
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

// ============================================================================
// WebhookHandler
// ============================================================================

/// Use case for handling inbound webhooks
///
/// Stateless apart from the tracker; safe to share across concurrent
/// requests.
pub struct WebhookHandler {
    tracker: Arc<dyn IMediaTracker + Send + Sync>,
}

impl WebhookHandler {
    /// Creates a new WebhookHandler
    ///
    /// # Arguments
    ///
    /// * `tracker` - Tracking service adapter that receives sync calls
    pub fn new(tracker: Arc<dyn IMediaTracker + Send + Sync>) -> Self {
        Self { tracker }
    }

    /// Handles a raw request body
    ///
    /// Bytes that are not valid JSON are ignored rather than rejected.
    pub async fn handle_bytes(&self, body: &[u8]) -> WebhookReply {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.handle(&value).await,
            Err(e) => {
                debug!(error = %e, "Webhook body is not JSON");
                WebhookReply::ignored()
            }
        }
    }

    /// Handles an already-decoded JSON payload
    pub async fn handle(&self, raw: &Value) -> WebhookReply {
        let Some(payload) = WebhookPayload::from_json(raw) else {
            return WebhookReply::ignored();
        };

        let Some(event) = normalize(&payload) else {
            debug!(
                event = %payload.event,
                item_type = %payload.item.item_type,
                "Unsupported event or media type"
            );
            return WebhookReply::ignored();
        };

        info!(event = %event.event_kind(), media = %event, "Webhook received");

        if !self.tracker.is_configured() {
            warn!("Trakt not configured, skipping sync");
            return WebhookReply::ok(ReplyStatus::Skipped, "Trakt not configured");
        }

        match event.event_kind().category() {
            EventCategory::Playback => {
                self.handle_playback(&event, payload.progress_percent())
                    .await
            }
            EventCategory::PlayedStatus => self.handle_played_status(&event).await,
            EventCategory::Favorite => self.handle_favorite(&event).await,
        }
    }

    /// Playback lifecycle: only a stop, or progress past the threshold,
    /// registers a watch
    async fn handle_playback(&self, event: &MediaEvent, progress: Option<f64>) -> WebhookReply {
        match event.event_kind() {
            EventKind::PlaybackProgress => {
                if let Some(percent) = progress {
                    if percent < PROGRESS_THRESHOLD_PERCENT {
                        debug!(media = %event, progress = percent, "Insufficient progress");
                        return WebhookReply::ok(ReplyStatus::Pending, "Insufficient progress");
                    }
                }
            }
            EventKind::PlaybackStop => {}
            _ => {
                return WebhookReply::ok(
                    ReplyStatus::Pending,
                    "Waiting for playback completion",
                );
            }
        }

        match self.tracker.add_to_history(event).await {
            Ok(()) => {
                info!(media = %event, "Registered watch");
                WebhookReply::ok(ReplyStatus::Success, format!("Registered: {event}"))
            }
            Err(e) => {
                error!(media = %event, error = %e, "Failed to register watch");
                WebhookReply::sync_failed("Error registering in Trakt")
            }
        }
    }

    async fn handle_played_status(&self, event: &MediaEvent) -> WebhookReply {
        let (result, action) = if event.is_played() {
            (self.tracker.add_to_history(event).await, "marked")
        } else {
            (self.tracker.remove_from_history(event).await, "unmarked")
        };

        match result {
            Ok(()) => WebhookReply::ok(
                ReplyStatus::Success,
                format!("{} as watched: {event}", capitalize(action)),
            ),
            Err(e) => {
                error!(media = %event, action, error = %e, "Played status sync failed");
                WebhookReply::sync_failed(format!("Error {action} in Trakt"))
            }
        }
    }

    async fn handle_favorite(&self, event: &MediaEvent) -> WebhookReply {
        let (result, action) = if event.is_favorite() {
            (self.tracker.add_to_favorites(event).await, "marked")
        } else {
            (self.tracker.remove_from_favorites(event).await, "unmarked")
        };

        match result {
            Ok(()) => WebhookReply::ok(
                ReplyStatus::Success,
                format!("{} as favorite: {event}", capitalize(action)),
            ),
            Err(e) => {
                error!(media = %event, action, error = %e, "Favorite sync failed");
                WebhookReply::sync_failed(format!("Error {action} favorite in Trakt"))
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
