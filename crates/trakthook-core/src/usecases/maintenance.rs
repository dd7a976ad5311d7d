//! Maintenance use case
//!
//! Operator-facing operations: health reporting, a manual token refresh and
//! static service information.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use super::handle_webhook::{ReplyStatus, WebhookReply};
use crate::{domain::EventKind, ports::IMediaTracker};

/// Human-readable service name
pub const SERVICE_NAME: &str = "Emby to Trakt Webhook";

/// Result of a health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// `"ok"` or `"error"`
    pub status: String,
    pub trakt_configured: bool,
    pub trakt_token_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    /// HTTP status for this report: 200 when the token is valid, else 503
    pub fn status_code(&self) -> u16 {
        if self.trakt_token_valid {
            200
        } else {
            503
        }
    }
}

/// Static description of the service and how to drive it
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub supported_events: Vec<&'static str>,
    pub commands: Commands,
}

/// Command lines for each operation, as advertised by [`ServiceInfo`]
#[derive(Debug, Clone, Serialize)]
pub struct Commands {
    pub webhook: &'static str,
    pub health: &'static str,
    pub refresh_token: &'static str,
}

/// Use case for operator maintenance tasks
pub struct MaintenanceUseCase {
    tracker: Arc<dyn IMediaTracker + Send + Sync>,
}

impl MaintenanceUseCase {
    pub fn new(tracker: Arc<dyn IMediaTracker + Send + Sync>) -> Self {
        Self { tracker }
    }

    /// Checks the configured credentials against the tracking service
    pub async fn health(&self) -> HealthReport {
        let configured = self.tracker.is_configured();
        match self.tracker.check_token().await {
            Ok(()) => HealthReport {
                status: "ok".to_string(),
                trakt_configured: configured,
                trakt_token_valid: true,
                error: None,
            },
            Err(e) => {
                warn!(error = %e, "Health check failed");
                HealthReport {
                    status: "error".to_string(),
                    trakt_configured: configured,
                    trakt_token_valid: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Refreshes the access token on operator request
    ///
    /// Replies 503 when credentials are missing, 200 on success and 500
    /// when the refresh was rejected.
    pub async fn refresh_token(&self) -> WebhookReply {
        if !self.tracker.is_configured() {
            return WebhookReply::new(
                503,
                ReplyStatus::Error,
                "Trakt not configured (missing client_id/client_secret)",
            );
        }

        info!("Manual token refresh requested");
        if self.tracker.refresh_token().await {
            WebhookReply::new(200, ReplyStatus::Success, "Token refreshed successfully")
        } else {
            error!("Manual token refresh failed");
            WebhookReply::new(500, ReplyStatus::Error, "Could not refresh token")
        }
    }

    /// Returns the service name, version, supported events and commands
    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            supported_events: EventKind::ALL.iter().map(EventKind::as_str).collect(),
            commands: Commands {
                webhook: "trakthook webhook [FILE|-]",
                health: "trakthook health",
                refresh_token: "trakthook token refresh",
            },
        }
    }
}
