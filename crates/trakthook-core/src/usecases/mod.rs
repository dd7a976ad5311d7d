//! Use cases (interactors) for TraktHook
//!
//! Use cases are thin coordinators: they delegate parsing to the domain
//! and remote I/O to the [`IMediaTracker`](crate::ports::IMediaTracker) port.
//!
//! ## Use Cases
//!
//! - [`WebhookHandler`] - Inbound webhook dispatch and reply mapping
//! - [`MaintenanceUseCase`] - Health check, manual token refresh, service info

pub mod handle_webhook;
pub mod maintenance;

pub use handle_webhook::{ReplyBody, ReplyStatus, WebhookHandler, WebhookReply};
pub use maintenance::{HealthReport, MaintenanceUseCase, ServiceInfo};
