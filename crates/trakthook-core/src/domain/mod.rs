//! Domain entities and business logic
//!
//! This module contains the core domain types for TraktHook:
//! - Event kinds and media types reported by the media server
//! - The canonical [`MediaEvent`] record
//! - The webhook normalizer that builds it from raw payloads
//! - Domain-specific error types

pub mod errors;
pub mod event;
pub mod webhook;

// Re-export commonly used types
pub use errors::DomainError;
pub use event::{EventCategory, EventKind, MediaDetails, MediaEvent, MediaType, ProviderIds};
pub use webhook::{normalize, WebhookItem, WebhookPayload};
