//! Domain error types
//!
//! Errors raised while parsing or validating domain values coming from
//! the media server.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The webhook event name is not one of the supported kinds
    #[error("Unsupported event kind: {0}")]
    UnsupportedEvent(String),

    /// The item type is neither an episode nor a movie
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// An external identifier could not be interpreted
    #[error("Invalid provider id for {provider}: {value}")]
    InvalidProviderId {
        /// Provider name (e.g. `Tmdb`)
        provider: &'static str,
        /// The raw value received
        value: String,
    },
}
