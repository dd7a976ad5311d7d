//! TraktHook Trakt - Trakt API adapter
//!
//! Provides the async client that mirrors media events to Trakt:
//! - OAuth token refresh with persistence to the env file
//! - Write pacing and retry on 429 / 401
//! - Sync payload construction and the sync operations
//!
//! ## Modules
//!
//! - [`auth`] - Credentials, token refresh and env-file persistence
//! - [`client`] - Rate-limited, retrying HTTP client
//! - [`payload`] - `/sync/*` request bodies
//! - [`provider`] - [`IMediaTracker`](trakthook_core::ports::IMediaTracker) implementation
//! - [`rate_limit`] - Write pacing and Retry-After parsing
//! - [`sync`] - History, collection, favorites, search and token check

pub mod auth;
pub mod client;
pub mod payload;
pub mod provider;
pub mod rate_limit;
pub mod sync;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when communicating with the Trakt API
#[derive(Debug, Error)]
pub enum TraktError {
    /// Client id or client secret is missing; no request was made
    #[error("Trakt client_id/client_secret not configured")]
    NotConfigured,

    /// No access token is available; no request was made
    #[error("No access token configured")]
    MissingAccessToken,

    /// The access token was rejected (and could not be refreshed)
    #[error("Token invalid or expired")]
    Unauthorized,

    /// Every attempt was answered with 429
    #[error("Rate limited after {attempts} attempts")]
    RateLimited {
        /// Number of attempts made
        attempts: u32,
    },

    /// A network-level error occurred on the last attempt
    #[error("Connection error: {0}")]
    Transport(String),

    /// The API answered with a status outside the operation's success set
    #[error("API error: {}", .0.as_u16())]
    RemoteRejected(StatusCode),

    /// The API response could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
