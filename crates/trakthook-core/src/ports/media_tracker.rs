//! Media tracker port (driven/secondary port)
//!
//! This module defines the interface for mirroring watch state to a
//! third-party tracking service. The implementation targets Trakt.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and don't need domain-level classification.
//! - Uses `#[async_trait]` for async trait methods.
//! - History and favorites additions imply a collection addition; that
//!   coupling is the adapter's job, not the caller's.

use crate::domain::MediaEvent;

/// Interface for a watch-history tracking service
#[async_trait::async_trait]
pub trait IMediaTracker: Send + Sync {
    /// Returns true when API credentials (client id and secret) are present
    ///
    /// Callers skip syncing entirely when this is false.
    fn is_configured(&self) -> bool;

    /// Marks the item as watched (and adds it to the collection)
    async fn add_to_history(&self, event: &MediaEvent) -> anyhow::Result<()>;

    /// Removes the item from watch history (and from the collection)
    async fn remove_from_history(&self, event: &MediaEvent) -> anyhow::Result<()>;

    /// Adds the item to favorites (and to the collection)
    async fn add_to_favorites(&self, event: &MediaEvent) -> anyhow::Result<()>;

    /// Removes the item from favorites
    async fn remove_from_favorites(&self, event: &MediaEvent) -> anyhow::Result<()>;

    /// Verifies the current access token against the account settings endpoint
    ///
    /// The error message is suitable for showing to an operator.
    async fn check_token(&self) -> anyhow::Result<()>;

    /// Refreshes the access token using the stored refresh token
    ///
    /// Returns `true` when new tokens were obtained.
    async fn refresh_token(&self) -> bool;
}
