//! [`IMediaTracker`] implementation backed by the Trakt API

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use trakthook_core::{
    config::TraktConfig,
    domain::{MediaEvent, MediaType},
    ports::IMediaTracker,
};

use crate::{
    client::TraktClient,
    payload::SyncPayload,
    sync::{self, SearchType},
};

/// Media tracker that mirrors events to Trakt
///
/// Builds one [`SyncPayload`] per event and hands it to the sync
/// operations. With title resolution enabled, events without any external
/// id are first looked up by name so Trakt gets its canonical title.
pub struct TraktTracker {
    client: Arc<TraktClient>,
    resolve_titles: bool,
}

impl TraktTracker {
    pub fn new(client: Arc<TraktClient>) -> Self {
        Self {
            client,
            resolve_titles: false,
        }
    }

    /// Builds the client, token manager and tracker from configuration
    pub fn from_config(config: &TraktConfig) -> Self {
        Self::new(Arc::new(TraktClient::from_config(config)))
            .with_title_resolution(config.resolve_titles)
    }

    pub fn with_title_resolution(mut self, enabled: bool) -> Self {
        self.resolve_titles = enabled;
        self
    }

    pub fn client(&self) -> &Arc<TraktClient> {
        &self.client
    }

    async fn payload_for(&self, event: &MediaEvent) -> SyncPayload {
        let resolved = if self.resolve_titles && event.ids().is_empty() {
            self.resolve_title(event).await
        } else {
            None
        };
        SyncPayload::build(event, resolved.as_deref())
    }

    async fn resolve_title(&self, event: &MediaEvent) -> Option<String> {
        let query = event.search_title();
        if query.is_empty() {
            return None;
        }

        let search_type = match event.media_type() {
            MediaType::Episode => SearchType::Show,
            MediaType::Movie => SearchType::Movie,
        };
        match sync::search(&self.client, search_type, query).await {
            Ok(Some(hit)) => {
                debug!(query, title = %hit.title, "Resolved Trakt title");
                Some(hit.title)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(query, error = %e, "Title lookup failed, using source title");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl IMediaTracker for TraktTracker {
    fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    async fn add_to_history(&self, event: &MediaEvent) -> Result<()> {
        let payload = self.payload_for(event).await;
        sync::add_to_history(&self.client, &payload)
            .await
            .with_context(|| format!("Failed to add {event} to history"))
    }

    async fn remove_from_history(&self, event: &MediaEvent) -> Result<()> {
        let payload = self.payload_for(event).await;
        sync::remove_from_history(&self.client, &payload)
            .await
            .with_context(|| format!("Failed to remove {event} from history"))
    }

    async fn add_to_favorites(&self, event: &MediaEvent) -> Result<()> {
        let payload = self.payload_for(event).await;
        sync::add_to_favorites(&self.client, &payload)
            .await
            .with_context(|| format!("Failed to add {event} to favorites"))
    }

    async fn remove_from_favorites(&self, event: &MediaEvent) -> Result<()> {
        let payload = self.payload_for(event).await;
        sync::remove_from_favorites(&self.client, &payload)
            .await
            .with_context(|| format!("Failed to remove {event} from favorites"))
    }

    /// The error message is the operator-facing reason, without context
    async fn check_token(&self) -> Result<()> {
        sync::check_token(&self.client).await?;
        Ok(())
    }

    async fn refresh_token(&self) -> bool {
        self.client.tokens().refresh().await
    }
}
