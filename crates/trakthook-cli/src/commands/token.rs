//! Token commands - Manage the Trakt OAuth token
//!
//! Provides the `trakthook token` CLI subcommands:
//! - `refresh` - Exchanges the refresh token for a new pair and persists it

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;
use tracing::info;
use trakthook_core::{config::Config, usecases::MaintenanceUseCase};
use trakthook_trakt::provider::TraktTracker;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Refresh the access token now
    Refresh,
}

impl TokenCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        match self {
            TokenCommand::Refresh => {
                let tracker = Arc::new(TraktTracker::from_config(&config.trakt));
                if let Some(store) = tracker.client().tokens().store() {
                    info!(path = %store.path().display(), "Refreshed tokens will be saved here");
                }
                let reply = MaintenanceUseCase::new(tracker).refresh_token().await;
                formatter.reply(&reply);
                super::ensure_success(reply.status_code, &reply.body.message)
            }
        }
    }
}
