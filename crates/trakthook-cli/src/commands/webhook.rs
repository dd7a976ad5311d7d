//! Webhook command - Replay a media-server webhook payload
//!
//! Provides the `trakthook webhook` CLI command which reads a JSON payload
//! from a file (or stdin), runs it through the webhook handler exactly as
//! the HTTP endpoint would, and prints the reply.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncReadExt;
use tracing::debug;
use trakthook_core::{config::Config, usecases::WebhookHandler};
use trakthook_trakt::provider::TraktTracker;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct WebhookCommand {
    /// Payload file; reads stdin when omitted or `-`
    pub payload: Option<PathBuf>,
}

impl WebhookCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let body = self.read_payload().await?;
        debug!(bytes = body.len(), "Replaying webhook payload");

        let tracker = Arc::new(TraktTracker::from_config(&config.trakt));
        let reply = WebhookHandler::new(tracker).handle_bytes(&body).await;
        formatter.reply(&reply);
        super::ensure_success(reply.status_code, &reply.body.message)
    }

    async fn read_payload(&self) -> Result<Vec<u8>> {
        match &self.payload {
            Some(path) if path.as_os_str() != "-" => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read payload from {}", path.display())),
            _ => {
                let mut body = Vec::new();
                tokio::io::stdin()
                    .read_to_end(&mut body)
                    .await
                    .context("Failed to read payload from stdin")?;
                Ok(body)
            }
        }
    }
}
