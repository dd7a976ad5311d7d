//! Info command - Print service information

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use trakthook_core::{config::Config, usecases::MaintenanceUseCase};
use trakthook_trakt::provider::TraktTracker;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct InfoCommand {}

impl InfoCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let tracker = Arc::new(TraktTracker::from_config(&config.trakt));
        let info = MaintenanceUseCase::new(tracker).service_info();

        if matches!(format, OutputFormat::Json) {
            let json = serde_json::to_value(&info).context("Failed to serialize service info")?;
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&format!("{} {}", info.service, info.version));
        formatter.info("Supported events:");
        for event in &info.supported_events {
            formatter.info(&format!("  {event}"));
        }
        formatter.info("Commands:");
        formatter.info(&format!("  webhook        {}", info.commands.webhook));
        formatter.info(&format!("  health         {}", info.commands.health));
        formatter.info(&format!("  refresh-token  {}", info.commands.refresh_token));
        Ok(())
    }
}
