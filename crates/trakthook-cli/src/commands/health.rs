//! Health command - Verify the Trakt token
//!
//! Provides the `trakthook health` CLI command which checks the configured
//! credentials against the Trakt account settings endpoint.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use trakthook_core::{config::Config, usecases::MaintenanceUseCase};
use trakthook_trakt::provider::TraktTracker;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct HealthCommand {}

impl HealthCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let tracker = Arc::new(TraktTracker::from_config(&config.trakt));
        let report = MaintenanceUseCase::new(tracker).health().await;

        if matches!(format, OutputFormat::Json) {
            let json = serde_json::to_value(&report).context("Failed to serialize health report")?;
            formatter.print_json(&json);
        } else {
            if report.trakt_token_valid {
                formatter.success("Trakt token is valid");
            } else {
                formatter.error(report.error.as_deref().unwrap_or("Trakt token is not valid"));
            }
            formatter.info(&format!("Configured: {}", report.trakt_configured));
            formatter.info(&format!("HTTP {}", report.status_code()));
        }

        super::ensure_success(
            report.status_code(),
            report.error.as_deref().unwrap_or("Health check failed"),
        )
    }
}
