//! Config command - View and validate TraktHook configuration
//!
//! Provides the `trakthook config` CLI command which:
//! 1. Shows the effective configuration with secrets masked
//! 2. Validates the configuration and reports every error

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::Value;
use tracing::info;
use trakthook_core::config::Config;

use crate::output::{get_formatter, OutputFormat};

/// Keys under `trakt` that are never printed
const SECRET_FIELDS: &[&str] = &["client_id", "client_secret", "access_token", "refresh_token"];

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(config, format),
            ConfigCommand::Validate => self.execute_validate(config, format),
        }
    }

    fn execute_show(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        info!("Showing configuration");

        let json = masked_json(config)?;
        if matches!(format, OutputFormat::Json) {
            formatter.print_json(&json);
        } else {
            formatter.success("Configuration");
            let pretty = serde_json::to_string_pretty(&json)
                .context("Failed to format configuration")?;
            for line in pretty.lines() {
                formatter.info(line);
            }
        }
        Ok(())
    }

    fn execute_validate(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let errors = config.validate();

        if matches!(format, OutputFormat::Json) {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "errors": messages,
                "trakt_configured": config.trakt.is_configured(),
                "has_token": config.trakt.has_token(),
            }));
            return Ok(());
        }

        if errors.is_empty() {
            formatter.success("Configuration is valid");
        } else {
            for error in &errors {
                formatter.error(&error.to_string());
            }
        }
        if !config.trakt.is_configured() {
            formatter.warn("TRAKT_CLIENT_ID and/or TRAKT_CLIENT_SECRET not set");
        } else if !config.trakt.has_token() {
            formatter.warn("TRAKT_ACCESS_TOKEN not set");
        }
        Ok(())
    }
}

/// Serializes `config` with every secret replaced by a presence marker
fn masked_json(config: &Config) -> Result<Value> {
    let mut json = serde_json::to_value(config).context("Failed to serialize configuration")?;
    if let Some(trakt) = json.get_mut("trakt").and_then(Value::as_object_mut) {
        for key in SECRET_FIELDS {
            if let Some(value) = trakt.get_mut(*key) {
                let set = value.as_str().is_some_and(|s| !s.is_empty());
                *value = Value::String(if set { "<set>" } else { "<unset>" }.to_string());
            }
        }
    }
    Ok(json)
}
