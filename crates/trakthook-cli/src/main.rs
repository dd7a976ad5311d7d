//! TraktHook CLI - Command-line interface for the Emby to Trakt bridge
//!
//! Provides commands for:
//! - Replaying a webhook payload through the handler
//! - Checking the Trakt token
//! - Refreshing the Trakt token
//! - Viewing and validating configuration
//! - Printing service information

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use trakthook_core::config::Config;

mod commands;
mod output;

use commands::{
    config::ConfigCommand, health::HealthCommand, info::InfoCommand, token::TokenCommand,
    webhook::WebhookCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "trakthook", version, about = "Mirror Emby playback events to Trakt")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Env file to load settings from and persist refreshed tokens to
    #[arg(long, global = true, env = "TRAKTHOOK_CONFIG_FILE")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Handle a webhook payload from a file or stdin
    Webhook(WebhookCommand),
    /// Check that the Trakt token is valid
    Health(HealthCommand),
    /// Manage the Trakt OAuth token
    #[command(subcommand)]
    Token(TokenCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Show service information
    Info(InfoCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.env_file.as_deref())?;

    // Setup tracing: RUST_LOG wins, then -v flags, then LOG_LEVEL
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    for error in config.validate() {
        warn!(field = %error.field, "Invalid configuration: {}", error.message);
    }
    if !config.trakt.is_configured() {
        warn!("TRAKT_CLIENT_ID and/or TRAKT_CLIENT_SECRET not configured - Trakt sync disabled");
    } else if !config.trakt.has_token() {
        warn!("TRAKT_ACCESS_TOKEN not configured - Trakt sync disabled");
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Webhook(cmd) => cmd.execute(&config, format).await,
        Commands::Health(cmd) => cmd.execute(&config, format).await,
        Commands::Token(cmd) => cmd.execute(&config, format).await,
        Commands::Config(cmd) => cmd.execute(&config, format).await,
        Commands::Info(cmd) => cmd.execute(&config, format).await,
    }
}
