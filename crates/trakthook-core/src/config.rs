//! Configuration module for TraktHook.
//!
//! Provides typed configuration structs populated from the process
//! environment, optionally seeded from a `KEY=value` env file (the same
//! file the token manager rewrites after a refresh). Includes validation,
//! defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default Trakt API base URL
pub const DEFAULT_API_URL: &str = "https://api.trakt.tv";

/// Out-of-band redirect URI used for device/PIN style OAuth apps
pub const DEFAULT_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for TraktHook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub trakt: TraktConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Trakt API credentials and client behaviour.
#[derive(Clone, Serialize, Deserialize)]
pub struct TraktConfig {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Base URL of the Trakt API.
    pub api_url: String,
    pub redirect_uri: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Attempts per outbound call (429 and transport failures consume one each).
    pub max_retries: u32,
    /// Search Trakt for a canonical title when an event carries no external id.
    pub resolve_titles: bool,
    /// Env file rewritten with refreshed tokens. `None` means auto-discover.
    pub config_file: Option<PathBuf>,
}

/// Bind address for the external webhook listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl TraktConfig {
    /// Client id and secret are both present
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// An access token is present
    pub fn has_token(&self) -> bool {
        !self.access_token.is_empty()
    }
}

impl std::fmt::Debug for TraktConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraktConfig")
            .field("client_id", &redacted(&self.client_id))
            .field("client_secret", &redacted(&self.client_secret))
            .field("access_token", &redacted(&self.access_token))
            .field("refresh_token", &redacted(&self.refresh_token))
            .field("api_url", &self.api_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("resolve_titles", &self.resolve_titles)
            .field("config_file", &self.config_file)
            .finish()
    }
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for TraktConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            access_token: String::new(),
            refresh_token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            resolve_titles: false,
            config_file: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Loads `env_file` (or `./.env` when `None`) into the process
    /// environment, then builds the configuration from the environment.
    ///
    /// A missing env file is not an error; a malformed one is.
    pub fn load(env_file: Option<&Path>) -> anyhow::Result<Self> {
        let loaded = match env_file {
            Some(path) => match dotenvy::from_path(path) {
                Ok(()) => true,
                Err(dotenvy::Error::Io(_)) => false,
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to parse env file {}", path.display()))
                }
            },
            None => match dotenvy::dotenv() {
                Ok(_) => true,
                Err(dotenvy::Error::Io(_)) => false,
                Err(e) => return Err(e).context("Failed to parse .env file"),
            },
        };
        debug!(env_file_loaded = loaded, "Loading configuration from environment");

        let mut config = Self::from_env()?;
        if config.trakt.config_file.is_none() {
            config.trakt.config_file = env_file.map(Path::to_path_buf);
        }
        Ok(config)
    }

    /// Builds the configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults. Numeric keys that fail to parse are
    /// reported as errors.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());

        if let Some(v) = get("TRAKT_CLIENT_ID") {
            config.trakt.client_id = v;
        }
        if let Some(v) = get("TRAKT_CLIENT_SECRET") {
            config.trakt.client_secret = v;
        }
        if let Some(v) = get("TRAKT_ACCESS_TOKEN") {
            config.trakt.access_token = v;
        }
        if let Some(v) = get("TRAKT_REFRESH_TOKEN") {
            config.trakt.refresh_token = v;
        }
        if let Some(v) = get("TRAKT_API_URL").filter(|v| !v.is_empty()) {
            config.trakt.api_url = v;
        }
        if let Some(v) = get("TRAKT_REDIRECT_URI").filter(|v| !v.is_empty()) {
            config.trakt.redirect_uri = v;
        }
        if let Some(v) = get("TRAKT_TIMEOUT_SECS") {
            config.trakt.timeout_secs = v
                .parse()
                .with_context(|| format!("TRAKT_TIMEOUT_SECS is not a number: {v}"))?;
        }
        if let Some(v) = get("TRAKT_MAX_RETRIES") {
            config.trakt.max_retries = v
                .parse()
                .with_context(|| format!("TRAKT_MAX_RETRIES is not a number: {v}"))?;
        }
        if let Some(v) = get("TRAKT_RESOLVE_TITLES") {
            config.trakt.resolve_titles = parse_bool(&v);
        }
        if let Some(v) = get("TRAKTHOOK_CONFIG_FILE").filter(|v| !v.is_empty()) {
            config.trakt.config_file = Some(PathBuf::from(v));
        }
        if let Some(v) = get("HOST").filter(|v| !v.is_empty()) {
            config.server.host = v;
        }
        if let Some(v) = get("PORT") {
            config.server.port = v
                .parse()
                .with_context(|| format!("PORT is not a valid port: {v}"))?;
        }
        if let Some(v) = get("LOG_LEVEL").filter(|v| !v.is_empty()) {
            config.logging.level = v.to_lowercase();
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"trakt.timeout_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// Missing credentials are not validation errors: an unconfigured
    /// bridge acknowledges webhooks and skips syncing.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.trakt.api_url.starts_with("http://") && !self.trakt.api_url.starts_with("https://")
        {
            errors.push(ValidationError {
                field: "trakt.api_url".into(),
                message: format!("must be an http(s) URL: {}", self.trakt.api_url),
            });
        }
        if self.trakt.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "trakt.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.trakt.max_retries == 0 {
            errors.push(ValidationError {
                field: "trakt.max_retries".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.server.port == 0 {
            errors.push(ValidationError {
                field: "server.port".into(),
                message: "must be greater than 0".into(),
            });
        }
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use trakthook_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .client_credentials("id", "secret")
///     .tokens("access", "refresh")
///     .logging_level("debug")
///     .build();
/// assert!(config.trakt.is_configured());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.config.trakt.client_id = client_id.into();
        self.config.trakt.client_secret = client_secret.into();
        self
    }

    pub fn tokens(
        mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        self.config.trakt.access_token = access_token.into();
        self.config.trakt.refresh_token = refresh_token.into();
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.trakt.api_url = url.into();
        self
    }

    pub fn timeout_secs(mut self, seconds: u64) -> Self {
        self.config.trakt.timeout_secs = seconds;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.trakt.max_retries = n;
        self
    }

    pub fn resolve_titles(mut self, enabled: bool) -> Self {
        self.config.trakt.resolve_titles = enabled;
        self
    }

    pub fn config_file(mut self, path: PathBuf) -> Self {
        self.config.trakt.config_file = Some(path);
        self
    }

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
