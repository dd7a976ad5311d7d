//! Trakt OAuth credentials and token lifecycle
//!
//! Components:
//! - [`Credentials`] - Client and token secrets, redacted in `Debug`
//! - [`EnvFileStore`] - Persists refreshed tokens into the `KEY=value` env file
//! - [`TokenManager`] - Holds the token pair, builds request headers and
//!   refreshes the access token under a lock

use std::{
    path::{Path, PathBuf},
    sync::RwLock,
    time::Duration,
};

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use trakthook_core::config::{TraktConfig, DEFAULT_REDIRECT_URI};

/// Trakt API version sent with every request
pub const TRAKT_API_VERSION: &str = "2";

/// Timeout for calls to the token endpoint
const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

const ACCESS_TOKEN_KEY: &str = "TRAKT_ACCESS_TOKEN";
const REFRESH_TOKEN_KEY: &str = "TRAKT_REFRESH_TOKEN";

// ============================================================================
// Credentials
// ============================================================================

/// Client credentials and the current token pair
#[derive(Clone, Default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl Credentials {
    /// Copies the secrets out of the Trakt configuration section
    pub fn from_config(config: &TraktConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            access_token: config.access_token.clone(),
            refresh_token: config.refresh_token.clone(),
        }
    }

    /// Client id and secret are both present
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &"<redacted>")
            .field("client_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// EnvFileStore
// ============================================================================

/// Durable store for refreshed tokens: the `KEY=value` env file
///
/// Only the `TRAKT_ACCESS_TOKEN=` and `TRAKT_REFRESH_TOKEN=` lines are
/// rewritten; comments, ordering and every other line are kept as-is.
#[derive(Debug, Clone)]
pub struct EnvFileStore {
    path: PathBuf,
}

impl EnvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Picks the env file location
    ///
    /// Candidates in order: `/app/config.env`, `<exe dir>/../config.env`,
    /// `<exe dir>/config.env`, `./config.env`. When none exists, falls back
    /// to `/app/config.env` if `/app` exists, else `./config.env`.
    pub fn discover() -> Self {
        let mut candidates = vec![PathBuf::from("/app/config.env")];
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            if let Some(parent) = exe_dir.parent() {
                candidates.push(parent.join("config.env"));
            }
            candidates.push(exe_dir.join("config.env"));
        }
        candidates.push(PathBuf::from("config.env"));

        let path = candidates
            .into_iter()
            .find(|p| p.exists())
            .unwrap_or_else(|| {
                if Path::new("/app").exists() {
                    PathBuf::from("/app/config.env")
                } else {
                    PathBuf::from("config.env")
                }
            });
        debug!(path = %path.display(), "Using env file for token persistence");
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the token pair into the env file
    ///
    /// Returns `Ok(false)` without touching the filesystem when the file
    /// does not exist.
    pub async fn save_tokens(&self, access_token: &str, refresh_token: &str) -> Result<bool> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    path = %self.path.display(),
                    "Env file not found, refreshed tokens kept in memory only"
                );
                return Ok(false);
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        let updated = rewrite_token_lines(&contents, access_token, refresh_token);
        tokio::fs::write(&self.path, updated)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Tokens saved to env file");
        Ok(true)
    }
}

/// Replaces the values of the two token lines, preserving everything else
/// (including each line's terminator)
pub fn rewrite_token_lines(contents: &str, access_token: &str, refresh_token: &str) -> String {
    let mut out = String::with_capacity(contents.len());
    for line in contents.split_inclusive('\n') {
        let (body, ending) = split_line_ending(line);
        if body.starts_with("TRAKT_ACCESS_TOKEN=") {
            out.push_str(ACCESS_TOKEN_KEY);
            out.push('=');
            out.push_str(access_token);
            out.push_str(ending);
        } else if body.starts_with("TRAKT_REFRESH_TOKEN=") {
            out.push_str(REFRESH_TOKEN_KEY);
            out.push('=');
            out.push_str(refresh_token);
            out.push_str(ending);
        } else {
            out.push_str(line);
        }
    }
    out
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

// ============================================================================
// TokenManager
// ============================================================================

#[derive(Debug, Clone, Default)]
struct TokenPair {
    access_token: String,
    refresh_token: String,
}

/// Body of a refresh request to `/oauth/token`
#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'static str,
}

/// Successful `/oauth/token` response (only the fields we use)
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Owner of the Trakt credentials
///
/// Shared via `Arc` between the client and the maintenance path. Header
/// construction reads the token pair without waiting on a refresh; refreshes
/// are serialized by an async lock.
pub struct TokenManager {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    tokens: RwLock<TokenPair>,
    refresh_lock: tokio::sync::Mutex<()>,
    store: Option<EnvFileStore>,
}

impl TokenManager {
    /// Creates a token manager without a persistent store
    ///
    /// # Arguments
    ///
    /// * `credentials` - Client credentials and the initial token pair
    /// * `base_url` - Trakt API base URL (e.g. `https://api.trakt.tv`)
    pub fn new(credentials: Credentials, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            tokens: RwLock::new(TokenPair {
                access_token: credentials.access_token,
                refresh_token: credentials.refresh_token,
            }),
            refresh_lock: tokio::sync::Mutex::new(()),
            store: None,
        }
    }

    /// Builds a token manager from configuration, persisting to the
    /// configured env file or a discovered one
    pub fn from_config(config: &TraktConfig) -> Self {
        let store = match &config.config_file {
            Some(path) => EnvFileStore::new(path),
            None => EnvFileStore::discover(),
        };
        Self::new(Credentials::from_config(config), &config.api_url)
            .with_redirect_uri(&config.redirect_uri)
            .with_store(store)
    }

    /// Persists refreshed tokens to `store`
    pub fn with_store(mut self, store: EnvFileStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    /// Client id and secret are both present
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    pub fn has_access_token(&self) -> bool {
        !self.read_tokens().access_token.is_empty()
    }

    /// Current access token
    pub fn access_token(&self) -> String {
        self.read_tokens().access_token
    }

    /// Current refresh token
    pub fn refresh_token(&self) -> String {
        self.read_tokens().refresh_token
    }

    pub fn store(&self) -> Option<&EnvFileStore> {
        self.store.as_ref()
    }

    fn read_tokens(&self) -> TokenPair {
        match self.tokens.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_tokens(&self, pair: TokenPair) {
        match self.tokens.write() {
            Ok(mut guard) => *guard = pair,
            Err(poisoned) => *poisoned.into_inner() = pair,
        }
    }

    /// Headers for an authenticated Trakt API request
    pub fn current_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "trakt-api-version",
            HeaderValue::from_static(TRAKT_API_VERSION),
        );

        match HeaderValue::from_str(&self.client_id) {
            Ok(value) => {
                headers.insert("trakt-api-key", value);
            }
            Err(_) => warn!("Client id contains characters not allowed in a header"),
        }

        let access_token = self.read_tokens().access_token;
        match HeaderValue::from_str(&format!("Bearer {access_token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Access token contains characters not allowed in a header"),
        }

        headers
    }

    /// Exchanges the refresh token for a new token pair
    ///
    /// On success the new tokens replace the in-memory pair, are written to
    /// the env file (when one exists) and are mirrored into the process
    /// environment. Any failure is logged and leaves the state untouched.
    pub async fn refresh(&self) -> bool {
        let _guard = self.refresh_lock.lock().await;

        let current = self.read_tokens();
        if current.refresh_token.is_empty() {
            error!("No refresh token available");
            return false;
        }

        info!("Refreshing access token");
        let body = RefreshRequest {
            refresh_token: &current.refresh_token,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_uri,
            grant_type: "refresh_token",
        };

        let response = match self
            .http
            .post(format!("{}/oauth/token", self.base_url))
            .json(&body)
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Token refresh error");
                return false;
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            error!(status = status.as_u16(), "Token refresh failed");
            return false;
        }

        let token: TokenResponse = match response.json().await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Token refresh response could not be parsed");
                return false;
            }
        };

        let updated = TokenPair {
            access_token: token.access_token,
            refresh_token: token
                .refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or(current.refresh_token),
        };
        self.write_tokens(updated.clone());

        if let Some(store) = &self.store {
            if let Err(e) = store
                .save_tokens(&updated.access_token, &updated.refresh_token)
                .await
            {
                error!(error = %e, "Error saving tokens");
            }
        }
        mirror_into_env(&updated);

        info!("Access token refreshed successfully");
        true
    }
}

/// Publishes the pair as `TRAKT_ACCESS_TOKEN` / `TRAKT_REFRESH_TOKEN`
///
/// `set_var` is not synchronized with `getenv` on other threads (libc DNS
/// resolution included) and is `unsafe` from edition 2024 onwards. Callers
/// must not refresh while other threads may be reading the environment;
/// the CLI performs at most one refresh per command.
fn mirror_into_env(tokens: &TokenPair) {
    std::env::set_var(ACCESS_TOKEN_KEY, &tokens.access_token);
    std::env::set_var(REFRESH_TOKEN_KEY, &tokens.refresh_token);
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("base_url", &self.base_url)
            .field("configured", &self.is_configured())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
