//! Trakt API client
//!
//! Authenticated, rate-limited and retrying HTTP calls against the Trakt API.
//!
//! ## Retry model
//!
//! Each call runs a small state machine:
//! - `429` sleeps for `Retry-After` (default 2 s) and consumes an attempt
//! - `401` triggers one token refresh per call; a successful refresh retries
//!   immediately without consuming an attempt
//! - transport errors sleep 1 s (unless it was the last attempt) and consume an attempt
//! - any other status is handed back to the caller
//!
//! Writes (POST/PUT/DELETE) go through the shared [`WritePacer`] before
//! every attempt.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trakthook_trakt::auth::{Credentials, TokenManager};
//! use trakthook_trakt::client::{ClientOptions, TraktClient};
//!
//! # async fn example() -> Result<(), trakthook_trakt::TraktError> {
//! let tokens = Arc::new(TokenManager::new(Credentials::default(), "https://api.trakt.tv"));
//! let client = TraktClient::new(tokens, ClientOptions::default());
//! let response = client.get("/users/settings", "check token").await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

use std::{fmt, sync::Arc, time::Duration};

use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};
use trakthook_core::config::{TraktConfig, DEFAULT_API_URL};

use crate::{
    auth::TokenManager,
    rate_limit::{parse_retry_after, WritePacer, DEFAULT_RETRY_AFTER, DEFAULT_WRITE_INTERVAL},
    TraktError,
};

/// Pause before retrying after a transport error
const TRANSPORT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Default number of attempts per call
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// ApiMethod
// ============================================================================

/// HTTP verbs used against the Trakt API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl ApiMethod {
    /// Writes are paced; reads are not
    pub fn is_write(&self) -> bool {
        matches!(self, ApiMethod::Post | ApiMethod::Put | ApiMethod::Delete)
    }

    fn to_reqwest(self) -> Method {
        match self {
            ApiMethod::Get => Method::GET,
            ApiMethod::Post => Method::POST,
            ApiMethod::Put => Method::PUT,
            ApiMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApiMethod::Get => "GET",
            ApiMethod::Post => "POST",
            ApiMethod::Put => "PUT",
            ApiMethod::Delete => "DELETE",
        })
    }
}

// ============================================================================
// ClientOptions
// ============================================================================

/// Tunables for [`TraktClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API base URL without a trailing slash
    pub base_url: String,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// Attempts per call
    pub max_retries: u32,
    /// Minimum spacing between writes
    pub write_interval: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            write_interval: DEFAULT_WRITE_INTERVAL,
        }
    }
}

impl ClientOptions {
    pub fn from_config(config: &TraktConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_write_interval(mut self, interval: Duration) -> Self {
        self.write_interval = interval;
        self
    }
}

// ============================================================================
// TraktClient
// ============================================================================

/// Outcome of a single attempt
enum CallStep {
    /// A response the caller should see
    Done(Response),
    /// 429 with the delay to honour
    RateLimited(Duration),
    /// 401; may be retried once after a refresh
    Unauthorized(Response),
    /// The request never produced a response
    TransportFailed(reqwest::Error),
}

/// HTTP client for the Trakt API
///
/// Cheap to share behind an `Arc`; the token manager and write pacer are
/// shared by every call made through it.
pub struct TraktClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    tokens: Arc<TokenManager>,
    pacer: Arc<WritePacer>,
}

impl TraktClient {
    /// Creates a new client
    ///
    /// # Arguments
    ///
    /// * `tokens` - Shared token manager providing headers and refresh
    /// * `options` - Base URL, timeout, retry count and write spacing
    pub fn new(tokens: Arc<TokenManager>, options: ClientOptions) -> Self {
        Self {
            http: Client::new(),
            base_url: options.base_url.trim_end_matches('/').to_string(),
            timeout: options.timeout,
            max_retries: options.max_retries,
            tokens,
            pacer: Arc::new(WritePacer::new(options.write_interval)),
        }
    }

    /// Builds a client and its token manager from configuration
    pub fn from_config(config: &TraktConfig) -> Self {
        let tokens = Arc::new(TokenManager::from_config(config));
        Self::new(tokens, ClientOptions::from_config(config))
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Client id and secret are both present
    pub fn is_configured(&self) -> bool {
        self.tokens.is_configured()
    }

    /// Sends a GET request
    pub async fn get(&self, endpoint: &str, operation: &str) -> Result<Response, TraktError> {
        self.call::<()>(ApiMethod::Get, endpoint, None, operation)
            .await
    }

    /// Sends a POST request with a JSON body
    pub async fn post<B>(
        &self,
        endpoint: &str,
        body: &B,
        operation: &str,
    ) -> Result<Response, TraktError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.call(ApiMethod::Post, endpoint, Some(body), operation)
            .await
    }

    /// Makes an authenticated request with the configured retry count
    pub async fn call<B>(
        &self,
        method: ApiMethod,
        endpoint: &str,
        body: Option<&B>,
        operation: &str,
    ) -> Result<Response, TraktError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.call_with_retries(method, endpoint, body, operation, self.max_retries)
            .await
    }

    /// Makes an authenticated request
    ///
    /// Returns the first response that is neither a retryable 429 nor a
    /// recoverable 401. A 401 that survives the single refresh is returned
    /// as a response, not an error.
    ///
    /// # Errors
    ///
    /// - [`TraktError::NotConfigured`] without any I/O when credentials are missing
    /// - [`TraktError::RateLimited`] when every attempt was throttled
    /// - [`TraktError::Transport`] when the last attempt failed on the network
    pub async fn call_with_retries<B>(
        &self,
        method: ApiMethod,
        endpoint: &str,
        body: Option<&B>,
        operation: &str,
        max_retries: u32,
    ) -> Result<Response, TraktError>
    where
        B: Serialize + ?Sized + Sync,
    {
        if !self.tokens.is_configured() {
            debug!(operation, "Trakt not configured, skipping");
            return Err(TraktError::NotConfigured);
        }

        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let max_retries = max_retries.max(1);
        let mut attempt: u32 = 0;
        let mut refreshed = false;
        let mut last_error = TraktError::Transport("no attempt made".to_string());

        while attempt < max_retries {
            if method.is_write() {
                self.pacer.acquire().await;
            }

            let step = match self.send(method, &url, body).await {
                Ok(response) => match response.status() {
                    StatusCode::TOO_MANY_REQUESTS => CallStep::RateLimited(retry_after(&response)),
                    StatusCode::UNAUTHORIZED => CallStep::Unauthorized(response),
                    _ => CallStep::Done(response),
                },
                Err(e) => CallStep::TransportFailed(e),
            };

            match step {
                CallStep::Done(response) => {
                    if attempt > 0 || refreshed {
                        info!(operation, attempt, "Request succeeded after retry");
                    }
                    debug!(
                        operation,
                        %method,
                        status = response.status().as_u16(),
                        "Trakt response"
                    );
                    return Ok(response);
                }
                CallStep::Unauthorized(response) => {
                    if refreshed {
                        warn!(operation, "Still unauthorized after token refresh");
                        return Ok(response);
                    }
                    warn!(operation, "Token expired, attempting refresh");
                    if !self.tokens.refresh().await {
                        return Ok(response);
                    }
                    refreshed = true;
                }
                CallStep::RateLimited(delay) => {
                    attempt += 1;
                    last_error = TraktError::RateLimited { attempts: attempt };
                    if attempt < max_retries {
                        info!(
                            operation,
                            attempt,
                            retry_after_ms = delay.as_millis() as u64,
                            "Rate limited, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        warn!(operation, attempts = attempt, "429 retry limit exhausted");
                    }
                }
                CallStep::TransportFailed(e) => {
                    attempt += 1;
                    warn!(
                        operation,
                        attempt,
                        max_retries,
                        error = %e,
                        "Connection error"
                    );
                    last_error = TraktError::Transport(e.to_string());
                    if attempt < max_retries {
                        tokio::time::sleep(TRANSPORT_RETRY_DELAY).await;
                    }
                }
            }
        }

        Err(last_error)
    }

    async fn send<B>(
        &self,
        method: ApiMethod,
        url: &str,
        body: Option<&B>,
    ) -> reqwest::Result<Response>
    where
        B: Serialize + ?Sized + Sync,
    {
        let mut request = self
            .http
            .request(method.to_reqwest(), url)
            .headers(self.tokens.current_headers())
            .timeout(self.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await
    }
}

impl fmt::Debug for TraktClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraktClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("write_interval", &self.pacer.interval())
            .finish_non_exhaustive()
    }
}

fn retry_after(response: &Response) -> Duration {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
        .unwrap_or(DEFAULT_RETRY_AFTER)
}
