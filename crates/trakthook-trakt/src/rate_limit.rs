//! Write pacing and Retry-After handling for the Trakt API
//!
//! Trakt allows roughly one write (POST/PUT/DELETE) per second per user.
//! [`WritePacer`] spaces writes process-wide so that no two start less
//! than the configured interval apart; reads are never paced.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trakthook_trakt::rate_limit::WritePacer;
//!
//! # async fn example() {
//! let pacer = WritePacer::with_defaults();
//! pacer.acquire().await;
//! // ... issue the write ...
//! # }
//! ```

use std::time::Duration;

use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, warn};

/// Minimum spacing between two writes
pub const DEFAULT_WRITE_INTERVAL: Duration = Duration::from_secs(1);

/// Wait used after a 429 when `Retry-After` is absent or unusable
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(2);

/// Longest HTTP-date delay honoured before falling back to the default
const MAX_RETRY_AFTER_SECS: u64 = 3600;

// ============================================================================
// WritePacer
// ============================================================================

/// Process-wide spacing of write requests
///
/// Holds the instant the previous write was issued. The lock is held while
/// sleeping, so concurrent writers queue and are released one interval
/// apart.
#[derive(Debug)]
pub struct WritePacer {
    interval: Duration,
    last_write: Mutex<Option<Instant>>,
}

impl WritePacer {
    /// Creates a pacer with the given minimum spacing
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_write: Mutex::new(None),
        }
    }

    /// Creates a pacer with [`DEFAULT_WRITE_INTERVAL`]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_WRITE_INTERVAL)
    }

    /// Returns the configured spacing
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until a write may be issued and records it as issued now
    ///
    /// Returns how long the caller was made to sleep.
    pub async fn acquire(&self) -> Duration {
        let mut last_write = self.last_write.lock().await;

        let mut waited = Duration::ZERO;
        if let Some(previous) = *last_write {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                waited = self.interval - elapsed;
                debug!(wait_ms = waited.as_millis() as u64, "Pacing write request");
                tokio::time::sleep(waited).await;
            }
        }

        *last_write = Some(Instant::now());
        waited
    }
}

impl Default for WritePacer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Retry-After header parsing
// ============================================================================

/// Parses a Retry-After header value into a Duration.
///
/// The header can be either:
/// - An integer number of seconds (e.g., "30")
/// - An HTTP-date (e.g., "Fri, 31 Dec 2025 23:59:59 GMT") - parsed as seconds from now
///
/// Falls back to the default duration if parsing fails.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value) {
        let remaining = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
        match u64::try_from(remaining.num_seconds()) {
            Ok(secs) if secs <= MAX_RETRY_AFTER_SECS => return Duration::from_secs(secs),
            Ok(_) => {}
            // Date already passed
            Err(_) => return Duration::ZERO,
        }
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}
