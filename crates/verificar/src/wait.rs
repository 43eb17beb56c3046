//! Wait mechanisms with explicit, per-step timing.
//!
//! Nothing here inherits ambient session defaults: every wait takes its
//! timeout, poll interval, and (for network idle) quiescence threshold as
//! configuration. Each wait polls until satisfied or until its deadline,
//! then fails; there are no retries beyond that polling.

use std::time::{Duration, Instant};

use crate::driver::{ElementHandle, PageDriver};
use crate::locator::{Locator, DEFAULT_POLL_INTERVAL_MS};
use crate::result::{VerificarError, VerificarResult};

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Network idle threshold (500ms without requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

/// Options for wait operations
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Quiescence window for network idle, in milliseconds
    pub idle_threshold_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            idle_threshold_ms: NETWORK_IDLE_THRESHOLD_MS,
        }
    }
}

impl WaitOptions {
    /// Create wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set the network-idle quiescence window in milliseconds
    #[must_use]
    pub const fn with_idle_threshold(mut self, idle_threshold_ms: u64) -> Self {
        self.idle_threshold_ms = idle_threshold_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get idle threshold as Duration
    #[must_use]
    pub const fn idle_threshold(&self) -> Duration {
        Duration::from_millis(self.idle_threshold_ms)
    }
}

/// Wait until no network activity has been observed for the quiescence
/// window.
///
/// The window restarts whenever a poll observes in-flight requests, so a
/// page that keeps issuing requests never reaches idle and the wait fails
/// with `Timeout` at the deadline.
///
/// # Errors
///
/// `Timeout` if idleness is not reached within `options.timeout_ms`; any
/// driver error is propagated.
pub async fn wait_for_network_idle<D: PageDriver + ?Sized>(
    driver: &D,
    options: &WaitOptions,
) -> VerificarResult<()> {
    let start = Instant::now();
    let mut quiet_since: Option<Instant> = None;

    loop {
        let in_flight = driver.in_flight_requests().await?;
        if in_flight == 0 {
            let since = *quiet_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= options.idle_threshold() {
                tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "network idle");
                return Ok(());
            }
        } else {
            quiet_since = None;
        }

        if start.elapsed() >= options.timeout() {
            return Err(VerificarError::Timeout {
                ms: options.timeout_ms,
                waiting_for: "network idle".to_string(),
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Poll locator resolution until a single element qualifies.
///
/// Uses the locator's own timeout and poll interval. An ambiguous strict
/// match fails immediately; an element that never appears fails with
/// `ElementNotFound` at the locator's deadline.
pub async fn wait_for_match<D: PageDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
) -> VerificarResult<ElementHandle> {
    let start = Instant::now();
    loop {
        let snapshot = driver.dom_snapshot().await?;
        if let Some(handle) = locator.resolve_single(&snapshot)? {
            return Ok(handle);
        }
        if start.elapsed() >= locator.options().timeout {
            return Err(VerificarError::ElementNotFound {
                query: locator.description(),
                timeout_ms: locator.options().timeout.as_millis() as u64,
            });
        }
        tokio::time::sleep(locator.options().poll_interval).await;
    }
}
