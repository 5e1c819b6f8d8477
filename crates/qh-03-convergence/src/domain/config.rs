//! Poller configuration.

use std::env;
use std::time::Duration;

/// Default convergence budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default delay between two probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Budget used when a call does not override it.
    pub timeout: Duration,
    /// Delay between probes.
    pub poll_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QH_CONVERGENCE_TIMEOUT_SECS`: default budget (default: 30)
    /// - `QH_POLL_INTERVAL_MS`: probe interval (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout: env::var("QH_CONVERGENCE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            poll_interval: env::var("QH_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        }
    }

    /// Short budget and fast cadence for tests.
    pub fn for_testing() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(50),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}
