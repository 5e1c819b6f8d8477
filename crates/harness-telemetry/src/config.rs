//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Filter directive (`info`, `qh_03_convergence=debug,info`, ...)
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,

    /// Colourise human-readable output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "quorum-harness".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: quorum-harness)
    /// - `QH_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `QH_JSON_LOGS`: JSON output (default: false, true in CI)
    /// - `NO_COLOR`: disables ANSI colours when set
    pub fn from_env() -> Self {
        let in_ci = env::var("CI").is_ok();
        let defaults = Self::default();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: env::var("QH_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            json_logs: env::var("QH_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(in_ci),

            ansi: env::var("NO_COLOR").is_err() && !in_ci,
        }
    }

    /// Override the filter directive (e.g. from a `--log-level` flag).
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
