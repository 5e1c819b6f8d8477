//! # Harness Telemetry
//!
//! Log and metric plumbing for the harness runtime.
//!
//! ## Components
//!
//! | Module | Backend | Output |
//! |--------|---------|--------|
//! | `logging` | `tracing-subscriber` | Human-readable or JSON lines on stdout |
//! | `metrics` | `prometheus` | Text exposition of the default registry |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use harness_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `quorum-harness` | Service name in logs |
//! | `QH_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `QH_JSON_LOGS` | `false` (`true` in CI) | JSON output |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{record_command, render_metrics, HistogramTimer};

#[doc(hidden)]
pub use tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Telemetry is already initialised in this process")]
    AlreadyInitialised,

    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Failed to encode Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and prime the harness metrics.
///
/// Hold the returned guard for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_logging(&config)?;
    lazy_static::initialize(&metrics::COMMANDS);
    lazy_static::initialize(&metrics::COMMAND_DURATION);

    tracing::info!(service = %config.service_name, "Telemetry initialised");
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
