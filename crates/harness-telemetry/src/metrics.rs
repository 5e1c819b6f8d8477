//! Harness-level Prometheus metrics and text export.
//!
//! Subsystem crates register their own metrics (behind their `metrics`
//! feature) in the default registry; `render_metrics` exports all of them.
//!
//! - `qh_harness_commands_total{command, outcome}`
//! - `qh_harness_command_duration_seconds{command}`

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, Histogram, HistogramVec,
    IntCounterVec, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Completed CLI commands
    pub static ref COMMANDS: IntCounterVec = register_int_counter_vec!(
        "qh_harness_commands_total",
        "Harness commands run to completion",
        &["command", "outcome"]
    )
    .expect("Failed to create COMMANDS metric");

    /// Wall-clock duration of CLI commands
    pub static ref COMMAND_DURATION: HistogramVec = register_histogram_vec!(
        "qh_harness_command_duration_seconds",
        "Wall-clock duration of harness commands",
        &["command"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    )
    .expect("Failed to create COMMAND_DURATION metric");
}

/// Count a finished command.
pub fn record_command(command: &str, outcome: &str) {
    COMMANDS.with_label_values(&[command, outcome]).inc();
}

/// Encode every metric in the default registry as Prometheus text.
pub fn render_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }

    /// Timer for one command's duration.
    pub fn for_command(command: &str) -> Self {
        Self::new(&COMMAND_DURATION.with_label_values(&[command]))
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
