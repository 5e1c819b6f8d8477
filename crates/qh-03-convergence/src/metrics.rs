//! # Convergence Metrics
//!
//! Enable with the `metrics` feature.
//!
//! - `qh_convergence_waits_total{outcome}` - waits by `converged` / `timeout`
//! - `qh_convergence_wait_seconds` - time until a wait resolved
//! - `qh_convergence_polls_total` - individual probes

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref CONVERGENCE_WAITS: IntCounterVec = register_int_counter_vec!(
        "qh_convergence_waits_total",
        "Convergence waits by outcome",
        &["outcome"]
    )
    .expect("Failed to create CONVERGENCE_WAITS metric");

    pub static ref CONVERGENCE_WAIT_SECONDS: Histogram = register_histogram!(
        "qh_convergence_wait_seconds",
        "Time until a convergence wait resolved",
        vec![0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]
    )
    .expect("Failed to create CONVERGENCE_WAIT_SECONDS metric");

    pub static ref CONVERGENCE_POLLS: IntCounter = register_int_counter!(
        "qh_convergence_polls_total",
        "Individual convergence probes"
    )
    .expect("Failed to create CONVERGENCE_POLLS metric");
}

#[cfg(feature = "metrics")]
pub fn record_wait(outcome: &str, seconds: f64) {
    CONVERGENCE_WAITS.with_label_values(&[outcome]).inc();
    CONVERGENCE_WAIT_SECONDS.observe(seconds);
}

#[cfg(feature = "metrics")]
pub fn record_poll() {
    CONVERGENCE_POLLS.inc();
}

#[cfg(not(feature = "metrics"))]
pub fn record_wait(_outcome: &str, _seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_poll() {}
