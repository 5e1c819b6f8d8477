//! # Topology Metrics
//!
//! Enable with the `metrics` feature.
//!
//! - `qh_topology_transitions_total{operation}` - completed lifecycle transitions
//! - `qh_members_running` - members currently launched

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref TOPOLOGY_TRANSITIONS: IntCounterVec = register_int_counter_vec!(
        "qh_topology_transitions_total",
        "Completed topology lifecycle transitions",
        &["operation"]
    )
    .expect("Failed to create TOPOLOGY_TRANSITIONS metric");

    pub static ref MEMBERS_RUNNING: IntGauge = register_int_gauge!(
        "qh_members_running",
        "Members currently launched"
    )
    .expect("Failed to create MEMBERS_RUNNING metric");
}

#[cfg(feature = "metrics")]
pub fn record_transition(operation: &str) {
    TOPOLOGY_TRANSITIONS.with_label_values(&[operation]).inc();
}

#[cfg(feature = "metrics")]
pub fn add_running_members(delta: i64) {
    MEMBERS_RUNNING.add(delta);
}

#[cfg(not(feature = "metrics"))]
pub fn record_transition(_operation: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn add_running_members(_delta: i64) {}
