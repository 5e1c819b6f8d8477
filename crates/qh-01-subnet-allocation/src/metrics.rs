//! # Allocation Metrics
//!
//! Enable with the `metrics` feature.
//!
//! - `qh_subnet_allocation_attempts_total{outcome}` - provisioning attempts
//! - `qh_addresses_leased_total` - host addresses issued

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref ALLOCATION_ATTEMPTS: IntCounterVec = register_int_counter_vec!(
        "qh_subnet_allocation_attempts_total",
        "Subnet provisioning attempts by outcome",
        &["outcome"]
    )
    .expect("Failed to create ALLOCATION_ATTEMPTS metric");

    pub static ref ADDRESSES_LEASED: IntCounter = register_int_counter!(
        "qh_addresses_leased_total",
        "Host addresses issued from subnet leases"
    )
    .expect("Failed to create ADDRESSES_LEASED metric");
}

/// Record one provisioning attempt (`accepted` / `rejected`).
#[cfg(feature = "metrics")]
pub fn record_allocation_attempt(outcome: &str) {
    ALLOCATION_ATTEMPTS.with_label_values(&[outcome]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_address_leased() {
    ADDRESSES_LEASED.inc();
}

#[cfg(not(feature = "metrics"))]
pub fn record_allocation_attempt(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_address_leased() {}
