//! # Convergence Poller
//!
//! ```text
//! ┌──────────── probe ────────────┐
//! │  Ok(value)  → return value    │
//! │  Err(obs)   → remember obs    │
//! │  panic      → remember panic  │
//! └───────────────────────────────┘
//!        │ not done
//!        ↓
//!   deadline passed? ── yes ──→ ConvergenceError::Timeout
//!        │ no
//!        ↓
//!   sleep(min(interval, time left))
//! ```
//!
//! A probe that is still running at the deadline is abandoned.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use shared_types::RpcError;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{Condition, ConvergenceError, PollerConfig, Populated};
use crate::metrics;

/// Retry-until-true primitive with a bounded budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvergencePoller {
    config: PollerConfig,
}

impl ConvergencePoller {
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Run `probe` until it yields a value or the budget is spent.
    ///
    /// `Err` results and panics are both treated as "not yet"; the last one
    /// is reported in the timeout error. `timeout` of `None` uses the
    /// configured default.
    pub async fn poll<T, E, F, Fut>(
        &self,
        description: &str,
        timeout: Option<Duration>,
        mut probe: F,
    ) -> Result<T, ConvergenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let timeout = timeout.unwrap_or(self.config.timeout);
        let started = Instant::now();
        let deadline = started + timeout;
        let mut attempts: u32 = 0;

        let last_observation = loop {
            attempts += 1;
            metrics::record_poll();

            let remaining = deadline.saturating_duration_since(Instant::now());
            let attempt = AssertUnwindSafe(async { probe().await }).catch_unwind();

            let observation = match tokio::time::timeout(remaining, attempt).await {
                Ok(Ok(Ok(value))) => {
                    let elapsed = started.elapsed();
                    metrics::record_wait("converged", elapsed.as_secs_f64());
                    debug!(
                        description,
                        attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Converged"
                    );
                    return Ok(value);
                }
                Ok(Ok(Err(observation))) => observation.to_string(),
                Ok(Err(panic)) => format!("probe panicked: {}", panic_message(&*panic)),
                Err(_) => "probe still running at the deadline".to_string(),
            };

            let now = Instant::now();
            if now >= deadline {
                break observation;
            }
            tokio::time::sleep(self.config.poll_interval.min(deadline - now)).await;
        };

        metrics::record_wait("timeout", started.elapsed().as_secs_f64());
        warn!(
            description,
            attempts,
            timeout_ms = timeout.as_millis() as u64,
            %last_observation,
            "Convergence timeout"
        );
        Err(ConvergenceError::Timeout {
            description: description.to_string(),
            timeout,
            attempts,
            last_observation,
        })
    }

    /// Wait until `predicate` returns `true`.
    pub async fn await_condition<F, Fut>(
        &self,
        description: &str,
        timeout: Option<Duration>,
        mut predicate: F,
    ) -> Result<(), ConvergenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.poll(description, timeout, || {
            let holds = predicate();
            async move {
                if holds.await {
                    Ok(())
                } else {
                    Err("condition not met")
                }
            }
        })
        .await
    }

    /// Wait until `supplier` returns a populated value, and return it.
    pub async fn await_data<T, E, F, Fut>(
        &self,
        description: &str,
        timeout: Option<Duration>,
        mut supplier: F,
    ) -> Result<T, ConvergenceError>
    where
        T: Populated,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.poll(description, timeout, || {
            let read = supplier();
            async move {
                match read.await {
                    Ok(value) if value.is_populated() => Ok(value),
                    Ok(_) => Err("empty result".to_string()),
                    Err(e) => Err(e.to_string()),
                }
            }
        })
        .await
    }

    /// Wait until `supplier` returns `Some`, and return the value.
    pub async fn await_presence<T, E, F, Fut>(
        &self,
        description: &str,
        timeout: Option<Duration>,
        mut supplier: F,
    ) -> Result<T, ConvergenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: Display,
    {
        self.poll(description, timeout, || {
            let read = supplier();
            async move {
                match read.await {
                    Ok(Some(value)) => Ok(value),
                    Ok(None) => Err("not present".to_string()),
                    Err(e) => Err(e.to_string()),
                }
            }
        })
        .await
    }

    /// Keep re-reading until the value appears, within the default budget.
    pub async fn or_timeout<T, F, Fut>(&self, description: &str, read: F) -> Result<T, ConvergenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, RpcError>>,
    {
        self.await_presence(description, None, read).await
    }

    /// Evaluate a prepared `Condition`.
    pub async fn check(&self, condition: Condition<'_>) -> Result<(), ConvergenceError> {
        let (description, timeout, mut check) = condition.into_parts();
        self.poll(&description, timeout, || check()).await
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
