//! Subscriber installation and structured log macros.
//!
//! Every log line carries the same core fields so a run can be filtered
//! by component or member:
//! - `component`: emitting part of the harness (`allocator`, `topology`, ...)
//! - `member`: network member the event concerns, when there is one

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

static INITIALISED: AtomicBool = AtomicBool::new(false);

/// Install the global `tracing` subscriber.
///
/// Only the first call in a process installs anything; later calls fail
/// with `TelemetryError::AlreadyInitialised`.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if INITIALISED.swap(true, Ordering::SeqCst) {
        return Err(TelemetryError::AlreadyInitialised);
    }

    let env_filter = match EnvFilter::try_new(&config.log_level) {
        Ok(filter) => filter,
        Err(e) => {
            INITIALISED.store(false, Ordering::SeqCst);
            return Err(TelemetryError::Config(format!(
                "invalid log filter '{}': {e}",
                config.log_level
            )));
        }
    };

    let installed = if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(config.ansi);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    };

    installed.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        filter = %config.log_level,
        "Logging initialised"
    );
    Ok(())
}

/// Log an event with a `component` field.
///
/// ```rust
/// harness_telemetry::log_event!(info, "allocator", "Subnet ready", cidr = "172.29.0.0/24");
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:ident, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log an event concerning one network member.
#[macro_export]
macro_rules! log_member_event {
    ($level:ident, $component:expr, $msg:expr, $member:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            component = $component,
            member = %$member,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_initialisation_rejected() {
        let config = TelemetryConfig::default().with_log_level("warn");
        // The first call's outcome depends on test order.
        let _ = init_logging(&config);
        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::AlreadyInitialised)
        ));
    }

    #[test]
    fn test_macros_expand() {
        log_event!(info, "test", "plain event");
        log_event!(debug, "test", "event with fields", attempt = 3, cidr = %"172.29.0.0/24");
        log_member_event!(warn, "test", "member event", "node-a", elapsed_ms = 12u64);
    }
}
