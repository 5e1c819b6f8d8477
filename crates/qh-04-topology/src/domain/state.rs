//! # Lifecycle State Machine
//!
//! ```text
//! Uninitialized --start--> Started
//! Started       --stop---> Stopped
//! Stopped       --start--> Started
//! Stopped       --close--> Closed
//! ```
//!
//! Every other pair is rejected. `Closed` is terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::TopologyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopologyState {
    Uninitialized,
    Started,
    Stopped,
    Closed,
}

impl TopologyState {
    pub const ALL: [TopologyState; 4] = [
        TopologyState::Uninitialized,
        TopologyState::Started,
        TopologyState::Stopped,
        TopologyState::Closed,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, TopologyState::Closed)
    }
}

impl fmt::Display for TopologyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TopologyState::Uninitialized => "Uninitialized",
            TopologyState::Started => "Started",
            TopologyState::Stopped => "Stopped",
            TopologyState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// Lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleOp {
    Start,
    Stop,
    Close,
}

impl LifecycleOp {
    pub const ALL: [LifecycleOp; 3] = [LifecycleOp::Start, LifecycleOp::Stop, LifecycleOp::Close];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleOp::Start => "start",
            LifecycleOp::Stop => "stop",
            LifecycleOp::Close => "close",
        }
    }
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State reached by applying `operation` in `current`.
pub fn transition(
    current: TopologyState,
    operation: LifecycleOp,
) -> Result<TopologyState, TopologyError> {
    use LifecycleOp::*;
    use TopologyState::*;

    match (current, operation) {
        (Uninitialized, Start) | (Stopped, Start) => Ok(Started),
        (Started, Stop) => Ok(Stopped),
        (Stopped, Close) => Ok(Closed),
        _ => Err(TopologyError::IllegalStateTransition { current, operation }),
    }
}
