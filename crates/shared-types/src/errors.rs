//! # Error Types
//!
//! Errors shared by every implementation of the RPC read port.

use thiserror::Error;

/// Failure of a single read against a member's RPC endpoint.
///
/// The convergence engine treats every variant as transient while polling;
/// only the final timeout is surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// The endpoint could not be reached.
    #[error("Transport error talking to {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The node answered with a JSON-RPC error object.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response did not have the expected shape.
    #[error("Failed to decode response for {method}: {reason}")]
    Decode { method: String, reason: String },

    /// The node answered, but has nothing for the query (yet).
    #[error("{what} not found")]
    NotFound { what: String },

    /// The member is not running (stopped or never launched).
    #[error("Member {0} is not running")]
    MemberUnavailable(String),
}

impl RpcError {
    /// Build a decode error for `method`.
    pub fn decode(method: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a not-found error describing the missing item.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}
