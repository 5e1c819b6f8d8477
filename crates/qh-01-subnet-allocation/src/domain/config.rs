//! Allocator configuration.

use std::env;

use super::cidr::SubnetRange;
use super::lease::FIRST_HOST_OFFSET;

/// Configuration for `SubnetAllocator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// `/16` range candidates are drawn from.
    pub range: SubnetRange,
    /// Candidates tried before giving up.
    pub max_attempts: u32,
    /// First host offset handed out by a lease (0 and 1 are reserved).
    pub first_host_offset: u8,
    /// Cursor value of the first candidate.
    pub initial_sequence: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            range: SubnetRange::default(),
            max_attempts: 25,
            first_host_offset: FIRST_HOST_OFFSET,
            initial_sequence: 0,
        }
    }
}

impl AllocatorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QH_SUBNET_PREFIX`: `/16` range, e.g. `172.29` (default: 172.29)
    /// - `QH_SUBNET_ATTEMPTS`: candidates tried per allocation (default: 25)
    /// - `QH_SUBNET_START`: first third-octet candidate (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            range: env::var("QH_SUBNET_PREFIX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.range),
            max_attempts: env::var("QH_SUBNET_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_attempts),
            initial_sequence: env::var("QH_SUBNET_START")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.initial_sequence),
            ..defaults
        }
    }

    /// Small attempt budget for tests.
    pub fn for_testing() -> Self {
        Self {
            max_attempts: 5,
            ..Self::default()
        }
    }
}
