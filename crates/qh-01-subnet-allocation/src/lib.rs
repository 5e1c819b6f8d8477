//! # Subnet Allocation Subsystem
//!
//! **Subsystem ID:** 1
//!
//! Hands out isolated `/24` networks for test topologies and sequential
//! host addresses inside them.
//!
//! ## Architecture
//!
//! - **Domain Layer:** `CidrBlock`, the pure `candidate_cidr` function and
//!   `AddressLease` (atomic host counter, never recycles)
//! - **Ports Layer:** `NetworkProvisioner` (driven), `SubnetAllocationApi` (driving)
//! - **Service Layer:** `SubnetAllocator` (bounded retry over candidates)
//! - **Adapters Layer:** `InMemoryNetworkProvisioner`
//!
//! ## Allocation Algorithm
//!
//! ```text
//! cursor (atomic, wraps 255 → 0)
//!    │
//!    ↓  candidate_cidr(range, cursor)
//! 172.29.N.0/24 ──create_isolated_network──→ Provisioner
//!    │                                          │
//!    │◄──────── rejected: next candidate ───────┤
//!    │                                          │
//!    └──── accepted: Subnet { handle, lease } ◄─┘
//! ```
//!
//! At most `max_attempts` (default 25) candidates are tried before
//! `AllocationError::AllocationExhausted`.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use qh_01_subnet_allocation::{AllocatorConfig, InMemoryNetworkProvisioner, SubnetAllocator};
//!
//! let provisioner = Arc::new(InMemoryNetworkProvisioner::new());
//! let allocator = SubnetAllocator::new(provisioner, AllocatorConfig::default());
//! assert_eq!(allocator.peek_candidate().to_string(), "172.29.0.0/24");
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Domain
pub use domain::{
    candidate_cidr, AddressLease, AllocationError, AllocatorConfig, CidrBlock, SubnetRange,
    FIRST_HOST_OFFSET, LAST_HOST_OFFSET,
};

// Ports
pub use ports::{NetworkHandle, NetworkProvisioner, ProvisionError, SubnetAllocationApi};

// Service
pub use service::{Subnet, SubnetAllocator};

// Adapters
pub use adapters::InMemoryNetworkProvisioner;
