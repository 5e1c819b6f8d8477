//! # Integration Scenarios
//!
//! Topologies driven end to end over the in-memory provisioner and the
//! simulated network. No docker, no sockets.

mod allocation;
mod e2e_topology;
