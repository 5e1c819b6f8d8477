//! # Quorum-Harness Benchmarks
//!
//! Hot paths of topology setup: address leasing and genesis extra-data
//! encoding. Both run once per member or per topology, so the numbers
//! matter mostly for very large generated topologies.

pub mod qh_01_subnet_allocation;
pub mod qh_02_extra_data;
