//! # Quorum-Harness Test Suite
//!
//! Cross-crate tests that need more than one subsystem at a time.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion groups per subsystem
//! │   ├── qh_01_subnet_allocation.rs
//! │   └── qh_02_extra_data.rs
//! │
//! └── integration/      # Whole-topology scenarios
//!     ├── e2e_topology.rs
//!     └── allocation.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qh-tests
//! cargo test -p qh-tests integration::
//! cargo bench -p qh-tests
//! ```

pub mod benchmarks;
pub mod integration;
