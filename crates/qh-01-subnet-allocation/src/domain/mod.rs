//! Domain layer: addresses, leases and the pure candidate function.

mod cidr;
mod config;
mod errors;
mod lease;

pub use cidr::{candidate_cidr, CidrBlock, SubnetRange};
pub use config::AllocatorConfig;
pub use errors::AllocationError;
pub use lease::{AddressLease, FIRST_HOST_OFFSET, LAST_HOST_OFFSET};

#[cfg(test)]
mod tests;
