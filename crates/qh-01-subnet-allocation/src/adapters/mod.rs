//! Adapters layer: provisioner implementations.

mod in_memory;

pub use in_memory::InMemoryNetworkProvisioner;
