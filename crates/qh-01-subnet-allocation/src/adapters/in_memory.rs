//! In-memory network provisioner.
//!
//! Behaves like a Docker daemon that refuses overlapping subnets. Blocks can
//! be pre-reserved to simulate networks owned by other processes.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::CidrBlock;
use crate::ports::{NetworkHandle, NetworkProvisioner, ProvisionError};

#[derive(Debug, Default)]
struct ProvisionerState {
    active: HashMap<String, NetworkHandle>,
    reserved: HashSet<CidrBlock>,
    attempts: Vec<CidrBlock>,
    closed: Vec<NetworkHandle>,
    next_id: u64,
}

/// Overlap-checking provisioner kept entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryNetworkProvisioner {
    state: Mutex<ProvisionerState>,
}

impl InMemoryNetworkProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `cidr` as owned by someone else.
    pub fn reserve(&self, cidr: CidrBlock) {
        self.state.lock().reserved.insert(cidr);
    }

    /// Every candidate passed to `create_isolated_network`, in call order.
    pub fn attempts(&self) -> Vec<CidrBlock> {
        self.state.lock().attempts.clone()
    }

    pub fn active_networks(&self) -> Vec<NetworkHandle> {
        self.state.lock().active.values().cloned().collect()
    }

    pub fn closed_networks(&self) -> Vec<NetworkHandle> {
        self.state.lock().closed.clone()
    }
}

#[async_trait]
impl NetworkProvisioner for InMemoryNetworkProvisioner {
    async fn create_isolated_network(
        &self,
        name: &str,
        cidr: &CidrBlock,
    ) -> Result<NetworkHandle, ProvisionError> {
        let mut state = self.state.lock();
        state.attempts.push(*cidr);

        let in_use = state.reserved.contains(cidr)
            || state.active.values().any(|handle| handle.cidr == *cidr);
        if in_use {
            return Err(ProvisionError::AddressSpaceInUse {
                cidr: *cidr,
                reason: "Pool overlaps with other one on this address space".to_string(),
            });
        }

        state.next_id += 1;
        let handle = NetworkHandle {
            id: format!("net-{:04}", state.next_id),
            name: name.to_string(),
            cidr: *cidr,
        };
        state.active.insert(handle.id.clone(), handle.clone());
        Ok(handle)
    }

    async fn close_network(&self, handle: &NetworkHandle) -> Result<(), ProvisionError> {
        let mut state = self.state.lock();
        let removed = state
            .active
            .remove(&handle.id)
            .ok_or_else(|| ProvisionError::UnknownNetwork(handle.id.clone()))?;
        state.closed.push(removed);
        Ok(())
    }
}
