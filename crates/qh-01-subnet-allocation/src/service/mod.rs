//! # Subnet Allocator Service
//!
//! Walks the candidate sequence until the provisioner accepts a block.
//! The cursor is shared by every allocation made through one allocator, so
//! concurrent callers never race for the same candidate; collisions with
//! networks created outside this process surface as provisioner rejections
//! and are retried on the next candidate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::{candidate_cidr, AddressLease, AllocationError, AllocatorConfig, CidrBlock};
use crate::metrics;
use crate::ports::{NetworkHandle, NetworkProvisioner, SubnetAllocationApi};

/// A provisioned network together with its host-address lease.
#[derive(Debug)]
pub struct Subnet {
    handle: NetworkHandle,
    lease: AddressLease,
}

impl Subnet {
    pub fn new(handle: NetworkHandle, lease: AddressLease) -> Self {
        Self { handle, lease }
    }

    pub fn cidr(&self) -> CidrBlock {
        self.handle.cidr
    }

    pub fn handle(&self) -> &NetworkHandle {
        &self.handle
    }

    /// Issue the next host address of this subnet.
    pub fn lease_address(&self) -> Result<std::net::Ipv4Addr, AllocationError> {
        self.lease.lease_address()
    }

    pub fn lease(&self) -> &AddressLease {
        &self.lease
    }
}

/// Bounded-retry subnet allocator.
pub struct SubnetAllocator<P: NetworkProvisioner> {
    provisioner: Arc<P>,
    config: AllocatorConfig,
    cursor: AtomicU32,
}

impl<P: NetworkProvisioner> SubnetAllocator<P> {
    pub fn new(provisioner: Arc<P>, config: AllocatorConfig) -> Self {
        let cursor = AtomicU32::new(config.initial_sequence);
        Self {
            provisioner,
            config,
            cursor,
        }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Claim the next candidate, advancing the shared cursor.
    pub fn next_candidate(&self) -> CidrBlock {
        let sequence = self.cursor.fetch_add(1, Ordering::SeqCst);
        candidate_cidr(self.config.range, sequence)
    }

    /// Candidate the next claim would return, without claiming it.
    pub fn peek_candidate(&self) -> CidrBlock {
        candidate_cidr(self.config.range, self.cursor.load(Ordering::SeqCst))
    }

    /// Provision an isolated network named `name`.
    pub async fn allocate(&self, name: &str) -> Result<Subnet, AllocationError> {
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=self.config.max_attempts {
            let candidate = self.next_candidate();
            debug!(network = name, %candidate, attempt, "Trying subnet candidate");

            match self
                .provisioner
                .create_isolated_network(name, &candidate)
                .await
            {
                Ok(handle) => {
                    metrics::record_allocation_attempt("accepted");
                    info!(
                        network = name,
                        cidr = %handle.cidr,
                        id = %handle.id,
                        attempts = attempt,
                        "Subnet allocated"
                    );
                    let lease = AddressLease::starting_at(handle.cidr, self.config.first_host_offset);
                    return Ok(Subnet::new(handle, lease));
                }
                Err(e) => {
                    metrics::record_allocation_attempt("rejected");
                    debug!(network = name, %candidate, error = %e, "Subnet candidate rejected");
                    last_error = e.to_string();
                }
            }
        }

        warn!(
            network = name,
            attempts = self.config.max_attempts,
            %last_error,
            "Subnet allocation exhausted"
        );
        Err(AllocationError::AllocationExhausted {
            attempts: self.config.max_attempts,
            last_error,
        })
    }

    /// Close the network backing `subnet`.
    pub async fn release(&self, subnet: &Subnet) -> Result<(), AllocationError> {
        self.provisioner
            .close_network(subnet.handle())
            .await
            .map_err(|e| AllocationError::ReleaseFailed {
                network: subnet.handle().name.clone(),
                cidr: subnet.cidr(),
                reason: e.to_string(),
            })?;
        info!(network = %subnet.handle().name, cidr = %subnet.cidr(), "Subnet released");
        Ok(())
    }
}

#[async_trait]
impl<P: NetworkProvisioner> SubnetAllocationApi for SubnetAllocator<P> {
    async fn allocate_subnet(&self, name: &str) -> Result<Subnet, AllocationError> {
        self.allocate(name).await
    }

    async fn release_subnet(&self, subnet: &Subnet) -> Result<(), AllocationError> {
        self.release(subnet).await
    }

    fn peek_candidate(&self) -> CidrBlock {
        SubnetAllocator::peek_candidate(self)
    }
}
