//! # Address Leases
//!
//! Sequential host addresses inside one provisioned block. Offsets are
//! issued once each; there is no release path because members keep their
//! address for the whole lifetime of the topology.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU16, Ordering};

use super::cidr::CidrBlock;
use super::errors::AllocationError;

/// First usable host offset (`.0` is the network, `.1` the gateway).
pub const FIRST_HOST_OFFSET: u8 = 2;

/// Last host offset a lease issues.
pub const LAST_HOST_OFFSET: u8 = 255;

/// Host-address counter over one `CidrBlock`.
#[derive(Debug)]
pub struct AddressLease {
    block: CidrBlock,
    first_offset: u8,
    next_offset: AtomicU16,
}

impl AddressLease {
    pub fn new(block: CidrBlock) -> Self {
        Self::starting_at(block, FIRST_HOST_OFFSET)
    }

    /// Lease whose first issued host is `first_offset`.
    pub fn starting_at(block: CidrBlock, first_offset: u8) -> Self {
        Self {
            block,
            first_offset,
            next_offset: AtomicU16::new(u16::from(first_offset)),
        }
    }

    pub fn block(&self) -> CidrBlock {
        self.block
    }

    /// Issue the next host address.
    ///
    /// Safe to call concurrently. The counter stops at `LAST_HOST_OFFSET + 1`,
    /// so exhaustion is sticky and never wraps.
    pub fn lease_address(&self) -> Result<Ipv4Addr, AllocationError> {
        let limit = u16::from(LAST_HOST_OFFSET);
        let offset = self
            .next_offset
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n <= limit).then_some(n + 1)
            })
            .map_err(|_| AllocationError::AddressSpaceExhausted { cidr: self.block })?;

        crate::metrics::record_address_leased();
        Ok(self.block.host(offset as u8))
    }

    /// Number of addresses issued so far.
    pub fn issued(&self) -> usize {
        let next = self.next_offset.load(Ordering::SeqCst);
        usize::from(next.saturating_sub(u16::from(self.first_offset)))
    }

    /// Number of addresses still available.
    pub fn remaining(&self) -> usize {
        let next = self.next_offset.load(Ordering::SeqCst);
        usize::from((u16::from(LAST_HOST_OFFSET) + 1).saturating_sub(next))
    }
}
