//! Tests for CIDR candidates and address leases

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

use super::*;

fn block() -> CidrBlock {
    CidrBlock::new(172, 29, 7)
}

// =============================================================================
// TEST GROUP 1: Candidate Selection
// =============================================================================

#[test]
fn test_candidate_is_pure() {
    let range = SubnetRange::default();
    assert_eq!(candidate_cidr(range, 3), candidate_cidr(range, 3));
    assert_eq!(candidate_cidr(range, 3).to_string(), "172.29.3.0/24");
}

#[test]
fn test_candidate_wraps_after_255() {
    let range = SubnetRange::new(10, 44);
    assert_eq!(candidate_cidr(range, 255).third_octet(), 255);
    assert_eq!(candidate_cidr(range, 256), candidate_cidr(range, 0));
    assert_eq!(candidate_cidr(range, 257).to_string(), "10.44.1.0/24");
}

#[test]
fn test_subnet_range_parsing() {
    assert_eq!("172.30".parse::<SubnetRange>().unwrap(), SubnetRange::new(172, 30));
    assert_eq!(
        "10.8.0.0/16".parse::<SubnetRange>().unwrap(),
        SubnetRange::new(10, 8)
    );
    assert!("10".parse::<SubnetRange>().is_err());
    assert!("10.300".parse::<SubnetRange>().is_err());
}

#[test]
fn test_cidr_parsing() {
    let parsed: CidrBlock = "172.29.7.0/24".parse().unwrap();
    assert_eq!(parsed, block());
    assert!("172.29.7.0/16".parse::<CidrBlock>().is_err());
    assert!("172.29.7.4/24".parse::<CidrBlock>().is_err());
    assert!("172.29.7.0".parse::<CidrBlock>().is_err());
}

#[test]
fn test_reserved_addresses() {
    assert_eq!(block().network(), Ipv4Addr::new(172, 29, 7, 0));
    assert_eq!(block().gateway(), Ipv4Addr::new(172, 29, 7, 1));
    assert!(block().contains(Ipv4Addr::new(172, 29, 7, 200)));
    assert!(!block().contains(Ipv4Addr::new(172, 29, 8, 2)));
}

// =============================================================================
// TEST GROUP 2: Address Leases
// =============================================================================

#[test]
fn test_first_lease_is_offset_two() {
    let lease = AddressLease::new(block());
    assert_eq!(lease.lease_address().unwrap(), Ipv4Addr::new(172, 29, 7, 2));
    assert_eq!(lease.lease_address().unwrap(), Ipv4Addr::new(172, 29, 7, 3));
    assert_eq!(lease.issued(), 2);
}

#[test]
fn test_every_address_distinct_and_in_range() {
    let lease = AddressLease::new(block());
    let mut seen = HashSet::new();

    while let Ok(address) = lease.lease_address() {
        let host = address.octets()[3];
        assert!((FIRST_HOST_OFFSET..=LAST_HOST_OFFSET).contains(&host));
        assert!(block().contains(address));
        assert!(seen.insert(address), "address {address} issued twice");
    }

    assert_eq!(seen.len(), 254);
    assert_eq!(lease.remaining(), 0);
}

#[test]
fn test_exhaustion_is_sticky() {
    let lease = AddressLease::starting_at(block(), 254);
    lease.lease_address().unwrap();
    lease.lease_address().unwrap();

    for _ in 0..3 {
        let err = lease.lease_address().unwrap_err();
        assert_eq!(err, AllocationError::AddressSpaceExhausted { cidr: block() });
    }
    assert_eq!(lease.issued(), 2);
}

#[test]
fn test_concurrent_leases_never_collide() {
    let lease = Arc::new(AddressLease::new(block()));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lease = Arc::clone(&lease);
            std::thread::spawn(move || {
                (0..40)
                    .filter_map(|_| lease.lease_address().ok())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    let unique: HashSet<_> = all.iter().copied().collect();
    assert_eq!(all.len(), 254, "8 x 40 requests capped at the 254 usable hosts");
    assert_eq!(unique.len(), all.len());
}

#[test]
fn test_exhaustion_message_names_block() {
    let lease = AddressLease::starting_at(block(), 255);
    lease.lease_address().unwrap();
    let message = lease.lease_address().unwrap_err().to_string();
    assert!(message.contains("172.29.7.0/24"), "{message}");
}
