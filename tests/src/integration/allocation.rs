//! # Concurrent Allocation
//!
//! One allocator shared by many topologies: the cursor and the per-subnet
//! lease are the only shared mutable state, so parallel callers must never
//! see the same block or the same host address twice.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use futures::future::join_all;
    use qh_01_subnet_allocation::{
        AllocationError, AllocatorConfig, CidrBlock, InMemoryNetworkProvisioner, SubnetAllocator,
    };
    use qh_02_extra_data::ConsensusFamily;
    use qh_04_topology::{
        GenesisSpec, MemberSpec, NetworkTopology, SimulatedNetwork, TopologyCollaborators,
        TopologyConfig, TopologyState,
    };

    fn allocator(
        provisioner: Arc<InMemoryNetworkProvisioner>,
    ) -> Arc<SubnetAllocator<InMemoryNetworkProvisioner>> {
        Arc::new(SubnetAllocator::new(provisioner, AllocatorConfig::default()))
    }

    // =========================================================================
    // TEST GROUP 1: Subnets
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_allocations_get_distinct_blocks() {
        let provisioner = Arc::new(InMemoryNetworkProvisioner::new());
        let allocator = allocator(provisioner.clone());

        let tasks = (0..20).map(|i| {
            let allocator = allocator.clone();
            tokio::spawn(async move { allocator.allocate(&format!("parallel-{i}")).await })
        });
        let subnets: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        let blocks: HashSet<CidrBlock> = subnets.iter().map(|s| s.cidr()).collect();
        assert_eq!(blocks.len(), 20);
        assert_eq!(provisioner.attempts().len(), 20);
        assert_eq!(provisioner.active_networks().len(), 20);
    }

    #[tokio::test]
    async fn test_collisions_skip_to_next_candidate() {
        let provisioner = Arc::new(InMemoryNetworkProvisioner::new());
        for third in 0..3 {
            provisioner.reserve(CidrBlock::new(172, 29, third));
        }
        let allocator = allocator(provisioner.clone());

        let subnet = allocator.allocate("after-collisions").await.unwrap();
        assert_eq!(subnet.cidr(), CidrBlock::new(172, 29, 3));
        assert_eq!(provisioner.attempts().len(), 4);
    }

    // =========================================================================
    // TEST GROUP 2: Host Addresses
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_leases_are_unique_until_exhausted() {
        let allocator = allocator(Arc::new(InMemoryNetworkProvisioner::new()));
        let subnet = Arc::new(allocator.allocate("lease-race").await.unwrap());

        let tasks = (0..300).map(|_| {
            let subnet = subnet.clone();
            tokio::spawn(async move { subnet.lease_address() })
        });
        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let leased: HashSet<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(leased.len(), 254);
        assert!(leased.iter().all(|a| subnet.cidr().contains(**a)));
        assert!(leased.iter().all(|a| a.octets()[3] >= 2));

        let exhausted = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(exhausted, 46);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(AllocationError::AddressSpaceExhausted { .. })
        )));
    }

    // =========================================================================
    // TEST GROUP 3: Independent Topologies
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_topologies_sharing_an_allocator_do_not_collide() {
        let provisioner = Arc::new(InMemoryNetworkProvisioner::new());
        let allocator = allocator(provisioner.clone());

        let build = |name: &str| {
            let network = Arc::new(SimulatedNetwork::new());
            let mut topology = NetworkTopology::new(
                TopologyConfig {
                    name: name.to_string(),
                    ..TopologyConfig::for_testing()
                },
                GenesisSpec::for_family(ConsensusFamily::Qbft),
                TopologyCollaborators {
                    allocator: allocator.clone(),
                    launcher: network.clone(),
                    genesis_writer: network.clone(),
                    reader: network,
                },
            );
            topology.register(MemberSpec::validator("v1")).unwrap();
            topology.register(MemberSpec::validator("v2")).unwrap();
            topology
        };
        let mut left = build("left");
        let mut right = build("right");

        let (l, r) = tokio::join!(left.start(), right.start());
        l.unwrap();
        r.unwrap();

        let left_cidr = left.subnet().unwrap().cidr();
        let right_cidr = right.subnet().unwrap().cidr();
        assert_ne!(left_cidr, right_cidr);
        assert_eq!(provisioner.active_networks().len(), 2);

        for topology in [&mut left, &mut right] {
            topology.stop().await.unwrap();
            topology.close().await.unwrap();
            assert_eq!(topology.state(), TopologyState::Closed);
        }
        assert!(provisioner.active_networks().is_empty());
    }
}
