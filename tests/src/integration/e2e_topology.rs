//! # End-to-End Topology Scenario
//!
//! ```text
//! allocate /24 ──→ register [A, B] ──→ encode IBFT2 extra data
//!                                              │
//!                                              ↓
//!       start: .2 / .3 bound ──→ mutual connectivity ──→ Started
//!                                              │
//!                                              ↓
//!       validators agree ──→ transfer A→B ──→ receipts + balances agree
//!                                              │
//!                                              ↓
//!                         stop ──→ close ──→ start rejected
//! ```

#[cfg(test)]
use std::net::Ipv4Addr;

#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use qh_01_subnet_allocation::{AllocatorConfig, InMemoryNetworkProvisioner, SubnetAllocator};

#[cfg(test)]
use qh_02_extra_data::{codec_for, ConsensusFamily};

#[cfg(test)]
use qh_04_topology::{
    GenesisSpec, MemberSpec, NetworkTopology, SimulatedNetwork, TopologyCollaborators,
    TopologyConfig,
};

#[cfg(test)]
use shared_crypto::NodeKey;

#[cfg(test)]
use shared_types::{Address, Wei};

/// Deterministic node key with secret scalar `last`.
#[cfg(test)]
fn node_key(last: u8) -> NodeKey {
    let mut bytes = [0u8; 32];
    bytes[31] = last;
    match NodeKey::from_bytes(bytes) {
        Ok(key) => key,
        Err(e) => panic!("scalar {last} is a valid key: {e}"),
    }
}

#[cfg(test)]
struct Scenario {
    provisioner: Arc<InMemoryNetworkProvisioner>,
    network: Arc<SimulatedNetwork>,
    topology: NetworkTopology,
    validator_a: Address,
    validator_b: Address,
}

/// Two IBFT2 validators, validator A funded in genesis.
#[cfg(test)]
fn ibft2_scenario() -> Scenario {
    let key_a = node_key(1);
    let key_b = node_key(2);
    let validator_a = key_a.identity().address();
    let validator_b = key_b.identity().address();

    let provisioner = Arc::new(InMemoryNetworkProvisioner::new());
    let network = Arc::new(SimulatedNetwork::new());
    let mut topology = NetworkTopology::new(
        TopologyConfig::for_testing(),
        GenesisSpec::for_family(ConsensusFamily::Ibft2)
            .with_allocation(validator_a, Wei::from(10u64).pow(Wei::from(21u64))),
        TopologyCollaborators {
            allocator: Arc::new(SubnetAllocator::new(
                provisioner.clone(),
                AllocatorConfig::for_testing(),
            )),
            launcher: network.clone(),
            genesis_writer: network.clone(),
            reader: network.clone(),
        },
    );
    topology
        .register(MemberSpec::validator("validator-a").with_node_key(key_a))
        .unwrap();
    topology
        .register(MemberSpec::validator("validator-b").with_node_key(key_b))
        .unwrap();

    Scenario {
        provisioner,
        network,
        topology,
        validator_a,
        validator_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qh_04_topology::{TopologyError, TopologyState};

    // =========================================================================
    // TEST GROUP 1: Bring-up
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_ibft2_two_validator_lifecycle() {
        let mut s = ibft2_scenario();

        s.topology.start().await.unwrap();
        assert_eq!(s.topology.state(), TopologyState::Started);

        let addresses: Vec<Ipv4Addr> =
            s.topology.endpoints().iter().map(|e| e.address).collect();
        assert_eq!(
            addresses,
            vec![Ipv4Addr::new(172, 29, 0, 2), Ipv4Addr::new(172, 29, 0, 3)]
        );

        let expected = codec_for(ConsensusFamily::Ibft2).encode(&[s.validator_a, s.validator_b]);
        assert_eq!(s.topology.extra_data(), Some(&expected));

        let endpoints = s.topology.endpoints().to_vec();
        s.topology
            .verifier()
            .consensus_on_validators(&endpoints, &[s.validator_a, s.validator_b])
            .await
            .unwrap();

        s.topology.stop().await.unwrap();
        s.topology.close().await.unwrap();
        assert_eq!(s.topology.state(), TopologyState::Closed);
        assert_eq!(s.provisioner.closed_networks().len(), 1);
        assert!(s.network.running_members().is_empty());

        let err = s.topology.start().await.unwrap_err();
        assert!(matches!(
            err,
            TopologyError::IllegalStateTransition {
                current: TopologyState::Closed,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_validator_order_is_not_checked() {
        let mut s = ibft2_scenario();
        s.topology.start().await.unwrap();

        let endpoints = s.topology.endpoints().to_vec();
        s.topology
            .verifier()
            .consensus_on_validators(&endpoints, &[s.validator_b, s.validator_a])
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_validator_set_times_out_with_observation() {
        let mut s = ibft2_scenario();
        s.topology.start().await.unwrap();

        let endpoints = s.topology.endpoints().to_vec();
        let err = s
            .topology
            .verifier()
            .consensus_on_validators(&endpoints, &[s.validator_a])
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("validators"), "{message}");
        assert!(message.contains("reports"), "{message}");
    }

    // =========================================================================
    // TEST GROUP 2: Chain State Agreement
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_transfer_converges_on_every_member() {
        let mut s = ibft2_scenario();
        s.topology.start().await.unwrap();
        let endpoints = s.topology.endpoints().to_vec();
        let verifier = s.topology.verifier();

        let before = verifier
            .consensus_on_value_at(&endpoints, &[s.validator_a, s.validator_b])
            .await
            .unwrap();
        assert_eq!(before[1], Wei::zero());

        let value = Wei::from(5_000u64);
        let hash = s
            .network
            .transfer(s.validator_a, s.validator_b, value)
            .unwrap();

        let receipt = verifier
            .consensus_on_transaction_receipt(&endpoints, hash)
            .await
            .unwrap();
        assert_eq!(receipt.transaction_hash, hash);
        assert!(receipt.is_successful());

        for member in &endpoints {
            verifier
                .value_transition(member, hash, before[0], before[1])
                .await
                .unwrap();
        }

        let after = verifier
            .consensus_on_value_at(&endpoints, &[s.validator_b])
            .await
            .unwrap();
        assert_eq!(after, vec![value]);

        let height = verifier
            .consensus_on_block_number_is_at_least(&endpoints, 1)
            .await
            .unwrap();
        assert!(height >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_transaction_times_out() {
        let mut s = ibft2_scenario();
        s.topology.start().await.unwrap();
        let endpoints = s.topology.endpoints().to_vec();

        let missing = shared_types::Hash::repeat_byte(0xab);
        let err = s
            .topology
            .verifier()
            .consensus_on_transaction_receipt(&endpoints, missing)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("receipt"), "{err}");
    }
}
