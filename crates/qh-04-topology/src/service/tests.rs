//! Lifecycle tests for `NetworkTopology` against the simulated network

use std::net::Ipv4Addr;
use std::sync::Arc;

use qh_01_subnet_allocation::{
    AllocationError, AllocatorConfig, InMemoryNetworkProvisioner, NetworkProvisioner,
    SubnetAllocator,
};
use qh_02_extra_data::{codec_for, ConsensusFamily};
use qh_03_convergence::ConvergenceError;
use shared_crypto::NodeKey;
use shared_types::{Address, MemberKind, Wei};

use super::*;
use crate::adapters::SimulatedNetwork;
use crate::domain::{GenesisSpec, MemberSpec, TopologyConfig, TopologyError, TopologyState};

struct Fixture {
    provisioner: Arc<InMemoryNetworkProvisioner>,
    network: Arc<SimulatedNetwork>,
    topology: NetworkTopology,
}

fn fixture(family: ConsensusFamily) -> Fixture {
    let provisioner = Arc::new(InMemoryNetworkProvisioner::new());
    let allocator = Arc::new(SubnetAllocator::new(
        provisioner.clone(),
        AllocatorConfig::for_testing(),
    ));
    let network = Arc::new(SimulatedNetwork::new());
    let collaborators = TopologyCollaborators {
        allocator,
        launcher: network.clone(),
        genesis_writer: network.clone(),
        reader: network.clone(),
    };
    let topology = NetworkTopology::new(
        TopologyConfig::for_testing(),
        GenesisSpec::for_family(family),
        collaborators,
    );
    Fixture {
        provisioner,
        network,
        topology,
    }
}

fn key(last: u8) -> NodeKey {
    let mut bytes = [0u8; 32];
    bytes[31] = last;
    NodeKey::from_bytes(bytes).unwrap()
}

fn two_validators(family: ConsensusFamily) -> Fixture {
    let mut f = fixture(family);
    f.topology
        .register(MemberSpec::validator("validator-a").with_node_key(key(1)))
        .unwrap();
    f.topology
        .register(MemberSpec::validator("validator-b").with_node_key(key(2)))
        .unwrap();
    f
}

// =============================================================================
// TEST GROUP 1: Registration
// =============================================================================

#[test]
fn test_register_rejects_duplicates() {
    let mut f = fixture(ConsensusFamily::Ibft2);
    f.topology.register(MemberSpec::validator("node-a")).unwrap();

    let err = f.topology.register(MemberSpec::node("node-a")).unwrap_err();
    assert!(matches!(err, TopologyError::DuplicateMember(ref id) if id.as_str() == "node-a"));
    assert_eq!(f.topology.members().len(), 1);
}

#[test]
fn test_register_rejects_defective_specs() {
    let mut f = fixture(ConsensusFamily::Ibft2);

    let mut signer = MemberSpec::signer("signer-a");
    signer.validator = true;
    assert!(matches!(
        f.topology.register(signer),
        Err(TopologyError::InvalidMember { .. })
    ));
    assert!(matches!(
        f.topology.register(MemberSpec::node("")),
        Err(TopologyError::InvalidMember { .. })
    ));
    assert!(f.topology.members().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_register_closed_after_first_start() {
    let mut f = two_validators(ConsensusFamily::Ibft2);
    f.topology.start().await.unwrap();
    f.topology.stop().await.unwrap();

    let err = f.topology.register(MemberSpec::node("late")).unwrap_err();
    assert!(matches!(
        err,
        TopologyError::RegistrationClosed {
            state: TopologyState::Stopped,
            ..
        }
    ));
}

// =============================================================================
// TEST GROUP 2: Lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_full_lifecycle() {
    let mut f = two_validators(ConsensusFamily::Ibft2);
    assert_eq!(f.topology.state(), TopologyState::Uninitialized);
    assert!(f.topology.endpoints().is_empty());

    f.topology.start().await.unwrap();
    assert_eq!(f.topology.state(), TopologyState::Started);
    assert_eq!(f.network.running_members().len(), 2);

    f.topology.stop().await.unwrap();
    assert_eq!(f.topology.state(), TopologyState::Stopped);
    assert!(f.network.running_members().is_empty());
    assert!(f.topology.running().is_empty());

    f.topology.start().await.unwrap();
    assert_eq!(f.topology.state(), TopologyState::Started);

    f.topology.stop().await.unwrap();
    f.topology.close().await.unwrap();
    assert_eq!(f.topology.state(), TopologyState::Closed);
    assert!(f.topology.subnet().is_none());
    assert!(f.provisioner.active_networks().is_empty());
    assert_eq!(f.provisioner.closed_networks().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_illegal_operations_leave_state_untouched() {
    let mut f = two_validators(ConsensusFamily::Ibft2);

    let err = f.topology.stop().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Illegal state transition: cannot stop a topology that is Uninitialized"
    );
    assert!(f.topology.close().await.is_err());
    assert_eq!(f.topology.state(), TopologyState::Uninitialized);
    assert!(f.provisioner.attempts().is_empty());

    f.topology.start().await.unwrap();
    assert!(matches!(
        f.topology.start().await,
        Err(TopologyError::IllegalStateTransition { .. })
    ));
    assert!(f.topology.close().await.is_err());
    assert_eq!(f.topology.state(), TopologyState::Started);
    assert_eq!(f.network.launches().len(), 2);

    f.topology.stop().await.unwrap();
    f.topology.close().await.unwrap();
    for result in [
        f.topology.start().await,
        f.topology.stop().await,
        f.topology.close().await,
    ] {
        assert!(matches!(
            result,
            Err(TopologyError::IllegalStateTransition {
                current: TopologyState::Closed,
                ..
            })
        ));
    }
}

#[tokio::test(start_paused = true)]
async fn test_restart_reuses_addresses_keys_and_genesis() {
    let mut f = two_validators(ConsensusFamily::Qbft);
    f.topology.register(MemberSpec::node("observer")).unwrap();

    f.topology.start().await.unwrap();
    let endpoints = f.topology.endpoints().to_vec();
    let genesis = f.topology.genesis_path().unwrap().to_path_buf();
    f.topology.stop().await.unwrap();
    f.topology.start().await.unwrap();

    assert_eq!(f.topology.endpoints(), endpoints.as_slice());
    assert_eq!(f.topology.genesis_path().unwrap(), genesis.as_path());
    assert_eq!(f.provisioner.attempts().len(), 1);

    let launches = f.network.launches();
    assert_eq!(launches.len(), 6);
    let first_observer = launches[2].node_key.as_ref().unwrap().identity();
    let second_observer = launches[5].node_key.as_ref().unwrap().identity();
    assert_eq!(first_observer, second_observer);
}

// =============================================================================
// TEST GROUP 3: Deployment
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_addresses_leased_in_registration_order() {
    let mut f = two_validators(ConsensusFamily::Ibft2);
    f.topology.register(MemberSpec::signer("signer-a")).unwrap();
    f.topology
        .register(MemberSpec::privacy_manager("tessera-a"))
        .unwrap();
    f.topology.start().await.unwrap();

    let endpoints = f.topology.endpoints();
    let addresses: Vec<Ipv4Addr> = endpoints.iter().map(|e| e.address).collect();
    assert_eq!(
        addresses,
        vec![
            Ipv4Addr::new(172, 29, 0, 2),
            Ipv4Addr::new(172, 29, 0, 3),
            Ipv4Addr::new(172, 29, 0, 4),
            Ipv4Addr::new(172, 29, 0, 5),
        ]
    );

    let tessera = f.topology.endpoint("tessera-a").unwrap();
    assert_eq!(tessera.kind, MemberKind::PrivacyManager);
    assert_eq!(tessera.rpc_port, 9081);
    assert_eq!(f.topology.endpoint("signer-a").unwrap().rpc_port, 8545);
}

#[tokio::test(start_paused = true)]
async fn test_genesis_carries_validator_extra_data() {
    let mut f = two_validators(ConsensusFamily::Ibft2);
    f.topology.register(MemberSpec::node("observer")).unwrap();
    f.topology.start().await.unwrap();

    let expected = vec![key(1).identity().address(), key(2).identity().address()];
    assert_eq!(f.topology.validator_addresses(), expected.as_slice());

    let extra = f.topology.extra_data().unwrap();
    assert_eq!(extra.family(), ConsensusFamily::Ibft2);
    let decoded = codec_for(ConsensusFamily::Ibft2)
        .decode_validators(extra.as_bytes())
        .unwrap();
    assert_eq!(decoded, expected);

    let document = f
        .network
        .genesis_at(f.topology.genesis_path().unwrap())
        .unwrap();
    assert_eq!(document["extraData"], extra.to_hex());
    assert!(document["config"]["ibft2"].is_object());

    f.topology
        .verifier()
        .consensus_on_validators(f.topology.endpoints(), &expected)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_bootnodes_list_every_consensus_node() {
    let mut f = two_validators(ConsensusFamily::Clique);
    f.topology.register(MemberSpec::signer("signer-a")).unwrap();
    f.topology.start().await.unwrap();

    let launches = f.network.launches();
    assert_eq!(launches.len(), 3);
    for launch in &launches {
        assert_eq!(launch.bootnodes.len(), 2);
        assert_eq!(launch.family, ConsensusFamily::Clique);
        assert_eq!(launch.chain_id, 1337);
    }
    assert!(launches[0].bootnodes[0].ends_with("@172.29.0.2:30303"));
    assert!(launches[2].node_key.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_genesis_allocation_visible_to_members() {
    let account = Address::repeat_byte(0x11);
    let mut f = fixture(ConsensusFamily::Ibft2);
    f.topology = NetworkTopology::new(
        TopologyConfig::for_testing(),
        GenesisSpec::for_family(ConsensusFamily::Ibft2)
            .with_allocation(account, Wei::from(1_000_000u64)),
        TopologyCollaborators {
            allocator: Arc::new(SubnetAllocator::new(
                f.provisioner.clone(),
                AllocatorConfig::for_testing(),
            )),
            launcher: f.network.clone(),
            genesis_writer: f.network.clone(),
            reader: f.network.clone(),
        },
    );
    f.topology.register(MemberSpec::validator("v1")).unwrap();
    f.topology.register(MemberSpec::validator("v2")).unwrap();
    f.topology.start().await.unwrap();

    let balances = f
        .topology
        .verifier()
        .consensus_on_value_at(f.topology.endpoints(), &[account])
        .await
        .unwrap();
    assert_eq!(balances, vec![Wei::from(1_000_000u64)]);
}

#[tokio::test(start_paused = true)]
async fn test_transfer_receipt_identical_on_every_member() {
    let mut f = two_validators(ConsensusFamily::Ibft2);
    f.topology.start().await.unwrap();

    let sender = Address::repeat_byte(0x11);
    let receiver = Address::repeat_byte(0x22);
    f.network.set_balance(sender, Wei::from(1_000_000_000_000_000u64));
    let hash = f.network.transfer(sender, receiver, Wei::from(7u64)).unwrap();

    let verifier = f.topology.verifier();
    let receipt = verifier
        .consensus_on_transaction_receipt(f.topology.endpoints(), hash)
        .await
        .unwrap();
    assert_eq!(receipt.transaction_hash, hash);
    assert_eq!(receipt.block_number, 1);
    assert!(!receipt.block_hash.is_zero());

    verifier
        .value_transition(
            &f.topology.endpoints()[0],
            hash,
            Wei::from(1_000_000_000_000_000u64),
            Wei::zero(),
        )
        .await
        .unwrap();

    // A second transfer from the same sender gets a distinct hash.
    let next = f.network.transfer(sender, receiver, Wei::from(7u64)).unwrap();
    assert_ne!(next, hash);
}

// =============================================================================
// TEST GROUP 4: Failure Handling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_first_start_rolls_back() {
    let mut f = two_validators(ConsensusFamily::Ibft2);
    f.network.fail_start_of("validator-b");

    let err = f.topology.start().await.unwrap_err();
    assert!(matches!(err, TopologyError::Launch { ref member, .. } if member.as_str() == "validator-b"));

    assert_eq!(f.topology.state(), TopologyState::Uninitialized);
    assert!(f.network.running_members().is_empty());
    assert!(f.topology.subnet().is_none());
    assert!(f.topology.endpoints().is_empty());
    assert!(f.provisioner.active_networks().is_empty());
    assert_eq!(f.provisioner.closed_networks().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unconnected_network_fails_start() {
    let mut f = two_validators(ConsensusFamily::Ibft2);
    f.network.isolate("validator-a");

    let err = f.topology.start().await.unwrap_err();
    match err {
        TopologyError::Convergence(ConvergenceError::Timeout { description, .. }) => {
            assert!(description.contains("connected to"), "{description}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(f.topology.state(), TopologyState::Uninitialized);
    assert!(f.network.running_members().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_restart_keeps_stopped_state_and_subnet() {
    let mut f = two_validators(ConsensusFamily::Ibft2);
    f.topology.start().await.unwrap();
    f.topology.stop().await.unwrap();

    f.network.fail_start_of("validator-a");
    assert!(f.topology.start().await.is_err());

    assert_eq!(f.topology.state(), TopologyState::Stopped);
    assert!(f.topology.subnet().is_some());
    assert!(f.network.running_members().is_empty());
    assert_eq!(f.provisioner.active_networks().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_allocation_fails_start() {
    let mut f = two_validators(ConsensusFamily::Ibft2);
    for third in 0..5 {
        f.provisioner
            .reserve(qh_01_subnet_allocation::CidrBlock::new(172, 29, third));
    }

    let err = f.topology.start().await.unwrap_err();
    assert!(matches!(
        err,
        TopologyError::Allocation(AllocationError::AllocationExhausted { attempts: 5, .. })
    ));
    assert_eq!(f.topology.state(), TopologyState::Uninitialized);
    assert!(f.network.launches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_attempts_every_member() {
    let mut f = two_validators(ConsensusFamily::Ibft2);
    f.topology.start().await.unwrap();
    f.network.fail_stop_of("validator-a");

    let err = f.topology.stop().await.unwrap_err();
    assert!(matches!(err, TopologyError::Shutdown { ref member, .. } if member.as_str() == "validator-a"));
    assert_eq!(f.topology.state(), TopologyState::Stopped);
    assert!(f.network.running_members().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_release_allows_close_retry() {
    let mut f = two_validators(ConsensusFamily::Ibft2);
    f.topology.start().await.unwrap();
    f.topology.stop().await.unwrap();

    let handle = f.topology.subnet().unwrap().handle().clone();
    f.provisioner.close_network(&handle).await.unwrap();

    let err = f.topology.close().await.unwrap_err();
    assert!(matches!(
        err,
        TopologyError::Allocation(AllocationError::ReleaseFailed { .. })
    ));
    assert_eq!(f.topology.state(), TopologyState::Stopped);
}
