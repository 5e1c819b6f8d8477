//! # Simulated Network
//!
//! One in-process object that plays launcher, genesis store and RPC
//! surface for a whole topology.
//!
//! - Every running member reports the validator set decoded from the
//!   genesis extra data it was launched with.
//! - Running peering members see each other as peers, unless isolated.
//! - All members share one chain: a block height, balances seeded from the
//!   genesis `alloc`, and receipts of simulated transfers.
//!
//! Failure injection: `fail_start_of`, `fail_stop_of` and `isolate`.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use qh_02_extra_data::codec_for;
use serde_json::Value;
use shared_crypto::keccak256;
use shared_types::{
    parse_address, Address, Hash, MemberEndpoint, MemberId, PeerId, RpcError, TransactionDetails,
    TransactionReceipt, Wei,
};

use qh_03_convergence::RpcReader;

use crate::domain::{MemberLaunch, RunningMember};
use crate::ports::{GenesisWriteError, GenesisWriter, LaunchError, MemberLauncher};

/// Gas charged by every simulated transfer.
pub const TRANSFER_GAS: u64 = 21_000;

/// Gas price of every simulated transfer (1 gwei).
pub const GAS_PRICE_WEI: u64 = 1_000_000_000;

struct SimulatedMember {
    handle: String,
    endpoint: MemberEndpoint,
    node_id: PeerId,
    validators: Vec<Address>,
    logs: Vec<String>,
}

#[derive(Default)]
struct SimulatedState {
    genesis: HashMap<PathBuf, Value>,
    running: HashMap<MemberId, SimulatedMember>,
    launches: Vec<MemberLaunch>,
    fail_start: HashSet<MemberId>,
    fail_stop: HashSet<MemberId>,
    isolated: HashSet<MemberId>,
    block_number: u64,
    balances: HashMap<Address, Wei>,
    receipts: HashMap<Hash, TransactionReceipt>,
    transactions: HashMap<Hash, TransactionDetails>,
    next_handle: u64,
}

/// In-process stand-in for a container runtime plus the members' RPC.
#[derive(Default)]
pub struct SimulatedNetwork {
    state: Mutex<SimulatedState>,
}

impl SimulatedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future launch of `member` fail.
    pub fn fail_start_of(&self, member: &str) {
        self.state.lock().fail_start.insert(MemberId::new(member));
    }

    /// Make every future stop of `member` fail (the member still halts).
    pub fn fail_stop_of(&self, member: &str) {
        self.state.lock().fail_stop.insert(MemberId::new(member));
    }

    /// Cut `member` off from peering.
    pub fn isolate(&self, member: &str) {
        self.state.lock().isolated.insert(MemberId::new(member));
    }

    pub fn reconnect(&self, member: &str) {
        self.state.lock().isolated.remove(&MemberId::new(member));
    }

    /// Names of the running members, sorted.
    pub fn running_members(&self) -> Vec<MemberId> {
        let mut members: Vec<MemberId> = self.state.lock().running.keys().cloned().collect();
        members.sort();
        members
    }

    /// Every launch request received, in order.
    pub fn launches(&self) -> Vec<MemberLaunch> {
        self.state.lock().launches.clone()
    }

    /// Genesis document stored at `path`.
    pub fn genesis_at(&self, path: &std::path::Path) -> Option<Value> {
        self.state.lock().genesis.get(path).cloned()
    }

    pub fn advance_blocks(&self, blocks: u64) {
        self.state.lock().block_number += blocks;
    }

    pub fn set_balance(&self, account: Address, balance: Wei) {
        self.state.lock().balances.insert(account, balance);
    }

    /// Mine a value transfer in the next block and return its hash.
    ///
    /// The sender pays `value` plus `TRANSFER_GAS * GAS_PRICE_WEI`.
    pub fn transfer(&self, from: Address, to: Address, value: Wei) -> Result<Hash, String> {
        let mut state = self.state.lock();
        let gas_cost = Wei::from(TRANSFER_GAS) * Wei::from(GAS_PRICE_WEI);
        let balance = state.balances.get(&from).copied().unwrap_or_default();
        let spent = value.checked_add(gas_cost).ok_or("amount overflows")?;
        if balance < spent {
            return Err(format!("{from:?} holds {balance} wei, needs {spent}"));
        }

        let nonce = state.transactions.values().filter(|tx| tx.from == from).count() as u64;
        let mut preimage = from.as_bytes().to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        let hash = Hash::from(keccak256(&preimage));

        state.block_number += 1;
        let block_number = state.block_number;

        state.balances.insert(from, balance - spent);
        let receiver = state.balances.get(&to).copied().unwrap_or_default();
        state.balances.insert(to, receiver + value);

        state.transactions.insert(
            hash,
            TransactionDetails {
                hash,
                from,
                to: Some(to),
                value,
                gas_price: Wei::from(GAS_PRICE_WEI),
                gas_limit: TRANSFER_GAS,
                nonce,
            },
        );
        state.receipts.insert(
            hash,
            TransactionReceipt {
                transaction_hash: hash,
                block_hash: Hash::from(keccak256(&block_number.to_be_bytes())),
                block_number,
                from,
                to: Some(to),
                gas_used: TRANSFER_GAS,
                contract_address: None,
                status: true,
            },
        );
        Ok(hash)
    }

    fn member<'a>(
        state: &'a SimulatedState,
        endpoint: &MemberEndpoint,
    ) -> Result<&'a SimulatedMember, RpcError> {
        state
            .running
            .get(&endpoint.member)
            .ok_or_else(|| RpcError::MemberUnavailable(endpoint.member.to_string()))
    }
}

fn node_id_for(launch: &MemberLaunch) -> PeerId {
    match &launch.node_key {
        Some(key) => PeerId::new(key.identity().public_key_hex()),
        None => PeerId::new(hex::encode(launch.endpoint.member.as_str())),
    }
}

fn genesis_validators(launch: &MemberLaunch, genesis: &Value) -> Result<Vec<Address>, String> {
    let extra = genesis
        .get("extraData")
        .and_then(Value::as_str)
        .ok_or("genesis has no extraData")?;
    let bytes = hex::decode(extra.trim_start_matches("0x")).map_err(|e| e.to_string())?;
    codec_for(launch.family)
        .decode_validators(&bytes)
        .map_err(|e| e.to_string())
}

fn genesis_balances(genesis: &Value) -> Vec<(Address, Wei)> {
    let Some(alloc) = genesis.get("alloc").and_then(Value::as_object) else {
        return Vec::new();
    };
    alloc
        .iter()
        .filter_map(|(account, entry)| {
            let account = parse_address(account).ok()?;
            let balance = entry.get("balance")?.as_str()?;
            let balance = Wei::from_str_radix(balance.trim_start_matches("0x"), 16).ok()?;
            Some((account, balance))
        })
        .collect()
}

// =============================================================================
// PORT IMPLEMENTATIONS
// =============================================================================

#[async_trait]
impl GenesisWriter for SimulatedNetwork {
    async fn write_genesis(
        &self,
        network: &str,
        document: &Value,
    ) -> Result<PathBuf, GenesisWriteError> {
        let path = PathBuf::from(format!("/simulated/{network}/genesis.json"));
        let mut state = self.state.lock();
        for (account, balance) in genesis_balances(document) {
            state.balances.entry(account).or_insert(balance);
        }
        state.genesis.insert(path.clone(), document.clone());
        Ok(path)
    }
}

#[async_trait]
impl MemberLauncher for SimulatedNetwork {
    async fn start_member(&self, launch: &MemberLaunch) -> Result<RunningMember, LaunchError> {
        let member = &launch.endpoint.member;
        let mut state = self.state.lock();
        state.launches.push(launch.clone());

        if state.fail_start.contains(member) {
            return Err(LaunchError::failed(member, "simulated start failure"));
        }
        if state.running.contains_key(member) {
            return Err(LaunchError::failed(member, "already running"));
        }
        let genesis = state
            .genesis
            .get(&launch.genesis_path)
            .ok_or_else(|| {
                LaunchError::failed(member, format!("no genesis at {}", launch.genesis_path.display()))
            })?;
        let validators = genesis_validators(launch, genesis)
            .map_err(|reason| LaunchError::failed(member, reason))?;

        state.next_handle += 1;
        let handle = format!("sim-{:04}", state.next_handle);
        let logs = vec![format!(
            "{member} started on {} with {} bootnodes",
            launch.endpoint.address,
            launch.bootnodes.len()
        )];
        state.running.insert(
            member.clone(),
            SimulatedMember {
                handle: handle.clone(),
                endpoint: launch.endpoint.clone(),
                node_id: node_id_for(launch),
                validators,
                logs,
            },
        );

        Ok(RunningMember {
            member: member.clone(),
            handle,
        })
    }

    async fn stop_member(&self, member: &RunningMember) -> Result<(), LaunchError> {
        let mut state = self.state.lock();
        let removed = state.running.remove(&member.member);
        if removed.is_none() {
            return Err(LaunchError::NotRunning(member.member.clone()));
        }
        if state.fail_stop.contains(&member.member) {
            return Err(LaunchError::failed(&member.member, "simulated stop failure"));
        }
        Ok(())
    }

    async fn fetch_logs(&self, member: &RunningMember) -> Result<String, LaunchError> {
        let state = self.state.lock();
        state
            .running
            .get(&member.member)
            .filter(|m| m.handle == member.handle)
            .map(|m| m.logs.join("\n"))
            .ok_or_else(|| LaunchError::NotRunning(member.member.clone()))
    }
}

#[async_trait]
impl RpcReader for SimulatedNetwork {
    async fn transaction_receipt(
        &self,
        member: &MemberEndpoint,
        hash: Hash,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        let state = self.state.lock();
        Self::member(&state, member)?;
        Ok(state.receipts.get(&hash).cloned())
    }

    async fn transaction_by_hash(
        &self,
        member: &MemberEndpoint,
        hash: Hash,
    ) -> Result<Option<TransactionDetails>, RpcError> {
        let state = self.state.lock();
        Self::member(&state, member)?;
        Ok(state.transactions.get(&hash).cloned())
    }

    async fn balance(&self, member: &MemberEndpoint, account: Address) -> Result<Wei, RpcError> {
        let state = self.state.lock();
        Self::member(&state, member)?;
        Ok(state.balances.get(&account).copied().unwrap_or_default())
    }

    async fn validators(&self, member: &MemberEndpoint) -> Result<Vec<Address>, RpcError> {
        let state = self.state.lock();
        Ok(Self::member(&state, member)?.validators.clone())
    }

    async fn block_number(&self, member: &MemberEndpoint) -> Result<u64, RpcError> {
        let state = self.state.lock();
        Self::member(&state, member)?;
        Ok(state.block_number)
    }

    async fn peer_ids(&self, member: &MemberEndpoint) -> Result<Vec<PeerId>, RpcError> {
        let state = self.state.lock();
        let me = Self::member(&state, member)?;
        if state.isolated.contains(&member.member) || !me.endpoint.kind.participates_in_peering() {
            return Ok(Vec::new());
        }
        let mut peers: Vec<PeerId> = state
            .running
            .iter()
            .filter(|(id, other)| {
                **id != member.member
                    && other.endpoint.kind.participates_in_peering()
                    && !state.isolated.contains(*id)
            })
            .map(|(_, other)| other.node_id.clone())
            .collect();
        peers.sort();
        Ok(peers)
    }

    async fn node_id(&self, member: &MemberEndpoint) -> Result<PeerId, RpcError> {
        let state = self.state.lock();
        Ok(Self::member(&state, member)?.node_id.clone())
    }
}
