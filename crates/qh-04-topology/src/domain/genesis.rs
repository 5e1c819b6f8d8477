//! # Genesis Document
//!
//! Builds the JSON genesis file every consensus member is launched with.
//! Only the `extraData` field depends on the validator set; everything else
//! comes from `GenesisSpec`.
//!
//! | Family | Config section | `mixHash` |
//! |--------|----------------|-----------|
//! | Clique | `clique` | zero |
//! | IBFT (legacy) | `istanbul` | BFT magic |
//! | IBFT2 | `ibft2` | BFT magic |
//! | QBFT | `qbft` | BFT magic |

use std::collections::BTreeMap;

use qh_02_extra_data::{ConsensusFamily, ExtraData};
use serde_json::{json, Map, Value};
use shared_types::{Address, Wei};

/// `keccak256("istanbul byzantine fault tolerance")`, required by BFT chains.
pub const BFT_MIX_HASH: &str =
    "0x63746963616c2062797a616e74696e65206661756c7420746f6c6572616e6365";

const ZERO_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Chain parameters shared by every member of a topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisSpec {
    pub family: ConsensusFamily,
    pub chain_id: u64,
    pub block_period_seconds: u64,
    pub epoch_length: u64,
    /// Round timeout (BFT families only).
    pub request_timeout_seconds: u64,
    pub gas_limit: u64,
    /// Pre-funded accounts.
    pub alloc: BTreeMap<Address, Wei>,
}

impl Default for GenesisSpec {
    fn default() -> Self {
        Self {
            family: ConsensusFamily::Ibft2,
            chain_id: 1337,
            block_period_seconds: 2,
            epoch_length: 30_000,
            request_timeout_seconds: 10,
            gas_limit: 0xE000_0000,
            alloc: BTreeMap::new(),
        }
    }
}

impl GenesisSpec {
    pub fn for_family(family: ConsensusFamily) -> Self {
        Self {
            family,
            ..Self::default()
        }
    }

    pub fn with_allocation(mut self, account: Address, balance: Wei) -> Self {
        self.alloc.insert(account, balance);
        self
    }

    /// The genesis JSON embedding `extra_data`.
    pub fn document(&self, extra_data: &ExtraData) -> Value {
        let mut config = json!({
            "chainId": self.chain_id,
            "homesteadBlock": 0,
            "eip150Block": 0,
            "eip155Block": 0,
            "eip158Block": 0,
            "byzantiumBlock": 0,
            "constantinopleBlock": 0,
            "petersburgBlock": 0,
            "istanbulBlock": 0,
        });
        let (section, parameters) = self.consensus_section();
        config[section] = parameters;

        let alloc: Map<String, Value> = self
            .alloc
            .iter()
            .map(|(account, balance)| {
                (
                    hex::encode(account.as_bytes()),
                    json!({ "balance": format!("0x{balance:x}") }),
                )
            })
            .collect();

        let mix_hash = if self.family.is_bft() {
            BFT_MIX_HASH
        } else {
            ZERO_HASH
        };

        json!({
            "config": config,
            "nonce": "0x0",
            "timestamp": "0x0",
            "gasLimit": format!("0x{:x}", self.gas_limit),
            "difficulty": "0x1",
            "mixHash": mix_hash,
            "coinbase": ZERO_ADDRESS,
            "extraData": extra_data.to_hex(),
            "alloc": alloc,
        })
    }

    fn consensus_section(&self) -> (&'static str, Value) {
        match self.family {
            ConsensusFamily::Clique => (
                "clique",
                json!({
                    "blockperiodseconds": self.block_period_seconds,
                    "epochlength": self.epoch_length,
                }),
            ),
            ConsensusFamily::IbftLegacy => (
                "istanbul",
                json!({
                    "epoch": self.epoch_length,
                    "policy": 0,
                    "ceil2Nby3Block": 0,
                }),
            ),
            ConsensusFamily::Ibft2 => ("ibft2", self.bft_section()),
            ConsensusFamily::Qbft => ("qbft", self.bft_section()),
        }
    }

    fn bft_section(&self) -> Value {
        json!({
            "blockperiodseconds": self.block_period_seconds,
            "epochlength": self.epoch_length,
            "requesttimeoutseconds": self.request_timeout_seconds,
        })
    }
}
