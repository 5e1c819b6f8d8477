//! # JSON-RPC Reader
//!
//! `RpcReader` over HTTP. Consensus nodes and signers answer Ethereum
//! JSON-RPC; privacy managers expose their peers through `GET /partyinfo`.
//!
//! | Read | Method |
//! |------|--------|
//! | receipt | `eth_getTransactionReceipt` |
//! | transaction | `eth_getTransactionByHash` |
//! | balance | `eth_getBalance` |
//! | validators | family specific (`clique_getSigners`, `ibft_getValidatorsByBlockNumber`, ...) |
//! | height | `eth_blockNumber` |
//! | peers / node id | `admin_peers` / `admin_nodeInfo` |

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use qh_02_extra_data::ConsensusFamily;
use qh_03_convergence::RpcReader;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::{
    parse_address, parse_hash, Address, Hash, MemberEndpoint, MemberKind, PeerId, RpcError,
    TransactionDetails, TransactionReceipt, Wei,
};

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReceipt {
    transaction_hash: String,
    block_hash: String,
    block_number: String,
    from: String,
    #[serde(default)]
    to: Option<String>,
    gas_used: String,
    #[serde(default)]
    contract_address: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTransaction {
    hash: String,
    from: String,
    #[serde(default)]
    to: Option<String>,
    value: String,
    #[serde(default)]
    gas_price: Option<String>,
    gas: String,
    nonce: String,
}

#[derive(Debug, Deserialize)]
struct WirePeer {
    #[serde(default)]
    id: String,
    #[serde(default)]
    enode: String,
}

#[derive(Debug, Deserialize)]
struct WirePartyInfo {
    #[serde(default)]
    peers: Vec<WirePartyPeer>,
}

#[derive(Debug, Deserialize)]
struct WirePartyPeer {
    url: String,
}

fn quantity(method: &str, field: &str, value: &str) -> Result<u64, RpcError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::decode(method, format!("{field} '{value}': {e}")))
}

fn wei(method: &str, field: &str, value: &str) -> Result<Wei, RpcError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    Wei::from_str_radix(digits, 16)
        .map_err(|_| RpcError::decode(method, format!("{field} '{value}' is not a quantity")))
}

fn address(method: &str, field: &str, value: &str) -> Result<Address, RpcError> {
    parse_address(value).map_err(|e| RpcError::decode(method, format!("{field}: {e}")))
}

fn hash(method: &str, field: &str, value: &str) -> Result<Hash, RpcError> {
    parse_hash(value).map_err(|e| RpcError::decode(method, format!("{field}: {e}")))
}

fn optional_address(
    method: &str,
    field: &str,
    value: Option<&str>,
) -> Result<Option<Address>, RpcError> {
    value.map(|v| address(method, field, v)).transpose()
}

impl WireReceipt {
    fn into_receipt(self) -> Result<TransactionReceipt, RpcError> {
        const METHOD: &str = "eth_getTransactionReceipt";
        Ok(TransactionReceipt {
            transaction_hash: hash(METHOD, "transactionHash", &self.transaction_hash)?,
            block_hash: hash(METHOD, "blockHash", &self.block_hash)?,
            block_number: quantity(METHOD, "blockNumber", &self.block_number)?,
            from: address(METHOD, "from", &self.from)?,
            to: optional_address(METHOD, "to", self.to.as_deref())?,
            gas_used: quantity(METHOD, "gasUsed", &self.gas_used)?,
            contract_address: optional_address(
                METHOD,
                "contractAddress",
                self.contract_address.as_deref(),
            )?,
            status: match self.status.as_deref() {
                Some(status) => quantity(METHOD, "status", status)? == 1,
                None => true,
            },
        })
    }
}

impl WireTransaction {
    fn into_details(self) -> Result<TransactionDetails, RpcError> {
        const METHOD: &str = "eth_getTransactionByHash";
        Ok(TransactionDetails {
            hash: hash(METHOD, "hash", &self.hash)?,
            from: address(METHOD, "from", &self.from)?,
            to: optional_address(METHOD, "to", self.to.as_deref())?,
            value: wei(METHOD, "value", &self.value)?,
            gas_price: match self.gas_price.as_deref() {
                Some(price) => wei(METHOD, "gasPrice", price)?,
                None => Wei::zero(),
            },
            gas_limit: quantity(METHOD, "gas", &self.gas)?,
            nonce: quantity(METHOD, "nonce", &self.nonce)?,
        })
    }
}

impl WirePeer {
    fn peer_id(&self) -> Option<PeerId> {
        PeerId::from_enode(&self.enode).or_else(|| {
            (!self.id.is_empty()).then(|| PeerId::new(&self.id))
        })
    }
}

/// JSON-RPC method reporting the validator set of `family`.
pub fn validators_method(family: ConsensusFamily) -> &'static str {
    match family {
        ConsensusFamily::Clique => "clique_getSigners",
        ConsensusFamily::IbftLegacy => "istanbul_getValidators",
        ConsensusFamily::Ibft2 => "ibft_getValidatorsByBlockNumber",
        ConsensusFamily::Qbft => "qbft_getValidatorsByBlockNumber",
    }
}

fn privacy_peer_id(url: &str) -> PeerId {
    PeerId::new(url.trim_end_matches('/'))
}

// =============================================================================
// READER
// =============================================================================

/// HTTP JSON-RPC implementation of `RpcReader`.
pub struct JsonRpcReader {
    client: Client,
    family: ConsensusFamily,
    request_id: AtomicU64,
}

impl JsonRpcReader {
    pub fn new(family: ConsensusFamily, timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport {
                endpoint: "client".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            family,
            request_id: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call `method`; `Ok(None)` when the node answers with a null result.
    async fn call<R: DeserializeOwned>(
        &self,
        member: &MemberEndpoint,
        method: &str,
        params: Value,
    ) -> Result<Option<R>, RpcError> {
        let url = member.rpc_url();
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::Transport {
                endpoint: url.clone(),
                reason: e.to_string(),
            })?;

        let response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| RpcError::decode(method, e.to_string()))?;

        if let Some(error) = response.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result)
    }

    async fn call_required<R: DeserializeOwned>(
        &self,
        member: &MemberEndpoint,
        method: &str,
        params: Value,
    ) -> Result<R, RpcError> {
        self.call(member, method, params)
            .await?
            .ok_or_else(|| RpcError::decode(method, "missing result"))
    }

    async fn party_info(&self, member: &MemberEndpoint) -> Result<WirePartyInfo, RpcError> {
        let url = format!("{}/partyinfo", member.rpc_url());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RpcError::Transport {
                endpoint: url.clone(),
                reason: e.to_string(),
            })?;
        response
            .json()
            .await
            .map_err(|e| RpcError::decode("partyinfo", e.to_string()))
    }
}

#[async_trait]
impl RpcReader for JsonRpcReader {
    async fn transaction_receipt(
        &self,
        member: &MemberEndpoint,
        hash: Hash,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        let receipt: Option<WireReceipt> = self
            .call(member, "eth_getTransactionReceipt", json!([format!("{hash:?}")]))
            .await?;
        receipt.map(WireReceipt::into_receipt).transpose()
    }

    async fn transaction_by_hash(
        &self,
        member: &MemberEndpoint,
        hash: Hash,
    ) -> Result<Option<TransactionDetails>, RpcError> {
        let transaction: Option<WireTransaction> = self
            .call(member, "eth_getTransactionByHash", json!([format!("{hash:?}")]))
            .await?;
        transaction.map(WireTransaction::into_details).transpose()
    }

    async fn balance(&self, member: &MemberEndpoint, account: Address) -> Result<Wei, RpcError> {
        let balance: String = self
            .call_required(member, "eth_getBalance", json!([format!("{account:?}"), "latest"]))
            .await?;
        wei("eth_getBalance", "result", &balance)
    }

    async fn validators(&self, member: &MemberEndpoint) -> Result<Vec<Address>, RpcError> {
        let method = validators_method(self.family);
        let validators: Vec<String> = self.call_required(member, method, json!(["latest"])).await?;
        validators
            .iter()
            .map(|v| address(method, "validator", v))
            .collect()
    }

    async fn block_number(&self, member: &MemberEndpoint) -> Result<u64, RpcError> {
        let height: String = self.call_required(member, "eth_blockNumber", json!([])).await?;
        quantity("eth_blockNumber", "result", &height)
    }

    async fn peer_ids(&self, member: &MemberEndpoint) -> Result<Vec<PeerId>, RpcError> {
        if member.kind == MemberKind::PrivacyManager {
            let info = self.party_info(member).await?;
            return Ok(info.peers.iter().map(|p| privacy_peer_id(&p.url)).collect());
        }
        let peers: Vec<WirePeer> = self.call_required(member, "admin_peers", json!([])).await?;
        Ok(peers.iter().filter_map(WirePeer::peer_id).collect())
    }

    async fn node_id(&self, member: &MemberEndpoint) -> Result<PeerId, RpcError> {
        if member.kind == MemberKind::PrivacyManager {
            return Ok(privacy_peer_id(&member.rpc_url()));
        }
        let info: WirePeer = self.call_required(member, "admin_nodeInfo", json!([])).await?;
        info.peer_id()
            .ok_or_else(|| RpcError::decode("admin_nodeInfo", "no enode or id"))
    }
}
