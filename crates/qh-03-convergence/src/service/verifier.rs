//! # Convergence Verifier
//!
//! Domain predicates over the poller. Every predicate is a closure over the
//! RPC reader and keeps no state between calls; failures surface as the
//! poller's timeout, naming what was compared and what was last seen.
//!
//! | Predicate | Holds when |
//! |-----------|------------|
//! | `consensus_on_transaction_receipt` | every member returns the same successful receipt |
//! | `consensus_on_value_at` | every member reports the same balance per account |
//! | `consensus_on_validators` | every member reports exactly the expected set |
//! | `consensus_on_block_number_is_at_least` | every member is at or above a height |
//! | `value_transition` | sender paid value + gas, receiver gained value |
//! | `mutual_connectivity` | every peering member sees every other one |

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, try_join_all};
use shared_types::{Address, Hash, MemberEndpoint, TransactionReceipt, Wei};
use tracing::info;

use super::poller::ConvergencePoller;
use crate::domain::{Condition, ConvergenceError, ReadOutcome};
use crate::ports::RpcReader;

/// Cross-member consistency checks.
#[derive(Clone)]
pub struct ConvergenceVerifier {
    reader: Arc<dyn RpcReader>,
    poller: ConvergencePoller,
}

impl ConvergenceVerifier {
    pub fn new(reader: Arc<dyn RpcReader>, poller: ConvergencePoller) -> Self {
        Self { reader, poller }
    }

    /// Same reader, different default budget.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
            poller: ConvergencePoller::new(self.poller.config().with_timeout(timeout)),
        }
    }

    pub fn poller(&self) -> &ConvergencePoller {
        &self.poller
    }

    pub fn reader(&self) -> &Arc<dyn RpcReader> {
        &self.reader
    }

    // =========================================================================
    // CROSS-MEMBER CONSENSUS
    // =========================================================================

    /// Every member returns the same successful receipt for `hash`.
    pub async fn consensus_on_transaction_receipt(
        &self,
        members: &[MemberEndpoint],
        hash: Hash,
    ) -> Result<TransactionReceipt, ConvergenceError> {
        require_members("receipt consensus", members, 2)?;
        let description = format!(
            "identical successful receipt for {hash:?} on {}",
            member_names(members)
        );
        let reader = &self.reader;

        self.poller
            .poll(&description, None, move || async move {
                let receipts =
                    join_all(members.iter().map(|m| reader.transaction_receipt(m, hash))).await;

                let mut checked = Vec::with_capacity(members.len());
                for (member, receipt) in members.iter().zip(receipts) {
                    let receipt = receipt
                        .or_fail(|| format!("receipt for {hash:?} on {member}"))
                        .map_err(|e| e.to_string())?;
                    if !receipt.is_successful() {
                        return Err(format!("transaction {hash:?} failed on {member}"));
                    }
                    checked.push((member, receipt));
                }

                let (first, expected) = &checked[0];
                for (member, receipt) in &checked[1..] {
                    if receipt != expected {
                        return Err(format!(
                            "{first} has it in block {} ({:?}) but {member} in block {} ({:?})",
                            expected.block_number,
                            expected.block_hash,
                            receipt.block_number,
                            receipt.block_hash
                        ));
                    }
                }
                Ok(checked.swap_remove(0).1)
            })
            .await
    }

    /// Every member reports the same balance for each of `accounts`.
    ///
    /// Returns the agreed balances in `accounts` order.
    pub async fn consensus_on_value_at(
        &self,
        members: &[MemberEndpoint],
        accounts: &[Address],
    ) -> Result<Vec<Wei>, ConvergenceError> {
        require_members("balance consensus", members, 2)?;
        let description = format!(
            "identical balances of {} on {}",
            account_list(accounts),
            member_names(members)
        );
        let reader = &self.reader;

        self.poller
            .poll(&description, None, move || async move {
                let mut agreed = Vec::with_capacity(accounts.len());
                for account in accounts {
                    let balances =
                        join_all(members.iter().map(|m| reader.balance(m, *account))).await;
                    let balances = balances
                        .into_iter()
                        .collect::<Result<Vec<Wei>, _>>()
                        .map_err(|e| e.to_string())?;

                    let first = balances[0];
                    if balances.iter().any(|b| *b != first) {
                        let observed: Vec<String> = members
                            .iter()
                            .zip(&balances)
                            .map(|(m, b)| format!("{}={b}", m.member))
                            .collect();
                        return Err(format!("balance of {account:?} differs: {}", observed.join(", ")));
                    }
                    agreed.push(first);
                }
                Ok::<_, String>(agreed)
            })
            .await
    }

    /// Every member reports exactly `expected` as its validator set (order
    /// does not matter, repeated entries do).
    pub async fn consensus_on_validators(
        &self,
        members: &[MemberEndpoint],
        expected: &[Address],
    ) -> Result<(), ConvergenceError> {
        require_members("validator consensus", members, 1)?;
        let expected_set: BTreeSet<Address> = expected.iter().copied().collect();
        let description = format!(
            "validators {} on {}",
            account_list(expected),
            member_names(members)
        );
        let reader = &self.reader;
        let expected_set = &expected_set;

        self.poller
            .poll(&description, None, move || async move {
                let reported = join_all(members.iter().map(|m| reader.validators(m))).await;
                for (member, validators) in members.iter().zip(reported) {
                    let validators = validators.map_err(|e| e.to_string())?;
                    let actual: BTreeSet<Address> = validators.iter().copied().collect();
                    if actual.len() != validators.len() {
                        return Err(format!(
                            "{member} reports duplicates in {}",
                            account_list(&validators)
                        ));
                    }
                    if actual != *expected_set {
                        return Err(format!(
                            "{member} reports {}",
                            account_list(&validators)
                        ));
                    }
                }
                Ok(())
            })
            .await?;

        info!(members = members.len(), validators = expected.len(), "Validator set agreed");
        Ok(())
    }

    /// Every member's chain height is at least `height`.
    ///
    /// Returns the lowest height observed when the condition held.
    pub async fn consensus_on_block_number_is_at_least(
        &self,
        members: &[MemberEndpoint],
        height: u64,
    ) -> Result<u64, ConvergenceError> {
        require_members("block height check", members, 1)?;
        let description = format!("block number >= {height} on {}", member_names(members));
        let reader = &self.reader;

        self.poller
            .poll(&description, None, move || async move {
                let heights = join_all(members.iter().map(|m| reader.block_number(m))).await;
                let mut lowest = u64::MAX;
                for (member, current) in members.iter().zip(heights) {
                    let current = current.map_err(|e| e.to_string())?;
                    if current < height {
                        return Err(format!("{member} is at block {current}"));
                    }
                    lowest = lowest.min(current);
                }
                Ok(lowest)
            })
            .await
    }

    // =========================================================================
    // SINGLE-MEMBER PREDICATES
    // =========================================================================

    /// The receipt for `hash` exists on `member` and reports success.
    pub async fn successful_receipt(
        &self,
        member: &MemberEndpoint,
        hash: Hash,
    ) -> Result<TransactionReceipt, ConvergenceError> {
        let description = format!("successful receipt for {hash:?} on {member}");
        let reader = &self.reader;

        self.poller
            .poll(&description, None, move || async move {
                let receipt = reader
                    .transaction_receipt(member, hash)
                    .await
                    .or_fail(|| format!("receipt for {hash:?}"))
                    .map_err(|e| e.to_string())?;
                if receipt.is_successful() {
                    Ok(receipt)
                } else {
                    Err(format!("transaction {hash:?} failed in block {}", receipt.block_number))
                }
            })
            .await
    }

    /// Balances on `member` moved as `transaction` dictates.
    ///
    /// The sender must end at `sender_before - value - gas_used * gas_price`
    /// and the receiver at `receiver_before + value`. A transfer to self only
    /// pays gas.
    pub async fn value_transition(
        &self,
        member: &MemberEndpoint,
        transaction: Hash,
        sender_before: Wei,
        receiver_before: Wei,
    ) -> Result<(), ConvergenceError> {
        let receipt = self.successful_receipt(member, transaction).await?;
        let reader = &self.reader;
        let details = self
            .poller
            .or_timeout(&format!("transaction {transaction:?} on {member}"), move || {
                reader.transaction_by_hash(member, transaction)
            })
            .await?;

        let receiver = details.to.ok_or_else(|| {
            ConvergenceError::InvalidExpectation(format!(
                "transaction {transaction:?} creates a contract and has no receiver"
            ))
        })?;

        let gas_cost = Wei::from(receipt.gas_used)
            .checked_mul(details.gas_price)
            .ok_or_else(|| overflow(transaction, "gas cost"))?;

        if receiver == details.from {
            let expected = sender_before
                .checked_sub(gas_cost)
                .ok_or_else(|| overflow(transaction, "sender balance"))?;
            return self
                .poller
                .check(self.balance_condition(member, receiver, expected, "sender and receiver"))
                .await;
        }

        let spent = details
            .value
            .checked_add(gas_cost)
            .ok_or_else(|| overflow(transaction, "amount spent"))?;
        let sender_after = sender_before
            .checked_sub(spent)
            .ok_or_else(|| overflow(transaction, "sender balance"))?;
        let receiver_after = receiver_before
            .checked_add(details.value)
            .ok_or_else(|| overflow(transaction, "receiver balance"))?;

        futures::try_join!(
            self.poller
                .check(self.balance_condition(member, details.from, sender_after, "sender")),
            self.poller
                .check(self.balance_condition(member, receiver, receiver_after, "receiver")),
        )?;
        Ok(())
    }

    /// `member` reports at least `count` connected peers.
    pub async fn await_peer_count(
        &self,
        member: &MemberEndpoint,
        count: usize,
    ) -> Result<usize, ConvergenceError> {
        let description = format!("{member} has at least {count} peers");
        let reader = &self.reader;

        self.poller
            .poll(&description, None, move || async move {
                let peers = reader.peer_ids(member).await.map_err(|e| e.to_string())?;
                if peers.len() >= count {
                    Ok(peers.len())
                } else {
                    Err(format!("{} peers", peers.len()))
                }
            })
            .await
    }

    /// `member`'s chain grows by at least `blocks` from its current height.
    pub async fn chain_advances(
        &self,
        member: &MemberEndpoint,
        blocks: u64,
    ) -> Result<u64, ConvergenceError> {
        let reader = &self.reader;
        let start = self
            .poller
            .poll(&format!("block number of {member}"), None, move || {
                reader.block_number(member)
            })
            .await?;
        let target = start.saturating_add(blocks);
        self.consensus_on_block_number_is_at_least(std::slice::from_ref(member), target)
            .await
    }

    // =========================================================================
    // CONNECTIVITY
    // =========================================================================

    /// Every peering member has every other peering member in its peer list.
    ///
    /// Transaction signers do not peer and are skipped. All pairwise checks
    /// run concurrently; the first pair that never connects is reported.
    pub async fn mutual_connectivity(
        &self,
        members: &[MemberEndpoint],
    ) -> Result<(), ConvergenceError> {
        let peering: Vec<&MemberEndpoint> = members
            .iter()
            .filter(|m| m.kind.participates_in_peering())
            .collect();
        if peering.len() < 2 {
            return Ok(());
        }

        let reader = &self.reader;
        let poller = &self.poller;

        let ids = try_join_all(peering.iter().map(|member| async move {
            let description = format!("node id of {member}");
            poller
                .poll(&description, None, move || reader.node_id(member))
                .await
        }))
        .await?;

        let mut pairs = Vec::with_capacity(peering.len() * (peering.len() - 1));
        for (i, from) in peering.iter().enumerate() {
            for (j, to) in peering.iter().enumerate() {
                if i != j {
                    pairs.push((*from, *to, &ids[j]));
                }
            }
        }

        try_join_all(pairs.into_iter().map(|(from, to, expected)| async move {
            let description = format!("{from} connected to {to}");
            poller
                .poll(&description, None, move || async move {
                    let peers = reader.peer_ids(from).await.map_err(|e| e.to_string())?;
                    if peers.contains(expected) {
                        Ok(())
                    } else {
                        Err(format!("{} peers, {} missing", peers.len(), to.member))
                    }
                })
                .await
        }))
        .await?;

        info!(members = peering.len(), "Mutual connectivity established");
        Ok(())
    }

    fn balance_condition<'a>(
        &'a self,
        member: &'a MemberEndpoint,
        account: Address,
        expected: Wei,
        role: &str,
    ) -> Condition<'a> {
        let reader = &self.reader;
        Condition::new(
            format!("{role} {account:?} holds {expected} wei on {member}"),
            move || async move {
                let balance = reader.balance(member, account).await.map_err(|e| e.to_string())?;
                if balance == expected {
                    Ok(())
                } else {
                    Err(format!("balance is {balance} wei"))
                }
            },
        )
    }
}

impl std::fmt::Debug for ConvergenceVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvergenceVerifier")
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}

fn require_members(
    check: &str,
    members: &[MemberEndpoint],
    required: usize,
) -> Result<(), ConvergenceError> {
    if members.len() < required {
        return Err(ConvergenceError::InsufficientMembers {
            check: check.to_string(),
            required,
            actual: members.len(),
        });
    }
    Ok(())
}

fn overflow(transaction: Hash, what: &str) -> ConvergenceError {
    ConvergenceError::InvalidExpectation(format!(
        "{what} for {transaction:?} over- or underflows"
    ))
}

fn member_names(members: &[MemberEndpoint]) -> String {
    members
        .iter()
        .map(|m| m.member.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn account_list(accounts: &[Address]) -> String {
    let rendered: Vec<String> = accounts.iter().map(|a| format!("{a:?}")).collect();
    format!("[{}]", rendered.join(", "))
}
