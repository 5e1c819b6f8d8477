//! # BFT Extra Data
//!
//! The five-field structure shared by IBFT2 and QBFT:
//!
//! ```text
//! RLP[ vanity(32), [validator, ...], vote, round, [seal, ...] ]
//! ```
//!
//! | Field | IBFT2 | QBFT |
//! |-------|-------|------|
//! | absent vote | empty string `0x80` | empty list `0xc0` |
//! | vote | `[recipient, 0xFF add / 0x00 drop]` | same |
//! | round | 4-byte big-endian string | minimal integer scalar |
//!
//! A genesis block carries no vote, round 0 and no seals.

use rlp::{Rlp, RlpStream};
use shared_types::Address;

use super::errors::ExtraDataError;
use super::family::ConsensusFamily;
use super::rlp_fields::{append_address_list, decode_address_list, expect_list, outer_list, rlp_error};
use super::VANITY_LENGTH;

const ADD_VOTE: u8 = 0xFF;
const DROP_VOTE: u8 = 0x00;

/// Direction of a validator vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Add,
    Drop,
}

impl VoteKind {
    fn to_byte(self) -> u8 {
        match self {
            VoteKind::Add => ADD_VOTE,
            VoteKind::Drop => DROP_VOTE,
        }
    }

    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            ADD_VOTE => Some(VoteKind::Add),
            DROP_VOTE => Some(VoteKind::Drop),
            _ => None,
        }
    }
}

/// A proposer's vote to add or remove a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vote {
    pub recipient: Address,
    pub kind: VoteKind,
}

/// Decoded IBFT2 / QBFT extra data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BftExtraData {
    pub vanity: [u8; VANITY_LENGTH],
    pub validators: Vec<Address>,
    pub vote: Option<Vote>,
    pub round: u32,
    /// Committer seals (65-byte signatures).
    pub seals: Vec<Vec<u8>>,
}

/// Which of the two BFT encodings to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BftDialect {
    Ibft2,
    Qbft,
}

impl BftDialect {
    pub(crate) fn family(self) -> ConsensusFamily {
        match self {
            BftDialect::Ibft2 => ConsensusFamily::Ibft2,
            BftDialect::Qbft => ConsensusFamily::Qbft,
        }
    }
}

impl BftExtraData {
    /// Extra data of a genesis block for `validators`.
    pub fn genesis(validators: Vec<Address>) -> Self {
        Self {
            vanity: [0u8; VANITY_LENGTH],
            validators,
            vote: None,
            round: 0,
            seals: Vec::new(),
        }
    }

    pub(crate) fn encode(&self, dialect: BftDialect) -> Vec<u8> {
        let mut stream = RlpStream::new_list(5);
        stream.append(&self.vanity.as_slice());
        append_address_list(&mut stream, &self.validators);

        match (&self.vote, dialect) {
            (None, BftDialect::Ibft2) => {
                stream.append_empty_data();
            }
            (None, BftDialect::Qbft) => {
                stream.begin_list(0);
            }
            (Some(vote), _) => {
                stream.begin_list(2);
                stream.append(&vote.recipient.as_bytes());
                stream.append(&[vote.kind.to_byte()].as_slice());
            }
        }

        match dialect {
            BftDialect::Ibft2 => {
                stream.append(&self.round.to_be_bytes().as_slice());
            }
            BftDialect::Qbft => {
                stream.append(&self.round);
            }
        }

        stream.begin_list(self.seals.len());
        for seal in &self.seals {
            stream.append(&seal.as_slice());
        }
        stream.out().to_vec()
    }

    pub(crate) fn decode(bytes: &[u8], dialect: BftDialect) -> Result<Self, ExtraDataError> {
        let family = dialect.family();
        let rlp = outer_list(bytes, family, 5)?;

        let vanity_bytes = rlp
            .at(0)
            .and_then(|item| item.data())
            .map_err(rlp_error(family, "vanity"))?;
        let vanity: [u8; VANITY_LENGTH] = vanity_bytes.try_into().map_err(|_| {
            ExtraDataError::malformed(
                family,
                format!("vanity is {} bytes, expected 32", vanity_bytes.len()),
            )
        })?;

        let validators_item = rlp.at(1).map_err(rlp_error(family, "validator list"))?;
        let validators = decode_address_list(&validators_item, family)?;

        let vote_item = rlp.at(2).map_err(rlp_error(family, "vote"))?;
        let vote = decode_vote(&vote_item, dialect)?;

        let round_item = rlp.at(3).map_err(rlp_error(family, "round"))?;
        let round = match dialect {
            BftDialect::Ibft2 => {
                let raw = round_item.data().map_err(rlp_error(family, "round"))?;
                let raw: [u8; 4] = raw.try_into().map_err(|_| {
                    ExtraDataError::malformed(
                        family,
                        format!("round is {} bytes, expected 4", raw.len()),
                    )
                })?;
                u32::from_be_bytes(raw)
            }
            BftDialect::Qbft => round_item.as_val::<u32>().map_err(rlp_error(family, "round"))?,
        };

        let seals_item = rlp.at(4).map_err(rlp_error(family, "seals"))?;
        expect_list(&seals_item, family, "seal list")?;
        let seals = seals_item
            .iter()
            .map(|seal| seal.data().map(<[u8]>::to_vec))
            .collect::<Result<Vec<_>, _>>()
            .map_err(rlp_error(family, "seal"))?;

        Ok(Self {
            vanity,
            validators,
            vote,
            round,
            seals,
        })
    }
}

fn decode_vote(item: &Rlp<'_>, dialect: BftDialect) -> Result<Option<Vote>, ExtraDataError> {
    let family = dialect.family();

    if item.is_data() {
        return match (dialect, item.is_empty()) {
            (BftDialect::Ibft2, true) => Ok(None),
            _ => Err(ExtraDataError::malformed(family, "vote must be a list")),
        };
    }

    let count = item.item_count().map_err(rlp_error(family, "vote"))?;
    match (count, dialect) {
        (0, BftDialect::Qbft) => Ok(None),
        (2, _) => {
            let recipient = item
                .at(0)
                .and_then(|r| r.data())
                .map_err(rlp_error(family, "vote recipient"))?;
            if recipient.len() != 20 {
                return Err(ExtraDataError::malformed(
                    family,
                    format!("vote recipient is {} bytes, expected 20", recipient.len()),
                ));
            }
            let kind_bytes = item
                .at(1)
                .and_then(|k| k.data())
                .map_err(rlp_error(family, "vote type"))?;
            let kind = match kind_bytes {
                [byte] => VoteKind::from_byte(*byte),
                _ => None,
            }
            .ok_or_else(|| {
                ExtraDataError::malformed(
                    family,
                    format!("vote type 0x{} is neither add nor drop", hex::encode(kind_bytes)),
                )
            })?;
            Ok(Some(Vote {
                recipient: Address::from_slice(recipient),
                kind,
            }))
        }
        (other, _) => Err(ExtraDataError::malformed(
            family,
            format!("vote list has {other} items"),
        )),
    }
}
