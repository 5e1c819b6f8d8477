//! IBFT2 and QBFT codecs over `BftExtraData`.

use shared_types::Address;

use crate::domain::{BftDialect, BftExtraData, ConsensusFamily, ExtraData, ExtraDataError};
use crate::ports::ExtraDataCodec;

#[derive(Debug, Clone, Copy, Default)]
pub struct Ibft2Codec;

impl Ibft2Codec {
    /// Encode a full structure, including vote, round and seals.
    pub fn encode_full(&self, extra: &BftExtraData) -> ExtraData {
        ExtraData::new(ConsensusFamily::Ibft2, extra.encode(BftDialect::Ibft2))
    }

    pub fn decode_full(&self, extra_data: &[u8]) -> Result<BftExtraData, ExtraDataError> {
        BftExtraData::decode(extra_data, BftDialect::Ibft2)
    }
}

impl ExtraDataCodec for Ibft2Codec {
    fn family(&self) -> ConsensusFamily {
        ConsensusFamily::Ibft2
    }

    fn encode(&self, validators: &[Address]) -> ExtraData {
        self.encode_full(&BftExtraData::genesis(validators.to_vec()))
    }

    fn decode_validators(&self, extra_data: &[u8]) -> Result<Vec<Address>, ExtraDataError> {
        Ok(self.decode_full(extra_data)?.validators)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QbftCodec;

impl QbftCodec {
    /// Encode a full structure, including vote, round and seals.
    pub fn encode_full(&self, extra: &BftExtraData) -> ExtraData {
        ExtraData::new(ConsensusFamily::Qbft, extra.encode(BftDialect::Qbft))
    }

    pub fn decode_full(&self, extra_data: &[u8]) -> Result<BftExtraData, ExtraDataError> {
        BftExtraData::decode(extra_data, BftDialect::Qbft)
    }
}

impl ExtraDataCodec for QbftCodec {
    fn family(&self) -> ConsensusFamily {
        ConsensusFamily::Qbft
    }

    fn encode(&self, validators: &[Address]) -> ExtraData {
        self.encode_full(&BftExtraData::genesis(validators.to_vec()))
    }

    fn decode_validators(&self, extra_data: &[u8]) -> Result<Vec<Address>, ExtraDataError> {
        Ok(self.decode_full(extra_data)?.validators)
    }
}
