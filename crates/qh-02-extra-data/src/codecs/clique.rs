//! Clique: `vanity(32) ‖ addresses(20·n) ‖ seal(65)`, no length prefixes.

use shared_types::Address;

use crate::domain::{ConsensusFamily, ExtraData, ExtraDataError, VANITY_LENGTH};
use crate::ports::ExtraDataCodec;

/// Length of the zeroed proposer seal placeholder.
pub const CLIQUE_SEAL_LENGTH: usize = 65;

const ADDRESS_LENGTH: usize = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct CliqueCodec;

impl ExtraDataCodec for CliqueCodec {
    fn family(&self) -> ConsensusFamily {
        ConsensusFamily::Clique
    }

    fn encode(&self, validators: &[Address]) -> ExtraData {
        let mut bytes =
            Vec::with_capacity(VANITY_LENGTH + ADDRESS_LENGTH * validators.len() + CLIQUE_SEAL_LENGTH);
        bytes.extend_from_slice(&[0u8; VANITY_LENGTH]);
        for validator in validators {
            bytes.extend_from_slice(validator.as_bytes());
        }
        bytes.extend_from_slice(&[0u8; CLIQUE_SEAL_LENGTH]);
        ExtraData::new(ConsensusFamily::Clique, bytes)
    }

    fn decode_validators(&self, extra_data: &[u8]) -> Result<Vec<Address>, ExtraDataError> {
        let fixed = VANITY_LENGTH + CLIQUE_SEAL_LENGTH;
        if extra_data.len() < fixed {
            return Err(ExtraDataError::malformed(
                ConsensusFamily::Clique,
                format!("{} bytes is shorter than vanity and seal ({fixed})", extra_data.len()),
            ));
        }

        let signers = &extra_data[VANITY_LENGTH..extra_data.len() - CLIQUE_SEAL_LENGTH];
        if signers.len() % ADDRESS_LENGTH != 0 {
            return Err(ExtraDataError::malformed(
                ConsensusFamily::Clique,
                format!("signer section of {} bytes is not a multiple of 20", signers.len()),
            ));
        }
        Ok(signers.chunks_exact(ADDRESS_LENGTH).map(Address::from_slice).collect())
    }
}
