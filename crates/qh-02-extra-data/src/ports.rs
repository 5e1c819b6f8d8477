//! Ports layer: the codec contract.

use shared_crypto::ValidatorIdentity;
use shared_types::Address;

use crate::domain::{ConsensusFamily, ExtraData, ExtraDataError};

/// Encodes an ordered validator list into one family's extra data.
///
/// Implementations are stateless. Encoding cannot fail once addresses
/// exist; only decoding untrusted bytes can.
pub trait ExtraDataCodec: Send + Sync {
    fn family(&self) -> ConsensusFamily;

    /// Genesis extra data for `validators`, in the given order.
    fn encode(&self, validators: &[Address]) -> ExtraData;

    /// Validator addresses embedded in `extra_data`, in encoded order.
    fn decode_validators(&self, extra_data: &[u8]) -> Result<Vec<Address>, ExtraDataError>;

    /// Encode from validator identities.
    fn encode_identities(&self, validators: &[ValidatorIdentity]) -> ExtraData {
        let addresses: Vec<Address> = validators.iter().map(ValidatorIdentity::address).collect();
        self.encode(&addresses)
    }
}
