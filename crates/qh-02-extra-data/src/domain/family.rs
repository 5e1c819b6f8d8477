//! Consensus families and the encoded blob.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Consensus protocol a genesis file is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsensusFamily {
    /// Proof of authority with signer votes in the block header.
    Clique,
    /// Istanbul BFT as originally shipped with Quorum.
    #[serde(alias = "ibft", alias = "istanbul")]
    IbftLegacy,
    /// Besu's IBFT 2.0.
    Ibft2,
    /// QBFT (EEA standard BFT).
    Qbft,
}

impl ConsensusFamily {
    pub const ALL: [ConsensusFamily; 4] = [
        ConsensusFamily::Clique,
        ConsensusFamily::IbftLegacy,
        ConsensusFamily::Ibft2,
        ConsensusFamily::Qbft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusFamily::Clique => "clique",
            ConsensusFamily::IbftLegacy => "ibft-legacy",
            ConsensusFamily::Ibft2 => "ibft2",
            ConsensusFamily::Qbft => "qbft",
        }
    }

    /// Whether blocks carry a BFT mix hash and committed seals.
    pub fn is_bft(&self) -> bool {
        !matches!(self, ConsensusFamily::Clique)
    }
}

impl fmt::Display for ConsensusFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsensusFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clique" => Ok(ConsensusFamily::Clique),
            "ibft" | "ibft-legacy" | "istanbul" => Ok(ConsensusFamily::IbftLegacy),
            "ibft2" | "ibft2.0" => Ok(ConsensusFamily::Ibft2),
            "qbft" => Ok(ConsensusFamily::Qbft),
            other => Err(format!(
                "unknown consensus family '{other}' (expected clique, ibft, ibft2 or qbft)"
            )),
        }
    }
}

/// Encoded extra data for one family.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ExtraData {
    family: ConsensusFamily,
    bytes: Vec<u8>,
}

impl ExtraData {
    pub fn new(family: ConsensusFamily, bytes: Vec<u8>) -> Self {
        Self { family, bytes }
    }

    pub fn family(&self) -> ConsensusFamily {
        self.family
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `0x`-prefixed lower-case hex, the form genesis files use.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.bytes))
    }
}

impl fmt::Display for ExtraData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ExtraData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtraData({}, {})", self.family, self.to_hex())
    }
}

impl AsRef<[u8]> for ExtraData {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parsing_aliases() {
        assert_eq!("IBFT".parse::<ConsensusFamily>().unwrap(), ConsensusFamily::IbftLegacy);
        assert_eq!("istanbul".parse::<ConsensusFamily>().unwrap(), ConsensusFamily::IbftLegacy);
        assert_eq!("ibft2".parse::<ConsensusFamily>().unwrap(), ConsensusFamily::Ibft2);
        assert!("pow".parse::<ConsensusFamily>().is_err());
    }

    #[test]
    fn test_family_display_roundtrips() {
        for family in ConsensusFamily::ALL {
            assert_eq!(family.to_string().parse::<ConsensusFamily>().unwrap(), family);
        }
    }

    #[test]
    fn test_family_serde_names() {
        let json = serde_json::to_string(&ConsensusFamily::IbftLegacy).unwrap();
        assert_eq!(json, "\"ibft-legacy\"");
        let parsed: ConsensusFamily = serde_json::from_str("\"ibft\"").unwrap();
        assert_eq!(parsed, ConsensusFamily::IbftLegacy);
    }

    #[test]
    fn test_extra_data_hex() {
        let extra = ExtraData::new(ConsensusFamily::Qbft, vec![0xc0, 0x80]);
        assert_eq!(extra.to_hex(), "0xc080");
        assert_eq!(extra.len(), 2);
    }
}
