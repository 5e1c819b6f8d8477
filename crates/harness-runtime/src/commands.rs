//! Offline helpers behind the `extra-data`, `inspect` and `plan-subnets`
//! subcommands. None of them touch docker or the network.

use anyhow::{Context, Result};
use qh_01_subnet_allocation::{candidate_cidr, CidrBlock, SubnetRange};
use qh_02_extra_data::{codec_for, encode_validator_keys, ConsensusFamily};
use shared_types::Address;

/// Genesis `extraData` for validators given as hex public keys.
pub fn extra_data_for_keys(family: ConsensusFamily, keys: &[String]) -> Result<String> {
    let extra_data = encode_validator_keys(family, keys)
        .with_context(|| format!("Failed to encode {family} extra data"))?;
    Ok(extra_data.to_hex())
}

/// Validator addresses embedded in a hex `extraData` blob.
pub fn inspect_extra_data(family: ConsensusFamily, extra_data: &str) -> Result<Vec<Address>> {
    let trimmed = extra_data.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).context("extra data is not valid hex")?;
    let validators = codec_for(family).decode_validators(&bytes)?;
    Ok(validators)
}

/// The first `count` candidate blocks starting at `start`.
pub fn plan_subnets(range: SubnetRange, start: u32, count: u32) -> Vec<CidrBlock> {
    (0..count)
        .map(|offset| candidate_cidr(range, start.wrapping_add(offset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const G_X: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const G_Y: &str = "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

    #[test]
    fn test_extra_data_then_inspect() {
        for family in [
            ConsensusFamily::Clique,
            ConsensusFamily::IbftLegacy,
            ConsensusFamily::Ibft2,
            ConsensusFamily::Qbft,
        ] {
            let hex = extra_data_for_keys(family, &[format!("0x{G_X}{G_Y}")]).unwrap();
            assert!(hex.starts_with("0x"));
            let validators = inspect_extra_data(family, &hex).unwrap();
            assert_eq!(
                format!("{:?}", validators[0]),
                "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf",
                "{family}"
            );
        }
    }

    #[test]
    fn test_bad_key_is_reported() {
        let err = extra_data_for_keys(ConsensusFamily::Ibft2, &["abcd".to_string()]).unwrap_err();
        assert!(format!("{err:#}").contains("got 2"), "{err:#}");
    }

    #[test]
    fn test_inspect_rejects_non_hex() {
        let err = inspect_extra_data(ConsensusFamily::Qbft, "0xzz").unwrap_err();
        assert!(err.to_string().contains("not valid hex"));
    }

    #[test]
    fn test_plan_wraps_third_octet() {
        let plan = plan_subnets(SubnetRange::new(172, 29), 254, 3);
        let rendered: Vec<String> = plan.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["172.29.254.0/24", "172.29.255.0/24", "172.29.0.0/24"]
        );
        assert!(plan_subnets(SubnetRange::default(), 0, 0).is_empty());
    }
}
