//! # CIDR Blocks
//!
//! Every topology gets a `/24` carved out of a fixed `/16` private range.
//! Only the third octet varies between candidates.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// The fixed `/16` range candidates are drawn from (e.g. `172.29`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubnetRange {
    pub first: u8,
    pub second: u8,
}

impl SubnetRange {
    pub const fn new(first: u8, second: u8) -> Self {
        Self { first, second }
    }
}

impl Default for SubnetRange {
    fn default() -> Self {
        Self::new(172, 29)
    }
}

impl fmt::Display for SubnetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.first, self.second)
    }
}

impl FromStr for SubnetRange {
    type Err = String;

    /// Accepts `"172.29"` or `"172.29.0.0/16"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let prefix = s.trim().trim_end_matches("/16");
        let octets: Vec<&str> = prefix.split('.').collect();
        let (first, second) = match octets.as_slice() {
            [a, b] => (*a, *b),
            [a, b, "0", "0"] => (*a, *b),
            _ => return Err(format!("expected '<a>.<b>' subnet prefix, got '{s}'")),
        };
        let parse = |octet: &str| {
            octet
                .parse::<u8>()
                .map_err(|e| format!("invalid octet '{octet}' in '{s}': {e}"))
        };
        Ok(Self::new(parse(first)?, parse(second)?))
    }
}

/// A `/24` network. Immutable once provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CidrBlock {
    network: Ipv4Addr,
}

impl CidrBlock {
    /// Prefix length of every block the allocator issues.
    pub const PREFIX_LENGTH: u8 = 24;

    pub const fn new(first: u8, second: u8, third: u8) -> Self {
        Self {
            network: Ipv4Addr::new(first, second, third, 0),
        }
    }

    /// Network address (`x.y.z.0`).
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn third_octet(&self) -> u8 {
        self.network.octets()[2]
    }

    /// Gateway address (`x.y.z.1`), reserved for routing infrastructure.
    pub fn gateway(&self) -> Ipv4Addr {
        self.host(1)
    }

    /// Address of host `offset` inside this block.
    pub fn host(&self, offset: u8) -> Ipv4Addr {
        let [a, b, c, _] = self.network.octets();
        Ipv4Addr::new(a, b, c, offset)
    }

    pub fn contains(&self, address: Ipv4Addr) -> bool {
        address.octets()[..3] == self.network.octets()[..3]
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, Self::PREFIX_LENGTH)
    }
}

impl FromStr for CidrBlock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("missing prefix length in '{s}'"))?;
        if prefix != "24" {
            return Err(format!("only /24 blocks are supported, got /{prefix}"));
        }
        let address: Ipv4Addr = address
            .parse()
            .map_err(|e| format!("invalid network address in '{s}': {e}"))?;
        let [a, b, c, d] = address.octets();
        if d != 0 {
            return Err(format!("'{s}' is not a network address"));
        }
        Ok(Self::new(a, b, c))
    }
}

/// Candidate block for cursor value `sequence`.
///
/// Pure: the same `(range, sequence)` always yields the same block. The
/// third octet is `sequence mod 256`, so the sequence wraps and old blocks
/// are reconsidered on long runs.
pub fn candidate_cidr(range: SubnetRange, sequence: u32) -> CidrBlock {
    CidrBlock::new(range.first, range.second, (sequence % 256) as u8)
}
