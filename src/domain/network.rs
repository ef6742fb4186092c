// Copyright 2025 Cowboy AI, LLC.

//! Network Value Objects with Validation Invariants
//!
//! `CidrBlock` is the address-block value object used throughout the
//! topology model. Construction validates the notation and normalizes the
//! address to the network address, so two blocks covering the same range
//! always compare equal. Subdivision is real bit arithmetic on the prefix,
//! never string manipulation of the notation.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// CIDR computation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CidrError {
    #[error("invalid CIDR notation: {0}")]
    InvalidNotation(String),

    #[error("invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("cannot carve a /{prefix} sub-block out of {block}")]
    BlockTooNarrow { block: String, prefix: u8 },

    #[error("sub-block index {index} out of range for /{prefix} blocks within {block}")]
    SubBlockOutOfRange {
        block: String,
        prefix: u8,
        index: u32,
    },
}

/// IPv4 address block in CIDR notation
///
/// Invariants:
/// - Prefix length 0-32
/// - Host bits are zero (normalized on construction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CidrBlock {
    address: Ipv4Addr,
    prefix_len: u8,
}

impl CidrBlock {
    /// Create a new block, normalizing the address to the network address
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self, CidrError> {
        if prefix_len > 32 {
            return Err(CidrError::InvalidPrefixLength(prefix_len));
        }

        let mask = Self::mask(prefix_len);
        let network = Ipv4Addr::from(u32::from(address) & mask);

        Ok(Self {
            address: network,
            prefix_len,
        })
    }

    /// Get the network address
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Get the prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Number of addresses covered by the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - self.prefix_len)
    }

    /// Check whether `other` is fully contained in this block
    pub fn contains(&self, other: &CidrBlock) -> bool {
        if other.prefix_len < self.prefix_len {
            return false;
        }

        let mask = Self::mask(self.prefix_len);
        (u32::from(other.address) & mask) == u32::from(self.address)
    }

    /// Carve the `index`-th sub-block of the given prefix length out of
    /// this block
    ///
    /// # Invariants
    /// - `prefix_len` must be at least as long as this block's prefix
    /// - `index` must address one of the `2^(prefix_len - self.prefix_len)`
    ///   sub-blocks
    pub fn sub_block(&self, prefix_len: u8, index: u32) -> Result<CidrBlock, CidrError> {
        if prefix_len > 32 {
            return Err(CidrError::InvalidPrefixLength(prefix_len));
        }

        if prefix_len < self.prefix_len {
            return Err(CidrError::BlockTooNarrow {
                block: self.to_string(),
                prefix: prefix_len,
            });
        }

        let extra_bits = prefix_len - self.prefix_len;
        let count = 1u64 << extra_bits;
        if u64::from(index) >= count {
            return Err(CidrError::SubBlockOutOfRange {
                block: self.to_string(),
                prefix: prefix_len,
                index,
            });
        }

        let step = 1u64 << (32 - prefix_len);
        let base = u64::from(u32::from(self.address)) + u64::from(index) * step;

        CidrBlock::new(Ipv4Addr::from(base as u32), prefix_len)
    }

    /// First /24 sub-block; the carve used for the NAT bootstrap subnet
    pub fn first_slash24(&self) -> Result<CidrBlock, CidrError> {
        self.sub_block(24, 0).map_err(|_| CidrError::BlockTooNarrow {
            block: self.to_string(),
            prefix: 24,
        })
    }

    fn mask(prefix_len: u8) -> u32 {
        if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - prefix_len)
        }
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for CidrBlock {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| CidrError::InvalidNotation(s.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| CidrError::InvalidNotation(s.to_string()))?;

        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| CidrError::InvalidNotation(s.to_string()))?;

        Self::new(address, prefix_len)
    }
}

impl Serialize for CidrBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CidrBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Routing class of a subnet
///
/// Drives which route table the subnet associates with: public subnets
/// route through the internet gateway, private subnets through NAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    Public,
    Private,
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteClass::Public => write!(f, "public"),
            RouteClass::Private => write!(f, "private"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_and_display() {
        let block: CidrBlock = "10.0.0.0/16".parse().unwrap();
        assert_eq!(block.prefix_len(), 16);
        assert_eq!(block.to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_normalizes_host_bits() {
        let block: CidrBlock = "10.0.3.7/16".parse().unwrap();
        assert_eq!(block.to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_invalid_notation() {
        assert!("10.0.0.0".parse::<CidrBlock>().is_err());
        assert!("10.0.0.0/33".parse::<CidrBlock>().is_err());
        assert!("999.0.0.0/8".parse::<CidrBlock>().is_err());
    }

    #[test_case("10.0.0.0/16", 0, "10.0.0.0/24"; "first sub-block")]
    #[test_case("10.0.0.0/16", 5, "10.0.5.0/24"; "fifth sub-block")]
    #[test_case("172.16.0.0/12", 0, "172.16.0.0/24"; "wide parent")]
    fn test_slash24_carve(parent: &str, index: u32, expected: &str) {
        let block: CidrBlock = parent.parse().unwrap();
        assert_eq!(block.sub_block(24, index).unwrap().to_string(), expected);
    }

    #[test]
    fn test_carve_too_narrow() {
        let block: CidrBlock = "10.0.0.0/26".parse().unwrap();
        assert!(matches!(
            block.first_slash24(),
            Err(CidrError::BlockTooNarrow { .. })
        ));
    }

    #[test]
    fn test_sub_block_index_range() {
        let block: CidrBlock = "10.0.0.0/23".parse().unwrap();
        assert!(block.sub_block(24, 1).is_ok());
        assert!(matches!(
            block.sub_block(24, 2),
            Err(CidrError::SubBlockOutOfRange { .. })
        ));
    }

    #[test]
    fn test_contains() {
        let parent: CidrBlock = "10.0.0.0/16".parse().unwrap();
        let child: CidrBlock = "10.0.4.0/24".parse().unwrap();
        let outside: CidrBlock = "10.1.0.0/24".parse().unwrap();

        assert!(parent.contains(&child));
        assert!(!parent.contains(&outside));
        assert!(!child.contains(&parent));
    }

    #[test]
    fn test_route_class_serde() {
        let public: RouteClass = serde_yaml::from_str("public").unwrap();
        assert_eq!(public, RouteClass::Public);
        assert_eq!(RouteClass::Private.to_string(), "private");
    }
}
