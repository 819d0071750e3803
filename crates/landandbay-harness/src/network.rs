// crates/landandbay-harness/src/network.rs
// ============================================================================
// Module: Network Layout
// Description: Fixed CIDR table and IPv4 block arithmetic.
// Purpose: Feed networking scenarios and check that subnet blocks never overlap.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The test VPC uses one `/16` supernet split into six `/24` subnets: two
//! public, two private, and two database blocks, each pair spread over two
//! availability zones. [`Ipv4Cidr`] provides the containment and overlap
//! checks used to assert that layout.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::vars::VarMap;

// ============================================================================
// SECTION: CIDR Table
// ============================================================================

/// Returns the fixed CIDR layout keyed by terraform variable name.
#[must_use]
pub fn vpc_cidr_blocks() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("vpc_cidr", "10.0.0.0/16"),
        ("public_subnet_a_cidr", "10.0.1.0/24"),
        ("public_subnet_b_cidr", "10.0.2.0/24"),
        ("private_subnet_a_cidr", "10.0.3.0/24"),
        ("private_subnet_b_cidr", "10.0.4.0/24"),
        ("private_db_subnet_a_cidr", "10.0.5.0/24"),
        ("private_db_subnet_b_cidr", "10.0.6.0/24"),
    ])
}

/// Scenario defaults for the networking module tests.
#[must_use]
pub fn networking_test_vars() -> VarMap {
    vpc_cidr_blocks().into_iter().collect()
}

/// Scenario defaults for the full-stack integration tests.
#[must_use]
pub fn integration_test_vars() -> VarMap {
    networking_test_vars()
}

// ============================================================================
// SECTION: IPv4 Blocks
// ============================================================================

/// Malformed CIDR notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cidr '{input}': {reason}")]
pub struct CidrParseError {
    /// Rejected input.
    pub input: String,
    /// Rejection reason.
    pub reason: &'static str,
}

/// IPv4 network block in `a.b.c.d/len` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Cidr {
    /// Network address with host bits cleared.
    network: u32,
    /// Prefix length (0 to 32).
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// Parses CIDR notation.
    ///
    /// # Errors
    ///
    /// Returns [`CidrParseError`] when the address or prefix is malformed or
    /// host bits are set.
    pub fn parse(input: &str) -> Result<Self, CidrParseError> {
        let reject = |reason| CidrParseError {
            input: input.to_string(),
            reason,
        };
        let (addr, len) =
            input.trim().split_once('/').ok_or_else(|| reject("missing prefix length"))?;
        let addr = Ipv4Addr::from_str(addr).map_err(|_| reject("malformed address"))?;
        let prefix_len: u8 = len.parse().map_err(|_| reject("malformed prefix length"))?;
        if prefix_len > 32 {
            return Err(reject("prefix length exceeds 32"));
        }
        let network = u32::from(addr);
        if network & !mask(prefix_len) != 0 {
            return Err(reject("host bits set"));
        }
        Ok(Self {
            network,
            prefix_len,
        })
    }

    /// Returns the network address.
    #[must_use]
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    /// Returns the prefix length.
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns true when `other` lies entirely within this block.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        other.prefix_len >= self.prefix_len
            && other.network & mask(self.prefix_len) == self.network
    }

    /// Returns true when the two blocks share any address.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CidrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix_len)
    }
}

/// Returns the netmask for a prefix length.
const fn mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 { 0 } else { u32::MAX << (32 - prefix_len) }
}

/// Returns every pair of overlapping blocks, in input order.
#[must_use]
pub fn find_overlaps(blocks: &[Ipv4Cidr]) -> Vec<(Ipv4Cidr, Ipv4Cidr)> {
    let mut overlaps = Vec::new();
    for (index, left) in blocks.iter().enumerate() {
        for right in &blocks[index + 1..] {
            if left.overlaps(right) {
                overlaps.push((*left, *right));
            }
        }
    }
    overlaps
}

// ============================================================================
// SECTION: Tests
// ============================================================================
