//! Candidate parsing and canonicalization.
//!
//! Every candidate entering the guardian is normalized into a
//! [`NetworkRange`]: host bits are masked off and bare addresses are widened
//! to single-host prefixes, so `"10.1.2.3/8"` and `"10.0.0.0/8"` evaluate
//! and cache identically.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;

use crate::error::{GuardianError, Result};

/// A canonical network range.
///
/// Invariant: the base address has no host bits set, and
/// `address_count() == 2^(max_prefix_len - prefix_len)` (saturating for
/// `::/0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkRange {
    net: IpNet,
}

impl NetworkRange {
    /// Parse an IP address or CIDR range. Host bits in CIDR input are
    /// masked rather than rejected.
    pub fn parse(candidate: &str) -> Result<Self> {
        let trimmed = candidate.trim();
        let net = if let Ok(net) = IpNet::from_str(trimmed) {
            net
        } else if let Ok(addr) = IpAddr::from_str(trimmed) {
            IpNet::from(addr)
        } else {
            return Err(GuardianError::InvalidCandidate {
                candidate: candidate.to_string(),
                reason: "not an IP address or CIDR range".to_string(),
            });
        };
        Ok(Self { net: net.trunc() })
    }

    /// The network base address (host bits cleared).
    pub fn base_addr(&self) -> IpAddr {
        self.net.addr()
    }

    pub fn prefix_len(&self) -> u8 {
        self.net.prefix_len()
    }

    /// 32 for IPv4, 128 for IPv6.
    pub fn max_prefix_len(&self) -> u8 {
        self.net.max_prefix_len()
    }

    pub fn is_ipv4(&self) -> bool {
        matches!(self.net, IpNet::V4(_))
    }

    pub fn is_single_host(&self) -> bool {
        self.net.prefix_len() == self.net.max_prefix_len()
    }

    /// Number of addresses covered, saturating at `u128::MAX` for `::/0`.
    pub fn address_count(&self) -> u128 {
        let host_bits = u32::from(self.net.max_prefix_len() - self.net.prefix_len());
        if host_bits >= 128 {
            u128::MAX
        } else {
            1u128 << host_bits
        }
    }

    /// Whether this range and `other` share at least one address. Ranges of
    /// different families never overlap.
    pub fn overlaps(&self, other: &NetworkRange) -> bool {
        self.net.contains(&other.net) || other.net.contains(&self.net)
    }

    /// Whether `other` is fully inside this range.
    pub fn contains(&self, other: &NetworkRange) -> bool {
        self.net.contains(&other.net)
    }
}

impl From<IpNet> for NetworkRange {
    fn from(net: IpNet) -> Self {
        Self { net: net.trunc() }
    }
}

impl FromStr for NetworkRange {
    type Err = GuardianError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.net)
    }
}
