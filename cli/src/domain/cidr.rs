//! IPv4 CIDR parsing and equal-size subnet allocation.
//!
//! Pure functions only, no I/O.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::domain::error::CidrError;

/// Largest VPC / subnet prefix the provider accepts.
pub const MIN_PREFIX: u8 = 16;
/// Smallest VPC / subnet prefix the provider accepts.
pub const MAX_PREFIX: u8 = 28;

/// An IPv4 network in CIDR notation with no host bits set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    /// Network address.
    #[must_use]
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length.
    #[must_use]
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses in the block.
    #[must_use]
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }

    /// Split the block into `count` equal subnets, in address order.
    ///
    /// The subnet size is the largest power of two that fits `count` blocks,
    /// so a `/24` split three ways yields three `/26` blocks and leaves the
    /// fourth unallocated.
    ///
    /// # Errors
    ///
    /// Returns [`CidrError::Exhausted`] if the resulting subnets would be
    /// smaller than `/28`.
    pub fn split(&self, count: usize) -> Result<Vec<Ipv4Cidr>, CidrError> {
        let count = count.max(1);
        let extra_bits = count.next_power_of_two().trailing_zeros();
        let new_prefix = u32::from(self.prefix) + extra_bits;
        if new_prefix > u32::from(MAX_PREFIX) {
            return Err(CidrError::Exhausted {
                cidr: self.to_string(),
                needed: count,
                prefix: u8::try_from(new_prefix).unwrap_or(u8::MAX),
            });
        }
        let block = 1u32 << (32 - new_prefix);
        let base = u32::from(self.network);
        Ok((0..count)
            .map(|i| {
                // count <= 2^(28 - 16), so the cast and the offset cannot overflow
                let offset = block * u32::try_from(i).unwrap_or(0);
                Ipv4Cidr {
                    network: Ipv4Addr::from(base + offset),
                    prefix: u8::try_from(new_prefix).unwrap_or(MAX_PREFIX),
                }
            })
            .collect())
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CidrError::Malformed(s.to_string());
        let (addr, prefix) = s.trim().split_once('/').ok_or_else(malformed)?;
        let addr: Ipv4Addr = addr.parse().map_err(|_| malformed())?;
        let prefix: u8 = prefix.parse().map_err(|_| malformed())?;
        if !(MIN_PREFIX..=MAX_PREFIX).contains(&prefix) {
            return Err(CidrError::PrefixOutOfRange {
                cidr: s.to_string(),
                prefix,
            });
        }
        let mask = u32::MAX << (32 - u32::from(prefix));
        let network = Ipv4Addr::from(u32::from(addr) & mask);
        if network != addr {
            return Err(CidrError::HostBitsSet {
                cidr: s.to_string(),
                network: format!("{network}/{prefix}"),
            });
        }
        Ok(Self { network, prefix })
    }
}
