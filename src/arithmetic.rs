//! Range arithmetic
//!
//! Builds inclusive `(start, end)` ranges from an address count or a prefix
//! length, derives prefix lengths back from ranges, and classifies IPv4
//! addresses into the historical classful networks.
//!
//! Every range in this crate uses an inclusive end: a `/24` starting at
//! `10.0.0.0` ends at `10.0.0.255`, and a count of 256 from the same start
//! produces the same range.

use crate::address::{to_ip_addr, Address, Family};
use crate::error::{IndexError, Result};
use serde::Serialize;
use std::fmt;

/// Largest offset inside a block with `host_bits` free bits
fn block_span(host_bits: u32) -> Address {
    if host_bits >= 128 {
        u128::MAX
    } else {
        (1u128 << host_bits) - 1
    }
}

/// Number of significant bits in `n` (0 for 0)
fn bit_length(n: Address) -> u32 {
    128 - n.leading_zeros()
}

/// Inclusive range of `count` addresses beginning at `start`
pub fn range_from_count(start: Address, count: Address, family: Family) -> Result<(Address, Address)> {
    family.check(start)?;
    if count == 0 {
        return Err(IndexError::InvalidRange {
            family,
            start,
            end: start.saturating_sub(1),
        });
    }

    let end = start
        .checked_add(count - 1)
        .filter(|&end| end <= family.max_address())
        .ok_or_else(|| IndexError::RangeOverflow {
            family,
            start,
            detail: format!("count {} runs past the last address", count),
        })?;
    Ok((start, end))
}

/// Inclusive range of the CIDR block `start/prefix_len`
///
/// `start` is not required to be aligned to the prefix; the block size alone
/// decides the end.
pub fn range_from_prefix(start: Address, prefix_len: u8, family: Family) -> Result<(Address, Address)> {
    let width = family.width();
    if prefix_len as u32 > width {
        return Err(IndexError::InvalidPrefix {
            family,
            prefix_len: prefix_len as u32,
        });
    }
    family.check(start)?;

    let span = block_span(width - prefix_len as u32);
    let end = start
        .checked_add(span)
        .filter(|&end| end <= family.max_address())
        .ok_or_else(|| IndexError::RangeOverflow {
            family,
            start,
            detail: format!("/{} block runs past the last address", prefix_len),
        })?;
    Ok((start, end))
}

/// A CIDR block: base address plus prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cidr {
    /// Address family
    pub family: Family,
    /// Base address
    pub address: Address,
    /// Prefix length (0-32 for IPv4, 0-128 for IPv6)
    pub prefix_len: u8,
}

impl Cidr {
    /// Inclusive range covered by the block
    pub fn range(&self) -> Result<(Address, Address)> {
        range_from_prefix(self.address, self.prefix_len, self.family)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match to_ip_addr(self.family, self.address) {
            Ok(ip) => write!(f, "{}/{}", ip, self.prefix_len),
            Err(_) => write!(f, "{}/{}", self.address, self.prefix_len),
        }
    }
}

/// Minimal enclosing prefix length for `[start, end]`
///
/// The result is `width - bit_length(end - start)`. It describes a block
/// beginning at `start` that is at least as large as the range; use
/// [`is_exact_cidr`] to find out whether the two coincide.
pub fn cidr(start: Address, end: Address, family: Family) -> Result<Cidr> {
    family.check(start)?;
    family.check(end)?;
    if start > end {
        return Err(IndexError::InvalidRange { family, start, end });
    }

    let prefix_len = family.width() - bit_length(end - start);
    Ok(Cidr {
        family,
        address: start,
        prefix_len: prefix_len as u8,
    })
}

/// True when `[start, end]` is exactly one CIDR block
pub fn is_exact_cidr(start: Address, end: Address, family: Family) -> Result<bool> {
    let block = cidr(start, end, family)?;
    Ok(match block.range() {
        Ok(range) => range == (start, end),
        Err(IndexError::RangeOverflow { .. }) => false,
        Err(e) => return Err(e),
    })
}

/// Smallest list of aligned CIDR blocks that exactly covers `[start, end]`
pub fn cidr_blocks(start: Address, end: Address, family: Family) -> Result<Vec<Cidr>> {
    family.check(start)?;
    family.check(end)?;
    if start > end {
        return Err(IndexError::InvalidRange { family, start, end });
    }

    let width = family.width();
    let mut blocks = Vec::new();
    let mut current = start;

    loop {
        let aligned_bits = current.trailing_zeros().min(width);
        let remaining = end - current;
        let fitting_bits = if remaining == u128::MAX {
            128
        } else {
            127 - (remaining + 1).leading_zeros()
        };
        let host_bits = aligned_bits.min(fitting_bits);

        blocks.push(Cidr {
            family,
            address: current,
            prefix_len: (width - host_bits) as u8,
        });

        let block_end = current + block_span(host_bits);
        if block_end >= end {
            break;
        }
        current = block_end + 1;
    }

    Ok(blocks)
}

/// Historical classful network class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classful {
    /// 0.0.0.0 - 127.255.255.255
    A,
    /// 128.0.0.0 - 191.255.255.255
    B,
    /// 192.0.0.0 - 223.255.255.255
    C,
    /// 224.0.0.0 - 239.255.255.255 (multicast)
    D,
    /// 240.0.0.0 - 255.255.255.255 (reserved)
    E,
    /// IPv6 has no classes
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Classful {
    /// Default network mask of the class
    ///
    /// Classes D and E define no mask. For IPv6 the conventional /64 network
    /// mask is returned.
    pub fn default_mask(self) -> Option<Address> {
        match self {
            Classful::A => Some(0xFF00_0000),
            Classful::B => Some(0xFFFF_0000),
            Classful::C => Some(0xFFFF_FF00),
            Classful::D | Classful::E => None,
            Classful::NotApplicable => Some(u128::MAX << 64),
        }
    }
}

impl fmt::Display for Classful {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classful::A => "A",
            Classful::B => "B",
            Classful::C => "C",
            Classful::D => "D",
            Classful::E => "E",
            Classful::NotApplicable => "N/A",
        };
        f.write_str(name)
    }
}

/// Classify an address by its leading bits
pub fn classful(family: Family, addr: Address) -> Result<Classful> {
    let value = match family {
        Family::Ipv6 => return Ok(Classful::NotApplicable),
        Family::Ipv4 => family.check(addr)? as u32,
    };

    Ok(if value >> 28 == 0b1111 {
        Classful::E
    } else if value >> 28 == 0b1110 {
        Classful::D
    } else if value >> 29 == 0b110 {
        Classful::C
    } else if value >> 30 == 0b10 {
        Classful::B
    } else {
        Classful::A
    })
}
