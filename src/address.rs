//! Address codec
//!
//! Converts between textual IPv4/IPv6 addresses and their integer values.
//! Both families share one integer type ([`Address`], a `u128`) tagged by
//! [`Family`]; the family decides the width and every conversion checks the
//! value against it rather than truncating.
//!
//! IPv6 output is the fully expanded form: eight zero-padded, lower-case,
//! four-digit groups. [`to_ip_addr`] gives the compressed `std::net` form for
//! display.
//!
//! # Example
//!
//! ```rust
//! use rirdb::address::{format_ipv6, parse_ipv4, parse_ipv6};
//!
//! assert_eq!(parse_ipv4("61.5.208.0")?, 0x3D05_D000);
//! let addr = parse_ipv6("2001:268:2000::")?;
//! assert_eq!(format_ipv6(addr)?, "2001:0268:2000:0000:0000:0000:0000:0000");
//! # Ok::<(), rirdb::IndexError>(())
//! ```

use crate::error::{IndexError, Result};
use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Integer value of an address; IPv4 values occupy the low 32 bits
pub type Address = u128;

/// Address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// 32-bit addresses
    Ipv4,
    /// 128-bit addresses
    Ipv6,
}

impl Family {
    /// Both families in index order
    pub const ALL: [Family; 2] = [Family::Ipv4, Family::Ipv6];

    /// Address width in bits
    pub fn width(self) -> u32 {
        match self {
            Family::Ipv4 => 32,
            Family::Ipv6 => 128,
        }
    }

    /// Largest address of the family
    pub fn max_address(self) -> Address {
        match self {
            Family::Ipv4 => u32::MAX as Address,
            Family::Ipv6 => u128::MAX,
        }
    }

    /// Resource type name used in delegated files
    pub fn name(self) -> &'static str {
        match self {
            Family::Ipv4 => "ipv4",
            Family::Ipv6 => "ipv6",
        }
    }

    /// Guess the family of a textual address (dotted quad vs colons)
    pub fn detect(text: &str) -> Option<Family> {
        if text.contains(':') {
            Some(Family::Ipv6)
        } else if text.contains('.') {
            Some(Family::Ipv4)
        } else {
            None
        }
    }

    /// Check that `addr` fits the family
    pub fn check(self, addr: Address) -> Result<Address> {
        if addr > self.max_address() {
            return Err(IndexError::RangeOverflow {
                family: self,
                start: addr,
                detail: format!("value {} exceeds {}-bit width", addr, self.width()),
            });
        }
        Ok(addr)
    }

    /// Render an address for messages; never fails
    ///
    /// Values that do not fit the family are printed as plain integers.
    pub fn display(self, addr: Address) -> String {
        format(self, addr).unwrap_or_else(|_| addr.to_string())
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Ipv4 => f.write_str("IPv4"),
            Family::Ipv6 => f.write_str("IPv6"),
        }
    }
}

impl std::str::FromStr for Family {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ipv4" => Ok(Family::Ipv4),
            "ipv6" => Ok(Family::Ipv6),
            _ => Err(IndexError::UnknownName {
                kind: "family",
                name: s.to_string(),
            }),
        }
    }
}

fn malformed(family: Family, text: &str, reason: &'static str) -> IndexError {
    IndexError::MalformedAddress {
        family,
        text: text.to_string(),
        reason,
    }
}

/// Parse a dotted-quad IPv4 address
pub fn parse_ipv4(text: &str) -> Result<Address> {
    let mut value: u32 = 0;
    let mut octets = 0;

    for part in text.split('.') {
        octets += 1;
        if octets > 4 {
            return Err(malformed(Family::Ipv4, text, "more than 4 octets"));
        }
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed(Family::Ipv4, text, "octet is not a decimal number"));
        }
        let octet: u32 = part
            .parse()
            .map_err(|_| malformed(Family::Ipv4, text, "octet is not a decimal number"))?;
        if octet > 255 {
            return Err(malformed(Family::Ipv4, text, "octet exceeds 255"));
        }
        value = (value << 8) | octet;
    }

    if octets != 4 {
        return Err(malformed(Family::Ipv4, text, "expected 4 octets"));
    }
    Ok(value as Address)
}

fn parse_hextets(family_text: &str, group: &str, out: &mut Vec<u16>) -> Result<()> {
    if group.is_empty() {
        return Ok(());
    }
    for hextet in group.split(':') {
        if hextet.is_empty() {
            return Err(malformed(Family::Ipv6, family_text, "empty hextet"));
        }
        if !hextet.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(malformed(Family::Ipv6, family_text, "hextet is not hexadecimal"));
        }
        if hextet.len() > 4 {
            return Err(malformed(Family::Ipv6, family_text, "hextet longer than 4 digits"));
        }
        let value = u16::from_str_radix(hextet, 16)
            .map_err(|_| malformed(Family::Ipv6, family_text, "hextet exceeds 0xffff"))?;
        out.push(value);
    }
    Ok(())
}

/// Parse a colon-separated IPv6 address with at most one `::`
///
/// Dotted (IPv4-mapped) tails are rejected.
pub fn parse_ipv6(text: &str) -> Result<Address> {
    if text.contains('.') {
        return Err(malformed(Family::Ipv6, text, "dotted notation is not supported"));
    }

    let hextets = match text.find("::") {
        Some(pos) => {
            let head = &text[..pos];
            let tail = &text[pos + 2..];
            if tail.contains("::") {
                return Err(malformed(Family::Ipv6, text, "more than one '::'"));
            }

            let mut head_groups = Vec::with_capacity(8);
            parse_hextets(text, head, &mut head_groups)?;
            let mut tail_groups = Vec::with_capacity(8);
            parse_hextets(text, tail, &mut tail_groups)?;

            // "::" stands for at least one zero hextet
            let explicit = head_groups.len() + tail_groups.len();
            if explicit > 7 {
                return Err(malformed(Family::Ipv6, text, "expected 8 hextets"));
            }
            head_groups.resize(8 - tail_groups.len(), 0);
            head_groups.extend(tail_groups);
            head_groups
        }
        None => {
            let mut groups = Vec::with_capacity(8);
            parse_hextets(text, text, &mut groups)?;
            if text.is_empty() {
                return Err(malformed(Family::Ipv6, text, "empty address"));
            }
            groups
        }
    };

    if hextets.len() != 8 {
        return Err(malformed(Family::Ipv6, text, "expected 8 hextets"));
    }

    Ok(hextets
        .iter()
        .fold(0u128, |acc, &hextet| (acc << 16) | hextet as u128))
}

/// Format an IPv4 address as a dotted quad
pub fn format_ipv4(addr: Address) -> Result<String> {
    let value = Family::Ipv4.check(addr)? as u32;
    let [a, b, c, d] = value.to_be_bytes();
    Ok(format!("{}.{}.{}.{}", a, b, c, d))
}

/// Format an IPv6 address as eight zero-padded hextets
pub fn format_ipv6(addr: Address) -> Result<String> {
    let groups: Vec<String> = (0..8)
        .rev()
        .map(|i| format!("{:04x}", (addr >> (i * 16)) & 0xFFFF))
        .collect();
    Ok(groups.join(":"))
}

/// Parse an address of the given family
pub fn parse(family: Family, text: &str) -> Result<Address> {
    match family {
        Family::Ipv4 => parse_ipv4(text),
        Family::Ipv6 => parse_ipv6(text),
    }
}

/// Format an address of the given family
pub fn format(family: Family, addr: Address) -> Result<String> {
    match family {
        Family::Ipv4 => format_ipv4(addr),
        Family::Ipv6 => format_ipv6(addr),
    }
}

/// Parse text of either family, detecting the family from its separators
pub fn parse_any(text: &str) -> Result<(Family, Address)> {
    let family = Family::detect(text).ok_or_else(|| IndexError::MalformedAddress {
        family: Family::Ipv4,
        text: text.to_string(),
        reason: "neither dotted nor colon-separated",
    })?;
    Ok((family, parse(family, text)?))
}

/// Convert to a `std::net` address (compressed IPv6 display)
pub fn to_ip_addr(family: Family, addr: Address) -> Result<IpAddr> {
    match family {
        Family::Ipv4 => Ok(IpAddr::V4(Ipv4Addr::from(Family::Ipv4.check(addr)? as u32))),
        Family::Ipv6 => Ok(IpAddr::V6(Ipv6Addr::from(addr))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("0.0.0.0").unwrap(), 0);
        assert_eq!(parse_ipv4("255.255.255.255").unwrap(), u32::MAX as u128);
        assert_eq!(parse_ipv4("192.168.1.1").unwrap(), 0xC0A80101);
        assert_eq!(parse_ipv4("61.5.208.0").unwrap(), 0x3D05D000);
    }

    #[test]
    fn test_parse_ipv4_rejects_malformed() {
        for text in [
            "", "1.2.3", "1.2.3.4.5", "256.0.0.0", "1..2.3", "a.b.c.d", "+1.2.3.4", "1.2.3.-4",
            " 1.2.3.4", "1.2.3.1000",
        ] {
            let err = parse_ipv4(text).unwrap_err();
            assert!(
                matches!(err, IndexError::MalformedAddress { .. }),
                "{:?} gave {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_format_ipv4() {
        assert_eq!(format_ipv4(0x3D05D7FF).unwrap(), "61.5.215.255");
        assert_eq!(format_ipv4(0).unwrap(), "0.0.0.0");
    }

    #[test]
    fn test_format_ipv4_rejects_wide_value() {
        let err = format_ipv4(1u128 << 32).unwrap_err();
        assert!(matches!(err, IndexError::RangeOverflow { .. }));
    }

    #[test]
    fn test_parse_ipv6_compressed_forms() {
        assert_eq!(parse_ipv6("::").unwrap(), 0);
        assert_eq!(parse_ipv6("::1").unwrap(), 1);
        assert_eq!(
            parse_ipv6("2001:268:2000::").unwrap(),
            0x2001_0268_2000_0000_0000_0000_0000_0000
        );
        assert_eq!(
            parse_ipv6("2001:268:2000::2:3").unwrap(),
            0x2001_0268_2000_0000_0000_0000_0002_0003
        );
        assert_eq!(
            parse_ipv6("::2001:268:2000").unwrap(),
            0x0000_0000_0000_0000_0000_2001_0268_2000
        );
        assert_eq!(
            parse_ipv6("1:2:3:4:5:6:7::").unwrap(),
            0x0001_0002_0003_0004_0005_0006_0007_0000
        );
        assert_eq!(parse_ipv6("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff").unwrap(), u128::MAX);
    }

    #[test]
    fn test_parse_ipv6_matches_std() {
        for text in ["2a0d:d080::", "fe80::1:2", "2001:db8:0:0:1::1", "0:0:0:0:0:0:0:0"] {
            let expected = u128::from(text.parse::<Ipv6Addr>().unwrap());
            assert_eq!(parse_ipv6(text).unwrap(), expected, "{}", text);
        }
    }

    #[test]
    fn test_parse_ipv6_rejects_malformed() {
        for text in [
            "",
            "1::2::3",
            "1:2:3:4:5:6:7",
            "1:2:3:4:5:6:7:8:9",
            "1:2:3:4:5:6:7:8::",
            "::ffff:1.2.3.4",
            "12345::",
            "g::",
            ":1:2:3:4:5:6:7",
            "1:2:3:4:5:6:7:",
            "+1::",
        ] {
            let err = parse_ipv6(text).unwrap_err();
            assert!(
                matches!(err, IndexError::MalformedAddress { .. }),
                "{:?} gave {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_parse_ipv6_hextet_width() {
        assert_eq!(parse_ipv6("0001:02::").unwrap(), (1u128 << 112) | (2u128 << 96));
        for text in ["00002001::", "::00000", "1:2:3:4:5:6:7:00008"] {
            assert!(
                matches!(
                    parse_ipv6(text).unwrap_err(),
                    IndexError::MalformedAddress { .. }
                ),
                "{:?} should be rejected",
                text
            );
            assert!(text.parse::<std::net::Ipv6Addr>().is_err());
        }
    }

    #[test]
    fn test_format_ipv6_expanded() {
        let addr = parse_ipv6("2001:268:3fff:ffff:ffff:ffff:ffff:ffff").unwrap();
        assert_eq!(
            format_ipv6(addr).unwrap(),
            "2001:0268:3fff:ffff:ffff:ffff:ffff:ffff"
        );
        assert_eq!(
            format_ipv6(1).unwrap(),
            "0000:0000:0000:0000:0000:0000:0000:0001"
        );
    }

    #[test]
    fn test_parse_any_detects_family() {
        assert_eq!(parse_any("10.0.0.1").unwrap(), (Family::Ipv4, 0x0A000001));
        assert_eq!(parse_any("::2").unwrap(), (Family::Ipv6, 2));
        assert!(parse_any("localhost").is_err());
    }

    #[test]
    fn test_to_ip_addr() {
        assert_eq!(
            to_ip_addr(Family::Ipv6, parse_ipv6("2001:268:2000::").unwrap())
                .unwrap()
                .to_string(),
            "2001:268:2000::"
        );
        assert_eq!(
            to_ip_addr(Family::Ipv4, 0x0A000001).unwrap().to_string(),
            "10.0.0.1"
        );
    }

    #[test]
    fn test_family_display_falls_back_to_integer() {
        assert_eq!(Family::Ipv4.display(1u128 << 40), (1u128 << 40).to_string());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ipv4_text_round_trips(value in any::<u32>()) {
                let text = format_ipv4(value as u128).unwrap();
                prop_assert_eq!(parse_ipv4(&text).unwrap(), value as u128);
                prop_assert_eq!(text, Ipv4Addr::from(value).to_string());
            }

            #[test]
            fn ipv6_text_round_trips(value in any::<u128>()) {
                let text = format_ipv6(value).unwrap();
                prop_assert_eq!(text.len(), 39);
                prop_assert_eq!(parse_ipv6(&text).unwrap(), value);
            }

            #[test]
            fn ipv6_parse_agrees_with_std(groups in prop::array::uniform8(any::<u16>())) {
                let addr = Ipv6Addr::from(groups);
                let text = addr.to_string();
                // std prints IPv4-compatible forms with dots, which are rejected here
                prop_assume!(!text.contains('.'));
                prop_assert_eq!(parse_ipv6(&text).unwrap(), u128::from(addr));
            }
        }
    }
}
