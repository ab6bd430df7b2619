//! Allocation records and their normalization into ranges

use crate::address::{Address, Family};
use crate::arithmetic::{range_from_count, range_from_prefix};
use crate::error::Result;
use crate::registry::{CountryCode, Registry, Status};

/// Size of an allocation as given by the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Number of addresses (IPv4 delegations)
    Count(u128),
    /// Prefix length (IPv6 delegations)
    Prefix(u8),
}

/// One delegation line from a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRecord {
    /// Registry that published the record
    pub registry: Registry,
    /// Country the range is delegated to
    pub country: CountryCode,
    /// Address family
    pub family: Family,
    /// First address of the range
    pub start: Address,
    /// Address count or prefix length
    pub extent: Extent,
    /// Allocation status
    pub status: Status,
}

/// A normalized range with an inclusive end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// First address
    pub start: Address,
    /// Last address (inclusive)
    pub end: Address,
    /// Country attribution
    pub country: CountryCode,
    /// Status attribution
    pub status: Status,
}

impl Range {
    /// Number of addresses covered, saturating at `u128::MAX` for the full IPv6 space
    pub fn size(&self) -> u128 {
        (self.end - self.start).saturating_add(1)
    }

    /// True if `addr` lies inside the range
    pub fn contains(&self, addr: Address) -> bool {
        self.start <= addr && addr <= self.end
    }
}

/// Key that splits one registry's records into independent partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grouping {
    /// Records delegated to one country
    Country(CountryCode),
    /// IANA records handed to one registry, keyed by their status
    Status(Status),
}

/// The partition a normalization call is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Registry that must have published the record
    pub registry: Registry,
    /// Required address family
    pub family: Family,
    /// Required grouping key
    pub group: Grouping,
}

impl Selection {
    /// True if the record belongs to this selection
    pub fn matches(&self, record: &AllocationRecord) -> bool {
        record.registry == self.registry
            && record.family == self.family
            && grouping_for(record) == Some(self.group)
    }
}

/// Partition key of a record
///
/// IANA publishes which regional registry each block went to in the status
/// field, so its records are grouped by that status. Blocks IANA keeps for
/// itself, or lists with a plain state, have no regional owner and are not
/// indexed. Every other registry is grouped by country.
pub fn grouping_for(record: &AllocationRecord) -> Option<Grouping> {
    match record.registry {
        Registry::Iana => match record.status.delegated_registry() {
            Some(Registry::Iana) | None => None,
            Some(_) => Some(Grouping::Status(record.status)),
        },
        _ => Some(Grouping::Country(record.country)),
    }
}

/// Convert a record into its canonical inclusive range
///
/// Returns `Ok(None)` when the record lies outside `selection`.
pub fn normalize(record: &AllocationRecord, selection: &Selection) -> Result<Option<Range>> {
    if !selection.matches(record) {
        return Ok(None);
    }
    to_range(record).map(Some)
}

/// Convert a record into its range without any selection filter
pub fn to_range(record: &AllocationRecord) -> Result<Range> {
    let (start, end) = match record.extent {
        Extent::Count(count) => range_from_count(record.start, count, record.family)?,
        Extent::Prefix(prefix_len) => range_from_prefix(record.start, prefix_len, record.family)?,
    };
    Ok(Range {
        start,
        end,
        country: record.country,
        status: record.status,
    })
}
