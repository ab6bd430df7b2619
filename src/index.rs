//! Range index construction and lookup
//!
//! [`IndexBuilder`] turns allocation records into one immutable [`RangeIndex`]
//! per (registry, family):
//!
//! 1. records are normalized and split into partitions (country, or status
//!    for IANA),
//! 2. every partition is coalesced on its own, in parallel when enabled,
//! 3. the partitions are concatenated, sorted, checked for overlap and for
//!    the family's address bound,
//! 4. country and status are replaced by their dense codes.
//!
//! Lookups binary-search the entry with the greatest `start <= addr` and hit
//! when `addr <= end`.
//!
//! # Example
//!
//! ```rust
//! use rirdb::address::{parse_ipv4, Family};
//! use rirdb::index::IndexBuilder;
//! use rirdb::record::{AllocationRecord, Extent};
//! use rirdb::registry::{CountryTable, Registry, Status};
//!
//! let countries = CountryTable::default();
//! let records = vec![AllocationRecord {
//!     registry: Registry::Apnic,
//!     country: "JP".parse()?,
//!     family: Family::Ipv4,
//!     start: parse_ipv4("1.0.16.0")?,
//!     extent: Extent::Count(4096),
//!     status: Status::Allocated,
//! }];
//!
//! let index = IndexBuilder::new(&countries).build(Registry::Apnic, Family::Ipv4, &records)?;
//! let entry = index.lookup_text("1.0.20.1")?.expect("inside the allocation");
//! assert_eq!(countries.country_of(entry.country_code)?.to_string(), "JP");
//! assert_eq!(entry.status_code, Status::Allocated.code());
//! # Ok::<(), rirdb::IndexError>(())
//! ```

use crate::address::{self, Address, Family};
use crate::coalesce::{coalesce_with_stats, CoalesceStats};
use crate::error::{IndexError, Result};
use crate::record::{grouping_for, to_range, AllocationRecord, Grouping, Range};
use crate::registry::{CountryTable, Registry};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// One row of a range index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// First address
    pub start: Address,
    /// Last address (inclusive)
    pub end: Address,
    /// Dense code from the [`CountryTable`]
    pub country_code: u8,
    /// Dense code of the [`Status`](crate::registry::Status)
    pub status_code: u8,
}

impl IndexEntry {
    /// True if `addr` lies inside the entry
    pub fn contains(&self, addr: Address) -> bool {
        self.start <= addr && addr <= self.end
    }
}

/// Immutable, ascending, non-overlapping ranges of one (registry, family)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeIndex {
    registry: Registry,
    family: Family,
    entries: Vec<IndexEntry>,
}

impl RangeIndex {
    /// Registry the index was built for
    pub fn registry(&self) -> Registry {
        self.registry
    }

    /// Address family of the index
    pub fn family(&self) -> Family {
        self.family
    }

    /// Entries in ascending order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the index has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry containing `addr`, if any
    pub fn lookup(&self, addr: Address) -> Option<&IndexEntry> {
        let idx = self.entries.partition_point(|e| e.start <= addr);
        if idx == 0 {
            return None;
        }
        let entry = &self.entries[idx - 1];
        entry.contains(addr).then_some(entry)
    }

    /// Parse `text` in the index's family and look it up
    pub fn lookup_text(&self, text: &str) -> Result<Option<&IndexEntry>> {
        let addr = address::parse(self.family, text)?;
        Ok(self.lookup(addr))
    }

    /// Total number of addresses covered
    pub fn address_count(&self) -> u128 {
        self.entries
            .iter()
            .fold(0u128, |acc, e| acc.saturating_add((e.end - e.start).saturating_add(1)))
    }

    /// Rows narrowed to 32-bit addresses
    ///
    /// Fails on an IPv6 index, or if any bound does not fit in 32 bits.
    pub fn ipv4_rows(&self) -> Result<Vec<(u32, u32, u8, u8)>> {
        if self.family != Family::Ipv4 {
            return Err(IndexError::FamilyMismatch {
                expected: Family::Ipv4,
                found: self.family,
            });
        }
        self.entries
            .iter()
            .map(|e| {
                let narrow = |value: Address| {
                    u32::try_from(value).map_err(|_| IndexError::RangeOverflow {
                        family: Family::Ipv4,
                        start: e.start,
                        detail: format!("bound {} does not fit in 32 bits", value),
                    })
                };
                Ok((narrow(e.start)?, narrow(e.end)?, e.country_code, e.status_code))
            })
            .collect()
    }

    /// Rows as 128-bit addresses (valid for both families)
    pub fn ipv6_rows(&self) -> Vec<(u128, u128, u8, u8)> {
        self.entries
            .iter()
            .map(|e| (e.start, e.end, e.country_code, e.status_code))
            .collect()
    }
}

/// A hit from [`IndexSet::lookup`]
#[derive(Debug, Clone, Copy)]
pub struct IndexMatch<'a> {
    /// Index that contained the address
    pub index: &'a RangeIndex,
    /// Matching entry
    pub entry: &'a IndexEntry,
}

/// Every index produced by one build, ordered by (registry, family)
#[derive(Debug, Clone, Default)]
pub struct IndexSet {
    indexes: Vec<RangeIndex>,
}

impl IndexSet {
    /// Index for a registry and family
    pub fn get(&self, registry: Registry, family: Family) -> Option<&RangeIndex> {
        self.indexes
            .iter()
            .find(|i| i.registry == registry && i.family == family)
    }

    /// Iterate over all indexes
    pub fn iter(&self) -> std::slice::Iter<'_, RangeIndex> {
        self.indexes.iter()
    }

    /// Number of indexes
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// True if the set holds no indexes
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Look an address up in every index of its family
    pub fn lookup(&self, text: &str) -> Result<Vec<IndexMatch<'_>>> {
        let (family, addr) = address::parse_any(text)?;
        Ok(self
            .indexes
            .iter()
            .filter(|index| index.family == family)
            .filter_map(|index| index.lookup(addr).map(|entry| IndexMatch { index, entry }))
            .collect())
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = &'a RangeIndex;
    type IntoIter = std::slice::Iter<'a, RangeIndex>;

    fn into_iter(self) -> Self::IntoIter {
        self.indexes.iter()
    }
}

/// Counters for one or more index builds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Records belonging to the registry and family being built
    pub records: usize,
    /// Records assigned to a partition
    pub indexed: usize,
    /// Records without a partition (IANA plain states)
    pub skipped: usize,
    /// Partitions coalesced
    pub partitions: usize,
    /// Combined coalescing counters
    pub coalesce: CoalesceStats,
    /// Entries in the finished index
    pub entries: usize,
}

impl BuildStats {
    fn accumulate(&mut self, other: &BuildStats) {
        self.records += other.records;
        self.indexed += other.indexed;
        self.skipped += other.skipped;
        self.partitions += other.partitions;
        self.coalesce.accumulate(&other.coalesce);
        self.entries += other.entries;
    }
}

/// Builds range indexes against a fixed country enumeration
pub struct IndexBuilder<'a> {
    countries: &'a CountryTable,
    parallel: bool,
}

impl<'a> IndexBuilder<'a> {
    /// Create a builder; partitions are coalesced in parallel by default
    pub fn new(countries: &'a CountryTable) -> Self {
        Self {
            countries,
            parallel: true,
        }
    }

    /// Enable or disable parallel coalescing across partitions
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Build the index of one registry and family
    pub fn build(
        &self,
        registry: Registry,
        family: Family,
        records: &[AllocationRecord],
    ) -> Result<RangeIndex> {
        self.build_with_stats(registry, family, records)
            .map(|(index, _)| index)
    }

    /// Build the index of one registry and family and report counters
    pub fn build_with_stats(
        &self,
        registry: Registry,
        family: Family,
        records: &[AllocationRecord],
    ) -> Result<(RangeIndex, BuildStats)> {
        let mut stats = BuildStats::default();
        let mut partitions: BTreeMap<Grouping, Vec<Range>> = BTreeMap::new();

        for record in records
            .iter()
            .filter(|r| r.registry == registry && r.family == family)
        {
            stats.records += 1;
            match grouping_for(record) {
                Some(group) => {
                    partitions.entry(group).or_default().push(to_range(record)?);
                    stats.indexed += 1;
                }
                None => stats.skipped += 1,
            }
        }
        stats.partitions = partitions.len();

        // Errors surface in partition order whichever path runs
        let coalesced: Vec<_> = if self.parallel {
            partitions
                .into_par_iter()
                .map(|(_, ranges)| coalesce_with_stats(registry, family, ranges))
                .collect::<Vec<_>>()
                .into_iter()
                .collect::<Result<_>>()?
        } else {
            partitions
                .into_iter()
                .map(|(_, ranges)| coalesce_with_stats(registry, family, ranges))
                .collect::<Result<_>>()?
        };

        let mut ranges = Vec::new();
        for (set, partition_stats) in coalesced {
            stats.coalesce.accumulate(&partition_stats);
            ranges.extend(set.into_ranges());
        }
        ranges.sort_unstable_by_key(|r| r.start);

        for pair in ranges.windows(2) {
            if pair[1].start <= pair[0].end {
                return Err(IndexError::OverlappingRanges {
                    registry,
                    family,
                    first_start: pair[0].start,
                    first_end: pair[0].end,
                    second_start: pair[1].start,
                });
            }
        }

        let entries = ranges
            .iter()
            .map(|range| self.encode(family, range))
            .collect::<Result<Vec<_>>>()?;
        stats.entries = entries.len();

        log::debug!(
            "{} {}: {} records in {} partitions -> {} entries",
            registry,
            family,
            stats.records,
            stats.partitions,
            stats.entries
        );

        Ok((
            RangeIndex {
                registry,
                family,
                entries,
            },
            stats,
        ))
    }

    /// Build every registry × family index
    pub fn build_all(&self, records: &[AllocationRecord]) -> Result<IndexSet> {
        self.build_all_with_stats(records).map(|(set, _)| set)
    }

    /// Build every registry × family index and report combined counters
    pub fn build_all_with_stats(&self, records: &[AllocationRecord]) -> Result<(IndexSet, BuildStats)> {
        let mut total = BuildStats::default();
        let mut indexes = Vec::with_capacity(Registry::ALL.len() * Family::ALL.len());

        for registry in Registry::ALL {
            for family in Family::ALL {
                let (index, stats) = self.build_with_stats(registry, family, records)?;
                if stats.records > 0 {
                    log::info!(
                        "{} {}: {} entries from {} records",
                        registry,
                        family,
                        stats.entries,
                        stats.records
                    );
                }
                total.accumulate(&stats);
                indexes.push(index);
            }
        }

        log::info!(
            "Built {} indexes: {} entries from {} records ({} merged, {} duplicate, {} overlapping, {} skipped)",
            indexes.len(),
            total.entries,
            total.records,
            total.coalesce.merges,
            total.coalesce.duplicates,
            total.coalesce.overlaps,
            total.skipped
        );

        Ok((IndexSet { indexes }, total))
    }

    fn encode(&self, family: Family, range: &Range) -> Result<IndexEntry> {
        if range.end > family.max_address() {
            return Err(IndexError::RangeOverflow {
                family,
                start: range.start,
                detail: format!("end {} exceeds the last address", range.end),
            });
        }
        Ok(IndexEntry {
            start: range.start,
            end: range.end,
            country_code: self.countries.code_of(range.country)?,
            status_code: range.status.code(),
        })
    }
}
