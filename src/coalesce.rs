//! Range coalescing
//!
//! Turns the unordered ranges of one partition into a [`CoalescedSet`]:
//! sorted by start, disjoint, and with no two entries touching.
//!
//! The input is sorted once (stable, so the first record seen for a start
//! address wins ties) and then consumed by a single forward sweep. Each step
//! compares the next range against the range currently being accumulated,
//! not against its unmerged predecessor, so one pass reaches the fixed point:
//!
//! ```text
//! sorted:   [a──────a][b────b][c──c]   [d────d]
//! sweep:    [acc──────────────────c]   [d────d]
//!            └ b touches acc, c touches acc    └ gap: emit acc, restart
//! ```
//!
//! Total cost is O(n log n) for the sort plus O(n) for the sweep.

use crate::address::{Address, Family};
use crate::error::{IndexError, Result};
use crate::record::Range;
use crate::registry::Registry;

/// Counters collected while coalescing one partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalesceStats {
    /// Ranges received
    pub input: usize,
    /// Identical duplicates dropped
    pub duplicates: usize,
    /// Adjacent ranges fused into their predecessor
    pub merges: usize,
    /// Overlapping ranges absorbed into their predecessor
    pub overlaps: usize,
    /// Ranges emitted
    pub output: usize,
}

impl CoalesceStats {
    /// Add another partition's counters
    pub fn accumulate(&mut self, other: &CoalesceStats) {
        self.input += other.input;
        self.duplicates += other.duplicates;
        self.merges += other.merges;
        self.overlaps += other.overlaps;
        self.output += other.output;
    }
}

/// Sorted, disjoint, maximally merged ranges of one partition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoalescedSet {
    ranges: Vec<Range>,
}

impl CoalescedSet {
    /// The ranges in ascending order
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// Take ownership of the ranges
    pub fn into_ranges(self) -> Vec<Range> {
        self.ranges
    }

    /// Number of ranges
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True if the set holds no ranges
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterate over the ranges in ascending order
    pub fn iter(&self) -> std::slice::Iter<'_, Range> {
        self.ranges.iter()
    }

    /// Total number of addresses covered
    pub fn address_count(&self) -> u128 {
        self.ranges
            .iter()
            .fold(0u128, |acc, r| acc.saturating_add(r.size()))
    }
}

impl<'a> IntoIterator for &'a CoalescedSet {
    type Item = &'a Range;
    type IntoIter = std::slice::Iter<'a, Range>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

/// Coalesce the ranges of one (registry, family) partition
///
/// `registry` and `family` only serve to locate the source data in errors.
pub fn coalesce(registry: Registry, family: Family, ranges: Vec<Range>) -> Result<CoalescedSet> {
    coalesce_with_stats(registry, family, ranges).map(|(set, _)| set)
}

/// Coalesce and report what the sweep did
pub fn coalesce_with_stats(
    registry: Registry,
    family: Family,
    mut ranges: Vec<Range>,
) -> Result<(CoalescedSet, CoalesceStats)> {
    let mut stats = CoalesceStats {
        input: ranges.len(),
        ..Default::default()
    };

    // Stable: among equal starts the record seen first stays first
    ranges.sort_by_key(|r| r.start);

    let mut iter = ranges.into_iter();
    let mut current = match iter.next() {
        Some(first) => first,
        None => return Ok((CoalescedSet::default(), stats)),
    };
    // Last raw range seen; equal starts are compared against it, not against
    // the accumulated range, which may already have grown past it
    let mut previous = (current.start, current.end);
    let mut merged = Vec::new();

    for next in iter {
        if next.start == previous.0 {
            if next.end != previous.1 {
                return Err(conflict(registry, family, next.start, previous.1, next.end));
            }
            stats.duplicates += 1;
            continue;
        }
        previous = (next.start, next.end);

        if next.start <= current.end {
            log::warn!(
                "{} {}: range {} - {} overlaps {} - {}, absorbing",
                registry,
                family,
                family.display(next.start),
                family.display(next.end),
                family.display(current.start),
                family.display(current.end)
            );
            current.end = current.end.max(next.end);
            stats.overlaps += 1;
        } else if current.end + 1 == next.start {
            current.end = next.end;
            stats.merges += 1;
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);

    stats.output = merged.len();
    log::debug!(
        "{} {}: coalesced {} ranges into {} ({} merged, {} duplicate, {} overlapping)",
        registry,
        family,
        stats.input,
        stats.output,
        stats.merges,
        stats.duplicates,
        stats.overlaps
    );

    Ok((CoalescedSet { ranges: merged }, stats))
}

fn conflict(
    registry: Registry,
    family: Family,
    start: Address,
    existing_end: Address,
    incoming_end: Address,
) -> IndexError {
    IndexError::ConflictingDuplicateRange {
        registry,
        family,
        start,
        existing_end,
        incoming_end,
    }
}
