//! rirdb - Registry Allocation Range Index Builder
//!
//! rirdb turns the allocation records published by the regional internet
//! registries into compact, sorted, non-overlapping range indexes: one per
//! (registry, address family), each entry carrying a dense country code and
//! a dense status code. Lookups are a binary search.
//!
//! # Quick Start
//!
//! ```rust
//! use rirdb::{delegated, CountryTable, Family, IndexBuilder, Registry};
//!
//! let file = delegated::parse_str("\
//! 2|apnic|20240101|2|19830613|20231231|+1000
//! apnic|CN|ipv4|61.5.208.0|1024|20040709|allocated
//! apnic|CN|ipv4|61.5.212.0|1024|20040709|allocated
//! ")?;
//!
//! let countries = CountryTable::default();
//! let index = IndexBuilder::new(&countries).build(Registry::Apnic, Family::Ipv4, &file.records)?;
//!
//! // Adjacent allocations of the same country collapse into one entry
//! assert_eq!(index.len(), 1);
//! assert!(index.lookup_text("61.5.215.255")?.is_some());
//! assert!(index.lookup_text("61.5.216.0")?.is_none());
//! # Ok::<(), rirdb::IndexError>(())
//! ```
//!
//! # Pipeline
//!
//! ```text
//! delegated files ──► AllocationRecord ──► Range (inclusive end)
//!                                             │ partition by country
//!                                             │ (IANA: by status)
//!                                             ▼
//!                                     coalesce per partition (rayon)
//!                                             │
//!                                             ▼
//!                     RangeIndex: sorted, disjoint, dense codes
//! ```
//!
//! Addresses are `u128` values tagged with their [`Family`]. IPv4 values
//! never exceed 32 bits; anything that would is rejected instead of being
//! truncated.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Address text codec
pub mod address;
/// Prefix and CIDR arithmetic
pub mod arithmetic;
pub mod coalesce;
pub mod delegated;
/// Error types for index operations
pub mod error;
pub mod export;
pub mod file_reader;
pub mod index;
pub mod record;
pub mod registry;

// Re-exports for Rust consumers

pub use crate::address::{Address, Family};
pub use crate::arithmetic::{cidr, cidr_blocks, classful, is_exact_cidr, Cidr, Classful};
pub use crate::coalesce::{coalesce, CoalescedSet};
pub use crate::error::{IndexError, Result};
pub use crate::index::{BuildStats, IndexBuilder, IndexEntry, IndexSet, RangeIndex};
pub use crate::record::{AllocationRecord, Extent, Range};
pub use crate::registry::{CountryCode, CountryTable, Registry, Status};

// Version information
/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
