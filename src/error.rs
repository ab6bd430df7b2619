/// Error types for the rirdb library
use crate::address::{Address, Family};
use crate::registry::Registry;
use std::fmt;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Main error type for address parsing, range arithmetic and index building
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Textual address could not be parsed
    MalformedAddress {
        /// Address family the text was parsed as
        family: Family,
        /// The rejected input
        text: String,
        /// What was wrong with it
        reason: &'static str,
    },

    /// Prefix length outside `[0, width]`
    InvalidPrefix {
        /// Address family
        family: Family,
        /// The rejected prefix length
        prefix_len: u32,
    },

    /// Range precondition violated (start after end, empty count)
    InvalidRange {
        /// Address family
        family: Family,
        /// Range start
        start: Address,
        /// Range end (inclusive)
        end: Address,
    },

    /// A computed bound does not fit the address family
    RangeOverflow {
        /// Address family
        family: Family,
        /// Start address of the offending range
        start: Address,
        /// Description of the bound that overflowed
        detail: String,
    },

    /// Two source records share a start address but disagree on extent
    ConflictingDuplicateRange {
        /// Registry being built
        registry: Registry,
        /// Address family
        family: Family,
        /// Shared start address
        start: Address,
        /// End of the record seen first
        existing_end: Address,
        /// End of the conflicting record
        incoming_end: Address,
    },

    /// Ranges from different partitions of one index overlap
    OverlappingRanges {
        /// Registry being built
        registry: Registry,
        /// Address family
        family: Family,
        /// Start of the lower range
        first_start: Address,
        /// End of the lower range
        first_end: Address,
        /// Start of the range that intrudes into it
        second_start: Address,
    },

    /// Dense code has no entry in its enumeration
    UnknownCode {
        /// Enumeration name (registry, status, country)
        kind: &'static str,
        /// The unknown code
        code: u8,
    },

    /// Name has no entry in its enumeration
    UnknownName {
        /// Enumeration name (registry, status, country)
        kind: &'static str,
        /// The unknown name
        name: String,
    },

    /// Operation requires a different address family than the index holds
    FamilyMismatch {
        /// Family the operation needs
        expected: Family,
        /// Family of the index
        found: Family,
    },

    /// Delegated file syntax errors
    Parse {
        /// 1-based line number
        line: usize,
        /// Description
        msg: String,
    },

    /// I/O errors
    Io(String),
}

fn extent(start: Address, end: Address) -> String {
    match end.checked_sub(start) {
        Some(span) => match span.checked_add(1) {
            Some(count) => count.to_string(),
            None => "2^128".to_string(),
        },
        None => "negative".to_string(),
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::MalformedAddress {
                family,
                text,
                reason,
            } => write!(f, "Malformed {} address {:?}: {}", family, text, reason),
            IndexError::InvalidPrefix { family, prefix_len } => write!(
                f,
                "Invalid {} prefix length {} (maximum {})",
                family,
                prefix_len,
                family.width()
            ),
            IndexError::InvalidRange { family, start, end } => write!(
                f,
                "Invalid {} range {} - {}",
                family,
                family.display(*start),
                family.display(*end)
            ),
            IndexError::RangeOverflow {
                family,
                start,
                detail,
            } => write!(
                f,
                "{} range starting at {} overflows the address space: {}",
                family,
                family.display(*start),
                detail
            ),
            IndexError::ConflictingDuplicateRange {
                registry,
                family,
                start,
                existing_end,
                incoming_end,
            } => write!(
                f,
                "Conflicting duplicate {} range in {} at {}: extent {} vs {}",
                family,
                registry,
                family.display(*start),
                extent(*start, *existing_end),
                extent(*start, *incoming_end)
            ),
            IndexError::OverlappingRanges {
                registry,
                family,
                first_start,
                first_end,
                second_start,
            } => write!(
                f,
                "Overlapping {} ranges in {}: {} - {} overlaps range starting at {}",
                family,
                registry,
                family.display(*first_start),
                family.display(*first_end),
                family.display(*second_start)
            ),
            IndexError::UnknownCode { kind, code } => write!(f, "Unknown {} code {}", kind, code),
            IndexError::UnknownName { kind, name } => write!(f, "Unknown {} {:?}", kind, name),
            IndexError::FamilyMismatch { expected, found } => {
                write!(f, "Expected an {} index, found {}", expected, found)
            }
            IndexError::Parse { line, msg } => write!(f, "Parse error at line {}: {}", line, msg),
            IndexError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for IndexError {}

impl From<std::io::Error> for IndexError {
    fn from(err: std::io::Error) -> Self {
        IndexError::Io(err.to_string())
    }
}
