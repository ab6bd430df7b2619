//! Reader for RIR statistics exchange ("delegated") files
//!
//! Each registry publishes a pipe-separated file:
//!
//! ```text
//! # comment lines start with '#'
//! 2|apnic|20240101|3|19830613|20231231|+1000       version line
//! apnic|*|ipv4|*|2|summary                          one summary per type
//! apnic|JP|ipv4|1.0.16.0|4096|20110412|allocated    records
//! apnic|JP|ipv6|2001:268::|32|20040706|allocated
//! apnic|JP|asn|2554|1|20020801|allocated
//! ```
//!
//! IPv4 records give an address count, IPv6 records a prefix length. ASN
//! records are counted but not returned. An empty country becomes `ZZ`, and
//! extended files append an opaque-id column and more, which are ignored.

use crate::address::{self, Family};
use crate::error::{IndexError, Result};
use crate::file_reader;
use crate::record::{AllocationRecord, Extent};
use crate::registry::{CountryCode, Registry, Status};
use rayon::prelude::*;
use serde::Serialize;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

/// Resource type column of a delegated file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Autonomous system numbers
    Asn,
    /// IPv4 address blocks
    Ipv4,
    /// IPv6 address blocks
    Ipv6,
}

impl FromStr for ResourceKind {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asn" => Ok(ResourceKind::Asn),
            "ipv4" => Ok(ResourceKind::Ipv4),
            "ipv6" => Ok(ResourceKind::Ipv6),
            _ => Err(IndexError::UnknownName {
                kind: "resource type",
                name: s.to_string(),
            }),
        }
    }
}

/// The version line opening every delegated file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    /// Format version (2 or 2.3)
    pub version: String,
    /// Publishing registry
    pub registry: Registry,
    /// Serial number of the file
    pub serial: String,
    /// Number of records the file claims to hold
    pub records: u64,
    /// Earliest record date
    pub start_date: String,
    /// Latest record date
    pub end_date: String,
    /// UTC offset, always with an explicit sign
    pub utc_offset: String,
}

/// A `registry|*|type|*|count|summary` line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Publishing registry
    pub registry: Registry,
    /// Resource type being summarized
    pub kind: ResourceKind,
    /// Number of records of that type
    pub count: u64,
}

/// Parsed content of one delegated file
#[derive(Debug, Clone, PartialEq)]
pub struct DelegatedFile {
    /// Version line
    pub header: Header,
    /// Summary lines in file order
    pub summaries: Vec<Summary>,
    /// IPv4 and IPv6 records in file order
    pub records: Vec<AllocationRecord>,
    /// ASN records seen and dropped
    pub asn_records: u64,
}

impl DelegatedFile {
    /// Number of record lines of a resource type
    pub fn count_of(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Asn => self.asn_records,
            ResourceKind::Ipv4 => self.count_family(Family::Ipv4),
            ResourceKind::Ipv6 => self.count_family(Family::Ipv6),
        }
    }

    fn count_family(&self, family: Family) -> u64 {
        self.records.iter().filter(|r| r.family == family).count() as u64
    }

    fn check_summaries(&self) {
        for summary in &self.summaries {
            let parsed = self.count_of(summary.kind);
            if parsed != summary.count {
                log::warn!(
                    "{}: summary announces {} {:?} records, parsed {}",
                    self.header.registry,
                    summary.count,
                    summary.kind,
                    parsed
                );
            }
        }
        let total = self.records.len() as u64 + self.asn_records;
        if total != self.header.records {
            log::warn!(
                "{}: header announces {} records, parsed {}",
                self.header.registry,
                self.header.records,
                total
            );
        }
    }
}

/// Parse delegated content from any buffered reader
pub fn parse_reader<R: BufRead>(reader: R) -> Result<DelegatedFile> {
    let mut header = None;
    let mut summaries = Vec::new();
    let mut records = Vec::new();
    let mut asn_records = 0u64;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if header.is_none() {
            header = Some(parse_header(line).map_err(|e| at_line(line_no, e))?);
            continue;
        }

        if line.ends_with("|summary") {
            summaries.push(parse_summary(line).map_err(|e| at_line(line_no, e))?);
            continue;
        }

        match parse_record(line).map_err(|e| at_line(line_no, e))? {
            Some(record) => records.push(record),
            None => asn_records += 1,
        }
    }

    let header = header.ok_or_else(|| IndexError::Parse {
        line: 0,
        msg: "missing version line".to_string(),
    })?;

    let file = DelegatedFile {
        header,
        summaries,
        records,
        asn_records,
    };
    file.check_summaries();
    log::debug!(
        "{}: parsed {} address records, skipped {} ASN records",
        file.header.registry,
        file.records.len(),
        file.asn_records
    );
    Ok(file)
}

/// Parse delegated content held in a string
pub fn parse_str(content: &str) -> Result<DelegatedFile> {
    parse_reader(content.as_bytes())
}

/// Read a delegated file from disk (plain or `.gz`, "-" for stdin)
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<DelegatedFile> {
    let path = path.as_ref();
    let reader = file_reader::open(path)
        .map_err(|e| IndexError::Io(format!("{}: {}", path.display(), e)))?;
    let file = parse_reader(reader).map_err(|e| match e {
        IndexError::Parse { line, msg } => IndexError::Parse {
            line,
            msg: format!("{}: {}", path.display(), msg),
        },
        other => other,
    })?;
    log::info!(
        "Read {} records from {} ({})",
        file.records.len(),
        path.display(),
        file.header.registry
    );
    Ok(file)
}

/// Read several delegated files in parallel and concatenate their records
///
/// Records keep file order within each file and argument order across files.
/// If several files fail, the error of the first one in argument order is returned.
pub fn read_files<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Vec<AllocationRecord>> {
    let files = paths
        .par_iter()
        .map(read_file)
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<Result<Vec<_>>>()?;
    Ok(files.into_iter().flat_map(|f| f.records).collect())
}

fn at_line(line: usize, err: IndexError) -> IndexError {
    match err {
        IndexError::Parse { msg, .. } => IndexError::Parse { line, msg },
        other => IndexError::Parse {
            line,
            msg: other.to_string(),
        },
    }
}

fn syntax(msg: impl Into<String>) -> IndexError {
    IndexError::Parse {
        line: 0,
        msg: msg.into(),
    }
}

fn parse_header(line: &str) -> Result<Header> {
    let fields: Vec<&str> = line.split('|').collect();
    let [version, registry, serial, records, start_date, end_date, utc_offset] = fields[..] else {
        return Err(syntax(format!(
            "version line needs 7 fields, found {}",
            fields.len()
        )));
    };

    match version.parse::<f64>() {
        Ok(v) if v == 2.0 || v == 2.3 => {}
        _ => return Err(syntax(format!("unsupported format version {:?}", version))),
    }
    let records = records
        .parse()
        .map_err(|_| syntax(format!("invalid record count {:?}", records)))?;
    let utc_offset = if utc_offset.starts_with('+') || utc_offset.starts_with('-') {
        utc_offset.to_string()
    } else {
        format!("+{}", utc_offset)
    };

    Ok(Header {
        version: version.to_string(),
        registry: registry.parse()?,
        serial: serial.to_string(),
        records,
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        utc_offset,
    })
}

fn parse_summary(line: &str) -> Result<Summary> {
    let fields: Vec<&str> = line.split('|').collect();
    let [registry, _, kind, _, count, "summary"] = fields[..] else {
        return Err(syntax(format!("malformed summary line {:?}", line)));
    };
    Ok(Summary {
        registry: registry.parse()?,
        kind: kind.parse()?,
        count: count
            .parse()
            .map_err(|_| syntax(format!("invalid summary count {:?}", count)))?,
    })
}

/// `Ok(None)` for ASN records
fn parse_record(line: &str) -> Result<Option<AllocationRecord>> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < 7 {
        return Err(syntax(format!(
            "record needs at least 7 fields, found {}",
            fields.len()
        )));
    }
    let (registry, cc, kind, start, value, status) =
        (fields[0], fields[1], fields[2], fields[3], fields[4], fields[6]);

    let registry: Registry = registry.parse()?;
    let status: Status = status.parse()?;
    let country = match cc.trim() {
        "" => CountryCode::UNKNOWN,
        cc => cc.parse()?,
    };

    let (family, extent) = match kind.parse()? {
        ResourceKind::Asn => return Ok(None),
        ResourceKind::Ipv4 => {
            let count = value
                .parse()
                .map_err(|_| syntax(format!("invalid address count {:?}", value)))?;
            (Family::Ipv4, Extent::Count(count))
        }
        ResourceKind::Ipv6 => {
            let prefix_len = value
                .parse()
                .map_err(|_| syntax(format!("invalid prefix length {:?}", value)))?;
            (Family::Ipv6, Extent::Prefix(prefix_len))
        }
    };

    Ok(Some(AllocationRecord {
        registry,
        country,
        family,
        start: address::parse(family, start)?,
        extent,
        status,
    }))
}
