//! Flat export of built indexes
//!
//! Every [`IndexEntry`] becomes one [`ExportRow`] with its addresses in
//! canonical text form and both the decoded and dense attribute values, so
//! consumers can load the rows without knowing the code tables. The JSON
//! document also carries the tables themselves.

use crate::address::{to_ip_addr, Family};
use crate::arithmetic::{cidr, cidr_blocks, is_exact_cidr};
use crate::error::{IndexError, Result};
use crate::index::{IndexEntry, IndexSet, RangeIndex};
use crate::registry::{CountryCode, CountryTable, Registry, Status};
use serde::Serialize;
use std::io::Write;

/// One exported index entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    /// Registry of the index
    pub registry: Registry,
    /// Address family
    pub family: Family,
    /// First address
    pub start: String,
    /// Last address (inclusive)
    pub end: String,
    /// Minimal enclosing prefix
    pub cidr: String,
    /// True when the range is exactly `cidr`
    pub cidr_exact: bool,
    /// Exact CIDR decomposition, space separated
    pub blocks: String,
    /// Country name
    pub country: CountryCode,
    /// Dense country code
    pub country_code: u8,
    /// Status name
    pub status: Status,
    /// Dense status code
    pub status_code: u8,
}

impl ExportRow {
    /// Decode one entry of `index`
    pub fn new(index: &RangeIndex, entry: &IndexEntry, countries: &CountryTable) -> Result<Self> {
        let family = index.family();
        let block = cidr(entry.start, entry.end, family)?;
        let blocks: Vec<String> = cidr_blocks(entry.start, entry.end, family)?
            .iter()
            .map(|b| b.to_string())
            .collect();
        Ok(Self {
            registry: index.registry(),
            family,
            start: to_ip_addr(family, entry.start)?.to_string(),
            end: to_ip_addr(family, entry.end)?.to_string(),
            cidr: block.to_string(),
            cidr_exact: is_exact_cidr(entry.start, entry.end, family)?,
            blocks: blocks.join(" "),
            country: countries.country_of(entry.country_code)?,
            country_code: entry.country_code,
            status: Status::from_code(entry.status_code)?,
            status_code: entry.status_code,
        })
    }
}

/// Rows of every index in the set, in (registry, family, start) order
pub fn rows(set: &IndexSet, countries: &CountryTable) -> Result<Vec<ExportRow>> {
    set.iter()
        .flat_map(|index| {
            index
                .entries()
                .iter()
                .map(move |entry| ExportRow::new(index, entry, countries))
        })
        .collect()
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    generator: String,
    countries: &'a [CountryCode],
    statuses: &'a [Status],
    registries: &'a [Registry],
    rows: Vec<ExportRow>,
}

/// Write the set as a pretty-printed JSON document
pub fn write_json<W: Write>(writer: W, set: &IndexSet, countries: &CountryTable) -> Result<()> {
    let doc = ExportDocument {
        generator: format!("rirdb {}", crate::VERSION),
        countries: countries.countries(),
        statuses: &Status::ALL,
        registries: &Registry::ALL,
        rows: rows(set, countries)?,
    };
    serde_json::to_writer_pretty(writer, &doc).map_err(|e| IndexError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{parse_ipv4, parse_ipv6};
    use crate::index::IndexBuilder;
    use crate::record::{AllocationRecord, Extent};

    fn sample_set(countries: &CountryTable) -> IndexSet {
        let records = vec![
            AllocationRecord {
                registry: Registry::Apnic,
                country: "CN".parse().unwrap(),
                family: Family::Ipv4,
                start: parse_ipv4("103.43.155.0").unwrap(),
                extent: Extent::Count(256),
                status: Status::Allocated,
            },
            AllocationRecord {
                registry: Registry::Apnic,
                country: "CN".parse().unwrap(),
                family: Family::Ipv4,
                start: parse_ipv4("61.5.208.0").unwrap(),
                extent: Extent::Count(1000),
                status: Status::Assigned,
            },
            AllocationRecord {
                registry: Registry::Apnic,
                country: "JP".parse().unwrap(),
                family: Family::Ipv6,
                start: parse_ipv6("2001:268:2000::").unwrap(),
                extent: Extent::Prefix(35),
                status: Status::Allocated,
            },
        ];
        IndexBuilder::new(countries).build_all(&records).unwrap()
    }

    #[test]
    fn test_rows() {
        let countries = CountryTable::default();
        let rows = rows(&sample_set(&countries), &countries).unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].start, "61.5.208.0");
        assert_eq!(rows[0].end, "61.5.211.231");
        assert_eq!(rows[0].cidr, "61.5.208.0/22");
        assert!(!rows[0].cidr_exact);
        assert_eq!(
            rows[0].blocks,
            "61.5.208.0/23 61.5.210.0/24 61.5.211.0/25 61.5.211.128/26 61.5.211.192/27 61.5.211.224/29"
        );
        assert_eq!(rows[0].status, Status::Assigned);

        assert_eq!(rows[1].cidr, "103.43.155.0/24");
        assert!(rows[1].cidr_exact);
        assert_eq!(rows[1].blocks, "103.43.155.0/24");
        assert_eq!(rows[1].country.to_string(), "CN");

        assert_eq!(rows[2].family, Family::Ipv6);
        assert_eq!(rows[2].end, "2001:268:3fff:ffff:ffff:ffff:ffff:ffff");
        assert_eq!(rows[2].cidr, "2001:268:2000::/35");
    }

    #[test]
    fn test_json_document() {
        let countries = CountryTable::default();
        let mut out = Vec::new();
        write_json(&mut out, &sample_set(&countries), &countries).unwrap();

        let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(doc["rows"].as_array().unwrap().len(), 3);
        assert_eq!(doc["rows"][1]["registry"], "apnic");
        assert_eq!(doc["rows"][1]["family"], "ipv4");
        assert_eq!(doc["rows"][1]["country"], "CN");
        assert_eq!(doc["statuses"][1], "allocated");
        assert_eq!(
            doc["countries"].as_array().unwrap().len(),
            countries.len()
        );
    }
}
