//! Registry, status and country enumerations
//!
//! Every attribute attached to an index entry is a closed type with a fixed
//! code order. Codes are dense `u8` values and are stable across runs; the
//! conversions in both directions are total and fail explicitly on unknown
//! input.

use crate::error::{IndexError, Result};
use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number resource registry: <https://www.iana.org/numbers>
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
    /// Africa Region
    Afrinic,
    /// Asia/Pacific Region
    Apnic,
    /// Canada, USA, and some Caribbean Islands
    Arin,
    /// Internet Assigned Numbers Authority
    Iana,
    /// Internet Engineering Task Force special registry
    Ietf,
    /// Latin America and some Caribbean Islands
    Lacnic,
    /// Europe, the Middle East, and Central Asia
    Ripencc,
}

impl Registry {
    /// All registries in code order
    pub const ALL: [Registry; 7] = [
        Registry::Afrinic,
        Registry::Apnic,
        Registry::Arin,
        Registry::Iana,
        Registry::Ietf,
        Registry::Lacnic,
        Registry::Ripencc,
    ];

    /// Look up a registry by its dense code
    pub fn from_code(code: u8) -> Result<Self> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(IndexError::UnknownCode {
                kind: "registry",
                code,
            })
    }

    /// Dense code of the registry
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Name as written in delegated files
    pub fn name(self) -> &'static str {
        match self {
            Registry::Afrinic => "afrinic",
            Registry::Apnic => "apnic",
            Registry::Arin => "arin",
            Registry::Iana => "iana",
            Registry::Ietf => "ietf",
            Registry::Lacnic => "lacnic",
            Registry::Ripencc => "ripencc",
        }
    }

    /// Area covered by the registry
    pub fn description(self) -> &'static str {
        match self {
            Registry::Afrinic => "Africa Region",
            Registry::Apnic => "Asia/Pacific Region",
            Registry::Arin => "Canada, USA, and some Caribbean Islands",
            Registry::Iana => "Internet Assigned Numbers Authority (IANA)",
            Registry::Ietf => "Internet Engineering Task Force (IETF), Special Registry",
            Registry::Lacnic => "Latin America and some Caribbean Islands",
            Registry::Ripencc => "Europe, the Middle East, and Central Asia",
        }
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Registry {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.name() == s)
            .ok_or_else(|| IndexError::UnknownName {
                kind: "registry",
                name: s.to_string(),
            })
    }
}

/// Allocation status of a delegated range
///
/// IANA's own file uses registry names as the status of blocks it handed to
/// a regional registry; the remaining values are plain states.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Afrinic,
    Allocated,
    Apnic,
    Arin,
    Assigned,
    Available,
    Iana,
    Ietf,
    Lacnic,
    Reserved,
    Ripencc,
}

impl Status {
    /// All statuses in code order
    pub const ALL: [Status; 11] = [
        Status::Afrinic,
        Status::Allocated,
        Status::Apnic,
        Status::Arin,
        Status::Assigned,
        Status::Available,
        Status::Iana,
        Status::Ietf,
        Status::Lacnic,
        Status::Reserved,
        Status::Ripencc,
    ];

    /// Look up a status by its dense code
    pub fn from_code(code: u8) -> Result<Self> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(IndexError::UnknownCode {
                kind: "status",
                code,
            })
    }

    /// Dense code of the status
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Name as written in delegated files
    pub fn name(self) -> &'static str {
        match self {
            Status::Afrinic => "afrinic",
            Status::Allocated => "allocated",
            Status::Apnic => "apnic",
            Status::Arin => "arin",
            Status::Assigned => "assigned",
            Status::Available => "available",
            Status::Iana => "iana",
            Status::Ietf => "ietf",
            Status::Lacnic => "lacnic",
            Status::Reserved => "reserved",
            Status::Ripencc => "ripencc",
        }
    }

    /// Registry this status names, if any
    pub fn delegated_registry(self) -> Option<Registry> {
        match self {
            Status::Afrinic => Some(Registry::Afrinic),
            Status::Apnic => Some(Registry::Apnic),
            Status::Arin => Some(Registry::Arin),
            Status::Iana => Some(Registry::Iana),
            Status::Ietf => Some(Registry::Ietf),
            Status::Lacnic => Some(Registry::Lacnic),
            Status::Ripencc => Some(Registry::Ripencc),
            Status::Allocated | Status::Assigned | Status::Available | Status::Reserved => None,
        }
    }

    /// True if the status is a registry name
    pub fn is_registry(self) -> bool {
        self.delegated_registry().is_some()
    }

    /// True if the status is a plain allocation state
    pub fn is_state(self) -> bool {
        !self.is_registry()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Status {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|st| st.name() == s)
            .ok_or_else(|| IndexError::UnknownName {
                kind: "status",
                name: s.to_string(),
            })
    }
}

/// Two-letter upper-case country code (ISO 3166 alpha-2, plus `EU`/`ZZ`)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    /// Code used for records without a country
    pub const UNKNOWN: CountryCode = CountryCode(*b"ZZ");

    /// The code as a string slice
    pub fn as_str(&self) -> &str {
        // Constructed only from ASCII upper-case letters
        std::str::from_utf8(&self.0).unwrap_or("ZZ")
    }
}

impl FromStr for CountryCode {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.as_bytes() {
            [a, b] if a.is_ascii_uppercase() && b.is_ascii_uppercase() => {
                Ok(CountryCode([*a, *b]))
            }
            _ => Err(IndexError::UnknownName {
                kind: "country",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CountryCode({})", self.as_str())
    }
}

impl Serialize for CountryCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// ISO-3166 codes seen in RIR delegation files, in code order
pub const DEFAULT_COUNTRIES: &[&str] = &[
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AR", "AS", "AT", "AU", "AW", "AX", "AZ",
    "BA", "BB", "BD", "BE", "BF", "BG", "BH", "BI", "BJ", "BL", "BM", "BN", "BO", "BQ", "BR",
    "BS", "BT", "BW", "BY", "BZ", "CA", "CD", "CF", "CG", "CH", "CI", "CK", "CL", "CM", "CN",
    "CO", "CR", "CU", "CV", "CW", "CY", "CZ", "DE", "DJ", "DK", "DM", "DO", "DZ", "EC", "EE",
    "EG", "ER", "ES", "ET", "EU", "FI", "FJ", "FM", "FO", "FR", "GA", "GB", "GD", "GE", "GF",
    "GG", "GH", "GI", "GL", "GM", "GN", "GP", "GQ", "GR", "GT", "GU", "GW", "GY", "HK", "HN",
    "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN", "IO", "IQ", "IR", "IS", "IT", "JE", "JM",
    "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN", "KP", "KR", "KW", "KY", "KZ", "LA", "LB",
    "LC", "LI", "LK", "LR", "LS", "LT", "LU", "LV", "LY", "MA", "MC", "MD", "ME", "MF", "MG",
    "MH", "MK", "ML", "MM", "MN", "MO", "MP", "MQ", "MR", "MS", "MT", "MU", "MV", "MW", "MX",
    "MY", "MZ", "NA", "NC", "NE", "NF", "NG", "NI", "NL", "NO", "NP", "NR", "NU", "NZ", "OM",
    "PA", "PE", "PF", "PG", "PH", "PK", "PL", "PM", "PR", "PS", "PT", "PW", "PY", "QA", "RE",
    "RO", "RS", "RU", "RW", "SA", "SB", "SC", "SD", "SE", "SG", "SI", "SK", "SL", "SM", "SN",
    "SO", "SR", "SS", "ST", "SV", "SX", "SY", "SZ", "TC", "TD", "TG", "TH", "TJ", "TK", "TL",
    "TM", "TN", "TO", "TR", "TT", "TV", "TW", "TZ", "UA", "UG", "US", "UY", "UZ", "VA", "VC",
    "VE", "VG", "VI", "VN", "VU", "WF", "WS", "YE", "YT", "ZA", "ZM", "ZW", "ZZ",
];

/// Ordered country enumeration mapping codes to dense `u8` values
///
/// The table is fixed before any index is built and only read afterwards,
/// so it can be shared by reference across worker threads.
#[derive(Debug, Clone)]
pub struct CountryTable {
    countries: Vec<CountryCode>,
    codes: FxHashMap<CountryCode, u8>,
}

impl CountryTable {
    /// Build a table from an ordered list of country names
    ///
    /// Fails on malformed or duplicate names, or more than 256 entries.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut countries = Vec::new();
        let mut codes = FxHashMap::default();

        for name in names {
            let country: CountryCode = name.as_ref().parse()?;
            let code = u8::try_from(countries.len()).map_err(|_| IndexError::UnknownName {
                kind: "country",
                name: format!("{} (table exceeds 256 entries)", country),
            })?;
            if codes.insert(country, code).is_some() {
                return Err(IndexError::UnknownName {
                    kind: "country",
                    name: format!("{} (duplicate table entry)", country),
                });
            }
            countries.push(country);
        }

        Ok(Self { countries, codes })
    }

    /// Load a table from a JSON array of strings
    pub fn from_json(json: &str) -> Result<Self> {
        let names: Vec<String> = serde_json::from_str(json).map_err(|e| IndexError::Parse {
            line: e.line(),
            msg: format!("country table: {}", e),
        })?;
        Self::new(names)
    }

    /// Dense code of a country
    pub fn code_of(&self, country: CountryCode) -> Result<u8> {
        self.codes
            .get(&country)
            .copied()
            .ok_or_else(|| IndexError::UnknownName {
                kind: "country",
                name: country.to_string(),
            })
    }

    /// Country for a dense code
    pub fn country_of(&self, code: u8) -> Result<CountryCode> {
        self.countries
            .get(code as usize)
            .copied()
            .ok_or(IndexError::UnknownCode {
                kind: "country",
                code,
            })
    }

    /// True if the country is part of the table
    pub fn contains(&self, country: CountryCode) -> bool {
        self.codes.contains_key(&country)
    }

    /// Countries in code order
    pub fn countries(&self) -> &[CountryCode] {
        &self.countries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    /// True if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

impl Default for CountryTable {
    fn default() -> Self {
        let countries: Vec<CountryCode> = DEFAULT_COUNTRIES
            .iter()
            .map(|name| {
                let bytes = name.as_bytes();
                CountryCode([bytes[0], bytes[1]])
            })
            .collect();
        let codes = countries
            .iter()
            .enumerate()
            .map(|(i, &country)| (country, i as u8))
            .collect();
        Self { countries, codes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_codes_round_trip() {
        for registry in Registry::ALL {
            assert_eq!(Registry::from_code(registry.code()).unwrap(), registry);
            assert_eq!(registry.name().parse::<Registry>().unwrap(), registry);
        }
        assert_eq!(Registry::Afrinic.code(), 0);
        assert_eq!(Registry::Ripencc.code(), 6);
    }

    #[test]
    fn test_registry_unknown() {
        assert_eq!(
            Registry::from_code(7).unwrap_err(),
            IndexError::UnknownCode {
                kind: "registry",
                code: 7
            }
        );
        assert!("RIPE".parse::<Registry>().is_err());
    }

    #[test]
    fn test_status_codes_are_stable() {
        let names: Vec<&str> = Status::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "afrinic",
                "allocated",
                "apnic",
                "arin",
                "assigned",
                "available",
                "iana",
                "ietf",
                "lacnic",
                "reserved",
                "ripencc"
            ]
        );
        for status in Status::ALL {
            assert_eq!(Status::from_code(status.code()).unwrap(), status);
        }
        assert!(Status::from_code(11).is_err());
        assert!("legacy".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_registry_split() {
        assert!(Status::Apnic.is_registry());
        assert!(Status::Allocated.is_state());
        assert_eq!(Status::Ripencc.delegated_registry(), Some(Registry::Ripencc));
        assert_eq!(Status::Reserved.delegated_registry(), None);
    }

    #[test]
    fn test_country_code_parse() {
        let cn: CountryCode = "CN".parse().unwrap();
        assert_eq!(cn.to_string(), "CN");
        assert!("cn".parse::<CountryCode>().is_err());
        assert!("CHN".parse::<CountryCode>().is_err());
        assert!("".parse::<CountryCode>().is_err());
    }

    #[test]
    fn test_default_country_table() {
        let table = CountryTable::default();
        assert_eq!(table.len(), DEFAULT_COUNTRIES.len());
        assert_eq!(table.code_of("AD".parse().unwrap()).unwrap(), 0);
        let zz = table.code_of(CountryCode::UNKNOWN).unwrap();
        assert_eq!(zz as usize, DEFAULT_COUNTRIES.len() - 1);
        assert_eq!(table.country_of(zz).unwrap(), CountryCode::UNKNOWN);
        assert!(table.country_of(255).is_err());
    }

    #[test]
    fn test_country_table_matches_new() {
        let built = CountryTable::new(DEFAULT_COUNTRIES).unwrap();
        assert_eq!(built.countries(), CountryTable::default().countries());
    }

    #[test]
    fn test_country_table_rejects_duplicates() {
        assert!(CountryTable::new(["US", "CA", "US"]).is_err());
    }

    #[test]
    fn test_country_table_from_json() {
        let table = CountryTable::from_json(r#"["JP", "CN", "ZZ"]"#).unwrap();
        assert_eq!(table.code_of("CN".parse().unwrap()).unwrap(), 1);
        assert!(table.code_of("US".parse().unwrap()).is_err());
        assert!(CountryTable::from_json("{").is_err());
    }
}
