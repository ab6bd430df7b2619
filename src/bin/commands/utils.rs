use anyhow::{Context, Result};
use rirdb::{delegated, AllocationRecord, CountryTable};
use std::fs;
use std::path::{Path, PathBuf};

/// Default table, or the JSON array in `path`
pub fn load_countries(path: Option<&Path>) -> Result<CountryTable> {
    match path {
        None => Ok(CountryTable::default()),
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read country table: {}", path.display()))?;
            CountryTable::from_json(&json)
                .with_context(|| format!("Invalid country table: {}", path.display()))
        }
    }
}

/// Records of every input, in argument order
pub fn load_records(inputs: &[PathBuf]) -> Result<Vec<AllocationRecord>> {
    delegated::read_files(inputs).context("Failed to read delegated files")
}
