use anyhow::{Context, Result};
use rirdb::export::ExportRow;
use rirdb::IndexBuilder;
use std::path::PathBuf;

use crate::commands::utils::{load_countries, load_records};

pub fn cmd_lookup(
    address: String,
    inputs: Vec<PathBuf>,
    countries: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let countries = load_countries(countries.as_deref())?;
    let records = load_records(&inputs)?;
    let set = IndexBuilder::new(&countries)
        .build_all(&records)
        .context("Failed to build range indexes")?;

    let matches = set
        .lookup(&address)
        .with_context(|| format!("Lookup failed for: {}", address))?;
    let found = !matches.is_empty();

    if !quiet {
        let rows = matches
            .iter()
            .map(|m| ExportRow::new(m.index, m.entry, &countries))
            .collect::<rirdb::Result<Vec<_>>>()?;
        // Always an array, empty when nothing matched
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }

    std::process::exit(if found { 0 } else { 1 });
}
