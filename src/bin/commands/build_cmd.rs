use anyhow::{Context, Result};
use clap::ValueEnum;
use rirdb::{export, IndexBuilder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use crate::commands::utils::{load_countries, load_records};

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON document with the code tables and all rows
    Json,
    /// One CSV row per index entry
    Csv,
}

pub fn cmd_build(
    inputs: Vec<PathBuf>,
    output: PathBuf,
    format: OutputFormat,
    countries: Option<PathBuf>,
    sequential: bool,
) -> Result<()> {
    let started = Instant::now();
    let countries = load_countries(countries.as_deref())?;
    let records = load_records(&inputs)?;
    log::info!(
        "Loaded {} records from {} files in {:.2?}",
        records.len(),
        inputs.len(),
        started.elapsed()
    );

    let (set, stats) = IndexBuilder::new(&countries)
        .with_parallel(!sequential)
        .build_all_with_stats(&records)
        .context("Failed to build range indexes")?;

    let file = File::create(&output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => {
            export::write_json(&mut writer, &set, &countries)
                .with_context(|| format!("Failed to write JSON: {}", output.display()))?;
            writeln!(writer)?;
        }
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(&mut writer);
            for row in export::rows(&set, &countries)? {
                csv_writer
                    .serialize(&row)
                    .with_context(|| format!("Failed to write CSV: {}", output.display()))?;
            }
            csv_writer.flush()?;
        }
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    eprintln!(
        "Built {} entries from {} records ({} merged, {} skipped) in {:.2?}",
        stats.entries,
        stats.records,
        stats.coalesce.merges,
        stats.skipped,
        started.elapsed()
    );
    eprintln!("  Output: {}", output.display());

    Ok(())
}
