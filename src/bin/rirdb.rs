mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{cmd_build, cmd_cidr, cmd_lookup, OutputFormat};

#[derive(Parser)]
#[command(name = "rirdb")]
#[command(
    about = "Build range indexes from regional internet registry allocation files",
    long_about = "rirdb - Registry allocation range index builder\n\n\
    Reads RIR statistics exchange (\"delegated\") files, normalizes every IPv4 and\n\
    IPv6 allocation into an inclusive range, merges adjacent ranges of the same\n\
    country (or, for IANA, the same receiving registry) and produces one sorted,\n\
    non-overlapping index per registry and address family.\n\n\
    Examples:\n  \
    rirdb build delegated-*-extended-latest -o ranges.json\n  \
    rirdb build delegated-apnic-latest.gz -o ranges.csv --format csv\n  \
    rirdb lookup 61.5.213.7 -i delegated-apnic-extended-latest\n  \
    rirdb cidr 103.43.155.0 103.43.155.255"
)]
#[command(version)]
struct Cli {
    /// Log progress and build statistics (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every registry and family index and export it
    Build {
        /// Delegated files (plain or .gz), or "-" for stdin
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// JSON array of country codes defining the country enumeration
        #[arg(long, value_name = "FILE")]
        countries: Option<PathBuf>,

        /// Number of worker threads (default: all cores)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Coalesce partitions one after another
        #[arg(long)]
        sequential: bool,
    },

    /// Look an address up in indexes built from delegated files
    Lookup {
        /// IPv4 or IPv6 address
        #[arg(value_name = "ADDRESS")]
        address: String,

        /// Delegated files to build from
        #[arg(short, long = "input", value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// JSON array of country codes defining the country enumeration
        #[arg(long, value_name = "FILE")]
        countries: Option<PathBuf>,

        /// Quiet mode - no output, only exit code (0 = found, 1 = not found)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show prefix, CIDR decomposition and class of an address range
    Cidr {
        /// First address
        #[arg(value_name = "START")]
        start: String,

        /// Last address (inclusive)
        #[arg(value_name = "END")]
        end: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Build {
            inputs,
            output,
            format,
            countries,
            threads,
            sequential,
        } => {
            if let Some(threads) = threads.filter(|&n| n > 0) {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build_global()
                    .context("Failed to configure thread pool")?;
            }
            cmd_build(inputs, output, format, countries, sequential)
        }
        Commands::Lookup {
            address,
            inputs,
            countries,
            quiet,
        } => cmd_lookup(address, inputs, countries, quiet),
        Commands::Cidr { start, end } => cmd_cidr(start, end),
    }
}
