//! bus2pwl - Bus file to SPICE PWL converter
//!
//! Reads a bus file and writes one piecewise-linear voltage source per
//! signal, plus the derived clock when `clockdelay` is set.
//!
//! # Usage
//!
//! ```bash
//! bus2pwl adder.bus              # writes adder.pwl
//! bus2pwl adder.bus -o stim.pwl -v
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use buspwl::{
    dsl::{self, ParseOptions},
    error::Result,
    pwl,
};

/// Convert a bus file into SPICE PWL voltage sources
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the bus file
    #[arg(value_name = "BUSFILE")]
    busfile: PathBuf,

    /// Output PWL file (defaults to BUSFILE with a .pwl extension)
    #[arg(short, long, value_name = "OUT")]
    out: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Pass malformed bus declarations through as single wires
    #[arg(short, long)]
    permissive: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let options = ParseOptions::new().with_permissive(args.permissive);
    let bus = dsl::parse_file(&args.busfile, &options)?;

    let deck = pwl::synthesize(&bus)?;

    let out = args
        .out
        .unwrap_or_else(|| args.busfile.with_extension("pwl"));
    pwl::write_file(&deck, &out)?;

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}
