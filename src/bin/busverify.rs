//! busverify - Check simulated outputs against a bus file
//!
//! Samples each node named in the bus file's outputs block around its clock
//! edge and compares the logic level with the expected vector. Exits with
//! status 1 when any vector fails.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use buspwl::{
    dsl::{self, ParseOptions},
    error::Result,
    verify,
};

/// Verify simulated waveforms against the outputs block of a bus file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the bus file
    #[arg(value_name = "BUSFILE")]
    busfile: PathBuf,

    /// Tabulated simulation output (time column followed by node voltages)
    #[arg(value_name = "TRACE")]
    trace: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let default = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();

    let bus = dsl::parse_file(&args.busfile, &ParseOptions::default())?;
    let trace = verify::read_trace(&args.trace)?;
    let report = verify::verify(&bus, &trace)?;

    if report.passed() {
        println!("All vectors passed");
        Ok(ExitCode::SUCCESS)
    } else {
        for check in report.failures() {
            println!(
                "{}: expected {}, measured {} (rows {:?})",
                check.name, check.expected, check.measured, check.mismatches
            );
        }
        println!("Some vectors failed");
        Ok(ExitCode::FAILURE)
    }
}
