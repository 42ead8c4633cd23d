//! # mztrace
//!
//! Command-line tool for assembling extracted ion chromatograms from
//! centroided LC-MS peak tables.
//!
//! ## Usage
//!
//! ```bash
//! # Build traces from a peak table
//! mztrace build peaks.tsv traces.parquet --ppm 10 --min-time-span 0.1
//!
//! # Generate a synthetic peak table
//! mztrace demo demo_peaks.tsv
//!
//! # Inspect a trace file
//! mztrace info traces.parquet
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
