use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod build;
mod config;
mod demo;
mod info;

pub use build::BuildArgs;

/// mztrace - Extracted ion chromatogram builder
#[derive(Parser)]
#[command(name = "mztrace")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Matching strategy selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Each track takes the most intense candidate in its window
    Greedy,
    /// Globally best-scoring (track, candidate) pairs first
    Scored,
}

/// Peak table field delimiter
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DelimiterArg {
    /// Tab-separated
    Tab,
    /// Comma-separated
    Comma,
}

impl DelimiterArg {
    pub fn as_byte(self) -> u8 {
        match self {
            DelimiterArg::Tab => b'\t',
            DelimiterArg::Comma => b',',
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble traces from a centroided peak table
    Build {
        /// Input peak table (CSV or TSV)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output trace file (defaults to <INPUT>.traces.parquet, or .json with --json)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Matching strategy
        #[arg(short = 's', long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Absolute m/z tolerance
        #[arg(short = 'm', long, value_name = "MZ")]
        mz_tolerance: Option<f64>,

        /// Relative m/z tolerance in ppm
        #[arg(short = 'p', long, value_name = "PPM")]
        ppm: Option<f64>,

        /// Minimum retention time span of a kept run
        #[arg(short = 't', long, value_name = "TIME")]
        min_time_span: Option<f64>,

        /// Minimum candidate intensity (scored strategy)
        #[arg(long, value_name = "INTENSITY")]
        min_height: Option<f64>,

        /// Field delimiter (inferred from the file extension when omitted)
        #[arg(short = 'd', long, value_enum)]
        delimiter: Option<DelimiterArg>,

        /// Write JSON instead of Parquet
        #[arg(long)]
        json: bool,
    },

    /// Generate a synthetic LC-MS peak table for testing
    Demo {
        /// Output peak table path
        #[arg(value_name = "OUTPUT", default_value = "demo_peaks.tsv")]
        output: PathBuf,

        /// Number of scans to generate
        #[arg(short = 'n', long, default_value = "600")]
        scans: usize,
    },

    /// Display information about a trace file
    Info {
        /// Trace Parquet file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build {
            input,
            output,
            config,
            strategy,
            mz_tolerance,
            ppm,
            min_time_span,
            min_height,
            delimiter,
            json,
        } => build::run(BuildArgs {
            input,
            output,
            config,
            strategy,
            mz_tolerance,
            ppm,
            min_time_span,
            min_height,
            delimiter,
            json,
        }),
        Commands::Demo { output, scans } => demo::run(output, scans),
        Commands::Info { file } => info::run(file),
    }
}
