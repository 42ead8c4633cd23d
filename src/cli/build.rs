use anyhow::{Context, Result};
use log::{info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use mztrace::builder::{BuildOutcome, BuilderConfig, CancellationToken, TraceBuilder, TraceSet};
use mztrace::matching::MatchStrategy;
use mztrace::peak_table::PeakTableReader;
use mztrace::tolerance::MzTolerance;
use mztrace::trace_writer::{write_trace_file, write_traces_json};

use super::config::Config;
use super::{DelimiterArg, StrategyArg};

const DEFAULT_PPM: f64 = 10.0;
const DEFAULT_MIN_TIME_SPAN: f64 = 0.1;

/// Arguments of the build command
pub struct BuildArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub strategy: Option<StrategyArg>,
    pub mz_tolerance: Option<f64>,
    pub ppm: Option<f64>,
    pub min_time_span: Option<f64>,
    pub min_height: Option<f64>,
    pub delimiter: Option<DelimiterArg>,
    pub json: bool,
}

/// Assemble traces from a peak table
pub fn run(args: BuildArgs) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    let file_config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let builder_config = resolve_config(&args, &file_config)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, args.json));

    info!("mztrace - trace assembly");
    info!("Input:     {}", args.input.display());
    info!("Output:    {}", output.display());
    info!("Tolerance: {}", builder_config.tolerance);
    info!("Min span:  {}", builder_config.min_time_span);
    info!("Strategy:  {}", builder_config.strategy.name());

    let reader = match args.delimiter {
        Some(delimiter) => PeakTableReader::new().with_delimiter(delimiter.as_byte()),
        None => PeakTableReader::for_path(&args.input),
    };
    let scans = reader
        .read_path(&args.input)
        .with_context(|| format!("Failed to read peak table {}", args.input.display()))?;

    let builder = TraceBuilder::new(builder_config.clone())
        .context("Invalid builder configuration")?
        .with_total_scans(scans.len());
    let set = match builder
        .run(&scans, &CancellationToken::new())
        .context("Trace assembly failed")?
    {
        BuildOutcome::Completed(set) => set,
        BuildOutcome::Cancelled { scans_processed } => {
            anyhow::bail!("Trace assembly cancelled after {} scans", scans_processed)
        }
    };

    if set.is_empty() {
        warn!("No trace passed the filters");
    }

    if args.json {
        let file = File::create(&output)
            .with_context(|| format!("Failed to create {}", output.display()))?;
        write_traces_json(BufWriter::new(file), &set, &builder_config)
            .context("Failed to write JSON traces")?;
    } else {
        let source = args
            .input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let stats = write_trace_file(&output, &set, &builder_config, source.as_deref())
            .context("Failed to write trace file")?;
        info!("{}", stats);
    }

    print_summary(&set, &output);
    Ok(())
}

/// Merge command-line flags over the config file over the defaults
fn resolve_config(args: &BuildArgs, file: &Config) -> Result<BuilderConfig> {
    let mz = args.mz_tolerance.or(file.tolerance.mz);
    let ppm = args.ppm.or(file.tolerance.ppm);
    let tolerance = match (mz, ppm) {
        (Some(mz), Some(ppm)) => MzTolerance::max_of_both(mz, ppm)?,
        (Some(mz), None) => MzTolerance::absolute(mz)?,
        (None, Some(ppm)) => MzTolerance::ppm(ppm)?,
        (None, None) => MzTolerance::ppm(DEFAULT_PPM)?,
    };

    let min_time_span = args
        .min_time_span
        .or(file.builder.min_time_span)
        .unwrap_or(DEFAULT_MIN_TIME_SPAN);

    let strategy_arg = args
        .strategy
        .or(file.builder.strategy.map(StrategyArg::from))
        .unwrap_or(StrategyArg::Greedy);
    let min_height = args.min_height.or(file.builder.min_height);

    let strategy = match strategy_arg {
        StrategyArg::Greedy => {
            if min_height.is_some() {
                warn!("min_height only applies to the scored strategy; ignoring it");
            }
            MatchStrategy::GreedyHighestIntensity
        }
        StrategyArg::Scored => MatchStrategy::ScoredBestFirst {
            min_height: min_height.unwrap_or(0.0),
            intensity_weight: file.builder.intensity_weight.unwrap_or(0.0),
        },
    };

    let mut config = BuilderConfig::new(tolerance, min_time_span).with_strategy(strategy);
    if let Some(min_highest_point) = file.builder.min_highest_point {
        config = config.with_min_highest_point(min_highest_point);
    }
    if let Some(interval) = file.builder.progress_interval {
        config = config.with_progress_interval(interval);
    }

    config.validate()?;
    Ok(config)
}

fn default_output(input: &Path, json: bool) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let extension = if json { "traces.json" } else { "traces.parquet" };
    input.with_file_name(format!("{}.{}", stem, extension))
}

fn print_summary(set: &TraceSet, output: &Path) {
    #[cfg(feature = "colorized_output")]
    {
        use console::style;

        println!("{}", style("Trace assembly complete").bold().green());
        println!("  {}: {}", style("Output").bold(), output.display());
        println!("  {}: {}", style("Traces").bold(), style(set.len()).cyan());
        println!("  {}", set.stats);
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        println!("Trace assembly complete");
        println!("  Output: {}", output.display());
        println!("  Traces: {}", set.len());
        println!("  {}", set.stats);
    }
}
