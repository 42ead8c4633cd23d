//! TOML configuration file support.
//!
//! Builder settings can be kept in a file instead of passed as flags; flags
//! given on the command line take precedence:
//!
//! ```toml
//! # mztrace.toml
//! [tolerance]
//! mz = 0.002
//! ppm = 10.0
//!
//! [builder]
//! strategy = "scored"
//! min_time_span = 0.1
//! min_height = 5000.0
//! intensity_weight = 0.5
//! min_highest_point = 20000.0
//! progress_interval = 500
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::StrategyArg;

/// Root configuration structure for mztrace.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// m/z window settings.
    #[serde(default)]
    pub tolerance: ToleranceConfig,

    /// Trace builder settings.
    #[serde(default)]
    pub builder: BuilderSection,
}

/// m/z tolerance; setting both values selects the larger window per m/z.
#[derive(Debug, Default, Deserialize)]
pub struct ToleranceConfig {
    /// Absolute half-width in m/z units.
    pub mz: Option<f64>,

    /// Relative half-width in ppm.
    pub ppm: Option<f64>,
}

/// Configuration for the build command.
#[derive(Debug, Default, Deserialize)]
pub struct BuilderSection {
    /// Matching strategy ("greedy" or "scored").
    pub strategy: Option<StrategyName>,

    /// Minimum retention time span of a kept run.
    pub min_time_span: Option<f64>,

    /// Minimum candidate intensity (scored strategy).
    pub min_height: Option<f64>,

    /// Weight of the intensity term in the match score (scored strategy).
    pub intensity_weight: Option<f64>,

    /// Minimum apex intensity of an emitted trace.
    pub min_highest_point: Option<f64>,

    /// Scans between progress messages.
    pub progress_interval: Option<usize>,
}

/// Strategy names accepted in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyName {
    /// Greedy highest intensity.
    Greedy,
    /// Scored best first.
    Scored,
}

impl From<StrategyName> for StrategyArg {
    fn from(name: StrategyName) -> Self {
        match name {
            StrategyName::Greedy => StrategyArg::Greedy,
            StrategyName::Scored => StrategyArg::Scored,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
