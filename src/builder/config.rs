use serde::{Deserialize, Serialize};

use super::BuildError;
use crate::matching::MatchStrategy;
use crate::tolerance::MzTolerance;

fn default_progress_interval() -> usize {
    1000
}

/// Configuration for the trace builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// m/z window used to continue a track
    pub tolerance: MzTolerance,

    /// Minimum retention time span a connected run must cover to be kept
    pub min_time_span: f64,

    /// Matching strategy
    #[serde(default)]
    pub strategy: MatchStrategy,

    /// Traces whose highest point is below this intensity are dropped at
    /// finalization (0 disables the filter)
    #[serde(default)]
    pub min_highest_point: f64,

    /// Log progress every N scans (0 disables progress logging)
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

impl BuilderConfig {
    /// Configuration with the default greedy strategy and no height filter
    pub fn new(tolerance: MzTolerance, min_time_span: f64) -> Self {
        Self {
            tolerance,
            min_time_span,
            strategy: MatchStrategy::default(),
            min_highest_point: 0.0,
            progress_interval: default_progress_interval(),
        }
    }

    /// Select the matching strategy
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Drop traces whose apex is below `intensity`
    pub fn with_min_highest_point(mut self, intensity: f64) -> Self {
        self.min_highest_point = intensity;
        self
    }

    /// Log progress every `scans` scans
    pub fn with_progress_interval(mut self, scans: usize) -> Self {
        self.progress_interval = scans;
        self
    }

    /// Reject unusable parameters before any scan is processed
    pub fn validate(&self) -> Result<(), BuildError> {
        self.tolerance.validate()?;

        if !(self.min_time_span > 0.0) || !self.min_time_span.is_finite() {
            return Err(BuildError::Configuration(format!(
                "min_time_span must be positive, got {}",
                self.min_time_span
            )));
        }

        if !(self.min_highest_point >= 0.0) || !self.min_highest_point.is_finite() {
            return Err(BuildError::Configuration(format!(
                "min_highest_point must be a non-negative number, got {}",
                self.min_highest_point
            )));
        }

        self.strategy.validate().map_err(BuildError::Configuration)
    }
}
