//! # Trace Builder
//!
//! Drives trace assembly over a stream of centroided scans. For every scan the
//! builder:
//!
//! 1. validates the scan (peak list present, retention time finite and not
//!    decreasing),
//! 2. builds the scan's [`CandidateSet`],
//! 3. asks the configured [`MatchStrategy`](crate::matching::MatchStrategy)
//!    for assignments and connects the matched candidates,
//! 4. pads, trims or drops every track that was not extended,
//! 5. opens a new track for every candidate nobody claimed.
//!
//! A scan without any usable candidate closes every open track: tracks never
//! bridge such a scan. When the stream ends, the remaining tracks go through
//! the same finalization filters and the surviving traces are returned in a
//! deterministic order (apex m/z, then start time, then creation order).
//!
//! ## Example
//!
//! ```rust
//! use mztrace::builder::{BuilderConfig, TraceBuilder};
//! use mztrace::peak::ScanBuilder;
//! use mztrace::tolerance::MzTolerance;
//!
//! let config = BuilderConfig::new(MzTolerance::absolute(0.01).unwrap(), 0.1);
//! let mut builder = TraceBuilder::new(config).unwrap();
//!
//! for (i, rt) in [1.0, 1.1, 1.2].into_iter().enumerate() {
//!     let scan = ScanBuilder::new(i as i64 + 1)
//!         .retention_time(rt)
//!         .add_peak(100.0, 1000.0)
//!         .build();
//!     builder.process_scan(&scan).unwrap();
//! }
//!
//! let traces = builder.finish();
//! assert_eq!(traces.len(), 1);
//! assert_eq!(traces.traces[0].len(), 3);
//! ```

mod config;
mod error;
mod finalize;
mod lifecycle;
mod stats;

#[cfg(test)]
mod tests;

use std::borrow::Borrow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::candidate::CandidateSet;
use crate::matching::MatchEngine;
use crate::peak::Scan;
use crate::track::{FinishedTrace, Track};

pub use config::BuilderConfig;
pub use error::BuildError;
pub use stats::BuildStats;

use finalize::{finalize_track, sort_traces};
use lifecycle::{ScanContext, TrackRegistry};

/// Shared flag used to stop a run between scans
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Traces produced by a completed run, with the run's counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceSet {
    /// Finished traces in output order
    pub traces: Vec<FinishedTrace>,
    /// Counters collected during the run
    pub stats: BuildStats,
}

impl TraceSet {
    /// Number of traces
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Whether no trace survived
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}

/// Result of [`TraceBuilder::run`]
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// Every scan was processed and the tracks were finalized
    Completed(TraceSet),
    /// Cancellation was observed; partial tracks were discarded
    Cancelled {
        /// Scans processed before cancellation was observed
        scans_processed: usize,
    },
}

impl BuildOutcome {
    /// The trace set, if the run completed
    pub fn into_traces(self) -> Option<TraceSet> {
        match self {
            BuildOutcome::Completed(set) => Some(set),
            BuildOutcome::Cancelled { .. } => None,
        }
    }

    /// Whether the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BuildOutcome::Cancelled { .. })
    }
}

/// Incremental trace assembler.
///
/// Owns the open tracks and the finished pool for one run. Feed scans in
/// acquisition order with [`process_scan`](Self::process_scan), then call
/// [`finish`](Self::finish).
#[derive(Debug)]
pub struct TraceBuilder {
    config: BuilderConfig,
    registry: TrackRegistry,
    finished: Vec<FinishedTrace>,
    total_scans: Option<usize>,
    previous_rt: Option<f64>,
    stats: BuildStats,
}

impl TraceBuilder {
    /// Create a builder, rejecting an unusable configuration
    pub fn new(config: BuilderConfig) -> Result<Self, BuildError> {
        config.validate()?;
        debug!(
            "Trace builder: tolerance {}, min span {}, strategy {}",
            config.tolerance,
            config.min_time_span,
            config.strategy.name()
        );
        Ok(Self {
            config,
            registry: TrackRegistry::default(),
            finished: Vec::new(),
            total_scans: None,
            previous_rt: None,
            stats: BuildStats::default(),
        })
    }

    /// Set the expected number of scans, used for progress reporting
    pub fn with_total_scans(mut self, total: usize) -> Self {
        self.total_scans = Some(total);
        self
    }

    /// Builder configuration
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Tracks still open, in creation order
    pub fn open_tracks(&self) -> &[Track] {
        self.registry.open()
    }

    /// Traces already closed by a scan without candidates
    pub fn finished_traces(&self) -> &[FinishedTrace] {
        &self.finished
    }

    /// Counters so far
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Processed and total scan counts (total is 0 when unknown)
    pub fn progress(&self) -> (usize, usize) {
        (self.stats.scans_processed, self.total_scans.unwrap_or(0))
    }

    /// Consume one scan
    pub fn process_scan(&mut self, scan: &Scan) -> Result<(), BuildError> {
        let scan_index = self.stats.scans_processed;

        let peaks = scan.peaks.as_deref().ok_or(BuildError::MissingInput {
            scan_index,
            scan_number: scan.scan_number,
        })?;

        if !scan.retention_time.is_finite() {
            return Err(BuildError::InvalidRetentionTime {
                scan_number: scan.scan_number,
            });
        }
        if let Some(previous) = self.previous_rt {
            if scan.retention_time < previous {
                return Err(BuildError::UnorderedScan {
                    scan_number: scan.scan_number,
                    retention_time: scan.retention_time,
                    previous,
                });
            }
        }
        self.previous_rt = Some(scan.retention_time);

        let context = ScanContext {
            scan_index,
            scan_number: scan.scan_number,
            retention_time: scan.retention_time,
        };

        let mut candidates =
            CandidateSet::from_peaks(peaks, self.config.strategy.min_candidate_height());
        self.stats.peaks_seen += peaks.len();
        self.stats.peaks_rejected += candidates.rejected();

        if candidates.is_empty() {
            self.close_open_tracks(scan.scan_number);
        } else {
            let assignments = self.config.strategy.propose(
                self.registry.open(),
                &candidates,
                &self.config.tolerance,
            );
            self.registry
                .apply(&assignments, &mut candidates, context, &mut self.stats);
            self.registry
                .settle_idle(context, &self.config, &mut self.stats);
            self.registry
                .spawn_unclaimed(&candidates, context, &mut self.stats);
        }

        self.stats.scans_processed += 1;
        self.report_progress();
        Ok(())
    }

    /// Finalize all open tracks and return the traces in output order
    pub fn finish(mut self) -> TraceSet {
        let closed = self.registry.close_all(&self.config, &mut self.stats);
        self.finished.extend(closed);
        sort_traces(&mut self.finished);
        self.stats.traces_emitted = self.finished.len();

        if self.stats.empty_scans > 0 {
            warn!(
                "{} of {} scans had no usable peaks",
                self.stats.empty_scans, self.stats.scans_processed
            );
        }
        info!("{}", self.stats);

        TraceSet {
            traces: self.finished,
            stats: self.stats,
        }
    }

    /// Process a whole scan stream, checking `cancel` once per scan.
    ///
    /// On cancellation the partial tracks are discarded without finalization.
    pub fn run<I>(mut self, scans: I, cancel: &CancellationToken) -> Result<BuildOutcome, BuildError>
    where
        I: IntoIterator,
        I::Item: Borrow<Scan>,
    {
        let scans = scans.into_iter();
        if self.total_scans.is_none() {
            if let (lower, Some(upper)) = scans.size_hint() {
                if lower == upper {
                    self.total_scans = Some(upper);
                }
            }
        }

        for scan in scans {
            if cancel.is_cancelled() {
                info!(
                    "Trace building cancelled after {} scans",
                    self.stats.scans_processed
                );
                return Ok(BuildOutcome::Cancelled {
                    scans_processed: self.stats.scans_processed,
                });
            }
            self.process_scan(scan.borrow())?;
        }

        Ok(BuildOutcome::Completed(self.finish()))
    }

    fn close_open_tracks(&mut self, scan_number: i64) {
        self.stats.empty_scans += 1;
        if self.registry.len() == 0 {
            return;
        }
        debug!(
            "Scan #{} has no usable peaks, closing {} open tracks",
            scan_number,
            self.registry.len()
        );
        let closed = self.registry.close_all(&self.config, &mut self.stats);
        self.finished.extend(closed);
    }

    fn report_progress(&self) {
        let interval = self.config.progress_interval;
        if interval == 0 || self.stats.scans_processed % interval != 0 {
            return;
        }
        let (processed, total) = self.progress();
        if total > 0 {
            info!(
                "Progress: {}/{} scans ({:.1}%)",
                processed,
                total,
                processed as f64 * 100.0 / total as f64
            );
        } else {
            info!("Progress: {} scans", processed);
        }
    }
}

/// Assemble traces from a scan stream in one call
pub fn build_traces<I>(scans: I, config: BuilderConfig) -> Result<TraceSet, BuildError>
where
    I: IntoIterator,
    I::Item: Borrow<Scan>,
{
    let mut builder = TraceBuilder::new(config)?;
    for scan in scans {
        builder.process_scan(scan.borrow())?;
    }
    Ok(builder.finish())
}

/// Assemble several independent runs in parallel.
///
/// Each run gets its own builder; results are returned in input order.
#[cfg(feature = "parallel")]
pub fn build_runs(
    runs: Vec<Vec<Scan>>,
    config: &BuilderConfig,
    cancel: &CancellationToken,
) -> Vec<Result<BuildOutcome, BuildError>> {
    use rayon::prelude::*;

    runs.into_par_iter()
        .map(|scans| {
            let total = scans.len();
            TraceBuilder::new(config.clone())?
                .with_total_scans(total)
                .run(scans, cancel)
        })
        .collect()
}

/// Finalize a single track outside of a run
pub fn finalize(track: Track, config: &BuilderConfig) -> Option<FinishedTrace> {
    let mut stats = BuildStats::default();
    finalize_track(track, config, &mut stats)
}
