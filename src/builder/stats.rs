use std::fmt;

use serde::Serialize;

/// Counters collected during one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Scans consumed
    pub scans_processed: usize,
    /// Scans that had no usable candidate and closed all open tracks
    pub empty_scans: usize,
    /// Input peaks seen
    pub peaks_seen: usize,
    /// Input peaks left out of the candidate sets (non-finite or below min height)
    pub peaks_rejected: usize,
    /// Candidates connected to an existing track
    pub points_connected: usize,
    /// Zero-intensity gap markers inserted
    pub gap_points: usize,
    /// Tracks opened from unclaimed candidates
    pub tracks_started: usize,
    /// Connected runs trimmed back to an earlier run
    pub runs_trimmed: usize,
    /// Tracks discarded for failing the span or height filters
    pub tracks_discarded: usize,
    /// Traces emitted
    pub traces_emitted: usize,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Built {} traces from {} scans ({} peaks, {} connected, {} gaps, {} tracks discarded)",
            self.traces_emitted,
            self.scans_processed,
            self.peaks_seen,
            self.points_connected,
            self.gap_points,
            self.tracks_discarded
        )
    }
}
