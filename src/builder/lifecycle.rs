use log::debug;

use super::finalize::finalize_track;
use super::{BuildStats, BuilderConfig};
use crate::candidate::CandidateSet;
use crate::matching::Assignment;
use crate::peak::Peak;
use crate::track::{FinishedTrace, PointKind, TracePoint, Track};

/// Identity of the scan currently being processed
#[derive(Debug, Clone, Copy)]
pub(super) struct ScanContext {
    pub scan_index: usize,
    pub scan_number: i64,
    pub retention_time: f64,
}

impl ScanContext {
    fn point(&self, peak: &Peak) -> TracePoint {
        TracePoint {
            scan_index: self.scan_index,
            scan_number: self.scan_number,
            retention_time: self.retention_time,
            mz: peak.mz,
            intensity: peak.intensity,
            kind: PointKind::Connected,
        }
    }
}

/// What to do with a track that was not extended this scan
enum IdleOutcome {
    Keep,
    Discard,
}

/// Registry of open tracks, in creation order
#[derive(Debug, Default)]
pub(super) struct TrackRegistry {
    tracks: Vec<Track>,
    next_id: usize,
}

impl TrackRegistry {
    pub fn open(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Extend matched tracks and claim their candidates
    pub fn apply(
        &mut self,
        assignments: &[Assignment],
        candidates: &mut CandidateSet,
        scan: ScanContext,
        stats: &mut BuildStats,
    ) {
        for assignment in assignments {
            let claimed = candidates.claim(assignment.candidate);
            debug_assert!(claimed, "candidate {} proposed twice", assignment.candidate);
            if !claimed {
                continue;
            }
            let point = scan.point(candidates.peak(assignment.candidate));
            self.tracks[assignment.track].connect(point);
            stats.points_connected += 1;
        }
    }

    /// Pad, trim or discard every track that was not extended this scan,
    /// then reset the growing flags for the next scan
    pub fn settle_idle(&mut self, scan: ScanContext, config: &BuilderConfig, stats: &mut BuildStats) {
        let tracks = std::mem::take(&mut self.tracks);
        self.tracks.reserve(tracks.len());

        for mut track in tracks {
            let outcome = if track.is_growing() {
                IdleOutcome::Keep
            } else {
                settle_idle_track(&mut track, scan, config, stats)
            };
            track.reset_growing();
            if let IdleOutcome::Keep = outcome {
                self.tracks.push(track);
            }
        }
    }

    /// Open a new single-point track for every unclaimed candidate
    pub fn spawn_unclaimed(&mut self, candidates: &CandidateSet, scan: ScanContext, stats: &mut BuildStats) {
        for (_, peak) in candidates.unclaimed() {
            let track = Track::start(self.next_id, scan.point(peak));
            self.next_id += 1;
            self.tracks.push(track);
            stats.tracks_started += 1;
        }
    }

    /// Close every open track through the finalization filters
    pub fn close_all(&mut self, config: &BuilderConfig, stats: &mut BuildStats) -> Vec<FinishedTrace> {
        std::mem::take(&mut self.tracks)
            .into_iter()
            .filter_map(|track| finalize_track(track, config, stats))
            .collect()
    }
}

fn settle_idle_track(
    track: &mut Track,
    scan: ScanContext,
    config: &BuilderConfig,
    stats: &mut BuildStats,
) -> IdleOutcome {
    // already padded after its last connected run
    if track.ends_with_gap() {
        return IdleOutcome::Keep;
    }

    if track.last_run_span() < config.min_time_span {
        if track.trim_last_run() > 0 {
            stats.runs_trimmed += 1;
            return IdleOutcome::Keep;
        }
        debug!(
            "Dropping track {} at m/z {:.4} after scan #{}: run too short",
            track.id(),
            track.last_mz(),
            scan.scan_number
        );
        stats.tracks_discarded += 1;
        return IdleOutcome::Discard;
    }

    track.pad_gap(scan.scan_index, scan.scan_number, scan.retention_time);
    stats.gap_points += 1;
    IdleOutcome::Keep
}
