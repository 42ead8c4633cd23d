use log::debug;

use super::{BuildStats, BuilderConfig};
use crate::track::{FinishedTrace, Track};

/// Close a track and decide whether it becomes a finished trace.
///
/// The most recent connected run must cover `min_time_span`. If it does not,
/// the track falls back to its earlier run when it has one and is discarded
/// otherwise. Surviving traces must also reach `min_highest_point`.
pub(super) fn finalize_track(
    mut track: Track,
    config: &BuilderConfig,
    stats: &mut BuildStats,
) -> Option<FinishedTrace> {
    if track.last_run_span() < config.min_time_span {
        if track.trim_last_run() > 0 {
            stats.runs_trimmed += 1;
        } else {
            debug!(
                "Discarding track {} at m/z {:.4}: span {:.3} below {}",
                track.id(),
                track.last_mz(),
                track.last_run_span(),
                config.min_time_span
            );
            stats.tracks_discarded += 1;
            return None;
        }
    }

    let id = track.id();
    let trace = match FinishedTrace::from_points(id, track.into_points()) {
        Some(trace) => trace,
        None => {
            stats.tracks_discarded += 1;
            return None;
        }
    };

    if trace.height < config.min_highest_point {
        debug!(
            "Discarding trace {} at m/z {:.4}: height {} below {}",
            id, trace.apex_mz, trace.height, config.min_highest_point
        );
        stats.tracks_discarded += 1;
        return None;
    }

    Some(trace)
}

/// Sort finished traces into their deterministic output order
pub(super) fn sort_traces(traces: &mut [FinishedTrace]) {
    traces.sort_by(FinishedTrace::output_order);
}
