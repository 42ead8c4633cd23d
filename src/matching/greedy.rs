use std::cmp::Ordering;

use super::{Assignment, MatchEngine};
use crate::candidate::CandidateSet;
use crate::peak::Peak;
use crate::tolerance::MzTolerance;
use crate::track::Track;

/// Greedy connector: each track, in creation order, takes the most intense
/// unclaimed candidate inside its window.
///
/// Ties on intensity go to the candidate closest to the track's last m/z, and
/// then to the lower candidate index.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyHighestIntensity;

impl GreedyHighestIntensity {
    /// Ranking of two in-window candidates; `Less` means `a` is preferred
    fn rank(center: f64, (ia, a): (usize, &Peak), (ib, b): (usize, &Peak)) -> Ordering {
        b.intensity
            .total_cmp(&a.intensity)
            .then_with(|| (a.mz - center).abs().total_cmp(&(b.mz - center).abs()))
            .then_with(|| ia.cmp(&ib))
    }
}

impl MatchEngine for GreedyHighestIntensity {
    fn propose(
        &self,
        tracks: &[Track],
        candidates: &CandidateSet,
        tolerance: &MzTolerance,
    ) -> Vec<Assignment> {
        let mut claimed = candidates.claimed_flags().to_vec();
        let mut assignments = Vec::with_capacity(tracks.len().min(candidates.len()));
        let mut window: Vec<(usize, &Peak)> = Vec::new();

        for (track_index, track) in tracks.iter().enumerate() {
            let center = track.last_mz();
            let range = tolerance.range(center);

            window.clear();
            for index in candidates.lower_bound(range.lo)..candidates.len() {
                let peak = candidates.peak(index);
                if peak.mz > range.hi {
                    break;
                }
                if !claimed[index] {
                    window.push((index, peak));
                }
            }

            let best = window
                .iter()
                .copied()
                .min_by(|a, b| Self::rank(center, *a, *b));

            if let Some((index, _)) = best {
                claimed[index] = true;
                assignments.push(Assignment {
                    track: track_index,
                    candidate: index,
                });
            }
        }

        assignments
    }
}
