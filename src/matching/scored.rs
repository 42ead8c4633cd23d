use std::cmp::Ordering;

use super::{Assignment, MatchEngine};
use crate::candidate::CandidateSet;
use crate::peak::Peak;
use crate::tolerance::MzTolerance;
use crate::track::Track;

/// Score of one in-tolerance (track, candidate) pair; lower is better
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    /// Index of the track in the open-track slice
    pub track: usize,
    /// Index of the candidate in the scan's [`CandidateSet`]
    pub candidate: usize,
    /// Combined distance
    pub score: f64,
}

impl MatchScore {
    /// Total order used to pick pairs: score, then track index, then candidate index
    pub fn rank(a: &MatchScore, b: &MatchScore) -> Ordering {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.track.cmp(&b.track))
            .then_with(|| a.candidate.cmp(&b.candidate))
    }
}

/// Best-first connector over all in-tolerance pairs.
///
/// The score is the m/z distance normalized by the tolerance half-width,
/// optionally plus `intensity_weight` times the relative intensity difference
/// `|a - b| / max(a, b)` between the candidate and the track's last connected
/// peak.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoredBestFirst {
    /// Peaks below this intensity are discarded before matching
    pub min_height: f64,
    /// Weight of the intensity term (0 disables it)
    pub intensity_weight: f64,
}

impl ScoredBestFirst {
    fn score(&self, track: &Track, peak: &Peak, half_width: f64) -> f64 {
        let distance = (peak.mz - track.last_mz()).abs();
        let mut score = if half_width > 0.0 {
            distance / half_width
        } else {
            distance
        };

        if self.intensity_weight > 0.0 {
            let a = track.last_intensity();
            let b = peak.intensity;
            let larger = a.abs().max(b.abs());
            if larger > 0.0 {
                score += self.intensity_weight * (a - b).abs() / larger;
            }
        }

        score
    }

    /// All in-tolerance pairs between `tracks` and the unclaimed candidates
    pub fn scores(
        &self,
        tracks: &[Track],
        candidates: &CandidateSet,
        tolerance: &MzTolerance,
    ) -> Vec<MatchScore> {
        let mut scores = Vec::new();

        for (track_index, track) in tracks.iter().enumerate() {
            let center = track.last_mz();
            let range = tolerance.range(center);
            let half_width = tolerance.half_width(center);

            for index in candidates.lower_bound(range.lo)..candidates.len() {
                let peak = candidates.peak(index);
                if peak.mz > range.hi {
                    break;
                }
                if candidates.is_claimed(index) {
                    continue;
                }
                scores.push(MatchScore {
                    track: track_index,
                    candidate: index,
                    score: self.score(track, peak, half_width),
                });
            }
        }

        scores
    }
}

impl MatchEngine for ScoredBestFirst {
    fn propose(
        &self,
        tracks: &[Track],
        candidates: &CandidateSet,
        tolerance: &MzTolerance,
    ) -> Vec<Assignment> {
        let mut scores = self.scores(tracks, candidates, tolerance);
        // Consuming a sorted list front to back is the same as repeatedly
        // popping the minimum from a heap.
        scores.sort_by(MatchScore::rank);

        let mut track_taken = vec![false; tracks.len()];
        let mut candidate_taken = candidates.claimed_flags().to_vec();
        let mut assignments = Vec::with_capacity(tracks.len().min(candidates.len()));

        for pair in scores {
            if track_taken[pair.track] || candidate_taken[pair.candidate] {
                continue;
            }
            track_taken[pair.track] = true;
            candidate_taken[pair.candidate] = true;
            assignments.push(Assignment {
                track: pair.track,
                candidate: pair.candidate,
            });
        }

        assignments
    }

    fn min_candidate_height(&self) -> f64 {
        self.min_height
    }
}
