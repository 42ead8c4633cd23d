//! # Match Engine
//!
//! Given the open tracks and the current scan's candidates, a match engine
//! proposes which candidate (if any) continues which track. Engines only read
//! their inputs; the caller applies the proposals.
//!
//! Two strategies are provided:
//!
//! 1. **Greedy highest intensity** ([`GreedyHighestIntensity`]): tracks are
//!    visited in creation order and each takes the most intense unclaimed
//!    candidate inside its tolerance window.
//!
//! 2. **Scored best first** ([`ScoredBestFirst`]): every in-tolerance
//!    (track, candidate) pair is scored, and pairs are accepted globally from
//!    the lowest score up while both sides are still free. This is a greedy
//!    approximation of minimum-cost bipartite matching, not an optimal
//!    assignment; it can lose to a Hungarian-style solver on crowded windows
//!    but costs `O(n log n)` in the number of in-tolerance pairs instead of
//!    cubic time.
//!
//! Both guarantee exclusivity within one scan: a candidate goes to at most one
//! track and a track receives at most one candidate.
//!
//! ## Precondition
//!
//! Candidates are scanned from the lower edge of the tolerance window upwards
//! and the scan stops at the first m/z above the upper edge. This is only
//! valid because every [`MzTolerance`] is symmetric and monotonic in m/z.

mod greedy;
mod scored;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::candidate::CandidateSet;
use crate::tolerance::MzTolerance;
use crate::track::Track;

pub use greedy::GreedyHighestIntensity;
pub use scored::{MatchScore, ScoredBestFirst};

/// A proposed (track, candidate) pairing for the current scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Assignment {
    /// Index of the track in the open-track slice
    pub track: usize,
    /// Index of the candidate in the scan's [`CandidateSet`]
    pub candidate: usize,
}

/// Common interface of the matching strategies
pub trait MatchEngine {
    /// Propose assignments for one scan.
    ///
    /// Candidates already claimed in `candidates` are never proposed.
    fn propose(
        &self,
        tracks: &[Track],
        candidates: &CandidateSet,
        tolerance: &MzTolerance,
    ) -> Vec<Assignment>;

    /// Minimum intensity a peak needs to become a candidate at all
    fn min_candidate_height(&self) -> f64 {
        0.0
    }
}

/// Strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Each track takes the most intense candidate in its window
    GreedyHighestIntensity,
    /// Globally best-scored pairs are accepted first
    ScoredBestFirst {
        /// Peaks below this intensity are discarded before matching
        #[serde(default)]
        min_height: f64,
        /// Weight of the relative intensity difference in the score (0 disables it)
        #[serde(default)]
        intensity_weight: f64,
    },
}

impl Default for MatchStrategy {
    fn default() -> Self {
        MatchStrategy::GreedyHighestIntensity
    }
}

impl MatchStrategy {
    /// Scored strategy with only the m/z distance in the score
    pub fn scored(min_height: f64) -> Self {
        MatchStrategy::ScoredBestFirst {
            min_height,
            intensity_weight: 0.0,
        }
    }

    /// Short human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            MatchStrategy::GreedyHighestIntensity => "greedy-highest-intensity",
            MatchStrategy::ScoredBestFirst { .. } => "scored-best-first",
        }
    }

    /// Check strategy parameters
    pub fn validate(&self) -> Result<(), String> {
        if let MatchStrategy::ScoredBestFirst {
            min_height,
            intensity_weight,
        } = *self
        {
            if !(min_height >= 0.0) || !min_height.is_finite() {
                return Err(format!("min_height must be a non-negative number, got {}", min_height));
            }
            if !(intensity_weight >= 0.0) || !intensity_weight.is_finite() {
                return Err(format!(
                    "intensity_weight must be a non-negative number, got {}",
                    intensity_weight
                ));
            }
        }
        Ok(())
    }
}

impl MatchEngine for MatchStrategy {
    fn propose(
        &self,
        tracks: &[Track],
        candidates: &CandidateSet,
        tolerance: &MzTolerance,
    ) -> Vec<Assignment> {
        match *self {
            MatchStrategy::GreedyHighestIntensity => {
                GreedyHighestIntensity.propose(tracks, candidates, tolerance)
            }
            MatchStrategy::ScoredBestFirst {
                min_height,
                intensity_weight,
            } => ScoredBestFirst {
                min_height,
                intensity_weight,
            }
            .propose(tracks, candidates, tolerance),
        }
    }

    fn min_candidate_height(&self) -> f64 {
        match *self {
            MatchStrategy::GreedyHighestIntensity => 0.0,
            MatchStrategy::ScoredBestFirst { min_height, .. } => min_height,
        }
    }
}
