//! Per-scan candidate arena.
//!
//! A [`CandidateSet`] wraps the peaks of the scan currently being processed.
//! Peaks are stored in ascending m/z order and addressed by their position in
//! that order; a parallel `claimed` bitset records which positions have been
//! consumed by a track. The set lives for exactly one scan.

use crate::peak::Peak;

/// Peaks of one scan, sorted by m/z, with a claimed flag per position
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    peaks: Vec<Peak>,
    claimed: Vec<bool>,
    rejected: usize,
}

impl CandidateSet {
    /// Build the candidate set for one scan.
    ///
    /// Peaks with non-finite coordinates or an intensity below `min_height`
    /// are left out. The remaining peaks are sorted by ascending m/z; peaks
    /// with identical m/z keep their input order.
    pub fn from_peaks(peaks: &[Peak], min_height: f64) -> Self {
        let mut kept: Vec<Peak> = peaks
            .iter()
            .filter(|p| p.is_finite() && p.intensity >= min_height)
            .copied()
            .collect();
        kept.sort_by(|a, b| a.mz.total_cmp(&b.mz));

        let rejected = peaks.len() - kept.len();
        let claimed = vec![false; kept.len()];
        Self {
            peaks: kept,
            claimed,
            rejected,
        }
    }

    /// Number of candidates
    #[inline]
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    /// Whether the scan contributed no candidates
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Number of input peaks filtered out while building the set
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Candidate peak at `index`
    #[inline]
    pub fn peak(&self, index: usize) -> &Peak {
        &self.peaks[index]
    }

    /// All candidate peaks in ascending m/z order
    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    /// Whether the candidate at `index` has already been claimed
    #[inline]
    pub fn is_claimed(&self, index: usize) -> bool {
        self.claimed[index]
    }

    /// Snapshot of the claimed bitset
    pub fn claimed_flags(&self) -> &[bool] {
        &self.claimed
    }

    /// Mark the candidate at `index` as claimed.
    ///
    /// Returns `false` if it was claimed already.
    pub fn claim(&mut self, index: usize) -> bool {
        !std::mem::replace(&mut self.claimed[index], true)
    }

    /// Index of the first candidate whose m/z is not below `mz`
    #[inline]
    pub fn lower_bound(&self, mz: f64) -> usize {
        self.peaks.partition_point(|p| p.mz < mz)
    }

    /// Iterator over unclaimed candidates with their indices
    pub fn unclaimed(&self) -> impl Iterator<Item = (usize, &Peak)> + '_ {
        self.peaks
            .iter()
            .enumerate()
            .filter(move |(i, _)| !self.claimed[*i])
    }

    /// Number of candidates not yet claimed
    pub fn unclaimed_count(&self) -> usize {
        self.claimed.iter().filter(|c| !**c).count()
    }
}
