use super::*;
use crate::peak::Peak;
use crate::track::{PointKind, TracePoint};
use std::collections::HashSet;

fn track(id: usize, mz: f64, intensity: f64) -> Track {
    Track::start(
        id,
        TracePoint {
            scan_index: 0,
            scan_number: 1,
            retention_time: 0.0,
            mz,
            intensity,
            kind: PointKind::Connected,
        },
    )
}

fn candidates(peaks: &[(f64, f64)]) -> CandidateSet {
    let peaks: Vec<Peak> = peaks.iter().map(|&(mz, i)| Peak::new(mz, i)).collect();
    CandidateSet::from_peaks(&peaks, 0.0)
}

fn tol(mz: f64) -> MzTolerance {
    MzTolerance::absolute(mz).unwrap()
}

fn assert_exclusive(assignments: &[Assignment]) {
    let tracks: HashSet<usize> = assignments.iter().map(|a| a.track).collect();
    let cands: HashSet<usize> = assignments.iter().map(|a| a.candidate).collect();
    assert_eq!(tracks.len(), assignments.len(), "track assigned twice");
    assert_eq!(cands.len(), assignments.len(), "candidate assigned twice");
}

#[test]
fn test_greedy_prefers_highest_intensity() {
    let tracks = vec![track(0, 100.000, 100.0)];
    let set = candidates(&[(100.000, 50.0), (100.005, 200.0)]);

    let proposed = GreedyHighestIntensity.propose(&tracks, &set, &tol(0.01));
    assert_eq!(proposed, vec![Assignment { track: 0, candidate: 1 }]);
}

#[test]
fn test_greedy_intensity_tie_prefers_closest_mz() {
    let tracks = vec![track(0, 100.000, 100.0)];
    let set = candidates(&[(99.992, 80.0), (100.003, 80.0), (100.009, 80.0)]);

    let proposed = GreedyHighestIntensity.propose(&tracks, &set, &tol(0.01));
    assert_eq!(proposed, vec![Assignment { track: 0, candidate: 1 }]);
}

#[test]
fn test_greedy_full_tie_prefers_lowest_index() {
    // exactly representable distances so the m/z tie is exact too
    let tracks = vec![track(0, 100.0, 100.0)];
    let set = candidates(&[(99.5, 80.0), (100.5, 80.0)]);

    let proposed = GreedyHighestIntensity.propose(&tracks, &set, &tol(1.0));
    assert_eq!(proposed, vec![Assignment { track: 0, candidate: 0 }]);
}

#[test]
fn test_greedy_visits_tracks_in_creation_order() {
    // both tracks see both candidates; the first track gets the intense one
    let tracks = vec![track(0, 100.000, 1.0), track(1, 100.008, 1.0)];
    let set = candidates(&[(100.001, 10.0), (100.007, 500.0)]);

    let proposed = GreedyHighestIntensity.propose(&tracks, &set, &tol(0.01));
    assert_eq!(
        proposed,
        vec![
            Assignment { track: 0, candidate: 1 },
            Assignment { track: 1, candidate: 0 },
        ]
    );
}

#[test]
fn test_scored_prefers_globally_closest_pairs() {
    let tracks = vec![track(0, 100.000, 1.0), track(1, 100.008, 1.0)];
    let set = candidates(&[(100.001, 10.0), (100.007, 500.0)]);

    let mut proposed = ScoredBestFirst::default().propose(&tracks, &set, &tol(0.01));
    proposed.sort_by_key(|a| a.track);
    assert_eq!(
        proposed,
        vec![
            Assignment { track: 0, candidate: 0 },
            Assignment { track: 1, candidate: 1 },
        ]
    );
}

#[test]
fn test_scored_intensity_weight_changes_choice() {
    let tracks = vec![track(0, 100.000, 1000.0)];
    // closer in m/z but far off in intensity vs. slightly further and similar
    let set = candidates(&[(100.001, 10.0), (100.004, 950.0)]);

    let plain = ScoredBestFirst::default().propose(&tracks, &set, &tol(0.01));
    assert_eq!(plain[0].candidate, 0);

    let weighted = ScoredBestFirst {
        min_height: 0.0,
        intensity_weight: 1.0,
    }
    .propose(&tracks, &set, &tol(0.01));
    assert_eq!(weighted[0].candidate, 1);
}

#[test]
fn test_scored_only_materializes_in_tolerance_pairs() {
    let tracks = vec![track(0, 100.0, 1.0), track(1, 200.0, 1.0)];
    let set = candidates(&[(100.02, 1.0), (100.005, 1.0), (199.999, 1.0), (300.0, 1.0)]);

    let scores = ScoredBestFirst::default().scores(&tracks, &set, &tol(0.01));
    assert_eq!(scores.len(), 2);
    assert!(scores.iter().all(|s| s.score <= 1.0));
}

#[test]
fn test_no_candidate_in_window() {
    let tracks = vec![track(0, 100.0, 1.0)];
    let set = candidates(&[(100.5, 1.0)]);

    assert!(GreedyHighestIntensity.propose(&tracks, &set, &tol(0.01)).is_empty());
    assert!(ScoredBestFirst::default().propose(&tracks, &set, &tol(0.01)).is_empty());
}

#[test]
fn test_claimed_candidates_are_skipped() {
    let tracks = vec![track(0, 100.0, 1.0)];
    let mut set = candidates(&[(100.0, 500.0), (100.002, 5.0)]);
    set.claim(0);

    let greedy = GreedyHighestIntensity.propose(&tracks, &set, &tol(0.01));
    assert_eq!(greedy, vec![Assignment { track: 0, candidate: 1 }]);

    let scored = ScoredBestFirst::default().propose(&tracks, &set, &tol(0.01));
    assert_eq!(scored, vec![Assignment { track: 0, candidate: 1 }]);
}

#[test]
fn test_exclusivity_in_crowded_window() {
    let tracks: Vec<Track> = (0..6).map(|i| track(i, 100.0 + i as f64 * 0.001, 1.0)).collect();
    let set = candidates(&[
        (100.000, 5.0),
        (100.002, 7.0),
        (100.003, 7.0),
        (100.004, 1.0),
    ]);

    for strategy in [MatchStrategy::GreedyHighestIntensity, MatchStrategy::scored(0.0)] {
        let proposed = strategy.propose(&tracks, &set, &tol(0.05));
        assert_eq!(proposed.len(), 4);
        assert_exclusive(&proposed);
    }
}

#[test]
fn test_strategy_min_candidate_height() {
    assert_eq!(MatchStrategy::GreedyHighestIntensity.min_candidate_height(), 0.0);
    assert_eq!(MatchStrategy::scored(250.0).min_candidate_height(), 250.0);
}

#[test]
fn test_strategy_validation() {
    assert!(MatchStrategy::GreedyHighestIntensity.validate().is_ok());
    assert!(MatchStrategy::scored(0.0).validate().is_ok());
    assert!(MatchStrategy::scored(-1.0).validate().is_err());
    assert!(MatchStrategy::ScoredBestFirst {
        min_height: 0.0,
        intensity_weight: f64::NAN
    }
    .validate()
    .is_err());
}

#[test]
fn test_strategy_serde() {
    let strategy: MatchStrategy =
        serde_json::from_str(r#"{"kind":"scored_best_first","min_height":1000.0}"#).unwrap();
    assert_eq!(
        strategy,
        MatchStrategy::ScoredBestFirst {
            min_height: 1000.0,
            intensity_weight: 0.0
        }
    );

    let strategy: MatchStrategy =
        serde_json::from_str(r#"{"kind":"greedy_highest_intensity"}"#).unwrap();
    assert_eq!(strategy, MatchStrategy::GreedyHighestIntensity);
    assert_eq!(strategy.name(), "greedy-highest-intensity");
}
