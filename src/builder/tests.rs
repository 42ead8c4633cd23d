use super::*;
use crate::matching::MatchStrategy;
use crate::peak::{Peak, Scan};
use crate::tolerance::MzTolerance;
use crate::track::PointKind;

fn config() -> BuilderConfig {
    BuilderConfig::new(MzTolerance::absolute(0.01).unwrap(), 1.5)
}

/// Scan at retention time == index, scan number == index + 1
fn scan(index: usize, peaks: &[(f64, f64)]) -> Scan {
    Scan::new(
        index as i64 + 1,
        index as f64,
        peaks.iter().map(|&(mz, i)| Peak::new(mz, i)).collect(),
    )
}

fn feed(builder: &mut TraceBuilder, scans: &[Scan]) {
    for s in scans {
        builder.process_scan(s).unwrap();
    }
}

fn kinds(trace: &FinishedTrace) -> Vec<PointKind> {
    trace.points.iter().map(|p| p.kind).collect()
}

#[test]
fn test_continuous_trace() {
    let scans: Vec<Scan> = (0..5).map(|i| scan(i, &[(100.0, 1000.0)])).collect();
    let set = build_traces(&scans, config()).unwrap();

    assert_eq!(set.len(), 1);
    let trace = &set.traces[0];
    assert_eq!(trace.len(), 5);
    assert!(trace.points.iter().all(|p| p.is_connected()));
    assert_eq!(set.stats.points_connected, 4);
    assert_eq!(set.stats.tracks_started, 1);
    assert_eq!(set.stats.traces_emitted, 1);
}

#[test]
fn test_idle_track_is_padded_once() {
    let scans = vec![
        scan(0, &[(100.0, 1000.0)]),
        scan(1, &[(100.0, 1200.0)]),
        scan(2, &[(100.0, 900.0)]),
        scan(3, &[(200.0, 500.0)]),
        scan(4, &[(200.0, 500.0)]),
    ];
    let mut builder = TraceBuilder::new(config()).unwrap();
    feed(&mut builder, &scans);

    let track = &builder.open_tracks()[0];
    assert_eq!(track.points().len(), 4);
    assert!(track.ends_with_gap());
    assert_eq!(track.last_point().intensity, 0.0);
    assert_eq!(track.last_point().mz, 100.0);
    assert_eq!(track.last_point().scan_index, 3);
    assert_eq!(builder.stats().gap_points, 1);
}

#[test]
fn test_trailing_gap_is_kept() {
    let scans = vec![
        scan(0, &[(100.0, 1000.0)]),
        scan(1, &[(100.0, 1200.0)]),
        scan(2, &[(100.0, 900.0)]),
        scan(3, &[(300.0, 500.0)]),
    ];
    let set = build_traces(&scans, config()).unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(
        kinds(&set.traces[0]),
        vec![
            PointKind::Connected,
            PointKind::Connected,
            PointKind::Connected,
            PointKind::Gap
        ]
    );
}

#[test]
fn test_short_run_is_trimmed_back_to_gap() {
    let scans = vec![
        scan(0, &[(100.0, 1000.0)]),
        scan(1, &[(100.0, 1200.0)]),
        scan(2, &[(100.0, 900.0)]),
        scan(3, &[(200.0, 500.0)]),
        // a single reconnected point, then the track goes idle again
        scan(4, &[(100.003, 800.0)]),
        scan(5, &[(200.0, 500.0)]),
    ];
    let mut builder = TraceBuilder::new(config()).unwrap();
    feed(&mut builder, &scans);

    let track = builder
        .open_tracks()
        .iter()
        .find(|t| t.id() == 0)
        .unwrap();
    assert_eq!(track.points().len(), 4);
    assert!(track.ends_with_gap());
    assert_eq!(track.last_mz(), 100.0);
    assert_eq!(builder.stats().runs_trimmed, 1);
}

#[test]
fn test_single_point_track_is_discarded() {
    let scans = vec![scan(0, &[(100.0, 1000.0)]), scan(1, &[(200.0, 500.0)])];
    let mut builder = TraceBuilder::new(config()).unwrap();
    feed(&mut builder, &scans);

    assert_eq!(builder.open_tracks().len(), 1);
    assert_eq!(builder.open_tracks()[0].last_mz(), 200.0);
    assert_eq!(builder.stats().tracks_discarded, 1);

    let set = builder.finish();
    assert!(set.is_empty());
    assert_eq!(set.stats.tracks_discarded, 2);
}

#[test]
fn test_new_track_is_checked_on_its_first_missed_scan() {
    let scans = vec![
        scan(0, &[(100.0, 1000.0)]),
        scan(1, &[(200.0, 500.0)]),
        scan(2, &[(100.0, 1000.0)]),
        scan(3, &[(100.0, 1000.0)]),
    ];
    let config = BuilderConfig::new(MzTolerance::absolute(0.01).unwrap(), 1.0);
    let mut builder = TraceBuilder::new(config).unwrap();

    feed(&mut builder, &scans[..2]);
    assert_eq!(builder.open_tracks().len(), 1);
    assert_eq!(builder.stats().tracks_discarded, 1);

    feed(&mut builder, &scans[2..]);
    let set = builder.finish();

    // the peak at scan 0 does not bridge the miss at scan 1
    assert_eq!(set.len(), 1);
    let indices: Vec<usize> = set.traces[0].points.iter().map(|p| p.scan_index).collect();
    assert_eq!(indices, vec![2, 3]);
    assert!(set.traces[0].points.iter().all(|p| p.is_connected()));
    assert_eq!(set.stats.tracks_discarded, 2);
}

#[test]
fn test_seeded_track_dropped_while_older_track_is_padded() {
    let scans = vec![
        scan(0, &[(100.0, 1000.0)]),
        scan(1, &[(100.0, 1000.0), (200.0, 500.0)]),
        scan(2, &[(200.0, 500.0), (300.0, 10.0)]),
        scan(3, &[(100.0, 900.0), (200.0, 500.0)]),
    ];
    let config = BuilderConfig::new(MzTolerance::absolute(0.01).unwrap(), 1.0);
    let mut builder = TraceBuilder::new(config).unwrap();
    feed(&mut builder, &scans);

    // the 300 m/z track seeded at scan 2 is dropped at scan 3
    assert!(builder.open_tracks().iter().all(|t| t.last_mz() != 300.0));

    let track = builder.open_tracks().iter().find(|t| t.id() == 0).unwrap();
    let kinds: Vec<(usize, PointKind)> = track
        .points()
        .iter()
        .map(|p| (p.scan_index, p.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (0, PointKind::Connected),
            (1, PointKind::Connected),
            (2, PointKind::Gap),
            (3, PointKind::Connected),
        ]
    );
}

#[test]
fn test_equal_retention_times_share_a_trace() {
    let scans = vec![
        Scan::new(1, 1.0, vec![Peak::new(100.0, 10.0)]),
        Scan::new(2, 1.0, vec![Peak::new(100.0, 20.0)]),
        Scan::new(3, 2.0, vec![Peak::new(100.0, 10.0)]),
    ];
    let config = BuilderConfig::new(MzTolerance::absolute(0.01).unwrap(), 1.0);
    let set = build_traces(&scans, config).unwrap();

    assert_eq!(set.len(), 1);
    let trace = &set.traces[0];
    let times: Vec<f64> = trace.points.iter().map(|p| p.retention_time).collect();
    let indices: Vec<usize> = trace.points.iter().map(|p| p.scan_index).collect();
    assert_eq!(times, vec![1.0, 1.0, 2.0]);
    assert_eq!(indices, vec![0, 1, 2]);
    // no time elapses between the first two points
    assert_eq!(trace.area, 15.0);
}

#[test]
fn test_short_last_run_trimmed_at_finish() {
    let scans = vec![
        scan(0, &[(100.0, 1000.0)]),
        scan(1, &[(100.0, 1200.0)]),
        scan(2, &[(100.0, 900.0)]),
        scan(3, &[(200.0, 500.0)]),
        scan(4, &[(100.0, 700.0)]),
    ];
    let set = build_traces(&scans, config()).unwrap();

    assert_eq!(set.len(), 1);
    let trace = &set.traces[0];
    assert_eq!(trace.len(), 4);
    assert!(trace.points[3].is_gap());
    assert_eq!(trace.height, 1200.0);
    assert_eq!(set.stats.runs_trimmed, 1);
}

#[test]
fn test_empty_scan_closes_tracks() {
    let mut scans: Vec<Scan> = (0..3).map(|i| scan(i, &[(100.0, 1000.0)])).collect();
    scans.push(scan(3, &[]));
    scans.extend((4..7).map(|i| scan(i, &[(100.0, 1000.0)])));

    let mut builder = TraceBuilder::new(config()).unwrap();
    feed(&mut builder, &scans[..4]);
    assert!(builder.open_tracks().is_empty());
    assert_eq!(builder.finished_traces().len(), 1);

    feed(&mut builder, &scans[4..]);
    let set = builder.finish();

    assert_eq!(set.len(), 2);
    assert_eq!(set.stats.empty_scans, 1);
    assert_eq!(set.stats.gap_points, 0);
    for trace in &set.traces {
        assert_eq!(trace.len(), 3);
        assert!(trace.points.iter().all(|p| p.is_connected()));
    }
    assert_eq!(set.traces[0].start_time(), 0.0);
    assert_eq!(set.traces[1].start_time(), 4.0);
}

#[test]
fn test_missing_peak_list() {
    let mut builder = TraceBuilder::new(config()).unwrap();
    builder.process_scan(&scan(0, &[(100.0, 1.0)])).unwrap();

    let err = builder
        .process_scan(&Scan::without_peaks(42, 1.0))
        .unwrap_err();
    assert_eq!(
        err,
        BuildError::MissingInput {
            scan_index: 1,
            scan_number: 42
        }
    );
    assert!(!err.is_configuration());
}

#[test]
fn test_retention_time_must_not_decrease() {
    let mut builder = TraceBuilder::new(config()).unwrap();
    builder.process_scan(&Scan::new(1, 2.0, vec![])).unwrap();
    builder.process_scan(&Scan::new(2, 2.0, vec![])).unwrap();

    let err = builder.process_scan(&Scan::new(3, 1.0, vec![])).unwrap_err();
    assert!(matches!(
        err,
        BuildError::UnorderedScan {
            scan_number: 3,
            ..
        }
    ));
}

#[test]
fn test_non_finite_retention_time() {
    let mut builder = TraceBuilder::new(config()).unwrap();
    let err = builder
        .process_scan(&Scan::new(7, f64::NAN, vec![Peak::new(100.0, 1.0)]))
        .unwrap_err();
    assert_eq!(err, BuildError::InvalidRetentionTime { scan_number: 7 });
}

#[test]
fn test_invalid_config_rejected() {
    let tol = MzTolerance::absolute(0.01).unwrap();

    let err = TraceBuilder::new(BuilderConfig::new(tol, 0.0)).unwrap_err();
    assert!(err.is_configuration());

    let err = TraceBuilder::new(BuilderConfig::new(tol, f64::NAN)).unwrap_err();
    assert!(err.is_configuration());

    let err = TraceBuilder::new(BuilderConfig::new(tol, 1.0).with_min_highest_point(-1.0))
        .unwrap_err();
    assert!(err.is_configuration());

    let bad_tol = MzTolerance::Absolute { mz: -0.5 };
    let err = TraceBuilder::new(BuilderConfig::new(bad_tol, 1.0)).unwrap_err();
    assert!(matches!(err, BuildError::Tolerance(_)));
}

#[test]
fn test_min_highest_point_filter() {
    let scans: Vec<Scan> = (0..4)
        .map(|i| scan(i, &[(100.0, 50.0), (200.0, 5000.0)]))
        .collect();
    let set = build_traces(&scans, config().with_min_highest_point(100.0)).unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(set.traces[0].apex_mz, 200.0);
    assert_eq!(set.stats.tracks_discarded, 1);
}

#[test]
fn test_scored_min_height_filters_candidates() {
    let scans: Vec<Scan> = (0..4)
        .map(|i| scan(i, &[(100.0, 50.0), (200.0, 5000.0)]))
        .collect();
    let config = config().with_strategy(MatchStrategy::scored(100.0));
    let set = build_traces(&scans, config).unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(set.stats.peaks_seen, 8);
    assert_eq!(set.stats.peaks_rejected, 4);
    assert_eq!(set.stats.tracks_started, 1);
}

#[test]
fn test_output_order() {
    let scans: Vec<Scan> = (0..3)
        .map(|i| scan(i, &[(100.0, 10.0), (300.0, 30.0), (200.0, 20.0)]))
        .collect();
    let set = build_traces(&scans, config()).unwrap();

    let mzs: Vec<f64> = set.traces.iter().map(|t| t.apex_mz).collect();
    assert_eq!(mzs, vec![100.0, 200.0, 300.0]);
}

#[test]
fn test_trace_summary() {
    let scans = vec![
        scan(0, &[(100.0, 10.0)]),
        scan(1, &[(100.002, 30.0)]),
        scan(2, &[(100.004, 10.0)]),
    ];
    let set = build_traces(&scans, config()).unwrap();
    let trace = &set.traces[0];

    assert_eq!(trace.apex_mz, 100.002);
    assert_eq!(trace.apex_time, 1.0);
    assert_eq!(trace.height, 30.0);
    assert_eq!(trace.area, 40.0);
    assert_eq!(trace.rt_range, (0.0, 2.0));
}

#[test]
fn test_run_cancelled_before_start() {
    let scans: Vec<Scan> = (0..5).map(|i| scan(i, &[(100.0, 1.0)])).collect();
    let token = CancellationToken::new();
    token.cancel();

    let outcome = TraceBuilder::new(config())
        .unwrap()
        .run(&scans, &token)
        .unwrap();
    assert!(outcome.is_cancelled());
    assert!(outcome.into_traces().is_none());
}

#[test]
fn test_run_cancelled_mid_stream() {
    let scans: Vec<Scan> = (0..5).map(|i| scan(i, &[(100.0, 1.0)])).collect();
    let token = CancellationToken::new();
    let observer = token.clone();

    let stream = scans.iter().inspect(|s| {
        if s.scan_number == 3 {
            observer.cancel();
        }
    });
    let outcome = TraceBuilder::new(config())
        .unwrap()
        .run(stream, &token)
        .unwrap();

    match outcome {
        BuildOutcome::Cancelled { scans_processed } => assert_eq!(scans_processed, 2),
        BuildOutcome::Completed(_) => panic!("run should have been cancelled"),
    }
}

#[test]
fn test_run_completes() {
    let scans: Vec<Scan> = (0..5).map(|i| scan(i, &[(100.0, 1.0)])).collect();
    let outcome = TraceBuilder::new(config())
        .unwrap()
        .run(scans, &CancellationToken::new())
        .unwrap();

    let set = outcome.into_traces().unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.stats.scans_processed, 5);
}

#[test]
fn test_progress() {
    let mut builder = TraceBuilder::new(config().with_progress_interval(2))
        .unwrap()
        .with_total_scans(10);
    assert_eq!(builder.progress(), (0, 10));

    feed(&mut builder, &[scan(0, &[]), scan(1, &[]), scan(2, &[])]);
    assert_eq!(builder.progress(), (3, 10));
}

#[test]
fn test_finalize_single_track() {
    let point = |i: usize, intensity: f64| crate::track::TracePoint {
        scan_index: i,
        scan_number: i as i64,
        retention_time: i as f64,
        mz: 100.0,
        intensity,
        kind: PointKind::Connected,
    };
    let mut track = Track::start(0, point(0, 5.0));
    assert!(finalize(track.clone(), &config()).is_none());

    track.connect(point(1, 8.0));
    track.connect(point(2, 6.0));
    let trace = finalize(track, &config()).unwrap();
    assert_eq!(trace.height, 8.0);
}

#[cfg(feature = "parallel")]
#[test]
fn test_build_runs_in_parallel() {
    let run = |mz: f64| -> Vec<Scan> { (0..4).map(|i| scan(i, &[(mz, 10.0)])).collect() };
    let results = build_runs(
        vec![run(100.0), run(200.0), run(300.0)],
        &config(),
        &CancellationToken::new(),
    );

    let apexes: Vec<f64> = results
        .into_iter()
        .map(|r| r.unwrap().into_traces().unwrap().traces[0].apex_mz)
        .collect();
    assert_eq!(apexes, vec![100.0, 200.0, 300.0]);
}
