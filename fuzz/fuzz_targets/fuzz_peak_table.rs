#![no_main]

use libfuzzer_sys::fuzz_target;
use mztrace::builder::{build_traces, BuilderConfig};
use mztrace::peak_table::PeakTableReader;
use mztrace::tolerance::MzTolerance;

fuzz_target!(|data: &[u8]| {
    // Malformed tables must surface as errors, never as panics
    let scans = match PeakTableReader::new().read(data) {
        Ok(scans) => scans,
        Err(_) => return,
    };

    let Ok(tolerance) = MzTolerance::ppm(10.0) else {
        return;
    };
    let config = BuilderConfig::new(tolerance, 0.05).with_progress_interval(0);

    // Unordered scans and missing peak lists are rejected by the builder
    if let Ok(set) = build_traces(&scans, config) {
        for trace in &set.traces {
            for pair in trace.points.windows(2) {
                assert!(pair[1].scan_index > pair[0].scan_index);
                assert!(pair[1].retention_time >= pair[0].retention_time);
                // connected runs never skip a scan
                if pair[0].is_connected() {
                    assert_eq!(pair[1].scan_index, pair[0].scan_index + 1);
                }
            }
        }
    }
});
