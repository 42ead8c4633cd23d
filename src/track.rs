//! # Tracks and Finished Traces
//!
//! A [`Track`] is a trace under construction. Its points are one per scan, in
//! strictly increasing scan order, and fall into *connected runs* separated by
//! synthetic zero-intensity gap markers:
//!
//! ```text
//! C C C C G C C        C = connected peak, G = gap marker
//! \_____/   \_/
//!  run 1    run 2 (current run)
//! ```
//!
//! Matching always compares candidates against `last_mz`, the m/z of the most
//! recently connected point, so a track follows slow m/z drift.

use serde::{Deserialize, Serialize};

use crate::tolerance::MzRange;

/// Whether a trace point is a real peak or a synthetic gap marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    /// Peak connected from the scan's candidate set
    Connected,
    /// Zero-intensity marker inserted for a scan where the track was not extended
    Gap,
}

/// One point of a trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    /// Position of the scan in the processed stream
    pub scan_index: usize,
    /// Native scan number
    pub scan_number: i64,
    /// Scan acquisition time
    pub retention_time: f64,
    /// m/z of the peak (last connected m/z for gap markers)
    pub mz: f64,
    /// Intensity of the peak (0 for gap markers)
    pub intensity: f64,
    /// Connected peak or gap marker
    pub kind: PointKind,
}

impl TracePoint {
    /// Whether this point is a connected peak
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.kind == PointKind::Connected
    }

    /// Whether this point is a gap marker
    #[inline]
    pub fn is_gap(&self) -> bool {
        self.kind == PointKind::Gap
    }
}

/// A trace under construction
#[derive(Debug, Clone)]
pub struct Track {
    id: usize,
    points: Vec<TracePoint>,
    growing: bool,
    last_mz: f64,
    last_intensity: f64,
}

impl Track {
    /// Start a new track from a single connected point.
    ///
    /// A seeded track is not growing, so the next scan that misses it puts it
    /// through the idle checks.
    pub fn start(id: usize, point: TracePoint) -> Self {
        debug_assert!(point.is_connected());
        Self {
            id,
            points: vec![point],
            growing: false,
            last_mz: point.mz,
            last_intensity: point.intensity,
        }
    }

    /// Creation sequence number of this track
    pub fn id(&self) -> usize {
        self.id
    }

    /// Points in scan order
    pub fn points(&self) -> &[TracePoint] {
        &self.points
    }

    /// m/z of the most recently connected point
    #[inline]
    pub fn last_mz(&self) -> f64 {
        self.last_mz
    }

    /// Intensity of the most recently connected point
    #[inline]
    pub fn last_intensity(&self) -> f64 {
        self.last_intensity
    }

    /// Whether a candidate was connected during the current scan
    #[inline]
    pub fn is_growing(&self) -> bool {
        self.growing
    }

    /// Clear the per-scan growing flag
    pub fn reset_growing(&mut self) {
        self.growing = false;
    }

    /// Last point of the track (connected or gap)
    pub fn last_point(&self) -> &TracePoint {
        // a track is never empty: it starts with one point and trimming
        // always leaves the earlier run in place
        &self.points[self.points.len() - 1]
    }

    /// Whether the track currently ends with a gap marker
    pub fn ends_with_gap(&self) -> bool {
        self.last_point().is_gap()
    }

    /// Append a connected point and mark the track as growing
    pub fn connect(&mut self, point: TracePoint) {
        debug_assert!(point.is_connected());
        debug_assert!(point.scan_index > self.last_point().scan_index);
        self.last_mz = point.mz;
        self.last_intensity = point.intensity;
        self.growing = true;
        self.points.push(point);
    }

    /// Append a zero-intensity gap marker for the given scan
    pub fn pad_gap(&mut self, scan_index: usize, scan_number: i64, retention_time: f64) {
        debug_assert!(scan_index > self.last_point().scan_index);
        self.points.push(TracePoint {
            scan_index,
            scan_number,
            retention_time,
            mz: self.last_mz,
            intensity: 0.0,
            kind: PointKind::Gap,
        });
    }

    /// Index range of the most recent connected run.
    ///
    /// Trailing gap markers are not part of the run.
    pub fn last_run(&self) -> std::ops::Range<usize> {
        let end = self
            .points
            .iter()
            .rposition(TracePoint::is_connected)
            .map_or(0, |i| i + 1);
        let start = self.points[..end]
            .iter()
            .rposition(TracePoint::is_gap)
            .map_or(0, |i| i + 1);
        start..end
    }

    /// Retention time span of the most recent connected run
    pub fn last_run_span(&self) -> f64 {
        let run = &self.points[self.last_run()];
        match (run.first(), run.last()) {
            (Some(first), Some(last)) => last.retention_time - first.retention_time,
            _ => 0.0,
        }
    }

    /// Whether an earlier connected run precedes the most recent one
    pub fn has_earlier_run(&self) -> bool {
        self.last_run().start > 0
    }

    /// Drop the most recent connected run.
    ///
    /// The gap marker that closed the earlier run stays in place, so the track
    /// keeps ending with a gap and `last_mz` reverts to the earlier run.
    /// Returns the number of points removed, or 0 if there is no earlier run
    /// to fall back to.
    pub fn trim_last_run(&mut self) -> usize {
        let run = self.last_run();
        if run.start == 0 {
            return 0;
        }
        let removed = self.points.len() - run.start;
        self.points.truncate(run.start);
        if let Some(last) = self.points.iter().rev().find(|p| p.is_connected()) {
            self.last_mz = last.mz;
            self.last_intensity = last.intensity;
        }
        removed
    }

    /// Number of connected points
    pub fn connected_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_connected()).count()
    }

    /// Consume the track and return its points
    pub fn into_points(self) -> Vec<TracePoint> {
        self.points
    }
}

/// A completed trace that passed the finalization filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedTrace {
    /// Creation sequence number of the originating track
    pub id: usize,
    /// Points in scan order, gap markers included
    pub points: Vec<TracePoint>,
    /// m/z of the most intense connected point (representative m/z)
    pub apex_mz: f64,
    /// Retention time of the most intense connected point
    pub apex_time: f64,
    /// Highest connected intensity
    pub height: f64,
    /// Mean m/z of connected points
    pub mean_mz: f64,
    /// Intensity-weighted mean m/z of connected points
    pub weighted_mz: f64,
    /// Trapezoidal area under the trace (intensity x time units)
    pub area: f64,
    /// m/z range of connected points
    pub mz_range: MzRange,
    /// Retention time range of connected points
    pub rt_range: (f64, f64),
}

impl FinishedTrace {
    /// Snapshot a track's points and compute its summary values.
    ///
    /// Returns `None` if the points contain no connected peak.
    pub fn from_points(id: usize, points: Vec<TracePoint>) -> Option<Self> {
        let mut connected = points.iter().filter(|p| p.is_connected());
        let first = connected.next()?;

        let mut apex = first;
        let mut mz_range = MzRange::new(first.mz, first.mz);
        let mut rt_range = (first.retention_time, first.retention_time);
        let mut mz_sum = first.mz;
        let mut weighted_sum = first.mz * first.intensity;
        let mut weight = first.intensity;
        let mut count = 1usize;

        for point in connected {
            if point.intensity > apex.intensity {
                apex = point;
            }
            mz_range = mz_range.span(&MzRange::new(point.mz, point.mz));
            rt_range.0 = rt_range.0.min(point.retention_time);
            rt_range.1 = rt_range.1.max(point.retention_time);
            mz_sum += point.mz;
            weighted_sum += point.mz * point.intensity;
            weight += point.intensity;
            count += 1;
        }

        let mean_mz = mz_sum / count as f64;
        let weighted_mz = if weight > 0.0 {
            weighted_sum / weight
        } else {
            mean_mz
        };

        let area = points
            .windows(2)
            .map(|w| {
                (w[1].retention_time - w[0].retention_time) * (w[0].intensity + w[1].intensity)
                    / 2.0
            })
            .sum();

        Some(Self {
            id,
            apex_mz: apex.mz,
            apex_time: apex.retention_time,
            height: apex.intensity,
            mean_mz,
            weighted_mz,
            area,
            mz_range,
            rt_range,
            points,
        })
    }

    /// Number of points, gap markers included
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the trace has no points (never true for finalized traces)
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Connected points only
    pub fn connected_points(&self) -> impl Iterator<Item = &TracePoint> + '_ {
        self.points.iter().filter(|p| p.is_connected())
    }

    /// First retention time of the trace
    pub fn start_time(&self) -> f64 {
        self.points.first().map_or(f64::NAN, |p| p.retention_time)
    }

    /// Deterministic output order: apex m/z, then start time, then creation order
    pub fn output_order(a: &FinishedTrace, b: &FinishedTrace) -> std::cmp::Ordering {
        a.apex_mz
            .total_cmp(&b.apex_mz)
            .then_with(|| a.start_time().total_cmp(&b.start_time()))
            .then_with(|| a.id.cmp(&b.id))
    }
}
