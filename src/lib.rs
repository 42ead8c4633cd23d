//! # mztrace - Extracted Ion Chromatogram Assembly
//!
//! `mztrace` turns a time-ordered stream of centroided LC-MS scans into
//! continuous ion traces ("chromatograms"): each trace follows one ion species
//! across consecutive scans within an m/z tolerance.
//!
//! ## Key Features
//!
//! - **Streaming assembly**: scans are consumed one at a time; only the open
//!   tracks are kept in memory.
//!
//! - **Two matching strategies**: greedy highest-intensity continuation, and a
//!   scored best-first approximation of minimum-cost assignment.
//!
//! - **Gap handling**: tracks that miss a scan are padded with a zero-intensity
//!   marker once; connected runs shorter than the minimum time span are
//!   trimmed or discarded.
//!
//! - **Deterministic output**: explicit tie-break rules and a total output
//!   order make repeated runs byte-identical.
//!
//! - **Parquet output**: finished traces are written as one row per trace
//!   with point arrays, the configuration stored in the file footer.
//!
//! ## Quick Start
//!
//! ```rust
//! use mztrace::prelude::*;
//!
//! let config = BuilderConfig::new(MzTolerance::ppm(10.0)?, 0.1)
//!     .with_strategy(MatchStrategy::GreedyHighestIntensity);
//!
//! let scans: Vec<Scan> = (0..5)
//!     .map(|i| {
//!         ScanBuilder::new(i + 1)
//!             .retention_time(i as f64 * 0.05)
//!             .add_peak(524.2648, 1.0e5 + i as f64 * 1.0e4)
//!             .add_peak(610.1841, 2.0e4)
//!             .build()
//!     })
//!     .collect();
//!
//! let traces = build_traces(&scans, config)?;
//! assert_eq!(traces.len(), 2);
//! assert_eq!(traces.traces[0].len(), 5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`tolerance`]: m/z acceptance windows (absolute, ppm, max of both)
//! - [`peak`]: input scans and peaks
//! - [`candidate`]: per-scan candidate arena with claimed flags
//! - [`matching`]: the [`MatchEngine`](matching::MatchEngine) strategies
//! - [`track`]: traces under construction and finished traces
//! - [`builder`]: track lifecycle, finalization and the driving loop
//! - [`peak_table`]: CSV/TSV peak table input
//! - [`schema`] and [`trace_writer`]: Parquet and JSON output
//!
//! ## Memory
//!
//! Every open track stays in memory until it is closed, so the working set
//! grows with the number of ion species alive at the same time. Independent
//! runs share nothing and can be processed concurrently, one builder each
//! (see `build_runs` with the `parallel` feature).

#![warn(clippy::all)]
#![deny(missing_docs)]

pub mod builder;
pub mod candidate;
pub mod matching;
pub mod peak;
pub mod peak_table;
pub mod schema;
pub mod tolerance;
pub mod trace_writer;
pub mod track;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::builder::{
        build_traces, BuildError, BuildOutcome, BuildStats, BuilderConfig, CancellationToken,
        TraceBuilder, TraceSet,
    };
    pub use crate::matching::{MatchEngine, MatchStrategy};
    pub use crate::peak::{Peak, Scan, ScanBuilder};
    pub use crate::peak_table::PeakTableReader;
    pub use crate::tolerance::{MzRange, MzTolerance, ToleranceError};
    pub use crate::trace_writer::{TraceWriter, TraceWriterConfig};
    pub use crate::track::{FinishedTrace, PointKind, TracePoint, Track};
}
