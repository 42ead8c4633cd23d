//! Centroided peaks and the scans that carry them.
//!
//! These are the input records handed over by the mass detection step. A
//! [`Scan`] without a peak list (`peaks == None`) stands for a scan on which
//! mass detection was never run; a scan with an empty list is a scan where
//! nothing was detected.

use serde::{Deserialize, Serialize};

/// A single centroided peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Mass-to-charge ratio
    pub mz: f64,
    /// Peak intensity
    pub intensity: f64,
}

impl Peak {
    /// Create a new peak
    pub fn new(mz: f64, intensity: f64) -> Self {
        Self { mz, intensity }
    }

    /// Whether both coordinates are finite numbers
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.mz.is_finite() && self.intensity.is_finite()
    }
}

/// One recorded mass spectrum reduced to its centroided peak list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    /// Native scan number (used for error reporting and trace provenance)
    pub scan_number: i64,
    /// Acquisition time
    pub retention_time: f64,
    /// Centroided peaks; `None` when no peak list was produced for this scan
    pub peaks: Option<Vec<Peak>>,
}

impl Scan {
    /// Create a scan with a peak list
    pub fn new(scan_number: i64, retention_time: f64, peaks: Vec<Peak>) -> Self {
        Self {
            scan_number,
            retention_time,
            peaks: Some(peaks),
        }
    }

    /// Create a scan whose peak list is absent
    pub fn without_peaks(scan_number: i64, retention_time: f64) -> Self {
        Self {
            scan_number,
            retention_time,
            peaks: None,
        }
    }

    /// Number of peaks (0 when the peak list is absent)
    pub fn peak_count(&self) -> usize {
        self.peaks.as_ref().map_or(0, Vec::len)
    }
}

/// Builder for constructing [`Scan`] objects fluently
pub struct ScanBuilder {
    scan: Scan,
}

impl ScanBuilder {
    /// Create a new scan builder with an empty peak list
    pub fn new(scan_number: i64) -> Self {
        Self {
            scan: Scan::new(scan_number, 0.0, Vec::new()),
        }
    }

    /// Set the retention time
    pub fn retention_time(mut self, rt: f64) -> Self {
        self.scan.retention_time = rt;
        self
    }

    /// Add a single peak
    pub fn add_peak(mut self, mz: f64, intensity: f64) -> Self {
        self.scan
            .peaks
            .get_or_insert_with(Vec::new)
            .push(Peak::new(mz, intensity));
        self
    }

    /// Add multiple peaks
    pub fn peaks(mut self, peaks: impl IntoIterator<Item = Peak>) -> Self {
        self.scan.peaks.get_or_insert_with(Vec::new).extend(peaks);
        self
    }

    /// Mark the peak list as absent
    pub fn missing_peaks(mut self) -> Self {
        self.scan.peaks = None;
        self
    }

    /// Build the scan
    pub fn build(self) -> Scan {
        self.scan
    }
}
