//! # Peak Tables
//!
//! Centroided peak lists stored as a long CSV/TSV table, one row per peak:
//!
//! ```text
//! scan_number  retention_time  mz        intensity
//! 1            0.50            100.0012  1520.0
//! 1            0.50            250.1180  88.5
//! 2            0.52            100.0009  1610.0
//! 3            0.54
//! 4            0.56            NA
//! ```
//!
//! Rows are grouped into scans by consecutive `scan_number`. A row with empty
//! `mz` and `intensity` marks a scan without peaks (scan 3 above), and `NA` in
//! the `mz` column marks a scan whose peak list is missing (scan 4), which the
//! builder rejects. Header names are matched case-insensitively; extra columns
//! are ignored.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use log::{debug, info};

use crate::peak::{Peak, Scan};

/// Column holding the native scan number
pub const SCAN_NUMBER: &str = "scan_number";
/// Column holding the scan retention time
pub const RETENTION_TIME: &str = "retention_time";
/// Column holding the peak m/z
pub const MZ: &str = "mz";
/// Column holding the peak intensity
pub const INTENSITY: &str = "intensity";

const MISSING_MARKER: &str = "NA";

/// Errors that can occur while reading or writing peak tables
#[derive(Debug, thiserror::Error)]
pub enum PeakTableError {
    /// I/O error
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV/TSV parsing error
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// A required column is absent from the header
    #[error("Missing required peak table column: {0}")]
    MissingColumn(&'static str),

    /// A cell could not be parsed
    #[error("Invalid value {value:?} in column {column} at line {line}")]
    InvalidValue {
        /// 1-based line number in the file
        line: u64,
        /// Column name
        column: &'static str,
        /// Raw cell content
        value: String,
    },
}

struct ColumnIndex {
    scan_number: usize,
    retention_time: usize,
    mz: usize,
    intensity: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &[String]) -> Result<Self, PeakTableError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(PeakTableError::MissingColumn(name))
        };
        Ok(Self {
            scan_number: find(SCAN_NUMBER)?,
            retention_time: find(RETENTION_TIME)?,
            mz: find(MZ)?,
            intensity: find(INTENSITY)?,
        })
    }
}

/// Reader for long-format peak tables
#[derive(Debug, Clone)]
pub struct PeakTableReader {
    delimiter: u8,
}

impl Default for PeakTableReader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl PeakTableReader {
    /// Comma-separated reader
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Reader whose delimiter follows the file extension (`.tsv`/`.txt` → tab)
    pub fn for_path<P: AsRef<Path>>(path: P) -> Self {
        Self::new().with_delimiter(delimiter_for_path(path))
    }

    /// Read all scans from a file
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Scan>, PeakTableError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let scans = self.read(BufReader::new(file))?;
        info!("Read {} scans from {}", scans.len(), path.display());
        Ok(scans)
    }

    /// Read all scans from a reader
    pub fn read<R: Read>(&self, reader: R) -> Result<Vec<Scan>, PeakTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect();
        let columns = ColumnIndex::from_headers(&headers)?;

        let mut scans: Vec<Scan> = Vec::new();
        let mut rows = 0usize;

        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            let cell = |index: usize| record.get(index).unwrap_or("");
            rows += 1;

            let scan_number: i64 = parse_cell(cell(columns.scan_number), SCAN_NUMBER, line)?;
            let mz_cell = cell(columns.mz);
            let intensity_cell = cell(columns.intensity);

            let row = if mz_cell.eq_ignore_ascii_case(MISSING_MARKER) {
                Row::Missing
            } else if mz_cell.is_empty() && intensity_cell.is_empty() {
                Row::Empty
            } else {
                Row::Peak(Peak::new(
                    parse_cell(mz_cell, MZ, line)?,
                    parse_cell(intensity_cell, INTENSITY, line)?,
                ))
            };

            let continues_scan = scans
                .last()
                .is_some_and(|last| last.scan_number == scan_number);
            if !continues_scan {
                let retention_time =
                    parse_cell(cell(columns.retention_time), RETENTION_TIME, line)?;
                scans.push(Scan::new(scan_number, retention_time, Vec::new()));
            }

            if let Some(scan) = scans.last_mut() {
                match row {
                    Row::Peak(peak) => {
                        if let Some(peaks) = scan.peaks.as_mut() {
                            peaks.push(peak);
                        }
                    }
                    Row::Missing => scan.peaks = None,
                    Row::Empty => {}
                }
            }
        }

        debug!("Parsed {} peak table rows into {} scans", rows, scans.len());
        Ok(scans)
    }
}

enum Row {
    Peak(Peak),
    Empty,
    Missing,
}

fn parse_cell<T: std::str::FromStr>(
    value: &str,
    column: &'static str,
    line: u64,
) -> Result<T, PeakTableError> {
    value.parse().map_err(|_| PeakTableError::InvalidValue {
        line,
        column,
        value: value.to_string(),
    })
}

/// Delimiter implied by a file extension: tab for `.tsv`/`.txt`, comma otherwise
pub fn delimiter_for_path<P: AsRef<Path>>(path: P) -> u8 {
    match path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("txt") | Some("tab") => b'\t',
        _ => b',',
    }
}

/// Write scans as a long-format peak table
pub fn write_peak_table<W: Write>(
    scans: &[Scan],
    writer: W,
    delimiter: u8,
) -> Result<usize, PeakTableError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    csv_writer.write_record([SCAN_NUMBER, RETENTION_TIME, MZ, INTENSITY])?;

    let mut rows = 0;
    for scan in scans {
        let scan_number = scan.scan_number.to_string();
        let retention_time = scan.retention_time.to_string();
        match scan.peaks.as_deref() {
            None => {
                csv_writer.write_record([
                    scan_number.as_str(),
                    retention_time.as_str(),
                    MISSING_MARKER,
                    "",
                ])?;
                rows += 1;
            }
            Some([]) => {
                csv_writer.write_record([scan_number.as_str(), retention_time.as_str(), "", ""])?;
                rows += 1;
            }
            Some(peaks) => {
                for peak in peaks {
                    csv_writer.write_record([
                        scan_number.clone(),
                        retention_time.clone(),
                        peak.mz.to_string(),
                        peak.intensity.to_string(),
                    ])?;
                    rows += 1;
                }
            }
        }
    }

    csv_writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_groups_consecutive_rows() {
        let data = "\
scan_number,retention_time,mz,intensity
1,0.5,100.0,1000
1,0.5,200.0,50
2,0.6,100.001,1100
";
        let scans = PeakTableReader::new().read(data.as_bytes()).unwrap();

        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].scan_number, 1);
        assert_eq!(scans[0].peak_count(), 2);
        assert_eq!(scans[1].retention_time, 0.6);
        assert_eq!(scans[1].peaks.as_ref().unwrap()[0], Peak::new(100.001, 1100.0));
    }

    #[test]
    fn test_empty_and_missing_scans() {
        let data = "\
Scan_Number\tRetention_Time\tMZ\tIntensity\tnote
1\t0.5\t100.0\t1000\tx
2\t0.6\t\t\t
3\t0.7\tNA\t\t
";
        let scans = PeakTableReader::new()
            .with_delimiter(b'\t')
            .read(data.as_bytes())
            .unwrap();

        assert_eq!(scans.len(), 3);
        assert_eq!(scans[1].peaks, Some(vec![]));
        assert_eq!(scans[2].peaks, None);
    }

    #[test]
    fn test_missing_column() {
        let data = "scan_number,mz,intensity\n1,100.0,5\n";
        let err = PeakTableReader::new().read(data.as_bytes()).unwrap_err();
        assert!(matches!(err, PeakTableError::MissingColumn(RETENTION_TIME)));
    }

    #[test]
    fn test_invalid_value() {
        let data = "scan_number,retention_time,mz,intensity\n1,0.5,abc,5\n";
        let err = PeakTableReader::new().read(data.as_bytes()).unwrap_err();
        match err {
            PeakTableError::InvalidValue { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, MZ);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_then_read() {
        let scans = vec![
            Scan::new(1, 0.5, vec![Peak::new(100.0, 10.0), Peak::new(150.5, 2.5)]),
            Scan::new(2, 0.75, vec![]),
            Scan::without_peaks(3, 1.0),
        ];
        let mut buffer = Vec::new();
        let rows = write_peak_table(&scans, &mut buffer, b'\t').unwrap();
        assert_eq!(rows, 4);

        let read = PeakTableReader::new()
            .with_delimiter(b'\t')
            .read(buffer.as_slice())
            .unwrap();
        assert_eq!(read, scans);
    }

    #[test]
    fn test_delimiter_for_path() {
        assert_eq!(delimiter_for_path("peaks.tsv"), b'\t');
        assert_eq!(delimiter_for_path("peaks.TXT"), b'\t');
        assert_eq!(delimiter_for_path("peaks.csv"), b',');
        assert_eq!(delimiter_for_path("peaks"), b',');
    }
}
