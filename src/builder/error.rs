use crate::tolerance::ToleranceError;

/// Errors that can occur while assembling traces
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// Tolerance parameters are not usable
    #[error("Invalid m/z tolerance: {0}")]
    Tolerance(#[from] ToleranceError),

    /// Other builder parameters are not usable
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A scan arrived without its peak list
    #[error("Scan #{scan_number} (position {scan_index}) does not have a peak list; run mass detection first")]
    MissingInput {
        /// Position of the scan in the stream
        scan_index: usize,
        /// Native scan number
        scan_number: i64,
    },

    /// Retention time went backwards
    #[error("Retention time of scan #{scan_number} ({retention_time}) is smaller than the previous scan's ({previous})")]
    UnorderedScan {
        /// Native scan number
        scan_number: i64,
        /// Retention time of the offending scan
        retention_time: f64,
        /// Retention time of the previous scan
        previous: f64,
    },

    /// Retention time is NaN or infinite
    #[error("Scan #{scan_number} has a non-finite retention time")]
    InvalidRetentionTime {
        /// Native scan number
        scan_number: i64,
    },
}

impl BuildError {
    /// Whether the error was raised while validating the configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, BuildError::Tolerance(_) | BuildError::Configuration(_))
    }
}
