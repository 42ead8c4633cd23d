//! # m/z Tolerance Windows
//!
//! A tolerance maps an m/z value to the closed acceptance interval used when
//! deciding whether a peak in the next scan may continue a trace.
//!
//! Three policies are supported:
//!
//! | Variant | Half-width at `mz` |
//! |---------|--------------------|
//! | `Absolute { mz }` | `mz` (Da / Th) |
//! | `Ppm { ppm }` | `mz / 1e6 * ppm` |
//! | `MaxOfBoth { mz, ppm }` | `max(mz, mz / 1e6 * ppm)` |
//!
//! All variants are symmetric around the center and their half-width never
//! shrinks as m/z grows. The matching engines rely on both properties for their
//! early exit over m/z-sorted candidates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors raised when a tolerance is constructed with unusable parameters
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToleranceError {
    /// Absolute tolerance was zero, negative or not a number
    #[error("Absolute m/z tolerance must be positive, got {0}")]
    NonPositiveAbsolute(f64),

    /// Relative tolerance was zero, negative or not a number
    #[error("Relative m/z tolerance must be positive, got {0} ppm")]
    NonPositivePpm(f64),
}

/// Closed m/z interval `[lo, hi]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MzRange {
    /// Lower bound (inclusive)
    pub lo: f64,
    /// Upper bound (inclusive)
    pub hi: f64,
}

impl MzRange {
    /// Create a new interval. Bounds are swapped if given in reverse order.
    pub fn new(lo: f64, hi: f64) -> Self {
        if lo <= hi {
            Self { lo, hi }
        } else {
            Self { lo: hi, hi: lo }
        }
    }

    /// Whether `mz` lies inside the interval (both ends inclusive)
    #[inline]
    pub fn contains(&self, mz: f64) -> bool {
        self.lo <= mz && mz <= self.hi
    }

    /// Width of the interval
    #[inline]
    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    /// Smallest interval covering both `self` and `other`
    pub fn span(&self, other: &MzRange) -> MzRange {
        MzRange {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }
}

impl fmt::Display for MzRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.lo, self.hi)
    }
}

/// m/z tolerance policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MzTolerance {
    /// Constant absolute window in m/z units
    Absolute {
        /// Half-width in m/z units
        mz: f64,
    },
    /// Window proportional to the m/z value
    Ppm {
        /// Half-width in parts per million
        ppm: f64,
    },
    /// Pointwise maximum of an absolute and a relative window
    MaxOfBoth {
        /// Absolute half-width in m/z units
        mz: f64,
        /// Relative half-width in parts per million
        ppm: f64,
    },
}

impl MzTolerance {
    /// Constant absolute tolerance
    pub fn absolute(mz: f64) -> Result<Self, ToleranceError> {
        let tolerance = Self::Absolute { mz };
        tolerance.validate()?;
        Ok(tolerance)
    }

    /// Relative (ppm) tolerance
    pub fn ppm(ppm: f64) -> Result<Self, ToleranceError> {
        let tolerance = Self::Ppm { ppm };
        tolerance.validate()?;
        Ok(tolerance)
    }

    /// Maximum of an absolute and a relative tolerance
    pub fn max_of_both(mz: f64, ppm: f64) -> Result<Self, ToleranceError> {
        let tolerance = Self::MaxOfBoth { mz, ppm };
        tolerance.validate()?;
        Ok(tolerance)
    }

    /// Check the parameters.
    ///
    /// Deserialized tolerances bypass the constructors, so consumers call this
    /// before processing any data.
    pub fn validate(&self) -> Result<(), ToleranceError> {
        let (mz, ppm) = match *self {
            MzTolerance::Absolute { mz } => (Some(mz), None),
            MzTolerance::Ppm { ppm } => (None, Some(ppm)),
            MzTolerance::MaxOfBoth { mz, ppm } => (Some(mz), Some(ppm)),
        };
        // `!(x > 0.0)` also rejects NaN
        if let Some(mz) = mz {
            if !(mz > 0.0) || !mz.is_finite() {
                return Err(ToleranceError::NonPositiveAbsolute(mz));
            }
        }
        if let Some(ppm) = ppm {
            if !(ppm > 0.0) || !ppm.is_finite() {
                return Err(ToleranceError::NonPositivePpm(ppm));
            }
        }
        Ok(())
    }

    /// Half-width of the acceptance window centered at `mz`
    #[inline]
    pub fn half_width(&self, mz: f64) -> f64 {
        match *self {
            MzTolerance::Absolute { mz: delta } => delta,
            MzTolerance::Ppm { ppm } => mz.abs() / 1e6 * ppm,
            MzTolerance::MaxOfBoth { mz: delta, ppm } => delta.max(mz.abs() / 1e6 * ppm),
        }
    }

    /// Acceptance interval centered at `mz`
    #[inline]
    pub fn range(&self, mz: f64) -> MzRange {
        let width = self.half_width(mz);
        MzRange {
            lo: mz - width,
            hi: mz + width,
        }
    }

    /// Whether `candidate_mz` falls inside the window centered at `center`
    #[inline]
    pub fn contains(&self, center: f64, candidate_mz: f64) -> bool {
        self.range(center).contains(candidate_mz)
    }
}

impl fmt::Display for MzTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MzTolerance::Absolute { mz } => write!(f, "{} m/z", mz),
            MzTolerance::Ppm { ppm } => write!(f, "{} ppm", ppm),
            MzTolerance::MaxOfBoth { mz, ppm } => write!(f, "max({} m/z, {} ppm)", mz, ppm),
        }
    }
}
