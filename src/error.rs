//! Error types for u-effect.
//!
//! Every variant is a local validation failure. Errors surface verbatim to
//! the caller; no analysis returns a partial result.

use std::fmt;

/// All errors produced by u-effect operations.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectError {
    /// The two column references are identical, or one is not in the table.
    InvalidColumnSelection { reason: String },
    /// Significance threshold outside the open interval (0, 1) or not a number.
    InvalidAlpha { value: String },
    /// Fewer distinct categories than the analysis requires.
    InvalidCategoryCount { column: String, found: usize },
    /// A standard deviation needed as a divisor is exactly zero.
    ZeroVariance { context: String },
    /// Not enough valid rows after cleaning.
    InsufficientData { min_required: usize, actual: usize },
    /// Interpretation requested for a metric outside the recognized kinds.
    UnknownMetricKind { name: String },
    /// Analysis selector does not name one of the three analysis paths.
    UnknownAnalysisKind { name: String },
    /// Plot style not offered for the analysis kind, or bad overlay flag.
    InvalidPlotStyle { style: String, reason: String },
    /// Column length does not match the table's row count.
    DimensionMismatch { expected: usize, actual: usize },
}

impl fmt::Display for EffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColumnSelection { reason } => {
                write!(f, "invalid column selection: {reason}")
            }
            Self::InvalidAlpha { value } => {
                write!(
                    f,
                    "significance (alpha) must be a number strictly between 0 and 1, got '{value}'"
                )
            }
            Self::InvalidCategoryCount { column, found } => {
                write!(
                    f,
                    "categorical column '{column}' must have at least 2 categories for comparison, found {found}"
                )
            }
            Self::ZeroVariance { context } => {
                write!(f, "zero variance: {context}")
            }
            Self::InsufficientData {
                min_required,
                actual,
            } => {
                write!(
                    f,
                    "not enough valid data: need at least {min_required} rows, got {actual}"
                )
            }
            Self::UnknownMetricKind { name } => {
                write!(f, "unknown effect size metric '{name}'")
            }
            Self::UnknownAnalysisKind { name } => {
                write!(f, "unknown analysis kind '{name}'")
            }
            Self::InvalidPlotStyle { style, reason } => {
                write!(f, "plot style '{style}' not available: {reason}")
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "expected {expected} elements, got {actual}")
            }
        }
    }
}

impl std::error::Error for EffectError {}
