//! Entry point: validate the request and dispatch to one analysis path.
//!
//! ```
//! use u_effect::cleaning::AnalysisKind;
//! use u_effect::dataframe::{Column, Table};
//! use u_effect::engine::{analyze, AnalysisConfig};
//!
//! let table = Table::from_columns([
//!     ("dose".to_string(), Column::numeric_from_options(&[Some(1.0), Some(2.0), Some(3.0), Some(4.0)])),
//!     ("response".to_string(), Column::numeric_from_options(&[Some(2.1), Some(3.9), Some(6.2), Some(7.8)])),
//! ]).unwrap();
//!
//! let result = analyze(&table, "dose", "response", AnalysisKind::NumericNumeric, &AnalysisConfig::default())
//!     .unwrap();
//! assert!(result.effect.value > 0.99);
//! ```

use log::debug;

use crate::association::association_effect_size;
use crate::cleaning::{validate_alpha, validate_selection, AnalysisKind};
use crate::correlation::correlation_effect_size;
use crate::dataframe::Table;
use crate::error::EffectError;
use crate::group_comparison::group_effect_size;
use crate::result::EffectSizeResult;

/// Default significance threshold.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Configuration for an effect size analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Significance threshold, strictly between 0 and 1. Default: 0.05.
    pub alpha: f64,
}

impl AnalysisConfig {
    /// Creates a configuration with a validated `alpha`.
    pub fn with_alpha(alpha: f64) -> Result<Self, EffectError> {
        Ok(Self {
            alpha: validate_alpha(alpha)?,
        })
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

/// Parses a user-entered significance threshold.
///
/// ```
/// use u_effect::engine::parse_alpha;
///
/// assert_eq!(parse_alpha(" 0.01 ").unwrap(), 0.01);
/// assert!(parse_alpha("five percent").is_err());
/// assert!(parse_alpha("5").is_err());
/// ```
pub fn parse_alpha(text: &str) -> Result<f64, EffectError> {
    let invalid = || EffectError::InvalidAlpha {
        value: text.to_string(),
    };
    let alpha: f64 = text.trim().parse().map_err(|_| invalid())?;
    validate_alpha(alpha).map_err(|_| invalid())
}

/// Runs the analysis selected by `kind` on columns `col_a` and `col_b`.
///
/// For [`AnalysisKind::CategoricalNumeric`], `col_a` is the categorical
/// column and `col_b` the numeric one.
pub fn analyze(
    table: &Table,
    col_a: &str,
    col_b: &str,
    kind: AnalysisKind,
    config: &AnalysisConfig,
) -> Result<EffectSizeResult, EffectError> {
    validate_alpha(config.alpha)?;
    validate_selection(table, col_a, col_b)?;

    debug!(
        "analyze '{}': {col_a} x {col_b}, alpha={}, rows={}",
        kind,
        config.alpha,
        table.row_count()
    );

    let result = match kind {
        AnalysisKind::CategoricalCategorical => {
            association_effect_size(table, col_a, col_b, config.alpha)
        }
        AnalysisKind::CategoricalNumeric => group_effect_size(table, col_a, col_b, config.alpha),
        AnalysisKind::NumericNumeric => correlation_effect_size(table, col_a, col_b, config.alpha),
    }?;

    debug!(
        "analyze '{}': {} of {} rows used; {}",
        kind,
        result.cleaned.row_count(),
        table.row_count(),
        result
    );
    Ok(result)
}

/// Runs an analysis with the kind chosen from the column types.
///
/// When only the first column is numeric the columns are swapped so the
/// categorical one comes first; the result's `columns` field reflects the
/// order actually used.
pub fn analyze_auto(
    table: &Table,
    col_a: &str,
    col_b: &str,
    config: &AnalysisConfig,
) -> Result<EffectSizeResult, EffectError> {
    let (a, b) = validate_selection(table, col_a, col_b)?;
    let (kind, swap) = AnalysisKind::detect(a, b);
    let (first, second) = if swap { (col_b, col_a) } else { (col_a, col_b) };
    debug!("detected '{kind}' for {col_a} x {col_b}");
    analyze(table, first, second, kind, config)
}
