//! Numeric × numeric association: Pearson's r.
//!
//! r is computed from centered sums and clamped to [−1, 1]. Its two-sided
//! p-value comes from `u_analytics::correlation::pearson`, except at the
//! edges where the t transform degenerates: with two observations the
//! test has no degrees of freedom (p = 1), and a perfect linear fit has
//! p = 0.

use log::debug;

use crate::cleaning::{clean_numeric_pair, validate_alpha, AnalysisKind};
use crate::dataframe::Table;
use crate::error::EffectError;
use crate::interpret::MetricKind;
use crate::result::{AnalysisDetails, Computation, EffectSize, EffectSizeResult};

/// Below this, 1 − r² is treated as an exact linear relationship.
const PERFECT_FIT_EPS: f64 = 1e-12;

/// Least-squares line `y = intercept + slope · x`, used for plot overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionLine {
    /// Slope of the fitted line.
    pub slope: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
}

impl RegressionLine {
    /// Evaluates the line at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fits `y` on `x` by ordinary least squares.
///
/// Returns `None` when `x` is constant.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<RegressionLine> {
    if x.len() >= 3 {
        if let Some(fit) = u_analytics::regression::simple_linear_regression(x, y) {
            return Some(RegressionLine {
                slope: fit.slope,
                intercept: fit.intercept,
                r_squared: fit.r_squared,
            });
        }
    }
    // Two points, or a fit the regression routine rejects (exact fits).
    let sums = CenteredSums::new(x, y)?;
    if sums.sxx == 0.0 {
        return None;
    }
    let slope = sums.sxy / sums.sxx;
    let r_squared = if sums.syy == 0.0 {
        1.0
    } else {
        (sums.sxy * sums.sxy / (sums.sxx * sums.syy)).min(1.0)
    };
    Some(RegressionLine {
        slope,
        intercept: sums.mean_y - slope * sums.mean_x,
        r_squared,
    })
}

struct CenteredSums {
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

impl CenteredSums {
    fn new(x: &[f64], y: &[f64]) -> Option<Self> {
        let mean_x = u_numflow::stats::mean(x)?;
        let mean_y = u_numflow::stats::mean(y)?;
        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }
        Some(Self {
            mean_x,
            mean_y,
            sxx,
            syy,
            sxy,
        })
    }
}

/// Computes Pearson's r between two columns coerced to numbers.
///
/// # Errors
///
/// - [`EffectError::InsufficientData`] with fewer than 2 valid rows.
/// - [`EffectError::ZeroVariance`] when either column is constant.
///
/// ```
/// use u_effect::correlation::correlation_effect_size;
/// use u_effect::dataframe::{Column, Table};
///
/// let x: Vec<Option<f64>> = (0..20).map(|i| Some(i as f64)).collect();
/// let y: Vec<Option<f64>> = (0..20).map(|i| Some(2.0 * i as f64 + 3.0)).collect();
/// let table = Table::from_columns([
///     ("x".to_string(), Column::numeric_from_options(&x)),
///     ("y".to_string(), Column::numeric_from_options(&y)),
/// ]).unwrap();
///
/// let result = correlation_effect_size(&table, "x", "y", 0.05).unwrap();
/// assert!((result.effect.value - 1.0).abs() < 1e-9);
/// assert_eq!(result.interpretation, Some("perfect correlation"));
/// ```
pub fn correlation_effect_size(
    table: &Table,
    col_a: &str,
    col_b: &str,
    alpha: f64,
) -> Result<EffectSizeResult, EffectError> {
    let alpha = validate_alpha(alpha)?;
    let paired = clean_numeric_pair(table, col_a, col_b)?;
    let n = paired.x.len();

    let sums = CenteredSums::new(&paired.x, &paired.y).ok_or(EffectError::InsufficientData {
        min_required: 2,
        actual: n,
    })?;
    for (name, ss) in [(col_a, sums.sxx), (col_b, sums.syy)] {
        if ss == 0.0 {
            return Err(EffectError::ZeroVariance {
                context: format!("column '{name}' is constant; correlation is undefined"),
            });
        }
    }
    let r = (sums.sxy / (sums.sxx * sums.syy).sqrt()).clamp(-1.0, 1.0);
    let p_value = pearson_p_value(&paired.x, &paired.y, r)?;

    debug!("correlation {col_a} x {col_b}: n={n}, r={r:.4}, p={p_value:.4}");

    let computation = Computation {
        statistic: r,
        p_value,
        effect: EffectSize {
            kind: MetricKind::PearsonR,
            value: r,
        },
        details: AnalysisDetails::Correlation {
            n,
            regression: fit_line(&paired.x, &paired.y),
        },
    };

    Ok(EffectSizeResult::from_computation(
        AnalysisKind::NumericNumeric,
        (col_a, col_b),
        alpha,
        computation,
        paired.table,
    ))
}

fn pearson_p_value(x: &[f64], y: &[f64], r: f64) -> Result<f64, EffectError> {
    if x.len() == 2 {
        return Ok(1.0);
    }
    if 1.0 - r * r <= PERFECT_FIT_EPS {
        return Ok(0.0);
    }
    u_analytics::correlation::pearson(x, y)
        .map(|pr| pr.p_value)
        .ok_or(EffectError::InsufficientData {
            min_required: 3,
            actual: x.len(),
        })
}
