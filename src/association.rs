//! Categorical × categorical association: chi-square test and Cramér's V.
//!
//! Builds a contingency table of observed counts, tests independence with
//! Pearson's chi-square (Yates-corrected for 2×2 tables), and normalizes
//! the statistic into Cramér's V:
//!
//! V = sqrt(χ² / (n · max(min(r−1, k−1), 1)))
//!
//! Reference: Cramér (1946). "Mathematical Methods of Statistics."
//!
//! ```
//! use u_effect::association::association_effect_size;
//! use u_effect::dataframe::{Column, Table};
//!
//! let group: Vec<Option<&str>> = (0..40).map(|i| Some(if i < 20 { "A" } else { "B" })).collect();
//! let outcome: Vec<Option<&str>> = (0..40)
//!     .map(|i| Some(if i < 18 || (20..22).contains(&i) { "Yes" } else { "No" }))
//!     .collect();
//! let table = Table::from_columns([
//!     ("Group".to_string(), Column::categorical_from_labels(&group)),
//!     ("Outcome".to_string(), Column::categorical_from_labels(&outcome)),
//! ]).unwrap();
//!
//! let result = association_effect_size(&table, "Group", "Outcome", 0.05).unwrap();
//! assert!(result.significant);
//! assert!(result.effect.value > 0.5);
//! ```

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::cleaning::{clean_categorical_pair, validate_alpha, AnalysisKind};
use crate::dataframe::Table;
use crate::error::EffectError;
use crate::interpret::MetricKind;
use crate::result::{AnalysisDetails, Computation, EffectSize, EffectSizeResult};

// ── Contingency table ─────────────────────────────────────────────────

/// Cross-tabulation of observed counts.
///
/// Rows are the first column's categories, columns the second's, both in
/// sorted order. Counts are stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    /// Categories of the first column.
    pub row_labels: Vec<String>,
    /// Categories of the second column.
    pub col_labels: Vec<String>,
    /// Row-major counts, `row_labels.len() * col_labels.len()` entries.
    pub counts: Vec<u64>,
}

impl ContingencyTable {
    /// Cross-tabulates two aligned label sequences.
    pub fn from_labels(a: &[String], b: &[String]) -> Self {
        let row_labels: Vec<String> = a.iter().collect::<BTreeSet<_>>().into_iter().cloned().collect();
        let col_labels: Vec<String> = b.iter().collect::<BTreeSet<_>>().into_iter().cloned().collect();
        let row_index: HashMap<&str, usize> =
            row_labels.iter().enumerate().map(|(i, s)| (s.as_str(), i)).collect();
        let col_index: HashMap<&str, usize> =
            col_labels.iter().enumerate().map(|(i, s)| (s.as_str(), i)).collect();

        let n_cols = col_labels.len();
        let mut counts = vec![0u64; row_labels.len() * n_cols];
        for (la, lb) in a.iter().zip(b.iter()) {
            let r = row_index[la.as_str()];
            let c = col_index[lb.as_str()];
            counts[r * n_cols + c] += 1;
        }

        Self {
            row_labels,
            col_labels,
            counts,
        }
    }

    /// Number of categories in the first column.
    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    /// Number of categories in the second column.
    pub fn n_cols(&self) -> usize {
        self.col_labels.len()
    }

    /// Count for row `r`, column `c`.
    pub fn get(&self, r: usize, c: usize) -> u64 {
        self.counts[r * self.n_cols() + c]
    }

    /// Total number of observations.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Per-row sums.
    pub fn row_totals(&self) -> Vec<u64> {
        let n_cols = self.n_cols();
        if n_cols == 0 {
            return vec![0; self.n_rows()];
        }
        self.counts.chunks(n_cols).map(|row| row.iter().sum()).collect()
    }

    /// Per-column sums.
    pub fn col_totals(&self) -> Vec<u64> {
        (0..self.n_cols())
            .map(|c| (0..self.n_rows()).map(|r| self.get(r, c)).sum())
            .collect()
    }

    /// Expected counts under independence, row-major.
    pub fn expected(&self) -> Vec<f64> {
        let total = self.total() as f64;
        if total == 0.0 {
            return vec![0.0; self.counts.len()];
        }
        let col_totals = self.col_totals();
        self.row_totals()
            .iter()
            .flat_map(|&rt| {
                col_totals
                    .iter()
                    .map(move |&ct| rt as f64 * ct as f64 / total)
            })
            .collect()
    }

    /// Counts as `f64`, row-major.
    pub fn as_f64(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }
}

// ── Analysis ──────────────────────────────────────────────────────────

/// Chi-square statistic and p-value for a contingency table.
///
/// Tables with a single row or column carry no information about
/// association: the statistic is 0 and the p-value 1. A 2×2 table (one
/// degree of freedom) gets the Yates continuity correction.
fn chi_squared(contingency: &ContingencyTable) -> Result<(f64, f64), EffectError> {
    let (r, k) = (contingency.n_rows(), contingency.n_cols());
    if r < 2 || k < 2 {
        return Ok((0.0, 1.0));
    }
    if (r - 1) * (k - 1) == 1 {
        return Ok(yates_chi_squared(contingency));
    }
    let test = u_analytics::testing::chi_squared_independence(&contingency.as_f64(), r, k)
        .ok_or_else(|| EffectError::InsufficientData {
            min_required: 1,
            actual: smallest_margin(contingency) as usize,
        })?;
    Ok((test.statistic, test.p_value))
}

/// Chi-square with each |O − E| shrunk by 0.5 (floored at zero).
fn yates_chi_squared(contingency: &ContingencyTable) -> (f64, f64) {
    let statistic: f64 = contingency
        .as_f64()
        .iter()
        .zip(contingency.expected())
        .filter(|&(_, e)| e > 0.0)
        .map(|(&o, e)| {
            let diff = ((o - e).abs() - 0.5).max(0.0);
            diff * diff / e
        })
        .sum();
    let p_value = 1.0 - u_numflow::special::chi_squared_cdf(statistic, 1.0);
    (statistic, p_value.clamp(0.0, 1.0))
}

fn smallest_margin(contingency: &ContingencyTable) -> u64 {
    contingency
        .row_totals()
        .into_iter()
        .chain(contingency.col_totals())
        .min()
        .unwrap_or(0)
}

/// Computes Cramér's V between two categorical columns.
///
/// Rows with a missing value in either column are excluded from the
/// counts. The result's `cleaned` table holds the remaining rows and its
/// details carry the contingency table for bar charts and heatmaps.
pub fn association_effect_size(
    table: &Table,
    col_a: &str,
    col_b: &str,
    alpha: f64,
) -> Result<EffectSizeResult, EffectError> {
    let alpha = validate_alpha(alpha)?;
    let cleaned = clean_categorical_pair(table, col_a, col_b)?;
    let contingency = ContingencyTable::from_labels(&cleaned.a, &cleaned.b);

    let n = contingency.total();
    if n == 0 {
        return Err(EffectError::InsufficientData {
            min_required: 1,
            actual: 0,
        });
    }

    let (statistic, p_value) = chi_squared(&contingency)?;
    let (r, k) = (contingency.n_rows(), contingency.n_cols());
    let denom = (r.min(k).saturating_sub(1)).max(1) as f64;
    let phi2 = statistic / n as f64;
    let v = (phi2 / denom).sqrt().clamp(0.0, 1.0);

    debug!(
        "association {col_a} x {col_b}: {r}x{k} table, n={n}, chi2={statistic:.4}, p={p_value:.4}, V={v:.4}"
    );

    let computation = Computation {
        statistic,
        p_value,
        effect: EffectSize {
            kind: MetricKind::CramersV,
            value: v,
        },
        details: AnalysisDetails::Association {
            degrees_of_freedom: r.saturating_sub(1) * k.saturating_sub(1),
            expected: contingency.expected(),
            contingency,
        },
    };

    Ok(EffectSizeResult::from_computation(
        AnalysisKind::CategoricalCategorical,
        (col_a, col_b),
        alpha,
        computation,
        cleaned.table,
    ))
}
