//! Categorical × numeric comparison: Cohen's d or eta squared.
//!
//! The path branches on the number of categories left after cleaning:
//!
//! - **2 groups**: Student's t-test (equal variances) and Cohen's d with
//!   the pooled standard deviation sqrt((s₁² + s₂²) / 2).
//! - **3+ groups**: one-way ANOVA and eta squared, SS_between / SS_total.
//!
//! Both p-values are computed here from the group statistics, so groups
//! holding a single observation still take part in the ANOVA.
//!
//! Reference: Cohen (1988). "Statistical Power Analysis for the Behavioral
//! Sciences", 2nd ed.

use log::{debug, trace};

use crate::cleaning::{clean_categorical_numeric, validate_alpha, AnalysisKind, GroupedSamples};
use crate::dataframe::Table;
use crate::error::EffectError;
use crate::interpret::MetricKind;
use crate::result::{AnalysisDetails, Computation, EffectSize, EffectSizeResult, GroupStats};

fn group_stats(label: &str, values: &[f64]) -> GroupStats {
    GroupStats {
        label: label.to_string(),
        n: values.len(),
        mean: u_numflow::stats::mean(values).unwrap_or(f64::NAN),
        variance: u_numflow::stats::variance(values).unwrap_or(f64::NAN),
    }
}

/// Compares a numeric column across the categories of another column.
///
/// `cat_col` supplies the groups; `num_col` is coerced to numbers and rows
/// that fail coercion or lack a category are dropped. Cohen's d is
/// `mean(first group) − mean(second group)` over the pooled standard
/// deviation, with groups ordered by first appearance.
///
/// # Errors
///
/// - [`EffectError::InvalidCategoryCount`] with fewer than 2 categories.
/// - [`EffectError::ZeroVariance`] when the pooled standard deviation of
///   two groups is exactly zero, or every value is identical (3+ groups).
/// - [`EffectError::InsufficientData`] when a group is too small for a
///   sample variance.
///
/// ```
/// use u_effect::dataframe::{Column, Table};
/// use u_effect::group_comparison::group_effect_size;
///
/// let table = Table::from_columns([
///     ("g".to_string(), Column::categorical_from_labels(&[
///         Some("a"), Some("a"), Some("a"), Some("b"), Some("b"), Some("b"),
///     ])),
///     ("v".to_string(), Column::numeric_from_options(&[
///         Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0),
///     ])),
/// ]).unwrap();
///
/// let result = group_effect_size(&table, "g", "v", 0.05).unwrap();
/// assert!((result.effect.value + 3.0).abs() < 1e-12);
/// ```
pub fn group_effect_size(
    table: &Table,
    cat_col: &str,
    num_col: &str,
    alpha: f64,
) -> Result<EffectSizeResult, EffectError> {
    let alpha = validate_alpha(alpha)?;
    let grouped = clean_categorical_numeric(table, cat_col, num_col)?;

    let stats: Vec<GroupStats> = grouped
        .categories
        .iter()
        .zip(grouped.groups.iter())
        .map(|(label, values)| group_stats(label, values))
        .collect();
    for s in &stats {
        trace!(
            "group '{}': n={}, mean={:.4}, var={:.4}",
            s.label,
            s.n,
            s.mean,
            s.variance
        );
    }

    let computation = if grouped.groups.len() == 2 {
        two_groups(stats)?
    } else {
        multi_group(&grouped, stats)?
    };

    debug!(
        "group comparison {num_col} by {cat_col}: {} groups, n={}, stat={:.4}, p={:.4}, {}={:.4}",
        grouped.groups.len(),
        grouped.total(),
        computation.statistic,
        computation.p_value,
        computation.effect.kind.id(),
        computation.effect.value
    );

    Ok(EffectSizeResult::from_computation(
        AnalysisKind::CategoricalNumeric,
        (cat_col, num_col),
        alpha,
        computation,
        grouped.table,
    ))
}

/// Student's t-test and Cohen's d.
fn two_groups(stats: Vec<GroupStats>) -> Result<Computation, EffectError> {
    let (g1, g2) = (&stats[0], &stats[1]);
    let smallest = g1.n.min(g2.n);
    if smallest < 2 {
        return Err(EffectError::InsufficientData {
            min_required: 2,
            actual: smallest,
        });
    }

    let pooled_std = ((g1.variance + g2.variance) / 2.0).sqrt();
    if pooled_std == 0.0 {
        return Err(EffectError::ZeroVariance {
            context: "pooled standard deviation is zero; cannot compute Cohen's d".to_string(),
        });
    }
    let diff = g1.mean - g2.mean;
    let d = diff / pooled_std;

    let df = g1.n + g2.n - 2;
    let pooled_var = ((g1.n - 1) as f64 * g1.variance + (g2.n - 1) as f64 * g2.variance) / df as f64;
    let se = (pooled_var * (1.0 / g1.n as f64 + 1.0 / g2.n as f64)).sqrt();
    let t = diff / se;

    let p_value = 2.0 * (1.0 - u_numflow::special::t_distribution_cdf(t.abs(), df as f64));

    Ok(Computation {
        statistic: t,
        p_value: p_value.clamp(0.0, 1.0),
        effect: EffectSize {
            kind: MetricKind::CohensD,
            value: d,
        },
        details: AnalysisDetails::TwoGroups {
            groups: stats,
            degrees_of_freedom: df,
            pooled_std,
        },
    })
}

/// One-way ANOVA and eta squared.
fn multi_group(grouped: &GroupedSamples, stats: Vec<GroupStats>) -> Result<Computation, EffectError> {
    let k = grouped.groups.len();
    let n = grouped.total();
    if n <= k {
        return Err(EffectError::InsufficientData {
            min_required: k + 1,
            actual: n,
        });
    }

    let all: Vec<f64> = grouped.groups.iter().flatten().copied().collect();
    let grand_mean = u_numflow::stats::mean(&all).unwrap_or(f64::NAN);
    let ss_between: f64 = stats
        .iter()
        .map(|s| s.n as f64 * (s.mean - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = grouped
        .groups
        .iter()
        .zip(stats.iter())
        .map(|(values, s)| values.iter().map(|x| (x - s.mean).powi(2)).sum::<f64>())
        .sum();
    let ss_total = ss_between + ss_within;
    if ss_total == 0.0 {
        return Err(EffectError::ZeroVariance {
            context: format!("all {n} values are identical; eta squared is undefined"),
        });
    }
    let eta_squared = (ss_between / ss_total).clamp(0.0, 1.0);

    // Constant within every group but different between groups: perfect separation.
    let (f_statistic, p_value) = if ss_within == 0.0 {
        (f64::INFINITY, 0.0)
    } else {
        let (df_between, df_within) = ((k - 1) as f64, (n - k) as f64);
        let f = (ss_between / df_between) / (ss_within / df_within);
        let p = 1.0 - u_numflow::special::f_distribution_cdf(f, df_between, df_within);
        (f, p.clamp(0.0, 1.0))
    };

    Ok(Computation {
        statistic: f_statistic,
        p_value,
        effect: EffectSize {
            kind: MetricKind::EtaSquared,
            value: eta_squared,
        },
        details: AnalysisDetails::MultiGroup {
            groups: stats,
            df_between: k - 1,
            df_within: n - k,
        },
    })
}
