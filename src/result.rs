//! Effect size result record.
//!
//! An [`EffectSizeResult`] is created fresh by every analysis and never
//! mutated afterwards. Its `Display` impl renders the result text shown to
//! the user; [`EffectSizeResult::cleaned`] carries the cleaned subset that
//! the plotting step reuses.

use std::fmt;

use crate::association::ContingencyTable;
use crate::cleaning::AnalysisKind;
use crate::correlation::RegressionLine;
use crate::dataframe::Table;
use crate::interpret::{interpret, MetricKind};

/// An effect size value tagged with its metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSize {
    /// Metric the value belongs to.
    pub kind: MetricKind,
    /// Signed effect size.
    pub value: f64,
}

/// Summary statistics of one group in a categorical × numeric analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    /// Category label.
    pub label: String,
    /// Number of observations.
    pub n: usize,
    /// Sample mean.
    pub mean: f64,
    /// Sample variance (n − 1 denominator). NaN for a single observation.
    pub variance: f64,
}

/// Path-specific supporting values.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisDetails {
    /// Chi-square test of independence.
    Association {
        /// Observed counts.
        contingency: ContingencyTable,
        /// (rows − 1) × (columns − 1).
        degrees_of_freedom: usize,
        /// Expected counts under independence, row-major.
        expected: Vec<f64>,
    },
    /// Student's t-test on two groups.
    TwoGroups {
        /// The two groups, in first-appearance order.
        groups: Vec<GroupStats>,
        /// n1 + n2 − 2.
        degrees_of_freedom: usize,
        /// sqrt of the mean of the two sample variances.
        pooled_std: f64,
    },
    /// One-way ANOVA on three or more groups.
    MultiGroup {
        /// Groups in first-appearance order.
        groups: Vec<GroupStats>,
        /// k − 1.
        df_between: usize,
        /// N − k.
        df_within: usize,
    },
    /// Pearson correlation.
    Correlation {
        /// Number of paired observations.
        n: usize,
        /// Least-squares fit of the second column on the first.
        regression: Option<RegressionLine>,
    },
}

/// Values computed by an analyzer, before significance is judged.
#[derive(Debug, Clone)]
pub(crate) struct Computation {
    pub statistic: f64,
    pub p_value: f64,
    pub effect: EffectSize,
    pub details: AnalysisDetails,
}

/// Result of one effect size analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectSizeResult {
    /// Analysis path that produced this result.
    pub analysis: AnalysisKind,
    /// The two analyzed columns (categorical column first for
    /// categorical × numeric).
    pub columns: (String, String),
    /// Test statistic: χ², t, F, or r.
    pub statistic: f64,
    /// P-value of the test.
    pub p_value: f64,
    /// Significance threshold used.
    pub alpha: f64,
    /// Effect size, always computed.
    pub effect: EffectSize,
    /// `p_value <= alpha`.
    pub significant: bool,
    /// Qualitative label; `None` when the test is not significant.
    pub interpretation: Option<&'static str>,
    /// Path-specific supporting values.
    pub details: AnalysisDetails,
    /// Cleaned two-column subset the analysis ran on.
    pub cleaned: Table,
}

impl EffectSizeResult {
    pub(crate) fn from_computation(
        analysis: AnalysisKind,
        columns: (&str, &str),
        alpha: f64,
        computation: Computation,
        cleaned: Table,
    ) -> Self {
        let significant = computation.p_value <= alpha;
        let interpretation =
            significant.then(|| interpret(computation.effect.value, computation.effect.kind));
        Self {
            analysis,
            columns: (columns.0.to_string(), columns.1.to_string()),
            statistic: computation.statistic,
            p_value: computation.p_value,
            alpha,
            effect: computation.effect,
            significant,
            interpretation,
            details: computation.details,
            cleaned,
        }
    }

    /// The effect size, only when the test rejected the null hypothesis.
    pub fn reported_effect(&self) -> Option<EffectSize> {
        self.significant.then_some(self.effect)
    }

    /// Human-readable result line.
    pub fn result_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EffectSizeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interpretation {
            Some(label) => write!(
                f,
                "{}: {:.3} ({}) (p = {:.3})",
                self.effect.kind.name(),
                self.effect.value,
                label,
                self.p_value
            ),
            None => write!(
                f,
                "Effect size not statistically significant (p = {:.3}, alpha = {})",
                self.p_value, self.alpha
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(p_value: f64, value: f64) -> EffectSizeResult {
        EffectSizeResult::from_computation(
            AnalysisKind::NumericNumeric,
            ("x", "y"),
            0.05,
            Computation {
                statistic: value,
                p_value,
                effect: EffectSize {
                    kind: MetricKind::PearsonR,
                    value,
                },
                details: AnalysisDetails::Correlation {
                    n: 10,
                    regression: None,
                },
            },
            Table::new(),
        )
    }

    #[test]
    fn significant_text() {
        let result = sample(0.001, 0.42);
        assert!(result.significant);
        assert_eq!(result.interpretation, Some("medium correlation"));
        assert_eq!(
            result.result_text(),
            "Pearson's r: 0.420 (medium correlation) (p = 0.001)"
        );
        assert_eq!(result.reported_effect().map(|e| e.value), Some(0.42));
    }

    #[test]
    fn not_significant_text() {
        let result = sample(0.2, 0.42);
        assert!(!result.significant);
        assert!(result.interpretation.is_none());
        assert!(result.reported_effect().is_none());
        assert_eq!(
            result.result_text(),
            "Effect size not statistically significant (p = 0.200, alpha = 0.05)"
        );
    }

    #[test]
    fn p_equal_to_alpha_is_significant() {
        assert!(sample(0.05, 0.3).significant);
    }
}
