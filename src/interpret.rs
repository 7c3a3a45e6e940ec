//! Qualitative interpretation of effect size magnitudes.
//!
//! Each [`MetricKind`] owns an ordered band table of `(upper_bound, label)`
//! pairs with strictly increasing bounds; the last bound is infinite. A
//! value maps to the first band whose bound exceeds `|value|`.
//!
//! ```
//! use u_effect::interpret::{interpret, MetricKind};
//!
//! assert_eq!(interpret(0.45, MetricKind::CohensD), "medium effect size");
//! assert_eq!(interpret(-0.95, MetricKind::PearsonR), "perfect correlation");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::EffectError;

/// Cohen (1988) thresholds for standardized mean differences.
const COHENS_D_BANDS: &[(f64, &str)] = &[
    (0.2, "small effect size"),
    (0.5, "medium effect size"),
    (0.8, "large effect size"),
    (f64::INFINITY, "very large effect size"),
];

const ETA_SQUARED_BANDS: &[(f64, &str)] = &[
    (0.01, "small effect size"),
    (0.06, "medium effect size"),
    (0.14, "large effect size"),
    (f64::INFINITY, "very large effect size"),
];

const PEARSONS_R_BANDS: &[(f64, &str)] = &[
    (0.1, "negligible correlation"),
    (0.3, "small correlation"),
    (0.5, "medium correlation"),
    (0.7, "large correlation"),
    (0.9, "very large correlation"),
    (f64::INFINITY, "perfect correlation"),
];

const CRAMERS_V_BANDS: &[(f64, &str)] = &[
    (0.1, "small effect size"),
    (0.3, "medium effect size"),
    (0.5, "large effect size"),
    (f64::INFINITY, "very large effect size"),
];

/// Effect size metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Standardized mean difference between two groups.
    CohensD,
    /// Proportion of variance explained by group membership.
    EtaSquared,
    /// Linear correlation coefficient.
    PearsonR,
    /// Chi-square based association strength.
    CramersV,
}

impl MetricKind {
    /// All recognized metrics.
    pub const ALL: [MetricKind; 4] = [
        Self::CohensD,
        Self::EtaSquared,
        Self::PearsonR,
        Self::CramersV,
    ];

    /// Band table for this metric, ordered by increasing bound.
    pub fn bands(self) -> &'static [(f64, &'static str)] {
        match self {
            Self::CohensD => COHENS_D_BANDS,
            Self::EtaSquared => ETA_SQUARED_BANDS,
            Self::PearsonR => PEARSONS_R_BANDS,
            Self::CramersV => CRAMERS_V_BANDS,
        }
    }

    /// Display name used in result text.
    pub fn name(self) -> &'static str {
        match self {
            Self::CohensD => "Cohen's d",
            Self::EtaSquared => "η² (Eta Squared)",
            Self::PearsonR => "Pearson's r",
            Self::CramersV => "Cramér's V",
        }
    }

    /// Stable identifier for the metric.
    pub fn id(self) -> &'static str {
        match self {
            Self::CohensD => "mean-difference-d",
            Self::EtaSquared => "variance-ratio-eta2",
            Self::PearsonR => "correlation-r",
            Self::CramersV => "association-v",
        }
    }

    /// Index of the band `value` falls into.
    ///
    /// NaN compares false against every bound and lands in the final
    /// catch-all band.
    pub fn band_index(self, value: f64) -> usize {
        let magnitude = value.abs();
        let bands = self.bands();
        bands
            .iter()
            .position(|&(bound, _)| magnitude < bound)
            .unwrap_or(bands.len() - 1)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = EffectError;

    /// Parses a metric name case-insensitively.
    ///
    /// Apostrophes, spaces, hyphens and underscores are ignored, and the
    /// accented "cramér" is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .replace('é', "e")
            .chars()
            .filter(|c| !matches!(c, '\'' | '’' | ' ' | '-' | '_'))
            .collect();
        match key.as_str() {
            "cohensd" | "cohend" | "d" | "meandifferenced" => Ok(Self::CohensD),
            "etasquared" | "eta2" | "η²" | "varianceratioeta2" => Ok(Self::EtaSquared),
            "pearsonsr" | "pearsonr" | "r" | "correlationr" => Ok(Self::PearsonR),
            "cramersv" | "cramerv" | "v" | "associationv" => Ok(Self::CramersV),
            _ => Err(EffectError::UnknownMetricKind {
                name: s.to_string(),
            }),
        }
    }
}

/// Maps an effect size to its qualitative label.
pub fn interpret(value: f64, kind: MetricKind) -> &'static str {
    kind.bands()[kind.band_index(value)].1
}

/// Maps an effect size to its label, with the metric given by name.
///
/// ```
/// use u_effect::interpret::interpret_named;
///
/// assert_eq!(interpret_named(0.55, "Cramér's V").unwrap(), "very large effect size");
/// assert!(interpret_named(0.5, "odds ratio").is_err());
/// ```
pub fn interpret_named(value: f64, kind: &str) -> Result<&'static str, EffectError> {
    Ok(interpret(value, kind.parse()?))
}
