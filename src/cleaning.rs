//! Column-pair classification, validation, and cleaning.
//!
//! Each analysis path follows the same protocol: validate the selection,
//! derive a cleaned copy of the two columns, then hand the cleaned values
//! to the analyzer. The caller's [`Table`] is never modified.
//!
//! | Path | Coercion | Rows dropped |
//! |------|----------|--------------|
//! | categorical × categorical | none | missing label in either column |
//! | categorical × numeric | numeric column coerced to `f64` | missing label or failed coercion |
//! | numeric × numeric | both coerced to `f64` | failed coercion in either column |

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::dataframe::{Column, Table};
use crate::error::EffectError;

// ── Analysis kind ─────────────────────────────────────────────────────

/// The three analysis paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    /// Two categorical columns: chi-square test, Cramér's V.
    CategoricalCategorical,
    /// Categorical grouping column and numeric outcome: t-test / ANOVA.
    CategoricalNumeric,
    /// Two numeric columns: Pearson correlation.
    NumericNumeric,
}

impl AnalysisKind {
    /// All analysis kinds in menu order.
    pub const ALL: [AnalysisKind; 3] = [
        Self::CategoricalCategorical,
        Self::CategoricalNumeric,
        Self::NumericNumeric,
    ];

    /// Display name of the analysis.
    pub fn name(self) -> &'static str {
        match self {
            Self::CategoricalCategorical => "Categorical on Categorical",
            Self::CategoricalNumeric => "Categorical on Numerical",
            Self::NumericNumeric => "Numerical Correlation",
        }
    }

    /// Chooses an analysis kind from the declared column types.
    ///
    /// Two numeric columns correlate; one numeric column is compared across
    /// the other's categories; anything else is treated as categorical.
    /// Returns the kind and whether the columns must be swapped so the
    /// categorical column comes first.
    pub fn detect(a: &Column, b: &Column) -> (Self, bool) {
        let a_cat = a.data_type().is_categorical();
        let b_cat = b.data_type().is_categorical();
        match (a_cat, b_cat) {
            (false, false) => (Self::NumericNumeric, false),
            (true, false) => (Self::CategoricalNumeric, false),
            (false, true) => (Self::CategoricalNumeric, true),
            (true, true) => (Self::CategoricalCategorical, false),
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnalysisKind {
    type Err = EffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', '_'], " ");
        match key.as_str() {
            "categorical on categorical" | "categorical categorical" | "cat cat" => {
                Ok(Self::CategoricalCategorical)
            }
            "categorical on numerical" | "categorical numeric" | "cat num" => {
                Ok(Self::CategoricalNumeric)
            }
            "numerical correlation" | "numeric numeric" | "num num" => Ok(Self::NumericNumeric),
            _ => Err(EffectError::UnknownAnalysisKind {
                name: s.to_string(),
            }),
        }
    }
}

// ── Validation ────────────────────────────────────────────────────────

/// Checks that `a` and `b` are distinct columns present in `table`.
pub fn validate_selection<'t>(
    table: &'t Table,
    a: &str,
    b: &str,
) -> Result<(&'t Column, &'t Column), EffectError> {
    if a == b {
        return Err(EffectError::InvalidColumnSelection {
            reason: "please select two different columns".to_string(),
        });
    }
    let lookup = |name: &str| {
        table
            .column_by_name(name)
            .ok_or_else(|| EffectError::InvalidColumnSelection {
                reason: format!("column '{name}' not found"),
            })
    };
    Ok((lookup(a)?, lookup(b)?))
}

/// Checks that `alpha` lies strictly between 0 and 1.
pub fn validate_alpha(alpha: f64) -> Result<f64, EffectError> {
    if alpha.is_finite() && alpha > 0.0 && alpha < 1.0 {
        Ok(alpha)
    } else {
        Err(EffectError::InvalidAlpha {
            value: alpha.to_string(),
        })
    }
}

// ── Categorical × categorical ─────────────────────────────────────────

/// Labels of rows where both columns hold a value.
#[derive(Debug, Clone)]
pub struct CleanedLabels {
    /// Row labels from the first column.
    pub a: Vec<String>,
    /// Row labels from the second column.
    pub b: Vec<String>,
    /// Cleaned two-column copy.
    pub table: Table,
}

/// Drops rows with a missing label in either column.
pub fn clean_categorical_pair(
    table: &Table,
    col_a: &str,
    col_b: &str,
) -> Result<CleanedLabels, EffectError> {
    let (a, b) = validate_selection(table, col_a, col_b)?;

    let mut rows = Vec::new();
    let mut labels_a = Vec::new();
    let mut labels_b = Vec::new();
    for i in 0..table.row_count() {
        if let (Some(la), Some(lb)) = (a.label_at(i), b.label_at(i)) {
            rows.push(i);
            labels_a.push(la);
            labels_b.push(lb);
        }
    }

    let cleaned = table.project(&[col_a, col_b])?.select_rows(&rows);
    Ok(CleanedLabels {
        a: labels_a,
        b: labels_b,
        table: cleaned,
    })
}

// ── Categorical × numeric ─────────────────────────────────────────────

/// Numeric values split by category.
#[derive(Debug, Clone)]
pub struct GroupedSamples {
    /// Category labels in first-appearance order.
    pub categories: Vec<String>,
    /// Values per category, aligned with `categories`.
    pub groups: Vec<Vec<f64>>,
    /// Cleaned copy: categorical column as-is, numeric column coerced.
    pub table: Table,
}

impl GroupedSamples {
    /// Total number of observations.
    pub fn total(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

/// Coerces `num_col` to numbers and groups it by `cat_col`.
///
/// Fails with [`EffectError::InvalidCategoryCount`] when fewer than two
/// categories survive cleaning.
pub fn clean_categorical_numeric(
    table: &Table,
    cat_col: &str,
    num_col: &str,
) -> Result<GroupedSamples, EffectError> {
    let (cat, num) = validate_selection(table, cat_col, num_col)?;

    let mut rows = Vec::new();
    let mut numbers = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    let mut categories: Vec<String> = Vec::new();
    let mut groups: Vec<Vec<f64>> = Vec::new();

    for i in 0..table.row_count() {
        let (Some(label), Some(value)) = (cat.label_at(i), num.coerce_numeric_at(i)) else {
            continue;
        };
        let g = match lookup.get(&label) {
            Some(&g) => g,
            None => {
                lookup.insert(label.clone(), categories.len());
                categories.push(label);
                groups.push(Vec::new());
                categories.len() - 1
            }
        };
        groups[g].push(value);
        rows.push(i);
        numbers.push(Some(value));
    }

    if categories.len() < 2 {
        return Err(EffectError::InvalidCategoryCount {
            column: cat_col.to_string(),
            found: categories.len(),
        });
    }

    let cleaned = Table::from_columns([
        (cat_col.to_string(), cat.select(&rows)),
        (num_col.to_string(), Column::numeric_from_options(&numbers)),
    ])?;

    Ok(GroupedSamples {
        categories,
        groups,
        table: cleaned,
    })
}

// ── Numeric × numeric ─────────────────────────────────────────────────

/// Paired numeric observations.
#[derive(Debug, Clone)]
pub struct PairedSamples {
    /// Values of the first column.
    pub x: Vec<f64>,
    /// Values of the second column.
    pub y: Vec<f64>,
    /// Cleaned copy with both columns coerced.
    pub table: Table,
}

/// Coerces both columns and keeps rows where both are valid numbers.
///
/// Fails with [`EffectError::InsufficientData`] when fewer than two rows
/// remain.
pub fn clean_numeric_pair(
    table: &Table,
    col_a: &str,
    col_b: &str,
) -> Result<PairedSamples, EffectError> {
    let (a, b) = validate_selection(table, col_a, col_b)?;

    let (x, y): (Vec<f64>, Vec<f64>) = (0..table.row_count())
        .filter_map(|i| Some((a.coerce_numeric_at(i)?, b.coerce_numeric_at(i)?)))
        .unzip();

    if x.len() < 2 {
        return Err(EffectError::InsufficientData {
            min_required: 2,
            actual: x.len(),
        });
    }

    let as_options = |v: &[f64]| v.iter().copied().map(Some).collect::<Vec<_>>();
    let cleaned = Table::from_columns([
        (col_a.to_string(), Column::numeric_from_options(&as_options(&x))),
        (col_b.to_string(), Column::numeric_from_options(&as_options(&y))),
    ])?;

    Ok(PairedSamples { x, y, table: cleaned })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::ValidityBitmap;

    fn mixed_table() -> Table {
        Table::from_columns([
            (
                "group".to_string(),
                Column::categorical_from_labels(&[
                    Some("A"),
                    Some("B"),
                    None,
                    Some("A"),
                    Some("B"),
                ]),
            ),
            (
                "score".to_string(),
                Column::text(
                    vec!["1".into(), "x".into(), "3".into(), "4".into(), "5".into()],
                    ValidityBitmap::all_valid(5),
                ),
            ),
            (
                "other".to_string(),
                Column::numeric(vec![2.0, 4.0, 6.0, 8.0, 10.0], ValidityBitmap::all_valid(5)),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn same_column_rejected() {
        let table = mixed_table();
        let err = validate_selection(&table, "group", "group").unwrap_err();
        assert!(matches!(err, EffectError::InvalidColumnSelection { .. }));
    }

    #[test]
    fn missing_column_rejected() {
        let table = mixed_table();
        let err = validate_selection(&table, "group", "nope").unwrap_err();
        match err {
            EffectError::InvalidColumnSelection { reason } => assert!(reason.contains("nope")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn alpha_bounds() {
        assert_eq!(validate_alpha(0.05).unwrap(), 0.05);
        for bad in [0.0, 1.0, -0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert!(validate_alpha(bad).is_err(), "alpha {bad}");
        }
    }

    #[test]
    fn detect_kinds() {
        let table = mixed_table();
        let group = table.column_by_name("group").unwrap();
        let score = table.column_by_name("score").unwrap();
        let other = table.column_by_name("other").unwrap();
        assert_eq!(
            AnalysisKind::detect(group, other),
            (AnalysisKind::CategoricalNumeric, false)
        );
        assert_eq!(
            AnalysisKind::detect(other, group),
            (AnalysisKind::CategoricalNumeric, true)
        );
        assert_eq!(
            AnalysisKind::detect(group, score),
            (AnalysisKind::CategoricalCategorical, false)
        );
        assert_eq!(
            AnalysisKind::detect(other, other),
            (AnalysisKind::NumericNumeric, false)
        );
    }

    #[test]
    fn parse_analysis_kind() {
        assert_eq!(
            "Categorical on Numerical".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::CategoricalNumeric
        );
        assert_eq!(
            "numeric-numeric".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::NumericNumeric
        );
        for kind in AnalysisKind::ALL {
            assert_eq!(kind.name().parse::<AnalysisKind>().unwrap(), kind);
        }
        assert!("heatmap".parse::<AnalysisKind>().is_err());
    }

    #[test]
    fn categorical_pair_drops_missing() {
        let table = mixed_table();
        let cleaned = clean_categorical_pair(&table, "group", "score").unwrap();
        assert_eq!(cleaned.a, vec!["A", "B", "A", "B"]);
        assert_eq!(cleaned.b, vec!["1", "x", "4", "5"]);
        assert_eq!(cleaned.table.row_count(), 4);
        assert_eq!(cleaned.table.column_count(), 2);
    }

    #[test]
    fn categorical_numeric_coerces_and_groups() {
        let table = mixed_table();
        let grouped = clean_categorical_numeric(&table, "group", "score").unwrap();
        assert_eq!(grouped.categories, vec!["A", "B"]);
        assert_eq!(grouped.groups, vec![vec![1.0, 4.0], vec![5.0]]);
        assert_eq!(grouped.total(), 3);

        let score = grouped.table.column_by_name("score").unwrap();
        assert_eq!(score.as_numeric(), Some(&[1.0, 4.0, 5.0][..]));
        // source table untouched
        assert_eq!(table.row_count(), 5);
    }

    #[test]
    fn categorical_numeric_single_category() {
        let table = Table::from_columns([
            (
                "g".to_string(),
                Column::categorical_from_labels(&[Some("A"), Some("A"), Some("B")]),
            ),
            (
                "v".to_string(),
                Column::numeric_from_options(&[Some(1.0), Some(2.0), None]),
            ),
        ])
        .unwrap();
        let err = clean_categorical_numeric(&table, "g", "v").unwrap_err();
        assert_eq!(
            err,
            EffectError::InvalidCategoryCount {
                column: "g".into(),
                found: 1
            }
        );
    }

    #[test]
    fn numeric_pair_drops_invalid_rows() {
        let table = mixed_table();
        let paired = clean_numeric_pair(&table, "score", "other").unwrap();
        assert_eq!(paired.x, vec![1.0, 3.0, 4.0, 5.0]);
        assert_eq!(paired.y, vec![2.0, 6.0, 8.0, 10.0]);
        assert_eq!(paired.table.row_count(), 4);
    }

    #[test]
    fn numeric_pair_insufficient() {
        let table = Table::from_columns([
            (
                "x".to_string(),
                Column::numeric_from_options(&[Some(1.0), None, Some(3.0)]),
            ),
            (
                "y".to_string(),
                Column::numeric_from_options(&[Some(1.0), Some(2.0), None]),
            ),
        ])
        .unwrap();
        let err = clean_numeric_pair(&table, "x", "y").unwrap_err();
        assert_eq!(
            err,
            EffectError::InsufficientData {
                min_required: 2,
                actual: 1
            }
        );
    }
}
