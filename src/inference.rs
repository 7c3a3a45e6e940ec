//! Typed column construction from raw string cells.
//!
//! Shells that hold untyped cells (a spreadsheet grid, a C string array)
//! use [`ColumnBuilder`] to turn them into a [`Column`] with an inferred
//! type. Inference priority is Numeric → Categorical → Text. Strings that
//! look like booleans stay categorical so their labels ("Yes"/"No") are
//! preserved in result text and charts.
//!
//! ```
//! use u_effect::inference::ColumnBuilder;
//! use u_effect::dataframe::DataType;
//!
//! let builder = ColumnBuilder::new();
//! let col = builder.build(&["1.5", "NA", "3"]);
//! assert_eq!(col.data_type(), DataType::Numeric);
//! assert_eq!(col.null_count(), 1);
//!
//! let col = builder.build(&["Yes", "No", "Yes", "Yes", "No"]);
//! assert_eq!(col.data_type(), DataType::Categorical);
//! ```

use std::collections::HashSet;

use crate::dataframe::{Column, DataType, ValidityBitmap};

/// Standard missing-value markers.
const DEFAULT_NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "na", "n/a", "null", "NULL", "None", "none", ".", "NaN", "nan", "NAN",
    "#N/A", "#NA",
];

/// Maximum unique-value ratio for a string column to be Categorical
/// instead of Text.
const CATEGORICAL_THRESHOLD: f64 = 0.5;

/// Maximum dictionary size for categorical columns.
const MAX_CATEGORICAL_UNIQUE: usize = 1000;

/// Builds typed columns from string cells.
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    null_markers: Vec<String>,
}

impl ColumnBuilder {
    /// Creates a builder with the standard missing-value markers.
    pub fn new() -> Self {
        Self {
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replaces the missing-value markers.
    pub fn null_markers(mut self, markers: Vec<String>) -> Self {
        self.null_markers = markers;
        self
    }

    fn is_null(&self, value: &str) -> bool {
        let trimmed = value.trim();
        self.null_markers.iter().any(|m| m == trimmed)
    }

    /// Builds a column from cells, inferring its type.
    pub fn build<S: AsRef<str>>(&self, cells: &[S]) -> Column {
        let cells: Vec<Option<&str>> = cells.iter().map(|c| Some(c.as_ref())).collect();
        self.build_optional(&cells)
    }

    /// Builds a column from cells where `None` is an explicit missing value.
    pub fn build_optional(&self, cells: &[Option<&str>]) -> Column {
        let trimmed: Vec<Option<&str>> = cells
            .iter()
            .map(|c| c.map(str::trim).filter(|s| !self.is_null(s)))
            .collect();

        let present: Vec<&str> = trimmed.iter().flatten().copied().collect();
        if present.is_empty() {
            let n = cells.len();
            return Column::numeric(vec![0.0; n], ValidityBitmap::all_invalid(n));
        }

        match infer_type(&present) {
            DataType::Numeric => {
                let values: Vec<Option<f64>> = trimmed
                    .iter()
                    .map(|c| c.and_then(|s| s.parse::<f64>().ok()))
                    .collect();
                Column::numeric_from_options(&values)
            }
            DataType::Categorical => Column::categorical_from_labels(&trimmed),
            DataType::Boolean | DataType::Text => {
                let validity = ValidityBitmap::from_flags(
                    &trimmed.iter().map(Option::is_some).collect::<Vec<_>>(),
                );
                let values = trimmed
                    .iter()
                    .map(|c| c.unwrap_or_default().to_string())
                    .collect();
                Column::text(values, validity)
            }
        }
    }
}

impl Default for ColumnBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks the most specific type that fits all present values.
fn infer_type(present: &[&str]) -> DataType {
    if present.iter().all(|s| s.parse::<f64>().is_ok()) {
        return DataType::Numeric;
    }

    let unique: HashSet<&str> = present.iter().copied().collect();
    let ratio = unique.len() as f64 / present.len() as f64;
    if ratio < CATEGORICAL_THRESHOLD && unique.len() <= MAX_CATEGORICAL_UNIQUE {
        DataType::Categorical
    } else {
        DataType::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_with_markers() {
        let col = ColumnBuilder::new().build(&["1", " 2.5 ", "NA", "", "-3e2"]);
        assert_eq!(col.data_type(), DataType::Numeric);
        assert_eq!(col.null_count(), 2);
        assert_eq!(col.coerce_numeric_at(4), Some(-300.0));
    }

    #[test]
    fn single_non_numeric_demotes_to_text() {
        let col = ColumnBuilder::new().build(&["1", "2", "three"]);
        assert_eq!(col.data_type(), DataType::Text);
        assert_eq!(col.coerce_numeric_at(0), Some(1.0));
        assert_eq!(col.coerce_numeric_at(2), None);
    }

    #[test]
    fn low_cardinality_is_categorical() {
        let cells = ["A", "B", "A", "B", "A", "B"];
        let col = ColumnBuilder::new().build(&cells);
        assert_eq!(col.data_type(), DataType::Categorical);
        assert_eq!(col.category_at(1), Some("B"));
    }

    #[test]
    fn explicit_missing_cells() {
        let col = ColumnBuilder::new().build_optional(&[Some("x"), None, Some("x"), Some("x")]);
        assert_eq!(col.data_type(), DataType::Categorical);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn all_missing_column() {
        let col = ColumnBuilder::new().build(&["NA", "", "null"]);
        assert_eq!(col.len(), 3);
        assert_eq!(col.null_count(), 3);
    }

    #[test]
    fn custom_null_markers() {
        let col = ColumnBuilder::new()
            .null_markers(vec!["-999".into()])
            .build(&["1", "-999", "2"]);
        assert_eq!(col.null_count(), 1);
    }
}
