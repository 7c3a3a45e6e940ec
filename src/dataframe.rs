//! Column-major table for the effect size engine.
//!
//! The [`Table`] stores named, typed columns of equal length. Each column
//! tracks missing cells with a bit-packed [`ValidityBitmap`]. The engine
//! only reads a caller's table; every cleaning step produces a derived copy
//! through [`Table::select_rows`] or [`Table::project`].
//!
//! # Column Types
//!
//! | Type | Storage | Use case |
//! |------|---------|----------|
//! | [`Numeric`](Column::Numeric) | `Vec<f64>` + bitmap | Measurements, scores |
//! | [`Boolean`](Column::Boolean) | `Vec<bool>` + bitmap | Flags |
//! | [`Categorical`](Column::Categorical) | Dictionary + `Vec<u32>` | Group labels |
//! | [`Text`](Column::Text) | `Vec<String>` + bitmap | Free-form strings |
//!
//! # Example
//!
//! ```
//! use u_effect::dataframe::{Column, Table, ValidityBitmap};
//!
//! let mut table = Table::new();
//! table.add_column(
//!     "score".to_string(),
//!     Column::numeric(vec![20.5, 21.3, 19.8], ValidityBitmap::all_valid(3)),
//! ).unwrap();
//! assert_eq!(table.row_count(), 3);
//! assert_eq!(table.column_count(), 1);
//! ```

use std::collections::HashMap;

use crate::error::EffectError;

// ── ValidityBitmap ────────────────────────────────────────────────────

/// Bit-packed validity bitmap using `Vec<u64>`.
///
/// Bit `i` is 1 when row `i` holds a value and 0 when it is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityBitmap {
    bits: Vec<u64>,
    len: usize,
}

impl ValidityBitmap {
    /// Creates a bitmap where all `len` positions are valid.
    pub fn all_valid(len: usize) -> Self {
        let n_words = len.div_ceil(64);
        let mut bits = vec![u64::MAX; n_words];
        let trailing = len % 64;
        if trailing != 0 && n_words > 0 {
            bits[n_words - 1] = (1u64 << trailing) - 1;
        }
        Self { bits, len }
    }

    /// Creates a bitmap where all `len` positions are missing.
    pub fn all_invalid(len: usize) -> Self {
        Self {
            bits: vec![0u64; len.div_ceil(64)],
            len,
        }
    }

    /// Creates an empty bitmap with no rows.
    pub fn empty() -> Self {
        Self {
            bits: Vec::new(),
            len: 0,
        }
    }

    /// Builds a bitmap from per-row flags (`true` = valid).
    pub fn from_flags(flags: &[bool]) -> Self {
        let mut bitmap = Self::empty();
        for &valid in flags {
            bitmap.push(valid);
        }
        bitmap
    }

    /// Returns `true` if the value at `idx` is valid.
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        let (word, bit) = (idx / 64, idx % 64);
        (self.bits[word] >> bit) & 1 == 1
    }

    /// Marks position `idx` as missing.
    #[inline]
    pub fn set_invalid(&mut self, idx: usize) {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        let (word, bit) = (idx / 64, idx % 64);
        self.bits[word] &= !(1u64 << bit);
    }

    /// Appends a new position.
    pub fn push(&mut self, valid: bool) {
        let idx = self.len;
        self.len += 1;
        let (word, bit) = (idx / 64, idx % 64);
        if word >= self.bits.len() {
            self.bits.push(0);
        }
        if valid {
            self.bits[word] |= 1u64 << bit;
        }
    }

    /// Returns the total number of tracked positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bitmap tracks zero positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counts missing positions.
    pub fn null_count(&self) -> usize {
        self.len - self.valid_count()
    }

    /// Counts valid positions.
    pub fn valid_count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns an iterator over indices of valid positions.
    pub fn valid_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.is_valid(i))
    }
}

// ── DataType ──────────────────────────────────────────────────────────

/// Declared scalar kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Real-valued data (stored as `f64`).
    Numeric,
    /// True/false values.
    Boolean,
    /// Dictionary-encoded labels.
    Categorical,
    /// Free-form text.
    Text,
}

impl DataType {
    /// Returns `true` for kinds the engine treats as categorical by default.
    pub fn is_categorical(self) -> bool {
        !matches!(self, Self::Numeric)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric => write!(f, "Numeric"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Categorical => write!(f, "Categorical"),
            Self::Text => write!(f, "Text"),
        }
    }
}

// ── Column ────────────────────────────────────────────────────────────

/// A typed column with a validity bitmap for missing cells.
///
/// Missing positions hold a placeholder (0.0, false, empty string, or
/// dictionary index 0) that must be ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Dense `f64` values.
    Numeric {
        values: Vec<f64>,
        validity: ValidityBitmap,
    },
    /// Boolean values.
    Boolean {
        values: Vec<bool>,
        validity: ValidityBitmap,
    },
    /// Dictionary-encoded labels; `indices[i]` points into `dictionary`.
    Categorical {
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    },
    /// Free-form text.
    Text {
        values: Vec<String>,
        validity: ValidityBitmap,
    },
}

impl Column {
    /// Creates a numeric column.
    pub fn numeric(values: Vec<f64>, validity: ValidityBitmap) -> Self {
        Self::Numeric { values, validity }
    }

    /// Creates a numeric column from optional values (`None` = missing).
    pub fn numeric_from_options(values: &[Option<f64>]) -> Self {
        let validity = ValidityBitmap::from_flags(
            &values.iter().map(Option::is_some).collect::<Vec<_>>(),
        );
        let values = values.iter().map(|v| v.unwrap_or(0.0)).collect();
        Self::Numeric { values, validity }
    }

    /// Creates a boolean column.
    pub fn boolean(values: Vec<bool>, validity: ValidityBitmap) -> Self {
        Self::Boolean { values, validity }
    }

    /// Creates a categorical column from a dictionary and indices.
    pub fn categorical(
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    ) -> Self {
        Self::Categorical {
            dictionary,
            indices,
            validity,
        }
    }

    /// Creates a categorical column from optional labels, building the
    /// dictionary in first-appearance order.
    pub fn categorical_from_labels<S: AsRef<str>>(labels: &[Option<S>]) -> Self {
        let mut lookup: HashMap<&str, u32> = HashMap::new();
        let mut dictionary = Vec::new();
        let mut indices = Vec::with_capacity(labels.len());
        let mut validity = ValidityBitmap::empty();

        for label in labels {
            match label {
                Some(s) => {
                    let s = s.as_ref();
                    let idx = *lookup.entry(s).or_insert_with(|| {
                        dictionary.push(s.to_string());
                        (dictionary.len() - 1) as u32
                    });
                    indices.push(idx);
                    validity.push(true);
                }
                None => {
                    indices.push(0);
                    validity.push(false);
                }
            }
        }

        Self::Categorical {
            dictionary,
            indices,
            validity,
        }
    }

    /// Creates a text column.
    pub fn text(values: Vec<String>, validity: ValidityBitmap) -> Self {
        Self::Text { values, validity }
    }

    /// Returns the data type of this column.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Numeric { .. } => DataType::Numeric,
            Self::Boolean { .. } => DataType::Boolean,
            Self::Categorical { .. } => DataType::Categorical,
            Self::Text { .. } => DataType::Text,
        }
    }

    /// Returns the number of rows in this column.
    pub fn len(&self) -> usize {
        self.validity().len()
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the validity bitmap.
    pub fn validity(&self) -> &ValidityBitmap {
        match self {
            Self::Numeric { validity, .. }
            | Self::Boolean { validity, .. }
            | Self::Categorical { validity, .. }
            | Self::Text { validity, .. } => validity,
        }
    }

    /// Returns the number of missing cells.
    pub fn null_count(&self) -> usize {
        self.validity().null_count()
    }

    /// Returns `true` if the cell at `idx` holds a value.
    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity().is_valid(idx)
    }

    /// Returns the raw numeric storage, or `None` if not a numeric column.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Self::Numeric { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Coerces the cell at `idx` to a real number.
    ///
    /// Numeric cells pass through (NaN and infinities count as missing),
    /// booleans map to 1.0/0.0, and labels are parsed after trimming.
    /// Anything that fails coercion is `None`.
    pub fn coerce_numeric_at(&self, idx: usize) -> Option<f64> {
        if !self.is_valid(idx) {
            return None;
        }
        let value = match self {
            Self::Numeric { values, .. } => values[idx],
            Self::Boolean { values, .. } => {
                if values[idx] {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Categorical {
                dictionary,
                indices,
                ..
            } => dictionary.get(indices[idx] as usize)?.trim().parse::<f64>().ok()?,
            Self::Text { values, .. } => values[idx].trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Returns the cell at `idx` as a category label.
    ///
    /// Numeric cells render with the shortest round-trip representation;
    /// NaN is treated as missing.
    pub fn label_at(&self, idx: usize) -> Option<String> {
        if !self.is_valid(idx) {
            return None;
        }
        match self {
            Self::Numeric { values, .. } => {
                let v = values[idx];
                (!v.is_nan()).then(|| v.to_string())
            }
            Self::Boolean { values, .. } => Some(values[idx].to_string()),
            Self::Categorical {
                dictionary,
                indices,
                ..
            } => dictionary.get(indices[idx] as usize).cloned(),
            Self::Text { values, .. } => Some(values[idx].clone()),
        }
    }

    /// Returns the category string at `idx` in a categorical column.
    pub fn category_at(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Categorical {
                dictionary,
                indices,
                validity,
            } if validity.is_valid(idx) => {
                dictionary.get(indices[idx] as usize).map(|s| s.as_str())
            }
            _ => None,
        }
    }

    /// Returns a new column holding only the rows at `rows`, in order.
    ///
    /// Categorical dictionaries are rebuilt so they only contain labels
    /// that survive the selection.
    pub fn select(&self, rows: &[usize]) -> Column {
        let validity =
            ValidityBitmap::from_flags(&rows.iter().map(|&i| self.is_valid(i)).collect::<Vec<_>>());
        match self {
            Self::Numeric { values, .. } => {
                Self::numeric(rows.iter().map(|&i| values[i]).collect(), validity)
            }
            Self::Boolean { values, .. } => {
                Self::boolean(rows.iter().map(|&i| values[i]).collect(), validity)
            }
            Self::Categorical { .. } => {
                let labels: Vec<Option<&str>> =
                    rows.iter().map(|&i| self.category_at(i)).collect();
                Self::categorical_from_labels(&labels)
            }
            Self::Text { values, .. } => {
                Self::text(rows.iter().map(|&i| values[i].clone()).collect(), validity)
            }
        }
    }
}

// ── Table ─────────────────────────────────────────────────────────────

/// Column-major tabular data: named columns of equal length.
///
/// ```
/// use u_effect::dataframe::{Column, Table, ValidityBitmap};
///
/// let mut table = Table::new();
/// table.add_column(
///     "x".to_string(),
///     Column::numeric(vec![1.0, 2.0, 3.0], ValidityBitmap::all_valid(3)),
/// ).unwrap();
/// table.add_column(
///     "group".to_string(),
///     Column::categorical_from_labels(&[Some("a"), Some("b"), None]),
/// ).unwrap();
///
/// let subset = table.select_rows(&[0, 1]);
/// assert_eq!(subset.row_count(), 2);
/// assert_eq!(table.row_count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Builds a table from `(name, column)` pairs.
    pub fn from_columns<I>(columns: I) -> Result<Self, EffectError>
    where
        I: IntoIterator<Item = (String, Column)>,
    {
        let mut table = Self::new();
        for (name, column) in columns {
            table.add_column(name, column)?;
        }
        Ok(table)
    }

    /// Adds a named column.
    ///
    /// Fails if the column length differs from the existing row count or
    /// the name is already taken.
    pub fn add_column(&mut self, name: String, column: Column) -> Result<(), EffectError> {
        if self.column_index(&name).is_some() {
            return Err(EffectError::InvalidColumnSelection {
                reason: format!("column '{name}' already exists"),
            });
        }
        let col_len = column.len();
        if self.columns.is_empty() {
            self.row_count = col_len;
        } else if col_len != self.row_count {
            return Err(EffectError::DimensionMismatch {
                expected: self.row_count,
                actual: col_len,
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Returns the number of rows.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the table has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns column names in order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Returns the column at `index`.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns the column with the given `name`.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Returns the index of the column with the given `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Returns an iterator over `(name, column)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(|s| s.as_str()).zip(self.columns.iter())
    }

    /// Returns `(name, data type)` for every column.
    pub fn schema(&self) -> Vec<(&str, DataType)> {
        self.iter().map(|(name, col)| (name, col.data_type())).collect()
    }

    /// Returns a copy holding only the given rows (all columns).
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.select(rows)).collect(),
            row_count: rows.len(),
        }
    }

    /// Returns a copy holding only the named columns, in the given order.
    pub fn project(&self, names: &[&str]) -> Result<Table, EffectError> {
        let mut table = Table::new();
        for &name in names {
            let column = self
                .column_by_name(name)
                .ok_or_else(|| EffectError::InvalidColumnSelection {
                    reason: format!("column '{name}' not found"),
                })?;
            table.add_column(name.to_string(), column.clone())?;
        }
        Ok(table)
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── ValidityBitmap ───────────────────────────────────────────

    #[test]
    fn bitmap_all_valid_and_invalid() {
        let bm = ValidityBitmap::all_valid(100);
        assert_eq!(bm.len(), 100);
        assert_eq!(bm.null_count(), 0);
        assert!((0..100).all(|i| bm.is_valid(i)));

        let bm = ValidityBitmap::all_invalid(70);
        assert_eq!(bm.valid_count(), 0);
        assert_eq!(bm.null_count(), 70);
    }

    #[test]
    fn bitmap_push_across_word_boundary() {
        let mut bm = ValidityBitmap::empty();
        for i in 0..130 {
            bm.push(i % 3 != 0);
        }
        assert_eq!(bm.len(), 130);
        assert_eq!(bm.null_count(), (0..130).filter(|i| i % 3 == 0).count());
        assert!(bm.is_valid(64));
        assert!(!bm.is_valid(129));
    }

    #[test]
    fn bitmap_valid_indices() {
        let mut bm = ValidityBitmap::all_valid(5);
        bm.set_invalid(1);
        bm.set_invalid(3);
        let indices: Vec<usize> = bm.valid_indices().collect();
        assert_eq!(indices, vec![0, 2, 4]);
    }

    // ── Coercion and labels ──────────────────────────────────────

    #[test]
    fn coerce_text_to_numeric() {
        let col = Column::text(
            vec!["1.5".into(), " 2 ".into(), "abc".into(), "inf".into()],
            ValidityBitmap::all_valid(4),
        );
        assert_eq!(col.coerce_numeric_at(0), Some(1.5));
        assert_eq!(col.coerce_numeric_at(1), Some(2.0));
        assert_eq!(col.coerce_numeric_at(2), None);
        assert_eq!(col.coerce_numeric_at(3), None);
    }

    #[test]
    fn coerce_numeric_and_boolean() {
        let mut validity = ValidityBitmap::all_valid(3);
        validity.set_invalid(2);
        let col = Column::numeric(vec![3.0, f64::NAN, 0.0], validity);
        assert_eq!(col.coerce_numeric_at(0), Some(3.0));
        assert_eq!(col.coerce_numeric_at(1), None);
        assert_eq!(col.coerce_numeric_at(2), None);

        let col = Column::boolean(vec![true, false], ValidityBitmap::all_valid(2));
        assert_eq!(col.coerce_numeric_at(0), Some(1.0));
        assert_eq!(col.coerce_numeric_at(1), Some(0.0));
    }

    #[test]
    fn labels_for_every_type() {
        let col = Column::numeric(vec![1.0, 2.5], ValidityBitmap::all_valid(2));
        assert_eq!(col.label_at(0).as_deref(), Some("1"));
        assert_eq!(col.label_at(1).as_deref(), Some("2.5"));

        let col = Column::categorical_from_labels(&[Some("low"), None, Some("high")]);
        assert_eq!(col.label_at(0).as_deref(), Some("low"));
        assert_eq!(col.label_at(1), None);
        assert_eq!(col.category_at(2), Some("high"));

        let col = Column::boolean(vec![true], ValidityBitmap::all_valid(1));
        assert_eq!(col.label_at(0).as_deref(), Some("true"));
    }

    #[test]
    fn categorical_dictionary_in_first_appearance_order() {
        let col = Column::categorical_from_labels(&[Some("b"), Some("a"), Some("b")]);
        match col {
            Column::Categorical {
                dictionary,
                indices,
                ..
            } => {
                assert_eq!(dictionary, vec!["b".to_string(), "a".to_string()]);
                assert_eq!(indices, vec![0, 1, 0]);
            }
            _ => panic!("expected categorical column"),
        }
    }

    // ── Table ────────────────────────────────────────────────────

    #[test]
    fn column_length_mismatch() {
        let mut table = Table::new();
        table
            .add_column(
                "x".into(),
                Column::numeric(vec![1.0, 2.0], ValidityBitmap::all_valid(2)),
            )
            .unwrap();
        let err = table
            .add_column(
                "y".into(),
                Column::numeric(vec![1.0, 2.0, 3.0], ValidityBitmap::all_valid(3)),
            )
            .unwrap_err();
        assert!(matches!(err, EffectError::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn duplicate_column_name_rejected() {
        let mut table = Table::new();
        let col = Column::numeric(vec![1.0], ValidityBitmap::all_valid(1));
        table.add_column("x".into(), col.clone()).unwrap();
        assert!(table.add_column("x".into(), col).is_err());
    }

    #[test]
    fn select_rows_leaves_source_untouched() {
        let table = Table::from_columns([
            (
                "g".to_string(),
                Column::categorical_from_labels(&[Some("a"), Some("b"), Some("c")]),
            ),
            (
                "v".to_string(),
                Column::numeric(vec![1.0, 2.0, 3.0], ValidityBitmap::all_valid(3)),
            ),
        ])
        .unwrap();

        let subset = table.select_rows(&[2, 0]);
        assert_eq!(subset.row_count(), 2);
        assert_eq!(subset.column_by_name("v").unwrap().as_numeric(), Some(&[3.0, 1.0][..]));
        assert_eq!(subset.column_by_name("g").unwrap().category_at(0), Some("c"));
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn project_keeps_requested_order() {
        let table = Table::from_columns([
            (
                "a".to_string(),
                Column::numeric(vec![1.0], ValidityBitmap::all_valid(1)),
            ),
            (
                "b".to_string(),
                Column::numeric(vec![2.0], ValidityBitmap::all_valid(1)),
            ),
        ])
        .unwrap();
        let projected = table.project(&["b", "a"]).unwrap();
        assert_eq!(projected.column_names(), &["b", "a"]);
        assert!(table.project(&["missing"]).is_err());
    }

    #[test]
    fn schema_reports_types() {
        let table = Table::from_columns([
            (
                "x".to_string(),
                Column::numeric(vec![1.0], ValidityBitmap::all_valid(1)),
            ),
            (
                "ok".to_string(),
                Column::boolean(vec![true], ValidityBitmap::all_valid(1)),
            ),
            (
                "label".to_string(),
                Column::text(vec!["a".into()], ValidityBitmap::all_valid(1)),
            ),
        ])
        .unwrap();
        let schema = table.schema();
        assert_eq!(schema[0], ("x", DataType::Numeric));
        assert_eq!(schema[1], ("ok", DataType::Boolean));
        assert_eq!(schema[2], ("label", DataType::Text));
    }
}
