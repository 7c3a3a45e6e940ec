//! # u-effect
//!
//! Effect size engine with C FFI bindings.
//!
//! u-effect takes two columns of a table, picks the statistical test that
//! fits their types, and reports how strong the relationship is alongside
//! whether it is significant:
//!
//! - **Categorical × Categorical**: chi-square test of independence, Cramér's V
//! - **Categorical × Numerical**: t-test and Cohen's d (2 groups), one-way ANOVA and η² (3+ groups)
//! - **Numerical × Numerical**: Pearson correlation and a fitted regression line
//!
//! ## Modules
//!
//! - [`dataframe`] — Column-major table model (Table, Column, DataType)
//! - [`inference`] — Builds typed columns from raw string cells
//! - [`cleaning`] — Column selection checks and per-analysis row cleaning
//! - [`association`] — Contingency tables, chi-square, Cramér's V
//! - [`group_comparison`] — Cohen's d and η² across category groups
//! - [`correlation`] — Pearson's r and simple linear regression
//! - [`interpret`] — Metric kinds and magnitude bands
//! - [`result`] — Analysis result record and result text
//! - [`engine`] — Validation and dispatch
//! - [`plot`] — Chart requests for a finished analysis
//! - [`ffi`] — C FFI bindings (auto-generated C header via cbindgen)
//! - [`error`] — Error types
//!
//! ## Quick Start
//!
//! ```
//! use u_effect::dataframe::Table;
//! use u_effect::engine::{analyze_auto, AnalysisConfig};
//! use u_effect::inference::ColumnBuilder;
//!
//! let builder = ColumnBuilder::new();
//! let group = builder.build(&["ctrl", "ctrl", "ctrl", "ctrl", "trt", "trt", "trt", "trt", "ctrl", "trt"]);
//! let score = builder.build(&["1", "2", "3", "2", "7", "8", "9", "8", "NA", "7"]);
//!
//! let table = Table::from_columns([
//!     ("group".to_string(), group),
//!     ("score".to_string(), score),
//! ]).unwrap();
//!
//! let result = analyze_auto(&table, "score", "group", &AnalysisConfig::default()).unwrap();
//! assert_eq!(result.columns.0, "group");
//! assert_eq!(result.cleaned.row_count(), 9);
//! assert!(result.significant);
//! assert!(result.result_text().starts_with("Cohen's d"));
//! ```

pub mod association;
pub mod cleaning;
pub mod correlation;
pub mod dataframe;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod group_comparison;
pub mod inference;
pub mod interpret;
pub mod plot;
pub mod result;
