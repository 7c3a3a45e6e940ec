//! C FFI bindings for u-effect.
//!
//! Lets a non-Rust shell build a table column by column, run an analysis,
//! and read back the result record and result text.
//!
//! # Design
//!
//! - **Opaque handle**: `*mut TableHandle`, freed with `effect_table_free`
//! - **`#[repr(C)]`**: result struct [`CEffectSizeResult`]
//! - **Integer error codes**: 0 = success, negative = error
//! - **Thread-local error message**: `effect_last_error()`
//! - **`catch_unwind`**: every entry point, so panics never cross the boundary
//!
//! # Enumerations
//!
//! Analysis kind (`kind` argument, `CEffectSizeResult::analysis`):
//!
//! | Code | Analysis kind |
//! |------|---------------|
//! | 0 | Categorical on Categorical |
//! | 1 | Categorical on Numerical |
//! | 2 | Numerical Correlation |
//! | 3 | auto-detect (input only) |
//!
//! Metric (`CEffectSizeResult::metric`, `effect_interpret`):
//!
//! | Code | Metric |
//! |------|--------|
//! | 0 | Cohen's d |
//! | 1 | Eta squared |
//! | 2 | Pearson's r |
//! | 3 | Cramér's V |

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;

use crate::cleaning::AnalysisKind;
use crate::dataframe::{Column, Table, ValidityBitmap};
use crate::engine::{analyze, analyze_auto, AnalysisConfig};
use crate::error::EffectError;
use crate::inference::ColumnBuilder;
use crate::interpret::{interpret, MetricKind};
use crate::result::EffectSizeResult;

// ── Error handling ────────────────────────────────────────────────────

pub const EFFECT_OK: i32 = 0;
pub const EFFECT_ERR_NULL_PTR: i32 = -1;
/// Bad column selection, alpha, selector, or column shape.
pub const EFFECT_ERR_INVALID_INPUT: i32 = -2;
/// Data does not support the analysis (categories, variance, row count).
pub const EFFECT_ERR_ANALYSIS_FAILED: i32 = -4;
pub const EFFECT_ERR_PANIC: i32 = -99;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = CString::new(msg).ok();
    });
}

fn error_code(err: &EffectError) -> i32 {
    match err {
        EffectError::InvalidCategoryCount { .. }
        | EffectError::ZeroVariance { .. }
        | EffectError::InsufficientData { .. } => EFFECT_ERR_ANALYSIS_FAILED,
        _ => EFFECT_ERR_INVALID_INPUT,
    }
}

fn fail(err: EffectError) -> i32 {
    set_last_error(&err.to_string());
    error_code(&err)
}

/// Runs `body`, converting a panic into `EFFECT_ERR_PANIC`.
fn guarded(name: &str, body: impl FnOnce() -> i32) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(code) => code,
        Err(_) => {
            set_last_error(&format!("panic in {name}"));
            EFFECT_ERR_PANIC
        }
    }
}

/// Reads a required UTF-8 C string argument.
///
/// # Safety
/// `ptr` must be null or a valid null-terminated string.
unsafe fn str_arg<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, i32> {
    if ptr.is_null() {
        set_last_error(&format!("null {what} pointer"));
        return Err(EFFECT_ERR_NULL_PTR);
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().map_err(|e| {
        set_last_error(&format!("invalid UTF-8 in {what}: {e}"));
        EFFECT_ERR_INVALID_INPUT
    })
}

/// Returns the last error message, or null if no error.
/// The returned string is valid until the next FFI call on this thread.
///
/// # Safety
/// The caller must not free the returned pointer.
#[no_mangle]
pub extern "C" fn effect_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| match cell.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn effect_clear_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Frees a string returned by this library.
///
/// # Safety
/// `s` must come from `effect_result_text` or `effect_interpret`, or be null.
#[no_mangle]
pub unsafe extern "C" fn effect_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = unsafe { CString::from_raw(s) };
    }
}

// ── Table handle ──────────────────────────────────────────────────────

/// Opaque table handle owned by the caller.
pub struct TableHandle {
    table: Table,
}

/// Creates an empty table.
///
/// The returned handle must be freed with `effect_table_free`.
#[no_mangle]
pub extern "C" fn effect_table_new() -> *mut TableHandle {
    Box::into_raw(Box::new(TableHandle {
        table: Table::new(),
    }))
}

/// Frees a table handle.
///
/// # Safety
/// `handle` must come from `effect_table_new`, or be null.
#[no_mangle]
pub unsafe extern "C" fn effect_table_free(handle: *mut TableHandle) {
    if !handle.is_null() {
        let _ = unsafe { Box::from_raw(handle) };
    }
}

/// Returns the number of rows, or -1 for a null handle.
///
/// # Safety
/// `handle` must be a valid table handle or null.
#[no_mangle]
pub unsafe extern "C" fn effect_table_row_count(handle: *const TableHandle) -> i64 {
    if handle.is_null() {
        set_last_error("null table handle");
        return -1;
    }
    unsafe { &*handle }.table.row_count() as i64
}

/// Appends a numeric column.
///
/// `validity` may be null (all values present); otherwise it holds `len`
/// bytes where 0 marks a missing value.
///
/// # Safety
/// `handle` and `name` must be valid. `values` must point to `len` f64s and
/// `validity`, if not null, to `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn effect_table_add_numeric(
    handle: *mut TableHandle,
    name: *const c_char,
    values: *const f64,
    validity: *const u8,
    len: u32,
) -> i32 {
    guarded("effect_table_add_numeric", || {
        if handle.is_null() || (values.is_null() && len > 0) {
            set_last_error("null pointer");
            return EFFECT_ERR_NULL_PTR;
        }
        let name = match unsafe { str_arg(name, "column name") } {
            Ok(s) => s,
            Err(code) => return code,
        };
        let n = len as usize;
        let values = if n == 0 {
            Vec::new()
        } else {
            unsafe { slice::from_raw_parts(values, n) }.to_vec()
        };
        let bitmap = if validity.is_null() {
            ValidityBitmap::all_valid(n)
        } else {
            let flags: Vec<bool> = unsafe { slice::from_raw_parts(validity, n) }
                .iter()
                .map(|&b| b != 0)
                .collect();
            ValidityBitmap::from_flags(&flags)
        };

        let handle = unsafe { &mut *handle };
        match handle
            .table
            .add_column(name.to_string(), Column::numeric(values, bitmap))
        {
            Ok(()) => EFFECT_OK,
            Err(e) => fail(e),
        }
    })
}

/// Appends a column of string cells; the column type is inferred.
///
/// A null entry in `cells` is a missing value, as are the standard markers
/// ("", "NA", "null", ...).
///
/// # Safety
/// `handle` and `name` must be valid. `cells` must point to `len` entries,
/// each null or a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn effect_table_add_text(
    handle: *mut TableHandle,
    name: *const c_char,
    cells: *const *const c_char,
    len: u32,
) -> i32 {
    guarded("effect_table_add_text", || {
        if handle.is_null() || (cells.is_null() && len > 0) {
            set_last_error("null pointer");
            return EFFECT_ERR_NULL_PTR;
        }
        let name = match unsafe { str_arg(name, "column name") } {
            Ok(s) => s,
            Err(code) => return code,
        };
        let raw: &[*const c_char] = if len == 0 {
            &[]
        } else {
            unsafe { slice::from_raw_parts(cells, len as usize) }
        };

        let mut owned: Vec<Option<&str>> = Vec::with_capacity(raw.len());
        for &cell in raw {
            if cell.is_null() {
                owned.push(None);
                continue;
            }
            match unsafe { CStr::from_ptr(cell) }.to_str() {
                Ok(s) => owned.push(Some(s)),
                Err(e) => {
                    set_last_error(&format!("invalid UTF-8 in column '{name}': {e}"));
                    return EFFECT_ERR_INVALID_INPUT;
                }
            }
        }

        let column = ColumnBuilder::new().build_optional(&owned);
        let handle = unsafe { &mut *handle };
        match handle.table.add_column(name.to_string(), column) {
            Ok(()) => EFFECT_OK,
            Err(e) => fail(e),
        }
    })
}

// ── Analysis ──────────────────────────────────────────────────────────

/// C-compatible effect size result.
#[repr(C)]
pub struct CEffectSizeResult {
    /// Analysis kind used: 0 = cat×cat, 1 = cat×num, 2 = num×num.
    pub analysis: u32,
    /// Metric: 0 = Cohen's d, 1 = eta squared, 2 = Pearson's r, 3 = Cramér's V.
    pub metric: u32,
    /// Test statistic (χ², t, F, or r).
    pub statistic: f64,
    /// P-value.
    pub p_value: f64,
    /// Effect size (always computed).
    pub effect_size: f64,
    /// Significance threshold used.
    pub alpha: f64,
    /// 1 if p_value <= alpha, else 0.
    pub significant: u8,
    /// Number of rows remaining after cleaning.
    pub rows_used: u64,
}

fn analysis_code(kind: AnalysisKind) -> u32 {
    match kind {
        AnalysisKind::CategoricalCategorical => 0,
        AnalysisKind::CategoricalNumeric => 1,
        AnalysisKind::NumericNumeric => 2,
    }
}

fn metric_code(kind: MetricKind) -> u32 {
    match kind {
        MetricKind::CohensD => 0,
        MetricKind::EtaSquared => 1,
        MetricKind::PearsonR => 2,
        MetricKind::CramersV => 3,
    }
}

fn metric_from_code(code: u32) -> Option<MetricKind> {
    MetricKind::ALL.into_iter().find(|&m| metric_code(m) == code)
}

/// Shared body of the analysis entry points.
///
/// # Safety
/// Same contract as `effect_analyze`.
unsafe fn run_analysis(
    handle: *const TableHandle,
    col_a: *const c_char,
    col_b: *const c_char,
    kind: u32,
    alpha: f64,
) -> Result<EffectSizeResult, i32> {
    if handle.is_null() {
        set_last_error("null table handle");
        return Err(EFFECT_ERR_NULL_PTR);
    }
    let a = unsafe { str_arg(col_a, "column") }?;
    let b = unsafe { str_arg(col_b, "column") }?;
    let table = &unsafe { &*handle }.table;
    let config = AnalysisConfig { alpha };

    let outcome = match kind {
        0 => analyze(table, a, b, AnalysisKind::CategoricalCategorical, &config),
        1 => analyze(table, a, b, AnalysisKind::CategoricalNumeric, &config),
        2 => analyze(table, a, b, AnalysisKind::NumericNumeric, &config),
        3 => analyze_auto(table, a, b, &config),
        other => Err(EffectError::UnknownAnalysisKind {
            name: other.to_string(),
        }),
    };
    outcome.map_err(fail)
}

/// Runs an effect size analysis.
///
/// `kind`: 0 = cat×cat, 1 = cat×num (`col_a` categorical), 2 = num×num,
/// 3 = detect from column types. `alpha` must lie in (0, 1).
///
/// # Safety
/// `handle` must be a valid table handle; `col_a`/`col_b` valid C strings;
/// `out` must point to a writable `CEffectSizeResult`.
#[no_mangle]
pub unsafe extern "C" fn effect_analyze(
    handle: *const TableHandle,
    col_a: *const c_char,
    col_b: *const c_char,
    kind: u32,
    alpha: f64,
    out: *mut CEffectSizeResult,
) -> i32 {
    guarded("effect_analyze", || {
        if out.is_null() {
            set_last_error("null out pointer");
            return EFFECT_ERR_NULL_PTR;
        }
        let result = match unsafe { run_analysis(handle, col_a, col_b, kind, alpha) } {
            Ok(r) => r,
            Err(code) => return code,
        };
        unsafe {
            (*out) = CEffectSizeResult {
                analysis: analysis_code(result.analysis),
                metric: metric_code(result.effect.kind),
                statistic: result.statistic,
                p_value: result.p_value,
                effect_size: result.effect.value,
                alpha: result.alpha,
                significant: u8::from(result.significant),
                rows_used: result.cleaned.row_count() as u64,
            };
        }
        EFFECT_OK
    })
}

/// Runs an analysis and returns its result text, or null on error.
///
/// # Safety
/// Same as `effect_analyze`. Free the result with `effect_free_string`.
#[no_mangle]
pub unsafe extern "C" fn effect_result_text(
    handle: *const TableHandle,
    col_a: *const c_char,
    col_b: *const c_char,
    kind: u32,
    alpha: f64,
) -> *mut c_char {
    let mut text = ptr::null_mut();
    guarded("effect_result_text", || {
        match unsafe { run_analysis(handle, col_a, col_b, kind, alpha) } {
            Ok(result) => match CString::new(result.result_text()) {
                Ok(s) => {
                    text = s.into_raw();
                    EFFECT_OK
                }
                Err(_) => {
                    set_last_error("result text contains a NUL byte");
                    EFFECT_ERR_INVALID_INPUT
                }
            },
            Err(code) => code,
        }
    });
    text
}

/// Returns the interpretation label for `value` under `metric`, or null
/// for an unknown metric code.
///
/// # Safety
/// Free the result with `effect_free_string`.
#[no_mangle]
pub extern "C" fn effect_interpret(value: f64, metric: u32) -> *mut c_char {
    match metric_from_code(metric) {
        Some(kind) => CString::new(interpret(value, kind))
            .map(CString::into_raw)
            .unwrap_or(ptr::null_mut()),
        None => {
            set_last_error(
                &EffectError::UnknownMetricKind {
                    name: metric.to_string(),
                }
                .to_string(),
            );
            ptr::null_mut()
        }
    }
}

// ── Version ──────────────────────────────────────────────────────────

/// Returns the version string of u-effect.
///
/// # Safety
/// The returned string is static. Do not free it.
#[no_mangle]
pub extern "C" fn effect_version() -> *const c_char {
    c"0.1.0".as_ptr()
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn last_error() -> String {
        let p = effect_last_error();
        assert!(!p.is_null());
        unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string()
    }

    fn owned_text(p: *mut c_char) -> String {
        assert!(!p.is_null());
        let s = unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string();
        unsafe { effect_free_string(p) };
        s
    }

    /// Group/Outcome/Score table with 20 rows.
    fn build_table() -> *mut TableHandle {
        let handle = effect_table_new();
        let groups: Vec<CString> = (0..20)
            .map(|i| CString::new(if i < 10 { "A" } else { "B" }).unwrap())
            .collect();
        let outcomes: Vec<CString> = (0..20)
            .map(|i| CString::new(if i < 9 || i == 19 { "Yes" } else { "No" }).unwrap())
            .collect();
        let group_ptrs: Vec<*const c_char> = groups.iter().map(|s| s.as_ptr()).collect();
        let outcome_ptrs: Vec<*const c_char> = outcomes.iter().map(|s| s.as_ptr()).collect();
        let scores: Vec<f64> = (0..20)
            .map(|i| if i < 10 { 1.0 + (i % 3) as f64 } else { 6.0 + (i % 4) as f64 })
            .collect();

        let group = CString::new("Group").unwrap();
        let outcome = CString::new("Outcome").unwrap();
        let score = CString::new("Score").unwrap();
        unsafe {
            assert_eq!(
                effect_table_add_text(handle, group.as_ptr(), group_ptrs.as_ptr(), 20),
                EFFECT_OK
            );
            assert_eq!(
                effect_table_add_text(handle, outcome.as_ptr(), outcome_ptrs.as_ptr(), 20),
                EFFECT_OK
            );
            assert_eq!(
                effect_table_add_numeric(handle, score.as_ptr(), scores.as_ptr(), ptr::null(), 20),
                EFFECT_OK
            );
        }
        handle
    }

    #[test]
    fn ffi_version() {
        let s = unsafe { CStr::from_ptr(effect_version()) }.to_str().unwrap();
        assert_eq!(s, "0.1.0");
    }

    #[test]
    fn ffi_error_lifecycle() {
        effect_clear_error();
        assert!(effect_last_error().is_null());
        set_last_error("test error");
        assert_eq!(last_error(), "test error");
        effect_clear_error();
        assert!(effect_last_error().is_null());
    }

    #[test]
    fn ffi_analyze_roundtrip() {
        let handle = build_table();
        assert_eq!(unsafe { effect_table_row_count(handle) }, 20);

        let group = CString::new("Group").unwrap();
        let score = CString::new("Score").unwrap();
        let mut out = CEffectSizeResult {
            analysis: 99,
            metric: 99,
            statistic: 0.0,
            p_value: 0.0,
            effect_size: 0.0,
            alpha: 0.0,
            significant: 0,
            rows_used: 0,
        };
        let rc = unsafe { effect_analyze(handle, group.as_ptr(), score.as_ptr(), 1, 0.05, &mut out) };
        assert_eq!(rc, EFFECT_OK);
        assert_eq!(out.analysis, 1);
        assert_eq!(out.metric, 0);
        assert_eq!(out.significant, 1);
        assert!(out.effect_size < -0.8);
        assert_eq!(out.rows_used, 20);

        let text = owned_text(unsafe {
            effect_result_text(handle, group.as_ptr(), score.as_ptr(), 3, 0.05)
        });
        assert!(text.starts_with("Cohen's d: "));

        unsafe { effect_table_free(handle) };
    }

    #[test]
    fn ffi_reports_analysis_errors() {
        let handle = build_table();
        let group = CString::new("Group").unwrap();

        let mut out = CEffectSizeResult {
            analysis: 0,
            metric: 0,
            statistic: 0.0,
            p_value: 0.0,
            effect_size: 0.0,
            alpha: 0.0,
            significant: 0,
            rows_used: 0,
        };
        let rc = unsafe { effect_analyze(handle, group.as_ptr(), group.as_ptr(), 0, 0.05, &mut out) };
        assert_eq!(rc, EFFECT_ERR_INVALID_INPUT);
        assert!(last_error().contains("two different columns"));

        let outcome = CString::new("Outcome").unwrap();
        let rc = unsafe { effect_analyze(handle, group.as_ptr(), outcome.as_ptr(), 0, 2.0, &mut out) };
        assert_eq!(rc, EFFECT_ERR_INVALID_INPUT);

        let rc = unsafe { effect_analyze(handle, group.as_ptr(), outcome.as_ptr(), 7, 0.05, &mut out) };
        assert_eq!(rc, EFFECT_ERR_INVALID_INPUT);

        unsafe { effect_table_free(handle) };
    }

    #[test]
    fn ffi_null_pointers() {
        let rc = unsafe {
            effect_analyze(ptr::null(), ptr::null(), ptr::null(), 0, 0.05, ptr::null_mut())
        };
        assert_eq!(rc, EFFECT_ERR_NULL_PTR);
        assert_eq!(unsafe { effect_table_row_count(ptr::null()) }, -1);
        assert!(unsafe {
            effect_result_text(ptr::null(), ptr::null(), ptr::null(), 0, 0.05)
        }
        .is_null());
    }

    #[test]
    fn ffi_length_mismatch() {
        let handle = build_table();
        let name = CString::new("short").unwrap();
        let values = [1.0, 2.0];
        let rc = unsafe { effect_table_add_numeric(handle, name.as_ptr(), values.as_ptr(), ptr::null(), 2) };
        assert_eq!(rc, EFFECT_ERR_INVALID_INPUT);
        unsafe { effect_table_free(handle) };
    }

    #[test]
    fn ffi_interpret() {
        assert_eq!(owned_text(effect_interpret(0.95, 2)), "perfect correlation");
        assert_eq!(owned_text(effect_interpret(0.35, 3)), "large effect size");
        assert!(effect_interpret(0.5, 42).is_null());
    }
}
