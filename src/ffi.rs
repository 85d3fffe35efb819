//! FFI bindings for MoodTrace
//!
//! This module provides C-compatible functions for calling the analysis engine
//! from other languages. All functions use C strings (null-terminated) and
//! return allocated memory that must be freed by the caller using
//! `moodtrace_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, TimeZone, Utc};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::{analyze_json, Analyzer};
use crate::schema::RawRecordAdapter;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// NULL config means defaults
unsafe fn config_from_ptr(config_json: *const c_char) -> Result<AnalysisConfig, AnalysisError> {
    if config_json.is_null() {
        return Ok(AnalysisConfig::default());
    }
    match cstr_to_string(config_json) {
        Some(json) => AnalysisConfig::from_json(&json),
        None => Err(AnalysisError::InvalidConfig(
            "config is not valid UTF-8".to_string(),
        )),
    }
}

/// Non-positive means "now"
fn now_from_millis(now_ms: i64) -> DateTime<Utc> {
    if now_ms <= 0 {
        return Utc::now();
    }
    Utc.timestamp_millis_opt(now_ms)
        .single()
        .unwrap_or_else(Utc::now)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a JSON array of records and return the report JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `config_json` may be NULL (defaults) or a valid null-terminated C string.
/// - `now_ms` is the reference instant in epoch milliseconds; values `<= 0` use the current time.
/// - Returns a newly allocated string that must be freed with `moodtrace_free_string`.
/// - Returns NULL on error; call `moodtrace_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn moodtrace_analyze(
    json: *const c_char,
    config_json: *const c_char,
    now_ms: i64,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let config = match config_from_ptr(config_json) {
        Ok(c) => c,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match analyze_json(&json_str, &config, now_from_millis(now_ms)) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Analyzer Handle API
// ============================================================================

/// Opaque handle to a configured Analyzer
pub struct AnalyzerHandle {
    analyzer: Analyzer,
}

/// Create an analyzer from a JSON configuration.
///
/// # Safety
/// - `config_json` may be NULL (defaults) or a valid null-terminated C string.
/// - Returns a pointer that must be freed with `moodtrace_analyzer_free`.
/// - Returns NULL on error; call `moodtrace_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn moodtrace_analyzer_new(config_json: *const c_char) -> *mut AnalyzerHandle {
    clear_last_error();

    let analyzer = match config_from_ptr(config_json).and_then(Analyzer::new) {
        Ok(a) => a,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    Box::into_raw(Box::new(AnalyzerHandle { analyzer }))
}

/// Free an analyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `moodtrace_analyzer_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn moodtrace_analyzer_free(analyzer: *mut AnalyzerHandle) {
    if !analyzer.is_null() {
        drop(Box::from_raw(analyzer));
    }
}

/// Run a full analysis pass with a configured analyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `moodtrace_analyzer_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `moodtrace_free_string`.
/// - Returns NULL on error; call `moodtrace_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn moodtrace_analyzer_analyze(
    analyzer: *const AnalyzerHandle,
    json: *const c_char,
    now_ms: i64,
) -> *mut c_char {
    clear_last_error();

    if analyzer.is_null() {
        set_last_error("Null analyzer pointer");
        return ptr::null_mut();
    }

    let handle = &*analyzer;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result = RawRecordAdapter::parse_array(&json_str).and_then(|records| {
        let report = handle.analyzer.analyze(&records, now_from_millis(now_ms));
        Ok(serde_json::to_string(&report)?)
    });

    match result {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by MoodTrace functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a MoodTrace function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn moodtrace_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next MoodTrace function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn moodtrace_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn moodtrace_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
