//! # FFI Types
//!
//! C-compatible types for cross-platform FFI.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::error::FfiError;

/// FFI-safe result type
///
/// Used to return results across the FFI boundary.
#[repr(C)]
pub struct FfiResult {
    /// Success flag (1 = success, 0 = error)
    pub success: i32,
    /// Error code (0 if success)
    pub error_code: i32,
    /// Error message (null if success)
    pub error_message: *mut c_char,
    /// Result data, JSON (null if error)
    pub data: *mut c_char,
}

impl FfiResult {
    /// Create a successful result with data
    pub fn ok(data: String) -> Self {
        Self {
            success: 1,
            error_code: 0,
            error_message: std::ptr::null_mut(),
            data: into_c_string(data),
        }
    }

    /// Create an error result
    pub fn err(code: i32, message: String) -> Self {
        Self {
            success: 0,
            error_code: code,
            error_message: into_c_string(message),
            data: std::ptr::null_mut(),
        }
    }

    /// Create from a dispatcher result
    pub fn from_dispatch(result: Result<String, (i32, String)>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err((code, message)) => Self::err(code, message),
        }
    }
}

impl From<crate::Error> for FfiResult {
    fn from(err: crate::Error) -> Self {
        let ffi = FfiError::from(err);
        Self::err(ffi.code, ffi.message)
    }
}

/// Hand a Rust string to C
///
/// Interior NULs cannot cross a C string, so they are dropped.
pub fn into_c_string(s: String) -> *mut c_char {
    let c = CString::new(s).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|b| *b != 0);
        // No NULs left
        CString::new(bytes).unwrap_or_default()
    });
    c.into_raw()
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Convert a C string to a Rust String
///
/// # Safety
/// The caller must ensure the pointer is valid and null-terminated.
pub unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(String::from)
}

/// Free a C string allocated by Rust
///
/// # Safety
/// The pointer must have been allocated by Rust using CString::into_raw().
#[no_mangle]
pub unsafe extern "C" fn kilt_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Free an FfiResult
///
/// # Safety
/// The FfiResult must have been created by Rust FFI functions.
#[no_mangle]
pub unsafe extern "C" fn kilt_free_result(result: FfiResult) {
    if !result.error_message.is_null() {
        drop(CString::from_raw(result.error_message));
    }
    if !result.data.is_null() {
        drop(CString::from_raw(result.data));
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_result_roundtrip() {
        let result = FfiResult::ok("{\"a\":1}".to_string());
        assert_eq!(result.success, 1);
        let data = unsafe { cstr_to_string(result.data) }.unwrap();
        assert_eq!(data, "{\"a\":1}");
        unsafe { kilt_free_result(result) };
    }

    #[test]
    fn test_err_result_from_core_error() {
        let result = FfiResult::from(crate::Error::EmptyBatch);
        assert_eq!(result.success, 0);
        assert_eq!(result.error_code, 602);
        assert!(result.data.is_null());
        unsafe { kilt_free_result(result) };
    }

    #[test]
    fn test_interior_nul_is_dropped() {
        let ptr = into_c_string("a\0b".to_string());
        let s = unsafe { cstr_to_string(ptr) }.unwrap();
        assert_eq!(s, "ab");
        unsafe { kilt_free_string(ptr) };
    }
}
