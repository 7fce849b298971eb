//! # C API
//!
//! C-compatible FFI functions for iOS and other native platforms.
//!
//! All functions follow the naming convention: `kilt_<action>`. Every
//! operation goes through [`kilt_call`] with a method name and JSON
//! arguments; see the dispatcher for the method list.

use std::os::raw::c_char;

use super::dispatcher;
use super::types::*;

/// Call a core method
///
/// # Arguments
/// * `method` - Method name, e.g. `did_derive_authentication`
/// * `args` - JSON arguments (null for none)
///
/// # Returns
/// FfiResult with JSON data on success. Free it with [`kilt_free_result`].
///
/// # Safety
/// `method` and `args` must be null or valid null-terminated UTF-8 strings.
#[no_mangle]
pub unsafe extern "C" fn kilt_call(method: *const c_char, args: *const c_char) -> FfiResult {
    let method = match cstr_to_string(method) {
        Some(m) => m,
        None => return FfiResult::err(1, "Invalid method name".to_string()),
    };
    let args = if args.is_null() {
        String::new()
    } else {
        match cstr_to_string(args) {
            Some(a) => a,
            None => return FfiResult::err(1, "Invalid arguments".to_string()),
        }
    };

    FfiResult::from_dispatch(dispatcher::dispatch(&method, &args))
}

/// Get KILT DID Core version
///
/// Free the returned string with [`kilt_free_string`].
#[no_mangle]
pub extern "C" fn kilt_version() -> *mut c_char {
    into_c_string(crate::version().to_string())
}

// ============================================================================
// TESTS
// ============================================================================
