//! # JNI Bindings
//!
//! Android entry point for `io.kilt.wallet.core.KiltCore`:
//!
//! ```text
//! external fun call(method: String, args: String): String
//! ```
//!
//! The returned string is always a JSON envelope, either
//! `{"ok":true,"data":<result>}` or
//! `{"ok":false,"error":{"code":..,"message":".."}}`.

#![cfg(all(feature = "ffi", target_os = "android"))]

use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;

use super::dispatcher::{self, DResult};

fn envelope(result: DResult) -> String {
    match result {
        Ok(data) => {
            let data: serde_json::Value =
                serde_json::from_str(&data).unwrap_or(serde_json::Value::String(data));
            serde_json::json!({ "ok": true, "data": data }).to_string()
        }
        Err((code, message)) => {
            serde_json::json!({ "ok": false, "error": { "code": code, "message": message } })
                .to_string()
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_io_kilt_wallet_core_KiltCore_call<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    method: JString<'local>,
    args: JString<'local>,
) -> jstring {
    let method: Result<String, _> = env.get_string(&method).map(String::from);
    let args: Result<String, _> = env.get_string(&args).map(String::from);

    let json = match (method, args) {
        (Ok(method), Ok(args)) => envelope(dispatcher::dispatch(&method, &args)),
        _ => envelope(Err((1, "Invalid JNI string argument".to_string()))),
    };

    match env.new_string(json) {
        Ok(output) => output.into_raw(),
        Err(e) => {
            tracing::error!(error = %e, "Cannot allocate JNI result string");
            std::ptr::null_mut()
        }
    }
}
