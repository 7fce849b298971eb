//! # FFI Dispatcher
//!
//! JSON-RPC style dispatcher that routes method names to core calls.
//! Called from `kilt_call(method, args)` in c_api.rs and from the Android
//! JNI entry point.
//!
//! Handler implementations live in domain sub-modules:
//!   - `dispatch_did`     - did_*, path_*, mnemonic_*, keypair_* methods
//!   - `dispatch_address` - address_* methods
//!   - `dispatch_tx`      - tx_* methods
//!
//! Every call is stateless. Handlers that need configuration read an
//! optional `config` object from their arguments.
//!
//! Returns `Ok(json_string)` on success, `Err((error_code, message))` on failure.

use tracing::debug;

use crate::CoreConfig;

pub type DResult = Result<String, (i32, String)>;

// ============================================================================
// HELPERS  (pub(super) so domain modules can use them)
// ============================================================================

pub fn err(code: i32, msg: impl ToString) -> (i32, String) {
    (code, msg.to_string())
}

pub fn core_err(e: crate::Error) -> (i32, String) {
    (e.code(), e.to_string())
}

pub fn json_parse(args: &str) -> Result<serde_json::Value, (i32, String)> {
    if args.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(args).map_err(|e| err(1, format!("Invalid JSON: {}", e)))
}

pub fn require_str<'a>(data: &'a serde_json::Value, field: &str) -> Result<&'a str, (i32, String)> {
    data[field].as_str().ok_or_else(|| err(2, format!("Missing {}", field)))
}

pub fn optional_str<'a>(data: &'a serde_json::Value, field: &str) -> Option<&'a str> {
    data.get(field).and_then(|v| v.as_str())
}

pub fn optional_u64(data: &serde_json::Value, field: &str) -> Result<Option<u64>, (i32, String)> {
    match data.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| err(2, format!("{} must be an unsigned integer", field))),
    }
}

/// Deserialize an optional field into `T`
pub fn optional_field<T: serde::de::DeserializeOwned>(
    data: &serde_json::Value,
    field: &str,
) -> Result<Option<T>, (i32, String)> {
    match data.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| err(2, format!("Invalid {}: {}", field, e))),
    }
}

/// The `config` argument, or the default configuration
pub fn config_arg(data: &serde_json::Value) -> Result<CoreConfig, (i32, String)> {
    let config: CoreConfig = optional_field(data, "config")?.unwrap_or_default();
    config.validate().map_err(core_err)?;
    Ok(config)
}

pub fn ok_json(v: serde_json::Value) -> DResult {
    Ok(v.to_string())
}

pub fn to_json<T: serde::Serialize>(value: &T) -> DResult {
    serde_json::to_string(value).map_err(|e| core_err(e.into()))
}

// ============================================================================
// MAIN DISPATCHER
// ============================================================================

use super::dispatch_address;
use super::dispatch_did;
use super::dispatch_tx;

/// Route a method call to its handler
pub fn dispatch(method: &str, args: &str) -> DResult {
    debug!(method = method, "FFI dispatch");

    match method {
        // ── DID ─────────────────────────────────────────────────────
        "did_derive_authentication" => dispatch_did::did_derive_authentication(args),
        "did_validate" => dispatch_did::did_validate(args),
        "did_extract_address" => dispatch_did::did_extract_address(args),
        "did_compose_light" => dispatch_did::did_compose_light(args),

        // ── Paths, mnemonics & keys ─────────────────────────────────
        "path_parse" => dispatch_did::path_parse(args),
        "mnemonic_generate" => dispatch_did::mnemonic_generate(args),
        "mnemonic_validate" => dispatch_did::mnemonic_validate(args),
        "keypair_generate" => dispatch_did::keypair_generate(args),

        // ── Addresses ───────────────────────────────────────────────
        "address_encode" => dispatch_address::address_encode(args),
        "address_decode" => dispatch_address::address_decode(args),
        "address_validate" => dispatch_address::address_validate(args),
        "address_is_from_network" => dispatch_address::address_is_from_network(args),

        // ── Transactions ────────────────────────────────────────────
        "tx_resolve_relationship" => dispatch_tx::tx_resolve_relationship(args),
        "tx_authorize" => dispatch_tx::tx_authorize(args),
        "tx_authorize_batch" => dispatch_tx::tx_authorize_batch(args),

        // ── Meta ────────────────────────────────────────────────────
        "version" => ok_json(serde_json::json!({
            "version": crate::version(),
            "build": crate::build_info(),
        })),

        _ => Err(err(404, format!("Unknown method: {}", method))),
    }
}

// ============================================================================
// TESTS
// ============================================================================
