//! SS58 address dispatch handlers.

use super::dispatcher::{
    config_arg, core_err, err, json_parse, ok_json, optional_u64, require_str, DResult,
};
use crate::crypto::ss58::{self, NetworkPrefix};

/// A present prefix must be a valid one; only an absent prefix defaults
fn prefix_arg(
    data: &serde_json::Value,
    field: &str,
) -> Result<Option<NetworkPrefix>, (i32, String)> {
    match optional_u64(data, field)? {
        Some(value) => {
            let value =
                u16::try_from(value).map_err(|_| err(2, format!("{} out of range", field)))?;
            NetworkPrefix::new(value).map(Some).map_err(core_err)
        }
        None => Ok(None),
    }
}

pub fn address_encode(args: &str) -> DResult {
    let data = json_parse(args)?;
    let key_hex = require_str(&data, "publicKey")?;
    let public_key = hex::decode(key_hex.strip_prefix("0x").unwrap_or(key_hex))
        .map_err(|e| err(2, format!("Invalid publicKey hex: {}", e)))?;
    let prefix = match prefix_arg(&data, "prefix")? {
        Some(prefix) => prefix,
        None => config_arg(&data)?.address_prefix,
    };

    let address = ss58::encode(&public_key, prefix).map_err(core_err)?;
    ok_json(serde_json::json!({ "address": address, "prefix": prefix.value() }))
}

pub fn address_decode(args: &str) -> DResult {
    let data = json_parse(args)?;
    let address = require_str(&data, "address")?;
    let (public_key, prefix) = ss58::decode(address).map_err(core_err)?;
    ok_json(serde_json::json!({
        "publicKey": hex::encode(public_key),
        "prefix": prefix.value(),
        "network": prefix.name(),
    }))
}

pub fn address_validate(args: &str) -> DResult {
    let data = json_parse(args)?;
    let address = require_str(&data, "address")?;
    ok_json(serde_json::json!({ "valid": ss58::validate_address(address) }))
}

pub fn address_is_from_network(args: &str) -> DResult {
    let data = json_parse(args)?;
    let address = require_str(&data, "address")?;
    let prefix = prefix_arg(&data, "prefix")?.ok_or_else(|| err(2, "Missing prefix"))?;
    ok_json(serde_json::json!({ "result": ss58::is_from_network(address, prefix) }))
}

// ============================================================================
// TESTS
// ============================================================================
