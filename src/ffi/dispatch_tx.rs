//! Transaction authorization dispatch handlers.
//!
//! The signing key is re-derived from the mnemonic for each call and
//! dropped before the call returns.

use super::dispatcher::{
    config_arg, core_err, err, json_parse, ok_json, optional_field, optional_str, optional_u64,
    require_str, to_json, DResult,
};
use crate::authorization::{Authorizer, Extrinsic};
use crate::crypto::{DerivedKey, KeyDerivationService, KeyPairInfo};
use crate::identity::{derive_did_key, KiltDidInfo, VerificationRelationship};
use crate::CoreConfig;

fn transaction_arg(value: &serde_json::Value) -> Result<Extrinsic, (i32, String)> {
    serde_json::from_value(value.clone()).map_err(|e| err(2, format!("Invalid transaction: {}", e)))
}

/// DID info and signing key holding `relationship`
fn signing_key(
    data: &serde_json::Value,
    config: &CoreConfig,
    relationship: VerificationRelationship,
) -> Result<(KiltDidInfo, KeyPairInfo), (i32, String)> {
    let mnemonic = require_str(data, "mnemonic")?;
    let password = optional_str(data, "password");

    let service = KeyDerivationService::from_config(config);
    let (info, key) = derive_did_key(&service, mnemonic, password, relationship).map_err(core_err)?;
    match key {
        DerivedKey::Full(pair) => Ok((info, pair)),
        DerivedKey::IdentityOnly(_) => Err(core_err(crate::Error::SigningFailed(
            "identity-only DID key cannot sign".into(),
        ))),
    }
}

pub fn tx_resolve_relationship(args: &str) -> DResult {
    let data = json_parse(args)?;
    let transaction = transaction_arg(&data["transaction"])?;
    let config = config_arg(&data)?;

    let relationship = Authorizer::from_config(&config)
        .resolve_relationship(&transaction)
        .map_err(core_err)?;
    ok_json(serde_json::json!({ "relationship": relationship }))
}

/// `relationship` picks the DID key to sign with; it defaults to the one the
/// transaction requires
pub fn tx_authorize(args: &str) -> DResult {
    let data = json_parse(args)?;
    let transaction = transaction_arg(&data["transaction"])?;
    let submitter = require_str(&data, "submitter")?;
    let nonce = optional_u64(&data, "nonce")?;
    let config = config_arg(&data)?;
    let authorizer = Authorizer::from_config(&config);

    let relationship = match optional_field(&data, "relationship")? {
        Some(relationship) => relationship,
        None => authorizer.resolve_relationship(&transaction).map_err(core_err)?,
    };
    let (did, key) = signing_key(&data, &config, relationship)?;

    let authorization = authorizer
        .authorize(&did, &transaction, nonce, submitter, &key)
        .map_err(core_err)?;
    to_json(&authorization)
}

/// Partial failures are reported in the result, not as an error, so the
/// caller keeps the authorizations computed before the failing item
pub fn tx_authorize_batch(args: &str) -> DResult {
    let data = json_parse(args)?;
    let transactions = data["transactions"]
        .as_array()
        .ok_or_else(|| err(2, "Missing transactions"))?
        .iter()
        .map(transaction_arg)
        .collect::<Result<Vec<_>, _>>()?;
    let submitter = require_str(&data, "submitter")?;
    let start_nonce = optional_u64(&data, "startNonce")?;
    let config = config_arg(&data)?;
    let authorizer = Authorizer::from_config(&config);

    let first = transactions
        .first()
        .ok_or_else(|| core_err(crate::Error::EmptyBatch))?;
    let relationship = match optional_field(&data, "relationship")? {
        Some(relationship) => relationship,
        None => authorizer.resolve_relationship(first).map_err(core_err)?,
    };
    let (did, key) = signing_key(&data, &config, relationship)?;

    match authorizer.authorize_batch(&did, &transactions, start_nonce, submitter, &key) {
        Ok(batch) => ok_json(serde_json::json!({
            "complete": true,
            "items": batch.items(),
        })),
        Err(batch_err) => ok_json(serde_json::json!({
            "complete": false,
            "items": batch_err.completed,
            "failedAt": batch_err.failed_at,
            "error": {
                "code": batch_err.error.code(),
                "message": batch_err.error.to_string(),
            },
        })),
    }
}

// ============================================================================
// TESTS
// ============================================================================
