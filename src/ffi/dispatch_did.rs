//! DID, derivation-path, mnemonic and key-pair dispatch handlers.

use super::dispatcher::{
    config_arg, core_err, err, json_parse, ok_json, optional_field, optional_str, optional_u64,
    require_str, to_json, DResult,
};
use crate::crypto::{DerivationPath, KeyAlgorithm, KeyDerivationService, NetworkAddress};
use crate::identity::{
    compose_light_did, derive_did_key, extract_address, AuthenticationKeyType, KiltDid,
    RecoveryPhrase, VerificationRelationship, WORD_COUNT,
};

pub fn did_derive_authentication(args: &str) -> DResult {
    let data = json_parse(args)?;
    let mnemonic = require_str(&data, "mnemonic")?;
    let password = optional_str(&data, "password");
    let relationship: VerificationRelationship =
        optional_field(&data, "relationship")?.unwrap_or(VerificationRelationship::Authentication);
    let config = config_arg(&data)?;

    let service = KeyDerivationService::from_config(&config);
    let (info, _key) =
        derive_did_key(&service, mnemonic, password, relationship).map_err(core_err)?;
    to_json(&info)
}

pub fn did_validate(args: &str) -> DResult {
    let data = json_parse(args)?;
    let did = require_str(&data, "did")?;

    match KiltDid::parse(did) {
        Ok(parsed) => ok_json(serde_json::json!({
            "valid": true,
            "didType": parsed.did_type(),
            "keyType": parsed.key_type(),
            "address": parsed.address().as_str(),
            "details": parsed.details(),
        })),
        Err(e) => ok_json(serde_json::json!({ "valid": false, "error": e.to_string() })),
    }
}

pub fn did_extract_address(args: &str) -> DResult {
    let data = json_parse(args)?;
    let did = require_str(&data, "did")?;
    let address = extract_address(did).map_err(core_err)?;
    ok_json(serde_json::json!({ "address": address }))
}

pub fn did_compose_light(args: &str) -> DResult {
    let data = json_parse(args)?;
    let address = require_str(&data, "address")?;
    let key_type: AuthenticationKeyType =
        optional_field(&data, "keyType")?.unwrap_or(AuthenticationKeyType::Sr25519);
    let details = optional_str(&data, "details");

    let did = compose_light_did(key_type, address, details).map_err(core_err)?;
    ok_json(serde_json::json!({ "did": did }))
}

pub fn path_parse(args: &str) -> DResult {
    let data = json_parse(args)?;
    let path = DerivationPath::parse(require_str(&data, "path")?).map_err(core_err)?;

    let junctions: Vec<serde_json::Value> = path
        .junctions()
        .iter()
        .map(|j| serde_json::json!({ "kind": j.kind(), "label": j.label() }))
        .collect();
    ok_json(serde_json::json!({
        "path": path.to_display_string(),
        "junctions": junctions,
        "hasPassword": path.password().is_some(),
    }))
}

pub fn mnemonic_generate(args: &str) -> DResult {
    let data = json_parse(args)?;
    let word_count = match optional_u64(&data, "wordCount")? {
        Some(count) => usize::try_from(count).map_err(|_| err(2, "wordCount out of range"))?,
        None => WORD_COUNT,
    };

    let phrase = RecoveryPhrase::generate(word_count).map_err(core_err)?;
    let mnemonic = phrase.phrase();
    ok_json(serde_json::json!({
        "mnemonic": mnemonic.as_str(),
        "wordCount": phrase.word_count(),
    }))
}

pub fn mnemonic_validate(args: &str) -> DResult {
    let data = json_parse(args)?;
    let mnemonic = require_str(&data, "mnemonic")?;

    match RecoveryPhrase::from_phrase(mnemonic) {
        Ok(phrase) => ok_json(serde_json::json!({
            "valid": true,
            "wordCount": phrase.word_count(),
        })),
        Err(e) => ok_json(serde_json::json!({ "valid": false, "error": e.to_string() })),
    }
}

/// Public half only; the private key never leaves the core
pub fn keypair_generate(args: &str) -> DResult {
    let data = json_parse(args)?;
    let mnemonic = require_str(&data, "mnemonic")?;
    let password = optional_str(&data, "password");
    let algorithm: KeyAlgorithm = optional_field(&data, "algorithm")?.unwrap_or_default();
    let path = optional_str(&data, "path")
        .map(DerivationPath::parse)
        .transpose()
        .map_err(core_err)?;
    let config = config_arg(&data)?;

    let service = KeyDerivationService::from_config(&config);
    let pair = service
        .generate_key_pair_with(algorithm, mnemonic, path.as_ref(), password)
        .map_err(core_err)?;
    let address = NetworkAddress::from_public_key(pair.public_key(), config.address_prefix);

    ok_json(serde_json::json!({
        "algorithm": pair.algorithm(),
        "publicKey": pair.public_key_hex(),
        "address": address.as_str(),
        "path": path.map(|p| p.to_display_string()).unwrap_or_default(),
    }))
}

// ============================================================================
// TESTS
// ============================================================================
