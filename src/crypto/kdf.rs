//! # Key Derivation Functions
//!
//! Seed and step functions underneath the key-pair derivation service.
//!
//! ## Mnemonic to Mini-Secret
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     SUBSTRATE MINI-SECRET                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Mnemonic words ──► BIP39 entropy (16..=32 bytes, multiple of 4)       │
//! │                                │                                        │
//! │                                ▼                                        │
//! │        PBKDF2-HMAC-SHA512(entropy, "mnemonic" ║ password, 2048)        │
//! │                                │                                        │
//! │                                ▼                                        │
//! │                  first 32 bytes = mini-secret seed                     │
//! │                                                                         │
//! │  NOTE: the PBKDF2 input is the entropy, not the phrase text. This is   │
//! │  the Substrate convention and differs from the BIP39 seed.              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity-Only Fallback
//!
//! `SHA256(base_public_key ║ 0x00 ║ label_1 ║ 0x00 ║ label_2 ...)`
//!
//! The digest is only shaped like a public key. No private key exists for
//! it, so the result is wrapped in [`IdentityOnlyKey`](super::IdentityOnlyKey)
//! by the derivation service.

use bip39::{Language, Mnemonic};
use hmac::Hmac;
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

use crate::crypto::junction::{encode_scale_compact, CHAIN_CODE_SIZE};
use crate::error::{Error, Result};

/// Domain separation strings
pub mod domain {
    /// Salt prefix for the PBKDF2 mini-secret
    pub const MNEMONIC_SALT: &str = "mnemonic";

    /// Ed25519 hard-derivation tag
    pub const ED25519_HDKD: &[u8] = b"Ed25519HDKD";
}

/// PBKDF2 rounds used by Substrate wallets
pub const PBKDF2_ROUNDS: u32 = 2048;

/// Width of the mini-secret seed
pub const MINI_SECRET_SIZE: usize = 32;

/// Derive the 32-byte mini-secret from a mnemonic phrase
///
/// Fails with [`Error::InvalidMnemonic`] on an unknown word, a bad checksum
/// or an unsupported word count. The phrase never appears in the error.
pub fn mini_secret_from_phrase(
    phrase: &str,
    password: &str,
) -> Result<Zeroizing<[u8; MINI_SECRET_SIZE]>> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;
    mini_secret_from_mnemonic(&mnemonic, password)
}

/// Derive the mini-secret from an already validated mnemonic
pub fn mini_secret_from_mnemonic(
    mnemonic: &Mnemonic,
    password: &str,
) -> Result<Zeroizing<[u8; MINI_SECRET_SIZE]>> {
    let (entropy, entropy_len) = mnemonic.to_entropy_array();
    let entropy = Zeroizing::new(entropy);
    mini_secret_from_entropy(&entropy[..entropy_len], password)
}

/// Derive the mini-secret from raw BIP39 entropy
pub fn mini_secret_from_entropy(
    entropy: &[u8],
    password: &str,
) -> Result<Zeroizing<[u8; MINI_SECRET_SIZE]>> {
    if !(16..=32).contains(&entropy.len()) || entropy.len() % 4 != 0 {
        return Err(Error::InvalidMnemonic(format!(
            "unsupported entropy length of {} bytes",
            entropy.len()
        )));
    }

    let mut salt = Zeroizing::new(String::with_capacity(
        domain::MNEMONIC_SALT.len() + password.len(),
    ));
    salt.push_str(domain::MNEMONIC_SALT);
    salt.push_str(password);

    let mut seed = Zeroizing::new([0u8; 64]);
    pbkdf2::pbkdf2::<Hmac<Sha512>>(entropy, salt.as_bytes(), PBKDF2_ROUNDS, &mut seed[..])
        .map_err(|e| Error::derivation_msg(format!("PBKDF2 mini-secret: {}", e)))?;

    let mut mini = Zeroizing::new([0u8; MINI_SECRET_SIZE]);
    mini.copy_from_slice(&seed[..MINI_SECRET_SIZE]);
    Ok(mini)
}

/// One Ed25519 hard-derivation step
///
/// `Blake2b-256(compact(11) ║ "Ed25519HDKD" ║ seed ║ chain_code)`
pub fn ed25519_hard_step(
    seed: &[u8; MINI_SECRET_SIZE],
    chain_code: &[u8; CHAIN_CODE_SIZE],
) -> Zeroizing<[u8; MINI_SECRET_SIZE]> {
    let mut hasher = blake2_rfc::blake2b::Blake2b::new(MINI_SECRET_SIZE);
    hasher.update(&encode_scale_compact(domain::ED25519_HDKD.len()));
    hasher.update(domain::ED25519_HDKD);
    hasher.update(seed);
    hasher.update(chain_code);

    let mut out = Zeroizing::new([0u8; MINI_SECRET_SIZE]);
    out.copy_from_slice(hasher.finalize().as_bytes());
    out
}

/// Deterministic nonce for a soft-derived sr25519 secret
///
/// Soft derivation only defines the secret scalar. The nonce half of the
/// expanded key is bound to the parent key and the chain code so that the
/// same mnemonic and path always give byte-identical secret keys.
pub fn sr25519_soft_nonce(
    parent_secret: &[u8; 64],
    chain_code: &[u8; CHAIN_CODE_SIZE],
) -> [u8; 32] {
    let mut hasher = blake2_rfc::blake2b::Blake2b::new(32);
    hasher.update(parent_secret);
    hasher.update(chain_code);
    let mut out = [0u8; 32];
    out.copy_from_slice(hasher.finalize().as_bytes());
    out
}

/// Identity-only fallback key from a base public key and junction labels
pub fn fallback_identity_key(base_public_key: &[u8; 32], labels: &[&str]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(base_public_key);
    for label in labels {
        hasher.update([0u8]);
        hasher.update(label.as_bytes());
    }
    hasher.finalize().into()
}

// ============================================================================
// TESTS
// ============================================================================
