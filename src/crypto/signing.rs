//! # Digital Signatures Module
//!
//! Signatures made with derived key pairs, for either key algorithm.
//!
//! ## Signature Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SIGNING FLOW                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  KeyPairInfo ──┬── Sr25519 ──► sign_simple("substrate", message)       │
//! │                │                 64 bytes, randomized                   │
//! │                │                                                        │
//! │                └── Ed25519 ──► Ed25519 sign(message)                   │
//! │                                  64 bytes, deterministic               │
//! │                                                                         │
//! │  A pair without a private key cannot sign (SigningFailed).             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       VERIFICATION FLOW                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  (algorithm, public key, message, signature) ──► Ok(()) or             │
//! │                                                  VerificationFailed    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sr25519 signatures use the Substrate signing context, so they verify
//! against the same keys on chain.

use ed25519_dalek::{Signature as Ed25519Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::crypto::keys::{KeyAlgorithm, KeyPairInfo};
use crate::crypto::PUBLIC_KEY_SIZE;
use crate::error::{Error, Result};

/// Size of a signature in bytes (both algorithms)
pub const SIGNATURE_SIZE: usize = 64;

/// Schnorrkel signing context used by Substrate
pub const SIGNING_CONTEXT: &[u8] = b"substrate";

/// A 64-byte signature
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "signature_bytes")] pub [u8; SIGNATURE_SIZE]);

impl Signature {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice (must be exactly 64 bytes)
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != SIGNATURE_SIZE {
            return Err(Error::InvalidKey(format!(
                "Signature must be {} bytes, got {}",
                SIGNATURE_SIZE,
                slice.len()
            )));
        }
        let mut bytes = [0u8; SIGNATURE_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// Encode as hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex string
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::InvalidKey(format!("Invalid signature hex: {}", e)))?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Sign a message with a derived key pair
///
/// ## Errors
///
/// [`Error::SigningFailed`] if the pair carries no private key or the
/// stored private key does not parse.
pub fn sign(key_pair: &KeyPairInfo, message: &[u8]) -> Result<Signature> {
    let private = key_pair
        .private_key()
        .ok_or_else(|| Error::SigningFailed("key pair has no private key".into()))?;

    match key_pair.algorithm() {
        KeyAlgorithm::Sr25519 => {
            let secret = schnorrkel::SecretKey::from_bytes(private)
                .map_err(|e| Error::SigningFailed(format!("sr25519 secret key: {}", e)))?;
            let public = secret.to_public();
            let sig = secret.sign_simple(SIGNING_CONTEXT, message, &public);
            Ok(Signature(sig.to_bytes()))
        }
        KeyAlgorithm::Ed25519 => {
            let bytes: &[u8; 32] = private
                .try_into()
                .map_err(|_| Error::SigningFailed("ed25519 secret key must be 32 bytes".into()))?;
            let sig = SigningKey::from_bytes(bytes).sign(message);
            Ok(Signature(sig.to_bytes()))
        }
    }
}

/// Verify a signature
///
/// ## Returns
///
/// `Ok(())` if valid, `Err(VerificationFailed)` if invalid
pub fn verify(
    algorithm: KeyAlgorithm,
    public_key: &[u8; PUBLIC_KEY_SIZE],
    message: &[u8],
    signature: &Signature,
) -> Result<()> {
    match algorithm {
        KeyAlgorithm::Sr25519 => {
            let public = schnorrkel::PublicKey::from_bytes(public_key)
                .map_err(|e| Error::InvalidKey(format!("Invalid public key: {}", e)))?;
            let sig = schnorrkel::Signature::from_bytes(&signature.0)
                .map_err(|_| Error::VerificationFailed)?;
            public
                .verify_simple(SIGNING_CONTEXT, message, &sig)
                .map_err(|_| Error::VerificationFailed)
        }
        KeyAlgorithm::Ed25519 => {
            let verifying_key = VerifyingKey::from_bytes(public_key)
                .map_err(|e| Error::InvalidKey(format!("Invalid public key: {}", e)))?;
            let sig = Ed25519Signature::from_bytes(&signature.0);
            verifying_key
                .verify(message, &sig)
                .map_err(|_| Error::VerificationFailed)
        }
    }
}

/// Serde helper for signature bytes
mod signature_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 64], serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<[u8; 64], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("Invalid signature length"))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::junction::DerivationPath;
    use crate::crypto::keys::KeyDerivationService;

    const DEV_PHRASE: &str =
        "bottom drive obey lake curtain smoke basket hold race lonely fit walk";

    fn alice(algorithm: KeyAlgorithm) -> KeyPairInfo {
        let service: KeyDerivationService = KeyDerivationService::default();
        let path = DerivationPath::parse("//Alice").unwrap();
        service
            .generate_key_pair_with(algorithm, DEV_PHRASE, Some(&path), None)
            .unwrap()
    }

    #[test]
    fn test_sign_verify() {
        for algorithm in [KeyAlgorithm::Sr25519, KeyAlgorithm::Ed25519] {
            let pair = alice(algorithm);
            let message = b"Hello, World!";

            let signature = sign(&pair, message).unwrap();
            assert!(verify(algorithm, pair.public_key(), message, &signature).is_ok());
        }
    }

    #[test]
    fn test_verify_wrong_message_fails() {
        for algorithm in [KeyAlgorithm::Sr25519, KeyAlgorithm::Ed25519] {
            let pair = alice(algorithm);
            let signature = sign(&pair, b"Hello, World!").unwrap();
            let result = verify(algorithm, pair.public_key(), b"Wrong message!", &signature);
            assert!(matches!(result, Err(Error::VerificationFailed)));
        }
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let alice = alice(KeyAlgorithm::Sr25519);
        let service: KeyDerivationService = KeyDerivationService::default();
        let bob = service
            .generate_key_pair(DEV_PHRASE, Some(&DerivationPath::parse("//Bob").unwrap()), None)
            .unwrap();

        let signature = sign(&alice, b"payload").unwrap();
        assert!(verify(KeyAlgorithm::Sr25519, bob.public_key(), b"payload", &signature).is_err());
    }

    #[test]
    fn test_soft_derived_key_signs() {
        let service: KeyDerivationService = KeyDerivationService::default();
        let path = DerivationPath::parse("//Alice/stash").unwrap();
        let pair = service.generate_key_pair(DEV_PHRASE, Some(&path), None).unwrap();

        let signature = sign(&pair, b"soft").unwrap();
        assert!(verify(KeyAlgorithm::Sr25519, pair.public_key(), b"soft", &signature).is_ok());
    }

    #[test]
    fn test_public_only_cannot_sign() {
        let pair = alice(KeyAlgorithm::Sr25519).public_only();
        assert!(matches!(sign(&pair, b"x"), Err(Error::SigningFailed(_))));
    }

    #[test]
    fn test_ed25519_is_deterministic() {
        let pair = alice(KeyAlgorithm::Ed25519);
        assert_eq!(sign(&pair, b"same").unwrap(), sign(&pair, b"same").unwrap());
    }

    #[test]
    fn test_signature_hex() {
        let pair = alice(KeyAlgorithm::Sr25519);
        let signature = sign(&pair, b"hex").unwrap();

        let restored = Signature::from_hex(&signature.to_hex()).unwrap();
        assert_eq!(signature, restored);
        assert!(Signature::from_hex("abcd").is_err());
    }
}
