//! # Identity Module
//!
//! KILT DIDs, the method-relationship table and the wallet-level identity.
//!
//! ## Identity Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         IDENTITY SYSTEM                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Recovery Phrase (12-24 words)                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌─────────────────────────────┐                                       │
//! │  │  //did//0  (sr25519)        │                                       │
//! │  │                             │                                       │
//! │  │  • Authentication key       │──► KILT address (prefix 38)          │
//! │  │  • Signs DID extrinsics     │           │                          │
//! │  └─────────────────────────────┘           ▼                          │
//! │                                    did:kilt:4siJtc4dYq2gPre8...        │
//! │                                                                         │
//! │  Method namespace ──► VerificationRelationship                         │
//! │  (attestation, ctype, delegation, did, web3Names, ...)                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## DID Format
//!
//! | Component | Example | Description |
//! |-----------|---------|-------------|
//! | Scheme | `did` | Always "did" |
//! | Method | `kilt` | The KILT method |
//! | Identifier | `4siJtc...` | SS58 address of the authentication key |

mod did;
mod methods;
mod recovery;

pub use did::{
    compose_full_did, compose_light_did, derive_authentication_did, derive_did_key,
    extract_address, relationship_path, validate_did, AuthenticationKeyType, DidType, KiltDid,
    KiltDidInfo, ASSERTION_KEY_PATH, DELEGATION_KEY_PATH, DID_PREFIX, LIGHT_DID_PREFIX,
};
pub use methods::{relationship_for_namespace, VerificationRelationship, METHOD_RELATIONSHIPS};
pub use recovery::{RecoveryPhrase, SUPPORTED_WORD_COUNTS, WORD_COUNT};

use serde::{Deserialize, Serialize};

use crate::crypto::{
    hex_bytes, DerivedKey, KeyAlgorithm, KeyDerivationService, KeyPairInfo, Signature,
    PUBLIC_KEY_SIZE,
};
use crate::error::{Error, Result};
use crate::CoreConfig;

/// A wallet's DID together with its authentication key
///
/// ## Security
///
/// - Contains a private key - handle with care
/// - The key is zeroized when dropped
/// - Should only exist in memory while needed
pub struct Identity {
    did_info: KiltDidInfo,
    /// `None` when the DID came from the identity-only fallback
    authentication_key: Option<KeyPairInfo>,
}

impl Identity {
    /// Create a new identity with a random recovery phrase
    ///
    /// ## Returns
    ///
    /// Tuple of (Identity, RecoveryPhrase)
    ///
    /// ## Important
    ///
    /// The recovery phrase should be shown to the user exactly once
    /// and they should be instructed to write it down securely.
    /// It cannot be recovered later!
    pub fn create(config: &CoreConfig) -> Result<(Self, RecoveryPhrase)> {
        let recovery = RecoveryPhrase::generate(WORD_COUNT)?;
        let identity = Self::from_recovery_phrase(config, &recovery, None)?;
        Ok((identity, recovery))
    }

    /// Restore an identity from a recovery phrase
    pub fn from_recovery_phrase(
        config: &CoreConfig,
        recovery: &RecoveryPhrase,
        password: Option<&str>,
    ) -> Result<Self> {
        Self::from_mnemonic(config, &recovery.phrase(), password)
    }

    /// Restore an identity from mnemonic text
    pub fn from_mnemonic(
        config: &CoreConfig,
        mnemonic: &str,
        password: Option<&str>,
    ) -> Result<Self> {
        let service = KeyDerivationService::from_config(config);
        let (did_info, key) = derive_did_key(
            &service,
            mnemonic,
            password,
            VerificationRelationship::Authentication,
        )?;

        let authentication_key = match key {
            DerivedKey::Full(pair) => Some(pair),
            DerivedKey::IdentityOnly(_) => None,
        };

        Ok(Self {
            did_info,
            authentication_key,
        })
    }

    /// Get the DID
    pub fn did(&self) -> &KiltDid {
        self.did_info.did()
    }

    /// Get the DID as a string
    pub fn did_string(&self) -> String {
        self.did_info.did().to_string()
    }

    /// Public description of the DID key
    pub fn did_info(&self) -> &KiltDidInfo {
        &self.did_info
    }

    /// The authentication key pair, absent for identity-only DIDs
    pub fn authentication_key(&self) -> Option<&KeyPairInfo> {
        self.authentication_key.as_ref()
    }

    /// Whether this identity can sign
    pub fn can_sign(&self) -> bool {
        self.authentication_key.is_some()
    }

    /// The key pair to sign DID operations with
    pub fn signer(&self) -> Result<&KeyPairInfo> {
        self.authentication_key.as_ref().ok_or_else(|| {
            Error::SigningFailed("identity-only DID has no authentication private key".into())
        })
    }

    /// Get the public identity (safe to share)
    pub fn public_identity(&self) -> PublicIdentity {
        PublicIdentity {
            did: self.did_string(),
            address: self.did_info.address().to_string(),
            public_key: *self.did_info.public_key(),
            key_algorithm: self.did_info.key_algorithm(),
        }
    }
}

// Never print the private key
impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("did", &self.did_info.did().as_str())
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

/// Public portion of an identity that can be shared with others
///
/// This contains no secret information and can be freely transmitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentity {
    /// Full KILT DID
    pub did: String,

    /// KILT address of the authentication key
    pub address: String,

    /// Authentication public key
    #[serde(with = "hex_bytes")]
    pub public_key: [u8; PUBLIC_KEY_SIZE],

    /// Algorithm of the authentication key
    pub key_algorithm: KeyAlgorithm,
}

impl PublicIdentity {
    /// Verify that a message was signed by this identity
    pub fn verify_signature(&self, message: &[u8], signature: &Signature) -> Result<()> {
        crate::crypto::verify(self.key_algorithm, &self.public_key, message, signature)
    }

    /// Check that the DID is the KILT address of the public key
    pub fn validate_did(&self) -> Result<()> {
        let did = KiltDid::parse(&self.did)?;
        if did.address().public_key() != &self.public_key {
            return Err(Error::InvalidDidFormat(format!(
                "DID {} does not match public key",
                self.did
            )));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
