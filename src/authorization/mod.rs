//! # Authorization Module
//!
//! Decides which DID key must sign an extrinsic and produces the DID
//! signature over it, one transaction at a time or as a nonce-ordered batch.
//!
//! ## Request Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    AUTHORIZATION REQUEST STATES                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   Pending ──► RelationshipResolved ──► NonceAssigned ──► Signed        │
//! │      │                 │                     │             │            │
//! │      │                 │                     │             ▼            │
//! │      │                 │                     │         Authorized       │
//! │      ▼                 ▼                     ▼                          │
//! │   ─────────────────── Failed (terminal) ◄──────────────────            │
//! │                                                                         │
//! │   resolve:  method namespace ──► VerificationRelationship             │
//! │   assign:   nonce from the caller or the batch counter                 │
//! │   sign:     bincode(transaction, nonce, submitter) with the DID key    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Batch Nonces
//!
//! Items of a batch get `start, start + 1, ...` in input order. The first
//! failing item stops the batch; items before it stay authorized and are
//! returned inside [`BatchError`].

mod authorizer;
mod request;

pub use authorizer::{Authorizer, BatchAuthorization, BatchError};
pub use request::{AuthorizationRequest, AuthorizationState};

use serde::{Deserialize, Serialize};

use crate::crypto::{KeyAlgorithm, KeyPairInfo, Signature, PUBLIC_KEY_SIZE};
use crate::error::{Error, Result};
use crate::identity::{KiltDidInfo, VerificationRelationship};

// ============================================================================
// TRANSACTIONS
// ============================================================================

/// Anything a DID can authorize
///
/// The serialized form is what gets signed, so it must be deterministic.
pub trait Transaction: Serialize {
    /// Runtime pallet the call belongs to, e.g. `attestation`
    fn namespace(&self) -> &str;
}

/// A runtime call described by pallet, method and SCALE-encoded arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extrinsic {
    /// Pallet name (the method namespace)
    pub section: String,
    /// Call name inside the pallet
    pub method: String,
    /// Encoded call arguments
    #[serde(with = "hex_vec", default)]
    pub args: Vec<u8>,
}

impl Extrinsic {
    /// Create an extrinsic
    pub fn new(section: impl Into<String>, method: impl Into<String>, args: Vec<u8>) -> Self {
        Self {
            section: section.into(),
            method: method.into(),
            args,
        }
    }

    /// `section.method`
    pub fn call_name(&self) -> String {
        format!("{}.{}", self.section, self.method)
    }
}

impl Transaction for Extrinsic {
    fn namespace(&self) -> &str {
        &self.section
    }
}

/// Hex (optionally `0x`-prefixed) serde helper for call arguments
mod hex_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// POLICY
// ============================================================================

/// What to do with a method namespace outside the relationship table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnknownMethodPolicy {
    /// Require AUTHENTICATION and log a warning
    #[default]
    DefaultToAuthentication,
    /// Fail with [`Error::UnresolvedRelationship`]
    Reject,
}

impl UnknownMethodPolicy {
    /// Apply the policy to a namespace
    pub fn resolve(self, namespace: &str) -> Result<VerificationRelationship> {
        if let Some(relationship) = crate::identity::relationship_for_namespace(namespace) {
            return Ok(relationship);
        }
        match self {
            UnknownMethodPolicy::DefaultToAuthentication => {
                tracing::warn!(
                    namespace = namespace,
                    "Unknown method namespace, defaulting to authentication"
                );
                Ok(VerificationRelationship::Authentication)
            }
            UnknownMethodPolicy::Reject => {
                Err(Error::UnresolvedRelationship(namespace.to_string()))
            }
        }
    }
}

// ============================================================================
// SIGNERS
// ============================================================================

/// A key that can produce DID signatures
///
/// Identity-only fallback keys deliberately do not implement this.
pub trait DidSigner {
    /// Signature scheme of the key
    fn algorithm(&self) -> KeyAlgorithm;

    /// Public half of the key
    fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE];

    /// Sign a message
    fn sign(&self, message: &[u8]) -> Result<Signature>;
}

impl DidSigner for KeyPairInfo {
    fn algorithm(&self) -> KeyAlgorithm {
        KeyPairInfo::algorithm(self)
    }

    fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        KeyPairInfo::public_key(self)
    }

    fn sign(&self, message: &[u8]) -> Result<Signature> {
        crate::crypto::sign(self, message)
    }
}

/// Require `signer` to be the key behind `did`
pub(crate) fn check_signer<S: DidSigner + ?Sized>(did: &KiltDidInfo, signer: &S) -> Result<()> {
    if signer.public_key() != did.public_key() || signer.algorithm() != did.key_algorithm() {
        return Err(Error::SignerMismatch(did.key_uri()));
    }
    Ok(())
}

// ============================================================================
// SIGNATURES
// ============================================================================

/// Data that gets signed for a transaction
#[derive(Serialize)]
struct SigningPayload<'a, T: Serialize> {
    transaction: &'a T,
    nonce: u64,
    submitter: &'a str,
}

/// Canonical bytes signed for `(transaction, nonce, submitter)`
pub fn signing_payload<T: Transaction>(
    transaction: &T,
    nonce: u64,
    submitter: &str,
) -> Result<Vec<u8>> {
    let payload = SigningPayload {
        transaction,
        nonce,
        submitter,
    };
    bincode::serialize(&payload).map_err(|e| Error::SerializationError(e.to_string()))
}

/// A DID key's signature over one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidSignature {
    /// `<did>#<relationship>` of the signing key
    pub key_uri: String,
    /// Signature over the signing payload
    pub signature: Signature,
    /// Relationship the key signed under
    pub verification_relationship: VerificationRelationship,
    /// Nonce included in the payload
    pub nonce: u64,
    /// SS58 address of the account submitting the extrinsic
    pub submitter: String,
}

/// A transaction ready for submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAuthorization<T> {
    /// The authorized transaction
    pub transaction: T,
    /// The DID key that authorized it
    pub did: KiltDidInfo,
    /// The signature
    pub signature: DidSignature,
}

impl<T: Transaction> TransactionAuthorization<T> {
    /// Re-check the signature against the DID's key
    pub fn verify(&self) -> Result<()> {
        if self.signature.key_uri != self.did.key_uri()
            || self.signature.verification_relationship != self.did.verification_relationship()
        {
            return Err(Error::VerificationFailed);
        }
        if self.did.verification_relationship() == VerificationRelationship::Authentication
            && self.did.did().address().public_key() != self.did.public_key()
        {
            return Err(Error::VerificationFailed);
        }

        let payload = signing_payload(
            &self.transaction,
            self.signature.nonce,
            &self.signature.submitter,
        )?;
        crate::crypto::verify(
            self.did.key_algorithm(),
            self.did.public_key(),
            &payload,
            &self.signature.signature,
        )
    }

    /// Nonce the transaction was signed with
    pub fn nonce(&self) -> u64 {
        self.signature.nonce
    }

    /// Relationship the transaction was signed under
    pub fn verification_relationship(&self) -> VerificationRelationship {
        self.signature.verification_relationship
    }
}

// ============================================================================
// TESTS
// ============================================================================
