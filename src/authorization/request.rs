//! Per-transaction authorization state machine.

use serde::{Deserialize, Serialize};

use super::{
    check_signer, signing_payload, DidSignature, DidSigner, Transaction, TransactionAuthorization,
    UnknownMethodPolicy,
};
use crate::crypto::ss58;
use crate::error::{Error, Result};
use crate::identity::{KiltDidInfo, VerificationRelationship};

/// Where an [`AuthorizationRequest`] is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationState {
    /// Created, nothing resolved yet
    Pending,
    /// Required relationship known
    RelationshipResolved,
    /// Nonce fixed
    NonceAssigned,
    /// DID signature produced
    Signed,
    /// Authorization handed out
    Authorized,
    /// A step failed; the request cannot continue
    Failed,
}

impl AuthorizationState {
    /// State name
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationState::Pending => "pending",
            AuthorizationState::RelationshipResolved => "relationshipResolved",
            AuthorizationState::NonceAssigned => "nonceAssigned",
            AuthorizationState::Signed => "signed",
            AuthorizationState::Authorized => "authorized",
            AuthorizationState::Failed => "failed",
        }
    }

    /// Whether no further step is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuthorizationState::Authorized | AuthorizationState::Failed)
    }
}

impl std::fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transaction moving towards a [`TransactionAuthorization`]
///
/// Steps must be called in order: [`resolve`](Self::resolve),
/// [`assign_nonce`](Self::assign_nonce), [`sign`](Self::sign),
/// [`finish`](Self::finish). Any error, including an out-of-order call,
/// leaves the request in [`AuthorizationState::Failed`].
#[derive(Debug)]
pub struct AuthorizationRequest<'a, T> {
    transaction: &'a T,
    state: AuthorizationState,
    relationship: Option<VerificationRelationship>,
    nonce: Option<u64>,
    signature: Option<DidSignature>,
}

impl<'a, T: Transaction> AuthorizationRequest<'a, T> {
    /// Start a request for `transaction`
    pub fn new(transaction: &'a T) -> Self {
        Self {
            transaction,
            state: AuthorizationState::Pending,
            relationship: None,
            nonce: None,
            signature: None,
        }
    }

    /// Current state
    pub fn state(&self) -> AuthorizationState {
        self.state
    }

    /// The transaction being authorized
    pub fn transaction(&self) -> &T {
        self.transaction
    }

    /// Resolved relationship, once known
    pub fn relationship(&self) -> Option<VerificationRelationship> {
        self.relationship
    }

    /// Assigned nonce, once fixed
    pub fn nonce(&self) -> Option<u64> {
        self.nonce
    }

    /// Look up the relationship the transaction's namespace requires
    pub fn resolve(&mut self, policy: UnknownMethodPolicy) -> Result<VerificationRelationship> {
        self.require_state(AuthorizationState::Pending, "resolve")?;
        let relationship = policy
            .resolve(self.transaction.namespace())
            .map_err(|e| self.fail(e))?;
        self.relationship = Some(relationship);
        self.state = AuthorizationState::RelationshipResolved;
        Ok(relationship)
    }

    /// Fix the nonce the signature will cover
    pub fn assign_nonce(&mut self, nonce: u64) -> Result<()> {
        self.require_state(AuthorizationState::RelationshipResolved, "assign_nonce")?;
        self.nonce = Some(nonce);
        self.state = AuthorizationState::NonceAssigned;
        Ok(())
    }

    /// Sign `(transaction, nonce, submitter)` with the DID key
    ///
    /// ## Errors
    ///
    /// - [`Error::WrongRelationship`] if the DID key holds another relationship
    /// - [`Error::SignerMismatch`] if `signer` is not the DID key
    /// - [`Error::InvalidAddress`] if `submitter` is not an SS58 address
    pub fn sign<S: DidSigner + ?Sized>(
        &mut self,
        did: &KiltDidInfo,
        submitter: &str,
        signer: &S,
    ) -> Result<&DidSignature> {
        self.require_state(AuthorizationState::NonceAssigned, "sign")?;
        let (relationship, nonce) = match (self.relationship, self.nonce) {
            (Some(relationship), Some(nonce)) => (relationship, nonce),
            _ => {
                return Err(self.fail(Error::Internal(
                    "nonce-assigned request without relationship or nonce".into(),
                )))
            }
        };

        let signature = self
            .produce_signature(did, relationship, nonce, submitter, signer)
            .map_err(|e| self.fail(e))?;
        self.state = AuthorizationState::Signed;
        Ok(self.signature.insert(signature))
    }

    /// Hand out the finished authorization
    pub fn finish(&mut self, did: &KiltDidInfo) -> Result<TransactionAuthorization<T>>
    where
        T: Clone,
    {
        self.require_state(AuthorizationState::Signed, "finish")?;
        let signature = match self.signature.clone() {
            Some(signature) => signature,
            None => {
                let err = Error::Internal("signed request without signature".into());
                return Err(self.fail(err));
            }
        };
        if signature.key_uri != did.key_uri() {
            return Err(self.fail(Error::SignerMismatch(did.key_uri())));
        }
        self.state = AuthorizationState::Authorized;
        Ok(TransactionAuthorization {
            transaction: self.transaction.clone(),
            did: did.clone(),
            signature,
        })
    }

    fn produce_signature<S: DidSigner + ?Sized>(
        &self,
        did: &KiltDidInfo,
        relationship: VerificationRelationship,
        nonce: u64,
        submitter: &str,
        signer: &S,
    ) -> Result<DidSignature> {
        if did.verification_relationship() != relationship {
            return Err(Error::WrongRelationship {
                expected: relationship,
                actual: did.verification_relationship(),
            });
        }
        check_signer(did, signer)?;
        if !ss58::validate_address(submitter) {
            return Err(Error::InvalidAddress("submitter is not an SS58 address".into()));
        }

        let payload = signing_payload(self.transaction, nonce, submitter)?;
        let signature = signer.sign(&payload)?;

        Ok(DidSignature {
            key_uri: did.key_uri(),
            signature,
            verification_relationship: relationship,
            nonce,
            submitter: submitter.to_string(),
        })
    }

    fn require_state(&mut self, expected: AuthorizationState, step: &str) -> Result<()> {
        if self.state != expected {
            let err = Error::InvalidStateTransition(format!(
                "{} requires state {}, request is {}",
                step, expected, self.state
            ));
            return Err(self.fail(err));
        }
        Ok(())
    }

    fn fail(&mut self, err: Error) -> Error {
        self.state = AuthorizationState::Failed;
        err
    }
}

// ============================================================================
// TESTS
// ============================================================================
