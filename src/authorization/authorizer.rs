//! Single and batch authorization over an [`AuthorizationRequest`].

use serde::Serialize;
use tracing::{debug, info, trace};

use super::{
    AuthorizationRequest, DidSigner, Transaction, TransactionAuthorization, UnknownMethodPolicy,
};
use crate::error::{Error, Result};
use crate::identity::{KiltDidInfo, VerificationRelationship};
use crate::{CoreConfig, DEFAULT_START_NONCE};

/// Resolves relationships and signs transactions for one policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorizer {
    policy: UnknownMethodPolicy,
    default_nonce: u64,
    verbose: bool,
}

impl Default for Authorizer {
    fn default() -> Self {
        Self::new(UnknownMethodPolicy::default())
    }
}

impl Authorizer {
    /// Create an authorizer with `policy` for unknown namespaces
    pub fn new(policy: UnknownMethodPolicy) -> Self {
        Self {
            policy,
            default_nonce: DEFAULT_START_NONCE,
            verbose: false,
        }
    }

    /// Create an authorizer from the core configuration
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            policy: config.unknown_method_policy,
            default_nonce: config.default_start_nonce,
            verbose: config.verbose_logging,
        }
    }

    /// Nonce used when callers pass none
    pub fn with_default_nonce(mut self, nonce: u64) -> Self {
        self.default_nonce = nonce;
        self
    }

    /// Log every batch item at trace level
    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Policy for namespaces outside the relationship table
    pub fn policy(&self) -> UnknownMethodPolicy {
        self.policy
    }

    /// Nonce used when callers pass none
    pub fn default_nonce(&self) -> u64 {
        self.default_nonce
    }

    /// Relationship the DID key must hold to sign `transaction`
    pub fn resolve_relationship<T: Transaction + ?Sized>(
        &self,
        transaction: &T,
    ) -> Result<VerificationRelationship> {
        self.policy.resolve(transaction.namespace())
    }

    /// Authorize a single transaction
    ///
    /// ## Errors
    ///
    /// - [`Error::UnresolvedRelationship`] under [`UnknownMethodPolicy::Reject`]
    /// - [`Error::WrongRelationship`] if `did` holds another relationship
    /// - [`Error::SignerMismatch`] if `signer` is not the key behind `did`
    pub fn authorize<T, S>(
        &self,
        did: &KiltDidInfo,
        transaction: &T,
        nonce: Option<u64>,
        submitter: &str,
        signer: &S,
    ) -> Result<TransactionAuthorization<T>>
    where
        T: Transaction + Clone,
        S: DidSigner + ?Sized,
    {
        let nonce = nonce.unwrap_or(self.default_nonce);
        let mut request = AuthorizationRequest::new(transaction);
        let relationship = request.resolve(self.policy)?;
        request.assign_nonce(nonce)?;
        request.sign(did, submitter, signer)?;
        let authorization = request.finish(did)?;

        debug!(
            namespace = transaction.namespace(),
            relationship = %relationship,
            nonce = nonce,
            "Authorized transaction"
        );
        Ok(authorization)
    }

    /// Authorize transactions in order with consecutive nonces
    ///
    /// The `i`-th transaction gets `start_nonce + i` (default start from
    /// the configuration). The first failure stops the batch; authorizations
    /// computed before it are returned in the [`BatchError`].
    pub fn authorize_batch<T, S>(
        &self,
        did: &KiltDidInfo,
        transactions: &[T],
        start_nonce: Option<u64>,
        submitter: &str,
        signer: &S,
    ) -> std::result::Result<BatchAuthorization<T>, BatchError<T>>
    where
        T: Transaction + Clone,
        S: DidSigner + ?Sized,
    {
        if transactions.is_empty() {
            return Err(BatchError {
                completed: Vec::new(),
                failed_at: 0,
                error: Error::EmptyBatch,
            });
        }

        let start = start_nonce.unwrap_or(self.default_nonce);
        info!(
            did = %did.did(),
            count = transactions.len(),
            start_nonce = start,
            "Authorizing batch"
        );

        let mut completed = Vec::with_capacity(transactions.len());
        let mut nonce = start;
        for (index, transaction) in transactions.iter().enumerate() {
            if index > 0 {
                nonce = match nonce.checked_add(1) {
                    Some(next) => next,
                    None => {
                        return Err(BatchError {
                            completed,
                            failed_at: index,
                            error: Error::NonceOverflow(nonce),
                        })
                    }
                };
            }

            if self.verbose {
                trace!(
                    index = index,
                    namespace = transaction.namespace(),
                    nonce = nonce,
                    "Batch item"
                );
            }

            match self.authorize(did, transaction, Some(nonce), submitter, signer) {
                Ok(authorization) => completed.push(authorization),
                Err(error) => {
                    return Err(BatchError {
                        completed,
                        failed_at: index,
                        error,
                    })
                }
            }
        }

        info!(did = %did.did(), count = completed.len(), "Batch authorized");
        Ok(BatchAuthorization { items: completed })
    }
}

// ============================================================================
// BATCH RESULTS
// ============================================================================

/// Authorizations of a batch in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAuthorization<T> {
    items: Vec<TransactionAuthorization<T>>,
}

impl<T> BatchAuthorization<T> {
    /// Items in input order
    pub fn items(&self) -> &[TransactionAuthorization<T>] {
        &self.items
    }

    /// Take the items
    pub fn into_items(self) -> Vec<TransactionAuthorization<T>> {
        self.items
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a successful batch
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items grouped by relationship, keeping input order inside each group
    pub fn by_relationship(
        &self,
    ) -> Vec<(VerificationRelationship, Vec<&TransactionAuthorization<T>>)> {
        VerificationRelationship::ALL
            .iter()
            .filter_map(|relationship| {
                let group: Vec<_> = self
                    .items
                    .iter()
                    .filter(|item| item.signature.verification_relationship == *relationship)
                    .collect();
                (!group.is_empty()).then_some((*relationship, group))
            })
            .collect()
    }
}

/// A batch that stopped at `failed_at`
#[derive(Debug)]
pub struct BatchError<T> {
    /// Authorizations finished before the failure, in input order
    pub completed: Vec<TransactionAuthorization<T>>,
    /// Index of the failing transaction
    pub failed_at: usize,
    /// Why it failed
    pub error: Error,
}

impl<T> std::fmt::Display for BatchError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Batch failed at item {}: {}", self.failed_at, self.error)
    }
}

impl<T: std::fmt::Debug> std::error::Error for BatchError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<BatchError<T>> for Error {
    fn from(err: BatchError<T>) -> Self {
        err.error
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::Extrinsic;
    use crate::crypto::{KeyDerivationService, KeyPairInfo};
    use crate::identity::derive_did_key;

    const DEV_PHRASE: &str =
        "bottom drive obey lake curtain smoke basket hold race lonely fit walk";
    const SUBMITTER: &str = "4siJtc4dYq2gPre8Xj6KJcSjVAdi1gmjctUzjf3AwrtNnhvy";

    fn did_key(relationship: VerificationRelationship) -> (KiltDidInfo, KeyPairInfo) {
        let service: KeyDerivationService = KeyDerivationService::default();
        let (info, key) = derive_did_key(&service, DEV_PHRASE, None, relationship).unwrap();
        (info, key.as_key_pair().unwrap().clone())
    }

    fn attestations(count: usize) -> Vec<Extrinsic> {
        (0..count)
            .map(|i| Extrinsic::new("attestation", "add", vec![i as u8]))
            .collect()
    }

    #[test]
    fn test_resolve_relationship() {
        let authorizer = Authorizer::default();
        let tx = Extrinsic::new("web3Names", "claim", vec![]);
        assert_eq!(
            authorizer.resolve_relationship(&tx).unwrap(),
            VerificationRelationship::Authentication
        );

        let unknown = Extrinsic::new("balances", "transfer", vec![]);
        assert_eq!(
            authorizer.resolve_relationship(&unknown).unwrap(),
            VerificationRelationship::Authentication
        );
        assert!(Authorizer::new(UnknownMethodPolicy::Reject)
            .resolve_relationship(&unknown)
            .is_err());
    }

    #[test]
    fn test_authorize_single() {
        let (did, key) = did_key(VerificationRelationship::Authentication);
        let tx = Extrinsic::new("did", "update", vec![9]);

        let authorization = Authorizer::default()
            .authorize(&did, &tx, None, SUBMITTER, &key)
            .unwrap();
        assert_eq!(authorization.nonce(), DEFAULT_START_NONCE);
        assert_eq!(authorization.transaction, tx);
        assert_eq!(authorization.signature.submitter, SUBMITTER);
        assert!(authorization.verify().is_ok());
    }

    #[test]
    fn test_tampered_authorization_fails_verify() {
        let (did, key) = did_key(VerificationRelationship::Authentication);
        let tx = Extrinsic::new("didLookup", "associateAccount", vec![1]);
        let mut authorization = Authorizer::default()
            .authorize(&did, &tx, Some(3), SUBMITTER, &key)
            .unwrap();

        authorization.signature.nonce = 4;
        assert!(matches!(authorization.verify(), Err(Error::VerificationFailed)));
    }

    #[test]
    fn test_authorize_wrong_relationship() {
        let (did, key) = did_key(VerificationRelationship::Authentication);
        let tx = Extrinsic::new("attestation", "add", vec![]);

        let result = Authorizer::default().authorize(&did, &tx, None, SUBMITTER, &key);
        assert!(matches!(
            result,
            Err(Error::WrongRelationship {
                expected: VerificationRelationship::AssertionMethod,
                actual: VerificationRelationship::Authentication,
            })
        ));
    }

    #[test]
    fn test_authorize_signer_mismatch() {
        let (did, _) = did_key(VerificationRelationship::AssertionMethod);
        let (_, other_key) = did_key(VerificationRelationship::Authentication);
        let tx = Extrinsic::new("attestation", "add", vec![]);

        let result = Authorizer::default().authorize(&did, &tx, None, SUBMITTER, &other_key);
        assert!(matches!(result, Err(Error::SignerMismatch(_))));
    }

    #[test]
    fn test_batch_nonces_increase() {
        let (did, key) = did_key(VerificationRelationship::AssertionMethod);
        let txs = attestations(4);

        let batch = Authorizer::default()
            .authorize_batch(&did, &txs, Some(10), SUBMITTER, &key)
            .unwrap();
        let nonces: Vec<u64> = batch.items().iter().map(|a| a.nonce()).collect();
        assert_eq!(nonces, vec![10, 11, 12, 13]);
        assert!(batch.items().iter().all(|a| a.verify().is_ok()));

        let groups = batch.by_relationship();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, VerificationRelationship::AssertionMethod);
        assert_eq!(groups[0].1.len(), 4);
    }

    #[test]
    fn test_batch_default_start_nonce() {
        let (did, key) = did_key(VerificationRelationship::AssertionMethod);
        let config = CoreConfig {
            default_start_nonce: 7,
            ..CoreConfig::default()
        };

        let batch = Authorizer::from_config(&config)
            .authorize_batch(&did, &attestations(2), None, SUBMITTER, &key)
            .unwrap();
        assert_eq!(batch.items()[0].nonce(), 7);
        assert_eq!(batch.items()[1].nonce(), 8);

        let batch = Authorizer::default()
            .authorize_batch(&did, &attestations(1), None, SUBMITTER, &key)
            .unwrap();
        assert_eq!(batch.items()[0].nonce(), 1);
    }

    #[test]
    fn test_empty_batch() {
        let (did, key) = did_key(VerificationRelationship::AssertionMethod);
        let txs: Vec<Extrinsic> = Vec::new();

        let err = Authorizer::default()
            .authorize_batch(&did, &txs, None, SUBMITTER, &key)
            .unwrap_err();
        assert!(matches!(err.error, Error::EmptyBatch));
        assert!(err.completed.is_empty());
    }

    #[test]
    fn test_batch_keeps_partial_results() {
        let (did, key) = did_key(VerificationRelationship::AssertionMethod);
        let mut txs = attestations(2);
        txs.push(Extrinsic::new("balances", "transfer", vec![]));
        txs.extend(attestations(1));

        let err = Authorizer::new(UnknownMethodPolicy::Reject)
            .authorize_batch(&did, &txs, Some(1), SUBMITTER, &key)
            .unwrap_err();
        assert_eq!(err.failed_at, 2);
        assert!(matches!(err.error, Error::UnresolvedRelationship(_)));
        assert_eq!(err.completed.len(), 2);
        assert_eq!(err.completed[1].nonce(), 2);
        assert!(err.completed.iter().all(|a| a.verify().is_ok()));
    }

    #[test]
    fn test_batch_nonce_overflow() {
        let (did, key) = did_key(VerificationRelationship::AssertionMethod);

        let err = Authorizer::default()
            .authorize_batch(&did, &attestations(2), Some(u64::MAX), SUBMITTER, &key)
            .unwrap_err();
        assert_eq!(err.failed_at, 1);
        assert!(matches!(err.error, Error::NonceOverflow(n) if n == u64::MAX));
        assert_eq!(err.completed.len(), 1);
    }

    #[test]
    fn test_batch_error_converts() {
        let (did, key) = did_key(VerificationRelationship::AssertionMethod);
        let txs: Vec<Extrinsic> = Vec::new();
        let result: Result<BatchAuthorization<Extrinsic>> = Authorizer::default()
            .authorize_batch(&did, &txs, None, SUBMITTER, &key)
            .map_err(Error::from);
        assert!(matches!(result, Err(Error::EmptyBatch)));
    }
}
