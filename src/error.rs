//! # Error Handling
//!
//! This module provides the error type shared by every operation in the core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Core Errors                                                       │
//! │  │   └── InvalidConfig          - Configuration rejected               │
//! │  │                                                                      │
//! │  ├── Identity Errors                                                   │
//! │  │   ├── InvalidMnemonic        - Bad BIP39 word, checksum or length   │
//! │  │   ├── MalformedPath          - Derivation path does not parse       │
//! │  │   └── InvalidDidFormat       - DID string has an unknown shape      │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── UnsupportedJunction    - Junction not derivable by algorithm  │
//! │  │   ├── DerivationFailed       - Backend derivation failed (+source)  │
//! │  │   ├── InvalidAddress         - SS58 string or prefix rejected       │
//! │  │   ├── InvalidKey             - Key bytes of the wrong shape         │
//! │  │   ├── SigningFailed          - Signature could not be produced      │
//! │  │   └── VerificationFailed     - Signature does not verify            │
//! │  │                                                                      │
//! │  └── Authorization Errors                                              │
//! │      ├── UnresolvedRelationship - Unknown method namespace             │
//! │      ├── WrongRelationship      - DID key holds another relationship   │
//! │      ├── EmptyBatch             - Batch with zero transactions         │
//! │      ├── SignerMismatch         - Signer key is not the DID key        │
//! │      ├── NonceOverflow          - Nonce counter exhausted              │
//! │      └── InvalidStateTransition - Request step out of order            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Handling Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ERROR HANDLING FLOW                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Internal (Rust)              FFI Boundary              External (Kt)  │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Result<T, Error>  ──────►  ErrorCode + Message  ──────►  KiltException│
//! │                              (integer + string)                         │
//! │                                                                         │
//! │  Example:                                                              │
//! │  Err(Error::EmptyBatch)  →  { code: 602, message: "..." }             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages never contain mnemonics, passwords, seeds or private keys.
//! Derivation paths are reported by byte offset only, since a path may end
//! in a `///password` segment.

use thiserror::Error;

use crate::identity::VerificationRelationship;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed lower-level cause attached to [`Error::DerivationFailed`]
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the KILT DID core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Core Errors (100-199)
    // ========================================================================

    /// Configuration could not be parsed or failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Identity Errors (200-299)
    // ========================================================================

    /// Mnemonic failed BIP39 validation
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Derivation path string does not follow the `//hard/soft///password` grammar
    #[error("Malformed derivation path: {0}")]
    MalformedPath(String),

    /// DID string is neither a full nor a light KILT DID
    #[error("Invalid DID format: {0}")]
    InvalidDidFormat(String),

    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================

    /// The junction cannot be applied by the selected algorithm
    #[error("Unsupported junction: {0}")]
    UnsupportedJunction(String),

    /// Lower-level derivation failure
    #[error("Key derivation failed: {message}")]
    DerivationFailed {
        /// What was being derived
        message: String,
        /// The originating error, if the backend produced one
        #[source]
        source: Option<BoxedCause>,
    },

    /// SS58 address could not be decoded or encoded
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Key bytes have the wrong length or are not a valid curve point
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Signature verification failed
    #[error("Signature verification failed")]
    VerificationFailed,

    // ========================================================================
    // Authorization Errors (600-699)
    // ========================================================================

    /// The transaction's method namespace has no known relationship
    #[error("No verification relationship known for method namespace '{0}'")]
    UnresolvedRelationship(String),

    /// The DID's key holds a different relationship than the transaction needs
    #[error("Wrong verification relationship: transaction requires {expected}, DID key holds {actual}")]
    WrongRelationship {
        /// Relationship the transaction requires
        expected: VerificationRelationship,
        /// Relationship the DID was derived for
        actual: VerificationRelationship,
    },

    /// A batch was submitted without transactions
    #[error("Cannot authorize an empty batch")]
    EmptyBatch,

    /// The signer's public key is not the key behind the DID
    #[error("Signer does not control DID {0}")]
    SignerMismatch(String),

    /// The next nonce does not fit in 64 bits
    #[error("Nonce overflow after {0}")]
    NonceOverflow(u64),

    /// An authorization request step was called in the wrong state
    #[error("Invalid authorization state transition: {0}")]
    InvalidStateTransition(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl Error {
    /// Build a [`Error::DerivationFailed`] wrapping a lower-level error
    pub fn derivation<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::DerivationFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a [`Error::DerivationFailed`] without an underlying cause
    pub fn derivation_msg(message: impl Into<String>) -> Self {
        Error::DerivationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Get the error code for FFI
    ///
    /// Error codes are organized by category:
    /// - 100-199: Core / configuration
    /// - 200-299: Identity (mnemonic, path, DID)
    /// - 300-399: Crypto (derivation, addresses, signatures)
    /// - 600-699: Authorization
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Core (100-199)
            Error::InvalidConfig(_) => 100,

            // Identity (200-299)
            Error::InvalidMnemonic(_) => 200,
            Error::MalformedPath(_) => 201,
            Error::InvalidDidFormat(_) => 202,

            // Crypto (300-399)
            Error::UnsupportedJunction(_) => 300,
            Error::DerivationFailed { .. } => 301,
            Error::InvalidAddress(_) => 302,
            Error::InvalidKey(_) => 303,
            Error::SigningFailed(_) => 304,
            Error::VerificationFailed => 305,

            // Authorization (600-699)
            Error::UnresolvedRelationship(_) => 600,
            Error::WrongRelationship { .. } => 601,
            Error::EmptyBatch => 602,
            Error::SignerMismatch(_) => 603,
            Error::NonceOverflow(_) => 604,
            Error::InvalidStateTransition(_) => 605,

            // Internal (900-999)
            Error::Internal(_) => 900,
            Error::SerializationError(_) => 902,
            Error::DeserializationError(_) => 903,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Nothing inside the core retries. A recoverable error is one the
    /// calling layer can fix by supplying different input for the same
    /// request, such as a corrected address or a fresh nonce.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidAddress(_) | Error::NonceOverflow(_) | Error::EmptyBatch
        )
    }

    /// Check if this error requires user action
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Error::InvalidMnemonic(_) | Error::MalformedPath(_) | Error::InvalidAddress(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Error::DeserializationError(err.to_string())
        } else {
            Error::SerializationError(err.to_string())
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// FFI ERROR REPRESENTATION
// ============================================================================

/// FFI-friendly error representation
///
/// This struct can be safely passed across the FFI boundary
#[derive(Debug, Clone)]
#[repr(C)]
pub struct FfiError {
    /// Numeric error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the error is recoverable
    pub recoverable: bool,
}

impl From<Error> for FfiError {
    fn from(err: Error) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
