//! # KILT DID Core
//!
//! Deterministic key derivation, SS58 addressing and DID-based extrinsic
//! authorization for KILT identity wallets.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         KILT DID CORE MODULES                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌───────────────────┐   │
//! │  │     Crypto       │   │     Identity     │   │   Authorization   │   │
//! │  │                  │   │                  │   │                   │   │
//! │  │ - SS58 encoder   │──►│ - did:kilt       │──►│ - Relationship    │   │
//! │  │ - Junctions      │   │ - Method table   │   │   resolver        │   │
//! │  │ - Key derivation │   │ - Recovery       │   │ - Nonces          │   │
//! │  │ - Signatures     │   │   phrase         │   │ - Batch signing   │   │
//! │  └──────────────────┘   └──────────────────┘   └───────────────────┘   │
//! │           ▲                      ▲                       ▲             │
//! │           └──────────────────────┼───────────────────────┘             │
//! │                                  │                                      │
//! │                     ┌────────────┴────────────┐                        │
//! │                     │   FFI (feature "ffi")   │                        │
//! │                     │  JSON dispatcher, C API,│                        │
//! │                     │  Android JNI            │                        │
//! │                     └─────────────────────────┘                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - SS58 addresses, derivation paths, key pairs, signatures
//! - [`identity`] - KILT DIDs, verification relationships, recovery phrases
//! - [`authorization`] - Relationship resolution and (batch) extrinsic authorization
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SECURITY RULES                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Every call is a pure function of its inputs. No caches, no         │
//! │     globals, no key material retained after a call returns.            │
//! │                                                                         │
//! │  2. Mnemonics, passwords, seeds and private keys never appear in       │
//! │     logs, error messages or Debug output.                              │
//! │                                                                         │
//! │  3. A key from the identity-only hash fallback has its own type and    │
//! │     cannot sign.                                                       │
//! │                                                                         │
//! │  4. An extrinsic is only signed by a DID key holding the relationship  │
//! │     its method namespace requires.                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod authorization;
pub mod crypto;
pub mod error;
pub mod identity;

#[cfg(feature = "ffi")]
pub mod ffi;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use authorization::{Authorizer, UnknownMethodPolicy};
pub use crypto::{FallbackPolicy, KeyDerivationService, NetworkPrefix};
pub use error::{Error, Result};
pub use identity::{Identity, KiltDidInfo, PublicIdentity, VerificationRelationship};

use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Default first nonce of a batch when the caller supplies none
pub const DEFAULT_START_NONCE: u64 = 1;

/// Configuration for the derivation and authorization services
///
/// Passed explicitly to every constructor that needs it.
///
/// ```text
/// {
///   "addressPrefix": 38,
///   "unknownMethodPolicy": "defaultToAuthentication",
///   "fallbackPolicy": "disabled",
///   "defaultStartNonce": 1,
///   "verboseLogging": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    /// Prefix for generic address helpers
    pub address_prefix: NetworkPrefix,
    /// What to do with a method namespace outside the relationship table
    pub unknown_method_policy: UnknownMethodPolicy,
    /// Whether the identity-only hash fallback may run
    pub fallback_policy: FallbackPolicy,
    /// Nonce used when a caller passes none
    pub default_start_nonce: u64,
    /// Enable verbose logging
    pub verbose_logging: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            address_prefix: NetworkPrefix::KILT,
            unknown_method_policy: UnknownMethodPolicy::default(),
            fallback_policy: FallbackPolicy::default(),
            default_start_nonce: DEFAULT_START_NONCE,
            verbose_logging: cfg!(feature = "verbose-logging"),
        }
    }
}

impl CoreConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Check the configuration for values no service accepts
    pub fn validate(&self) -> Result<()> {
        NetworkPrefix::new(self.address_prefix.value())
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if self.default_start_nonce == u64::MAX {
            return Err(Error::InvalidConfig(
                "defaultStartNonce leaves no room for a second nonce".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of KILT DID Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        #[cfg(target_os = "ios")]
        target: "ios",
        #[cfg(target_os = "android")]
        target: "android",
        #[cfg(target_os = "macos")]
        target: "macos",
        #[cfg(target_os = "linux")]
        target: "linux",
        #[cfg(target_os = "windows")]
        target: "windows",
        #[cfg(not(any(
            target_os = "ios",
            target_os = "android",
            target_os = "macos",
            target_os = "linux",
            target_os = "windows"
        )))]
        target: "unknown",
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Build information for debugging
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Target operating system
    pub target: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_build_info() {
        let info = build_info();
        assert_eq!(info.version, version());
    }

    #[test]
    fn test_config_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.address_prefix, NetworkPrefix::KILT);
        assert_eq!(
            config.unknown_method_policy,
            UnknownMethodPolicy::DefaultToAuthentication
        );
        assert_eq!(config.fallback_policy, FallbackPolicy::Disabled);
        assert_eq!(config.default_start_nonce, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json_partial() {
        let config = CoreConfig::from_json(r#"{"unknownMethodPolicy":"reject","addressPrefix":0}"#)
            .unwrap();
        assert_eq!(config.unknown_method_policy, UnknownMethodPolicy::Reject);
        assert_eq!(config.address_prefix, NetworkPrefix::POLKADOT);
        assert_eq!(config.default_start_nonce, DEFAULT_START_NONCE);
    }

    #[test]
    fn test_config_rejects_reserved_prefix() {
        let result = CoreConfig::from_json(r#"{"addressPrefix":46}"#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = CoreConfig::from_json(r#"{"defaultStartNonce":18446744073709551615}"#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"fallbackPolicy":"identityOnly","verboseLogging":true}}"#).unwrap();

        let config = CoreConfig::from_file(file.path()).unwrap();
        assert_eq!(config.fallback_policy, FallbackPolicy::IdentityOnly);
        assert!(config.verbose_logging);

        assert!(CoreConfig::from_file("/definitely/not/here.json").is_err());
    }
}
