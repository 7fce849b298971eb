//! # KILT Decentralized Identifiers
//!
//! Composition, parsing and derivation of `did:kilt` identifiers.
//!
//! ## DID Shapes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DID:KILT FORMAT                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Full:   did:kilt:4siJtc4dYq2gPre8Xj6KJcSjVAdi1gmjctUzjf3AwrtNnhvy    │
//! │          ────┬─── ──────────────────────┬──────────────────────        │
//! │              │                          └─ SS58 address, prefix 38     │
//! │              └─ method                                                 │
//! │                                                                         │
//! │  Light:  did:kilt:light:00<address>[:<details>]                        │
//! │                         ─┬                ────┬────                     │
//! │                          │                    └─ optional encoded      │
//! │                          │                       details               │
//! │                          └─ authentication key type                    │
//! │                                                                         │
//! │  ┌─────────┬──────────────────────────────────────────────────────┐    │
//! │  │   00    │  sr25519                                             │    │
//! │  ├─────────┼──────────────────────────────────────────────────────┤    │
//! │  │   01    │  ed25519                                             │    │
//! │  ├─────────┼──────────────────────────────────────────────────────┤    │
//! │  │   02    │  ecdsa                                               │    │
//! │  └─────────┴──────────────────────────────────────────────────────┘    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derivation
//!
//! The DID of a wallet is the KILT address of the sr25519 key at
//! `//did//0`. Keys for the other relationships hang off the same DID:
//!
//! | Relationship | Path |
//! |--------------|------|
//! | authentication | `//did//0` |
//! | assertionMethod | `//did//assertion//0` |
//! | capabilityDelegation | `//did//delegation//0` |

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::crypto::{
    did_authentication_path, hex_bytes, DerivationBackend, DerivationPath, DerivedKey,
    KeyAlgorithm, KeyDerivationService, KeyOrigin, NetworkAddress, NetworkPrefix,
    PUBLIC_KEY_SIZE,
};
use crate::error::{Error, Result};
use crate::identity::VerificationRelationship;

/// Prefix shared by every KILT DID
pub const DID_PREFIX: &str = "did:kilt:";

/// Prefix of a light DID
pub const LIGHT_DID_PREFIX: &str = "did:kilt:light:";

/// Path of the assertion-method key
pub const ASSERTION_KEY_PATH: &str = "//did//assertion//0";

/// Path of the capability-delegation key
pub const DELEGATION_KEY_PATH: &str = "//did//delegation//0";

/// Whether the DID lives on chain or is self-contained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DidType {
    /// `did:kilt:<address>`
    Full,
    /// `did:kilt:light:<type><address>[:<details>]`
    Light,
}

/// Authentication key type tag of a light DID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationKeyType {
    /// `00`
    Sr25519,
    /// `01`
    Ed25519,
    /// `02`
    Ecdsa,
}

impl AuthenticationKeyType {
    /// Two-character tag
    pub fn code(&self) -> &'static str {
        match self {
            AuthenticationKeyType::Sr25519 => "00",
            AuthenticationKeyType::Ed25519 => "01",
            AuthenticationKeyType::Ecdsa => "02",
        }
    }

    /// Parse a two-character tag
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "00" => Some(AuthenticationKeyType::Sr25519),
            "01" => Some(AuthenticationKeyType::Ed25519),
            "02" => Some(AuthenticationKeyType::Ecdsa),
            _ => None,
        }
    }
}

impl From<KeyAlgorithm> for AuthenticationKeyType {
    fn from(algorithm: KeyAlgorithm) -> Self {
        match algorithm {
            KeyAlgorithm::Sr25519 => AuthenticationKeyType::Sr25519,
            KeyAlgorithm::Ed25519 => AuthenticationKeyType::Ed25519,
        }
    }
}

/// A parsed, validated KILT DID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KiltDid {
    value: String,
    did_type: DidType,
    key_type: Option<AuthenticationKeyType>,
    address: NetworkAddress,
    details: Option<String>,
}

impl KiltDid {
    /// Parse a full or light DID
    ///
    /// ## Validation
    ///
    /// - Must start with `did:kilt:` or `did:kilt:light:`
    /// - Light DIDs need a known key-type tag before the address
    /// - The address must be a valid SS58 address under prefix 38
    /// - Light details, if present, are non-empty base64/hex text
    pub fn parse(did: &str) -> Result<Self> {
        if let Some(rest) = did.strip_prefix(LIGHT_DID_PREFIX) {
            let (identifier, details) = match rest.split_once(':') {
                Some((identifier, details)) => (identifier, Some(details)),
                None => (rest, None),
            };

            let code = identifier
                .get(..2)
                .ok_or_else(|| Error::InvalidDidFormat("light DID identifier too short".into()))?;
            let key_type = AuthenticationKeyType::from_code(code).ok_or_else(|| {
                Error::InvalidDidFormat(format!("unknown light DID key type '{}'", code))
            })?;
            let address = kilt_address(&identifier[2..])?;

            if let Some(details) = details {
                validate_details(details)?;
            }

            return Ok(Self {
                value: did.to_string(),
                did_type: DidType::Light,
                key_type: Some(key_type),
                address,
                details: details.map(String::from),
            });
        }

        let rest = did.strip_prefix(DID_PREFIX).ok_or_else(|| {
            Error::InvalidDidFormat(format!("DID must start with '{}'", DID_PREFIX))
        })?;

        Ok(Self {
            value: did.to_string(),
            did_type: DidType::Full,
            key_type: None,
            address: kilt_address(rest)?,
            details: None,
        })
    }

    /// Full DID for a KILT address
    pub fn full(address: &NetworkAddress) -> Result<Self> {
        ensure_kilt(address)?;
        Ok(Self {
            value: format!("{}{}", DID_PREFIX, address),
            did_type: DidType::Full,
            key_type: None,
            address: address.clone(),
            details: None,
        })
    }

    /// Light DID for a KILT address
    pub fn light(
        key_type: AuthenticationKeyType,
        address: &NetworkAddress,
        details: Option<&str>,
    ) -> Result<Self> {
        ensure_kilt(address)?;
        let mut value = format!("{}{}{}", LIGHT_DID_PREFIX, key_type.code(), address);
        if let Some(details) = details {
            validate_details(details)?;
            value.push(':');
            value.push_str(details);
        }
        Ok(Self {
            value,
            did_type: DidType::Light,
            key_type: Some(key_type),
            address: address.clone(),
            details: details.map(String::from),
        })
    }

    /// The DID string
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Full or light
    pub fn did_type(&self) -> DidType {
        self.did_type
    }

    /// Key-type tag, light DIDs only
    pub fn key_type(&self) -> Option<AuthenticationKeyType> {
        self.key_type
    }

    /// The embedded KILT address
    pub fn address(&self) -> &NetworkAddress {
        &self.address
    }

    /// Encoded details, light DIDs only
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Key URI for a relationship, e.g. `did:kilt:4...#authentication`
    pub fn key_uri(&self, relationship: VerificationRelationship) -> String {
        format!("{}{}", self.value, relationship.fragment())
    }
}

impl std::fmt::Display for KiltDid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::str::FromStr for KiltDid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for KiltDid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<KiltDid> for String {
    fn from(did: KiltDid) -> Self {
        did.value
    }
}

impl AsRef<str> for KiltDid {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

fn kilt_address(text: &str) -> Result<NetworkAddress> {
    let address = NetworkAddress::parse(text)
        .map_err(|e| Error::InvalidDidFormat(format!("DID address: {}", e)))?;
    if address.prefix() != NetworkPrefix::KILT {
        return Err(Error::InvalidDidFormat(format!(
            "DID address uses prefix {}, expected {}",
            address.prefix(),
            NetworkPrefix::KILT
        )));
    }
    Ok(address)
}

fn ensure_kilt(address: &NetworkAddress) -> Result<()> {
    if address.prefix() != NetworkPrefix::KILT {
        return Err(Error::InvalidAddress(format!(
            "address uses prefix {}, expected {}",
            address.prefix(),
            NetworkPrefix::KILT
        )));
    }
    Ok(())
}

fn validate_details(details: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=' | '_' | '-');
    if details.is_empty() || !details.chars().all(allowed) {
        return Err(Error::InvalidDidFormat(
            "light DID details must be non-empty base64 or hex".into(),
        ));
    }
    Ok(())
}

// ============================================================================
// COMPOSITION HELPERS
// ============================================================================

/// `did:kilt:<address>` for a KILT address string
pub fn compose_full_did(address: &str) -> Result<String> {
    let address = NetworkAddress::parse(address)?;
    Ok(KiltDid::full(&address)?.value)
}

/// `did:kilt:light:<type><address>[:<details>]` for a KILT address string
pub fn compose_light_did(
    key_type: AuthenticationKeyType,
    address: &str,
    details: Option<&str>,
) -> Result<String> {
    let address = NetworkAddress::parse(address)?;
    Ok(KiltDid::light(key_type, &address, details)?.value)
}

/// Whether a string is a well-formed full or light KILT DID
pub fn validate_did(did: &str) -> bool {
    KiltDid::parse(did).is_ok()
}

/// Address embedded in a full or light DID
pub fn extract_address(did: &str) -> Result<String> {
    Ok(KiltDid::parse(did)?.address.into())
}

// ============================================================================
// DID INFO & DERIVATION
// ============================================================================

/// Everything a wallet needs to know about one of its DID keys
///
/// Contains only public data; safe to serialize and store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KiltDidInfo {
    did: KiltDid,
    #[serde(with = "hex_bytes")]
    public_key: [u8; PUBLIC_KEY_SIZE],
    key_algorithm: KeyAlgorithm,
    derivation_path: String,
    verification_relationship: VerificationRelationship,
    did_type: DidType,
    key_origin: KeyOrigin,
}

impl KiltDidInfo {
    /// Info for an authentication key known only by its public half
    ///
    /// The DID is the KILT address of `public_key`.
    pub fn for_authentication_key(
        public_key: &[u8; PUBLIC_KEY_SIZE],
        key_algorithm: KeyAlgorithm,
        key_origin: KeyOrigin,
    ) -> Result<Self> {
        let address = NetworkAddress::from_public_key(public_key, NetworkPrefix::KILT);
        Ok(Self {
            did: KiltDid::full(&address)?,
            public_key: *public_key,
            key_algorithm,
            derivation_path: did_authentication_path().to_canonical_string(),
            verification_relationship: VerificationRelationship::Authentication,
            did_type: DidType::Full,
            key_origin,
        })
    }

    /// The DID
    pub fn did(&self) -> &KiltDid {
        &self.did
    }

    /// KILT address the DID is built from
    pub fn address(&self) -> &str {
        self.did.address().as_str()
    }

    /// Public key holding the relationship
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.public_key
    }

    /// Public key as lowercase hex
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }

    /// Algorithm of the relationship key
    pub fn key_algorithm(&self) -> KeyAlgorithm {
        self.key_algorithm
    }

    /// Path the relationship key was derived at
    pub fn derivation_path(&self) -> &str {
        &self.derivation_path
    }

    /// Relationship the key holds
    pub fn verification_relationship(&self) -> VerificationRelationship {
        self.verification_relationship
    }

    /// Full or light
    pub fn did_type(&self) -> DidType {
        self.did_type
    }

    /// Whether the key came from real derivation or the hash fallback
    pub fn key_origin(&self) -> KeyOrigin {
        self.key_origin
    }

    /// `<did>#<relationship>`
    pub fn key_uri(&self) -> String {
        self.did.key_uri(self.verification_relationship)
    }
}

/// Derivation path of the key holding `relationship`
pub fn relationship_path(relationship: VerificationRelationship) -> Result<DerivationPath> {
    match relationship {
        VerificationRelationship::Authentication => Ok(did_authentication_path()),
        VerificationRelationship::AssertionMethod => DerivationPath::parse(ASSERTION_KEY_PATH),
        VerificationRelationship::CapabilityDelegation => {
            DerivationPath::parse(DELEGATION_KEY_PATH)
        }
    }
}

/// Derive the wallet's DID from its mnemonic
///
/// Always sr25519 at `//did//0`, KILT prefix, full DID, AUTHENTICATION.
pub fn derive_authentication_did<B: DerivationBackend>(
    service: &KeyDerivationService<B>,
    mnemonic: &str,
    password: Option<&str>,
) -> Result<KiltDidInfo> {
    derive_did_key(
        service,
        mnemonic,
        password,
        VerificationRelationship::Authentication,
    )
    .map(|(info, _)| info)
}

/// Derive the DID and the key holding `relationship`
///
/// The returned [`DerivedKey`] is the signing key for the relationship.
/// It is [`DerivedKey::IdentityOnly`] when the service fell back to the
/// hash derivation, and then cannot sign.
pub fn derive_did_key<B: DerivationBackend>(
    service: &KeyDerivationService<B>,
    mnemonic: &str,
    password: Option<&str>,
    relationship: VerificationRelationship,
) -> Result<(KiltDidInfo, DerivedKey)> {
    let auth_path = did_authentication_path();
    let auth_key = service.derive(KeyAlgorithm::Sr25519, mnemonic, &auth_path, password)?;
    let mut info = KiltDidInfo::for_authentication_key(
        auth_key.public_key(),
        KeyAlgorithm::Sr25519,
        auth_key.origin(),
    )?;

    let key = if relationship == VerificationRelationship::Authentication {
        auth_key
    } else {
        let path = relationship_path(relationship)?;
        let key = service.derive(KeyAlgorithm::Sr25519, mnemonic, &path, password)?;
        info.public_key = *key.public_key();
        info.derivation_path = path.to_canonical_string();
        info.verification_relationship = relationship;
        info.key_origin = key.origin();
        key
    };

    info!(
        did = %info.did,
        relationship = %relationship,
        origin = ?info.key_origin,
        "Derived KILT DID key"
    );
    Ok((info, key))
}

// ============================================================================
// TESTS
// ============================================================================
