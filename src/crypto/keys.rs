//! # Key Management
//!
//! Deterministic key-pair derivation from a mnemonic and a derivation path.
//!
//! ## Key Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY TYPES                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  KeyPairInfo                                                    │   │
//! │  │  ───────────                                                    │   │
//! │  │                                                                  │   │
//! │  │  Purpose:                                                       │   │
//! │  │  • DID authentication keys and account keys                     │   │
//! │  │  • Signing extrinsic authorizations                             │   │
//! │  │                                                                  │   │
//! │  │  Format:                                                        │   │
//! │  │  • Public key: 32 bytes                                        │   │
//! │  │  • Private key: 64 bytes sr25519 (scalar ║ nonce)              │   │
//! │  │                 32 bytes ed25519 (seed)                        │   │
//! │  │                 absent for public-only derivation              │   │
//! │  │  • Zeroized on drop                                            │   │
//! │  │                                                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  IdentityOnlyKey                                                │   │
//! │  │  ───────────────                                                │   │
//! │  │                                                                  │   │
//! │  │  SHA-256 over the base public key and the junction labels.     │   │
//! │  │  Shaped like a public key, but no private key exists for it.   │   │
//! │  │  Good for computing an address or DID, never for signing.      │   │
//! │  │                                                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derivation Flow
//!
//! ```text
//! mnemonic ──► mini-secret ──► base key ──► junction 1 ──► ... ──► KeyPairInfo
//!    │              ▲                           │
//!    │          password                 backend failure
//!    ▼                                          │  (FallbackPolicy::IdentityOnly)
//! InvalidMnemonic                               ▼
//!                                 SHA256(base public ║ labels) = IdentityOnlyKey
//! ```
//!
//! The fallback only ever runs through [`KeyDerivationService::derive`],
//! whose return type makes the weaker guarantee visible.

use ed25519_dalek::SigningKey;
use schnorrkel::derive::{ChainCode, Derivation};
use schnorrkel::{ExpansionMode, MiniSecretKey, PublicKey as Sr25519PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::junction::{DerivationPath, PrimitiveJunction};
use crate::crypto::kdf::{self, MINI_SECRET_SIZE};
use crate::crypto::PUBLIC_KEY_SIZE;
use crate::error::{Error, Result};
use crate::CoreConfig;

/// Signature scheme a key is derived for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    /// Schnorrkel over Ristretto25519, hard and soft junctions
    #[default]
    Sr25519,
    /// Ed25519, hard junctions only
    Ed25519,
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyAlgorithm::Sr25519 => write!(f, "sr25519"),
            KeyAlgorithm::Ed25519 => write!(f, "ed25519"),
        }
    }
}

/// A derived key pair
///
/// ## Security
///
/// - The private key is zeroized when this struct is dropped
/// - `Debug` never prints the private key
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyPairInfo {
    #[zeroize(skip)]
    algorithm: KeyAlgorithm,
    #[zeroize(skip)]
    public_key: [u8; PUBLIC_KEY_SIZE],
    private_key: Option<Vec<u8>>,
}

impl KeyPairInfo {
    pub(crate) fn new(
        algorithm: KeyAlgorithm,
        public_key: [u8; PUBLIC_KEY_SIZE],
        private_key: Option<Vec<u8>>,
    ) -> Self {
        Self {
            algorithm,
            public_key,
            private_key,
        }
    }

    /// Algorithm the key was derived for
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// 32-byte public key
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.public_key
    }

    /// Public key as lowercase hex
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }

    /// Private key bytes, if this pair carries one
    ///
    /// ## Security Warning
    ///
    /// Only use this for secure storage. Never log or transmit these bytes.
    pub fn private_key(&self) -> Option<&[u8]> {
        self.private_key.as_deref()
    }

    /// Whether the pair can sign
    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Copy of this pair without the private key
    pub fn public_only(&self) -> Self {
        Self::new(self.algorithm, self.public_key, None)
    }
}

// Never print the private key
impl std::fmt::Debug for KeyPairInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairInfo")
            .field("algorithm", &self.algorithm)
            .field("public_key", &hex::encode(self.public_key))
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Public-key-shaped value from the hash fallback
///
/// There is no private key behind it. It deliberately implements no signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityOnlyKey {
    algorithm: KeyAlgorithm,
    #[serde(with = "hex_bytes")]
    public_key: [u8; PUBLIC_KEY_SIZE],
    #[serde(with = "hex_bytes")]
    base_public_key: [u8; PUBLIC_KEY_SIZE],
    labels: Vec<String>,
}

impl IdentityOnlyKey {
    /// Algorithm of the base key the value was hashed from
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// The 32-byte identity value
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.public_key
    }

    /// Base public key (empty path) that was hashed
    pub fn base_public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.base_public_key
    }

    /// Junction labels that were hashed, in order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// How a key was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyOrigin {
    /// Real hierarchical derivation, private key available
    Derived,
    /// Hash fallback, identity only, cannot sign
    IdentityOnlyFallback,
}

/// Result of [`KeyDerivationService::derive`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedKey {
    /// Real key pair
    Full(KeyPairInfo),
    /// Hash fallback value
    IdentityOnly(IdentityOnlyKey),
}

impl DerivedKey {
    /// Public key of either variant
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        match self {
            DerivedKey::Full(pair) => pair.public_key(),
            DerivedKey::IdentityOnly(key) => key.public_key(),
        }
    }

    /// Algorithm of either variant
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            DerivedKey::Full(pair) => pair.algorithm(),
            DerivedKey::IdentityOnly(key) => key.algorithm(),
        }
    }

    /// How the key was obtained
    pub fn origin(&self) -> KeyOrigin {
        match self {
            DerivedKey::Full(_) => KeyOrigin::Derived,
            DerivedKey::IdentityOnly(_) => KeyOrigin::IdentityOnlyFallback,
        }
    }

    /// The key pair, if derivation was real
    pub fn as_key_pair(&self) -> Option<&KeyPairInfo> {
        match self {
            DerivedKey::Full(pair) => Some(pair),
            DerivedKey::IdentityOnly(_) => None,
        }
    }
}

/// Whether the hash fallback may replace a failed derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackPolicy {
    /// Failures are returned as they are
    #[default]
    Disabled,
    /// A backend `DerivationFailed` yields an [`IdentityOnlyKey`]
    IdentityOnly,
}

// ============================================================================
// DERIVATION BACKEND
// ============================================================================

/// The elliptic-curve primitive behind the derivation service
pub trait DerivationBackend: Send + Sync {
    /// Derive a key pair from a mini-secret by applying `junctions` in order
    fn derive(
        &self,
        algorithm: KeyAlgorithm,
        seed: &[u8; MINI_SECRET_SIZE],
        junctions: &[PrimitiveJunction],
    ) -> Result<KeyPairInfo>;

    /// Apply soft junctions to a public key
    fn derive_public(
        &self,
        algorithm: KeyAlgorithm,
        public_key: &[u8; PUBLIC_KEY_SIZE],
        junctions: &[PrimitiveJunction],
    ) -> Result<[u8; PUBLIC_KEY_SIZE]>;
}

/// Substrate-compatible backend: schnorrkel for sr25519, ed25519-dalek for ed25519
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstrateBackend;

impl SubstrateBackend {
    fn derive_sr25519(
        seed: &[u8; MINI_SECRET_SIZE],
        junctions: &[PrimitiveJunction],
    ) -> Result<KeyPairInfo> {
        let mini = MiniSecretKey::from_bytes(seed)
            .map_err(|e| Error::derivation_msg(format!("sr25519 mini-secret: {}", e)))?;
        let mut secret = mini.expand(ExpansionMode::Ed25519);

        for junction in junctions {
            secret = match junction {
                PrimitiveJunction::Hard(cc) => secret
                    .hard_derive_mini_secret_key(Some(ChainCode(*cc)), b"")
                    .0
                    .expand(ExpansionMode::Ed25519),
                PrimitiveJunction::Soft(cc) => Self::soft_step(&secret, cc)?,
            };
        }

        let public = secret.to_public().to_bytes();
        let private = Zeroizing::new(secret.to_bytes());
        Ok(KeyPairInfo::new(
            KeyAlgorithm::Sr25519,
            public,
            Some(private.to_vec()),
        ))
    }

    // Soft derivation fixes the scalar only; the nonce half is made
    // deterministic so repeated derivations give identical bytes.
    fn soft_step(parent: &SecretKey, chain_code: &[u8; 32]) -> Result<SecretKey> {
        let (derived, _) = parent.derived_key_simple(ChainCode(*chain_code), b"");
        let parent_bytes = Zeroizing::new(parent.to_bytes());
        let mut bytes = Zeroizing::new(derived.to_bytes());
        bytes[32..].copy_from_slice(&kdf::sr25519_soft_nonce(&parent_bytes, chain_code));
        SecretKey::from_bytes(&bytes[..]).map_err(|e| Error::derivation_msg(format!("sr25519 soft step: {}", e)))
    }

    fn derive_ed25519(
        seed: &[u8; MINI_SECRET_SIZE],
        junctions: &[PrimitiveJunction],
    ) -> Result<KeyPairInfo> {
        let mut secret = Zeroizing::new(*seed);
        for junction in junctions {
            match junction {
                PrimitiveJunction::Hard(cc) => secret = kdf::ed25519_hard_step(&secret, cc),
                PrimitiveJunction::Soft(_) => {
                    return Err(Error::UnsupportedJunction(
                        "ed25519 supports hard junctions only".into(),
                    ))
                }
            }
        }

        let signing = SigningKey::from_bytes(&secret);
        Ok(KeyPairInfo::new(
            KeyAlgorithm::Ed25519,
            signing.verifying_key().to_bytes(),
            Some(secret.to_vec()),
        ))
    }
}

impl DerivationBackend for SubstrateBackend {
    fn derive(
        &self,
        algorithm: KeyAlgorithm,
        seed: &[u8; MINI_SECRET_SIZE],
        junctions: &[PrimitiveJunction],
    ) -> Result<KeyPairInfo> {
        match algorithm {
            KeyAlgorithm::Sr25519 => Self::derive_sr25519(seed, junctions),
            KeyAlgorithm::Ed25519 => Self::derive_ed25519(seed, junctions),
        }
    }

    fn derive_public(
        &self,
        algorithm: KeyAlgorithm,
        public_key: &[u8; PUBLIC_KEY_SIZE],
        junctions: &[PrimitiveJunction],
    ) -> Result<[u8; PUBLIC_KEY_SIZE]> {
        if algorithm != KeyAlgorithm::Sr25519 {
            return Err(Error::UnsupportedJunction(format!(
                "{} has no public derivation",
                algorithm
            )));
        }

        let mut public = Sr25519PublicKey::from_bytes(public_key)
            .map_err(|e| Error::InvalidKey(format!("Invalid sr25519 public key: {}", e)))?;
        for junction in junctions {
            match junction {
                PrimitiveJunction::Soft(cc) => {
                    public = public.derived_key_simple(ChainCode(*cc), b"").0;
                }
                PrimitiveJunction::Hard(_) => {
                    return Err(Error::UnsupportedJunction(
                        "hard junctions need the private key".into(),
                    ))
                }
            }
        }
        Ok(public.to_bytes())
    }
}

// ============================================================================
// KEY DERIVATION SERVICE
// ============================================================================

/// Derives key pairs from mnemonics
///
/// Stateless between calls; nothing derived is cached.
#[derive(Debug, Clone)]
pub struct KeyDerivationService<B = SubstrateBackend> {
    backend: B,
    fallback_policy: FallbackPolicy,
    verbose: bool,
}

impl Default for KeyDerivationService<SubstrateBackend> {
    fn default() -> Self {
        Self::new(SubstrateBackend)
    }
}

impl KeyDerivationService<SubstrateBackend> {
    /// Service over the Substrate backend, configured from `config`
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(SubstrateBackend)
            .with_fallback_policy(config.fallback_policy)
            .with_verbose_logging(config.verbose_logging)
    }
}

impl<B: DerivationBackend> KeyDerivationService<B> {
    /// Service over a custom backend, fallback disabled
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            fallback_policy: FallbackPolicy::Disabled,
            verbose: false,
        }
    }

    /// Set the fallback policy
    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    /// Enable per-junction trace logging
    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Current fallback policy
    pub fn fallback_policy(&self) -> FallbackPolicy {
        self.fallback_policy
    }

    /// Derive an sr25519 key pair
    ///
    /// `password` and a trailing `///password` in `path` are the same BIP39
    /// password; giving both with different values is an error. This never
    /// falls back to the hash derivation.
    pub fn generate_key_pair(
        &self,
        mnemonic: &str,
        path: Option<&DerivationPath>,
        password: Option<&str>,
    ) -> Result<KeyPairInfo> {
        self.generate_key_pair_with(KeyAlgorithm::Sr25519, mnemonic, path, password)
    }

    /// Derive a key pair for a chosen algorithm
    pub fn generate_key_pair_with(
        &self,
        algorithm: KeyAlgorithm,
        mnemonic: &str,
        path: Option<&DerivationPath>,
        password: Option<&str>,
    ) -> Result<KeyPairInfo> {
        let root = DerivationPath::root();
        let path = path.unwrap_or(&root);
        let seed = self.seed(mnemonic, path, password)?;
        self.derive_from_seed(algorithm, &seed, path)
    }

    /// Derive a key, falling back to an identity-only value when allowed
    ///
    /// The fallback applies only to a backend `DerivationFailed` on a
    /// non-empty path. Mnemonic, path and junction errors are returned as they are.
    pub fn derive(
        &self,
        algorithm: KeyAlgorithm,
        mnemonic: &str,
        path: &DerivationPath,
        password: Option<&str>,
    ) -> Result<DerivedKey> {
        let seed = self.seed(mnemonic, path, password)?;

        match self.derive_from_seed(algorithm, &seed, path) {
            Ok(pair) => Ok(DerivedKey::Full(pair)),
            Err(err)
                if matches!(err, Error::DerivationFailed { .. })
                    && self.fallback_policy == FallbackPolicy::IdentityOnly
                    && !path.is_empty() =>
            {
                warn!(
                    error = %err,
                    algorithm = %algorithm,
                    "Hierarchical derivation failed, using identity-only hash fallback"
                );
                let base = self.backend.derive(algorithm, &seed, &[])?;
                let labels = path.labels();
                let public_key = kdf::fallback_identity_key(base.public_key(), &labels);
                Ok(DerivedKey::IdentityOnly(IdentityOnlyKey {
                    algorithm,
                    public_key,
                    base_public_key: *base.public_key(),
                    labels: labels.into_iter().map(String::from).collect(),
                }))
            }
            Err(err) => Err(err),
        }
    }

    /// Apply a soft-only path to an sr25519 public key
    pub fn derive_public(
        &self,
        public_key: &[u8; PUBLIC_KEY_SIZE],
        path: &DerivationPath,
    ) -> Result<KeyPairInfo> {
        if path.password().is_some() {
            return Err(Error::UnsupportedJunction(
                "public derivation takes no password".into(),
            ));
        }
        debug!(junctions = path.len(), "Deriving public key");
        let public = self
            .backend
            .derive_public(KeyAlgorithm::Sr25519, public_key, &path.to_primitives())?;
        Ok(KeyPairInfo::new(KeyAlgorithm::Sr25519, public, None))
    }

    fn seed(
        &self,
        mnemonic: &str,
        path: &DerivationPath,
        password: Option<&str>,
    ) -> Result<Zeroizing<[u8; MINI_SECRET_SIZE]>> {
        let password = resolve_password(path, password)?;
        kdf::mini_secret_from_phrase(mnemonic, password)
    }

    fn derive_from_seed(
        &self,
        algorithm: KeyAlgorithm,
        seed: &[u8; MINI_SECRET_SIZE],
        path: &DerivationPath,
    ) -> Result<KeyPairInfo> {
        debug!(algorithm = %algorithm, junctions = path.len(), "Deriving key pair");
        if self.verbose {
            for (index, junction) in path.to_primitives().iter().enumerate() {
                trace!(index, hard = junction.is_hard(), "Applying junction");
            }
        }
        self.backend.derive(algorithm, seed, &path.to_primitives())
    }
}

fn resolve_password<'a>(path: &'a DerivationPath, explicit: Option<&'a str>) -> Result<&'a str> {
    match (path.password(), explicit) {
        (Some(from_path), Some(given)) if from_path != given => Err(Error::MalformedPath(
            "password given both in the path and as an argument".into(),
        )),
        (Some(from_path), _) => Ok(from_path),
        (None, Some(given)) => Ok(given),
        (None, None) => Ok(""),
    }
}

/// Serde helper for serializing byte arrays as hex
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("Invalid length"))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_PHRASE: &str =
        "bottom drive obey lake curtain smoke basket hold race lonely fit walk";

    const ALICE_SR25519_SECRET: [u8; 64] = [
        51, 166, 243, 9, 63, 21, 138, 113, 9, 246, 121, 65, 11, 239, 26, 12, 84, 22, 129, 69,
        224, 206, 203, 77, 240, 6, 193, 194, 255, 251, 31, 9, 146, 90, 34, 93, 151, 170, 0, 104,
        45, 106, 89, 185, 91, 24, 120, 12, 16, 215, 3, 35, 54, 232, 143, 52, 66, 180, 35, 97,
        244, 166, 96, 17,
    ];

    const ALICE_ED25519_SECRET: [u8; 32] = [
        171, 248, 229, 189, 190, 48, 198, 86, 86, 192, 163, 203, 209, 129, 255, 138, 86, 41, 74,
        105, 223, 237, 210, 121, 130, 170, 206, 74, 118, 144, 145, 21,
    ];

    const MULTI_PHRASE: &str =
        "strong isolate job basic auto frozen want garlic autumn height riot desert";

    /// Fails every derivation that has junctions
    struct FlakyBackend;

    impl DerivationBackend for FlakyBackend {
        fn derive(
            &self,
            algorithm: KeyAlgorithm,
            seed: &[u8; MINI_SECRET_SIZE],
            junctions: &[PrimitiveJunction],
        ) -> Result<KeyPairInfo> {
            if junctions.is_empty() {
                SubstrateBackend.derive(algorithm, seed, junctions)
            } else {
                Err(Error::derivation_msg("hierarchical derivation unavailable"))
            }
        }

        fn derive_public(
            &self,
            algorithm: KeyAlgorithm,
            public_key: &[u8; PUBLIC_KEY_SIZE],
            junctions: &[PrimitiveJunction],
        ) -> Result<[u8; PUBLIC_KEY_SIZE]> {
            SubstrateBackend.derive_public(algorithm, public_key, junctions)
        }
    }

    fn substrate() -> KeyDerivationService {
        KeyDerivationService::default()
    }

    fn path(s: &str) -> DerivationPath {
        DerivationPath::parse(s).unwrap()
    }

    #[test]
    fn test_alice_sr25519() {
        let service = substrate();
        let pair = service
            .generate_key_pair(DEV_PHRASE, Some(&path("//Alice")), None)
            .unwrap();

        assert_eq!(
            pair.public_key_hex(),
            "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d"
        );
        assert_eq!(pair.private_key(), Some(&ALICE_SR25519_SECRET[..]));
        assert_eq!(pair.algorithm(), KeyAlgorithm::Sr25519);
    }

    #[test]
    fn test_alice_ed25519() {
        let service = substrate();
        let pair = service
            .generate_key_pair_with(KeyAlgorithm::Ed25519, DEV_PHRASE, Some(&path("//Alice")), None)
            .unwrap();

        assert_eq!(
            pair.public_key_hex(),
            "88dc3417d5058ec4b4503e0c12ea1a0a89be200fe98922423d4334014fa6b0ee"
        );
        assert_eq!(pair.private_key(), Some(&ALICE_ED25519_SECRET[..]));
    }

    #[test]
    fn test_empty_path_is_base_key() {
        let service = substrate();
        let expected: [u8; 64] = [
            5, 214, 85, 132, 99, 13, 22, 205, 74, 246, 208, 190, 193, 15, 52, 187, 80, 74, 93,
            203, 98, 219, 162, 18, 45, 73, 245, 166, 99, 118, 61, 10, 253, 25, 12, 206, 116, 223,
            53, 100, 50, 180, 16, 189, 100, 104, 35, 9, 214, 222, 219, 39, 199, 104, 69, 218, 243,
            136, 85, 124, 186, 195, 202, 52,
        ];

        let none = service.generate_key_pair(DEV_PHRASE, None, None).unwrap();
        let root = service
            .generate_key_pair(DEV_PHRASE, Some(&DerivationPath::root()), None)
            .unwrap();

        assert_eq!(none.private_key(), Some(&expected[..]));
        assert_eq!(none, root);
    }

    #[test]
    fn test_multi_junction_with_password() {
        let service = substrate();
        let p = path("//foo//2//baz///my_password");

        let sr = service.generate_key_pair(MULTI_PHRASE, Some(&p), None).unwrap();
        let expected_sr: [u8; 64] = [
            144, 209, 243, 24, 75, 220, 185, 255, 47, 39, 160, 1, 179, 74, 230, 178, 26, 1, 64,
            139, 194, 14, 123, 204, 213, 105, 88, 17, 142, 68, 198, 10, 101, 57, 5, 124, 59, 208,
            57, 242, 223, 43, 140, 191, 21, 56, 88, 79, 192, 241, 237, 195, 169, 103, 244, 249, 36,
            90, 106, 10, 109, 40, 29, 73,
        ];
        assert_eq!(sr.private_key(), Some(&expected_sr[..]));

        let ed = service
            .generate_key_pair_with(KeyAlgorithm::Ed25519, MULTI_PHRASE, Some(&p), None)
            .unwrap();
        let expected_ed: [u8; 32] = [
            95, 205, 122, 218, 56, 195, 127, 158, 30, 205, 82, 84, 159, 120, 105, 63, 210, 155,
            217, 74, 40, 142, 70, 179, 11, 75, 82, 143, 219, 208, 86, 245,
        ];
        assert_eq!(ed.private_key(), Some(&expected_ed[..]));
    }

    #[test]
    fn test_password_argument_and_path_password() {
        let service = substrate();
        let with_path = path("//foo//2//baz///my_password");
        let without = path("//foo//2//baz");

        let a = service.generate_key_pair(MULTI_PHRASE, Some(&with_path), None).unwrap();
        let b = service
            .generate_key_pair(MULTI_PHRASE, Some(&without), Some("my_password"))
            .unwrap();
        let c = service
            .generate_key_pair(MULTI_PHRASE, Some(&with_path), Some("my_password"))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);

        let conflict = service.generate_key_pair(MULTI_PHRASE, Some(&with_path), Some("other"));
        assert!(matches!(conflict, Err(Error::MalformedPath(_))));
    }

    #[test]
    fn test_soft_derivation_is_deterministic() {
        let service = substrate();
        let p = path("//Alice/soft/1");

        let first = service.generate_key_pair(DEV_PHRASE, Some(&p), None).unwrap();
        let second = service.generate_key_pair(DEV_PHRASE, Some(&p), None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_derive_public_matches_secret_path() {
        let service = substrate();
        let alice = service
            .generate_key_pair(DEV_PHRASE, Some(&path("//Alice")), None)
            .unwrap();
        let child = service
            .generate_key_pair(DEV_PHRASE, Some(&path("//Alice/soft/1")), None)
            .unwrap();

        let public = service
            .derive_public(alice.public_key(), &path("/soft/1"))
            .unwrap();
        assert_eq!(public.public_key(), child.public_key());
        assert!(!public.has_private_key());

        assert!(matches!(
            service.derive_public(alice.public_key(), &path("//hard")),
            Err(Error::UnsupportedJunction(_))
        ));
    }

    #[test]
    fn test_ed25519_rejects_soft() {
        let service = substrate();
        let result = service.generate_key_pair_with(
            KeyAlgorithm::Ed25519,
            DEV_PHRASE,
            Some(&path("//Alice/soft")),
            None,
        );
        assert!(matches!(result, Err(Error::UnsupportedJunction(_))));
    }

    #[test]
    fn test_invalid_mnemonic() {
        let service = substrate().with_fallback_policy(FallbackPolicy::IdentityOnly);
        let bad = "bottom drive obey lake curtain smoke basket hold race lonely fit wa1k";

        assert!(matches!(
            service.generate_key_pair(bad, None, None),
            Err(Error::InvalidMnemonic(_))
        ));
        assert!(matches!(
            service.derive(KeyAlgorithm::Sr25519, bad, &path("//did//0"), None),
            Err(Error::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn test_fallback_disabled_surfaces_error() {
        let service = KeyDerivationService::new(FlakyBackend);
        let result = service.derive(KeyAlgorithm::Sr25519, DEV_PHRASE, &path("//did//0"), None);
        assert!(matches!(result, Err(Error::DerivationFailed { .. })));
    }

    #[test]
    fn test_fallback_identity_only() {
        let service = KeyDerivationService::new(FlakyBackend)
            .with_fallback_policy(FallbackPolicy::IdentityOnly);
        let derived = service
            .derive(KeyAlgorithm::Sr25519, DEV_PHRASE, &path("//did//0"), None)
            .unwrap();

        assert_eq!(derived.origin(), KeyOrigin::IdentityOnlyFallback);
        assert!(derived.as_key_pair().is_none());

        let base = substrate()
            .generate_key_pair(DEV_PHRASE, None, None)
            .unwrap();
        let expected = kdf::fallback_identity_key(base.public_key(), &["did", "0"]);
        assert_eq!(derived.public_key(), &expected);

        match derived {
            DerivedKey::IdentityOnly(key) => {
                assert_eq!(key.base_public_key(), base.public_key());
                assert_eq!(key.labels(), &["did".to_string(), "0".to_string()]);
            }
            DerivedKey::Full(_) => panic!("expected identity-only key"),
        }
    }

    #[test]
    fn test_generate_key_pair_never_falls_back() {
        let service = KeyDerivationService::new(FlakyBackend)
            .with_fallback_policy(FallbackPolicy::IdentityOnly);
        let result = service.generate_key_pair(DEV_PHRASE, Some(&path("//did//0")), None);
        assert!(matches!(result, Err(Error::DerivationFailed { .. })));
    }

    #[test]
    fn test_real_derivation_reports_derived_origin() {
        let service = substrate().with_fallback_policy(FallbackPolicy::IdentityOnly);
        let derived = service
            .derive(KeyAlgorithm::Sr25519, DEV_PHRASE, &path("//Alice"), None)
            .unwrap();
        assert_eq!(derived.origin(), KeyOrigin::Derived);
        assert_eq!(
            hex::encode(derived.public_key()),
            "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d"
        );
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let pair = substrate()
            .generate_key_pair(DEV_PHRASE, Some(&path("//Alice")), None)
            .unwrap();
        let debug = format!("{:?}", pair);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&hex::encode(&ALICE_SR25519_SECRET[..32])));
        assert!(pair.public_only().private_key().is_none());
    }

    #[test]
    fn test_identity_only_key_serialization() {
        let key = IdentityOnlyKey {
            algorithm: KeyAlgorithm::Sr25519,
            public_key: [3u8; 32],
            base_public_key: [4u8; 32],
            labels: vec!["did".into()],
        };
        let json = serde_json::to_string(&key).unwrap();
        assert!(json.contains(&hex::encode([3u8; 32])));
        let restored: IdentityOnlyKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, restored);
    }
}
