//! # Cryptography Module
//!
//! Key derivation, addressing and signatures behind every KILT DID.
//!
//! ## Key Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    KEY HIERARCHY                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Recovery Phrase (BIP39 - 12 to 24 words)                      │   │
//! │  │                          │                                      │   │
//! │  │                          ▼                                      │   │
//! │  │  ┌─────────────────────────────────────────────────────────┐   │   │
//! │  │  │              Mini-Secret (256 bits)                      │   │   │
//! │  │  │   PBKDF2-SHA512(entropy, "mnemonic" ║ password, 2048)   │   │   │
//! │  │  └─────────────────────────────────────────────────────────┘   │   │
//! │  │                          │                                      │   │
//! │  │                          ▼                                      │   │
//! │  │                 Base key pair (empty path)                      │   │
//! │  │                          │                                      │   │
//! │  │            ┌─────────────┴─────────────┐                       │   │
//! │  │            ▼                           ▼                       │   │
//! │  │  ┌─────────────────┐         ┌─────────────────┐              │   │
//! │  │  │  //did//0       │         │  any other path │              │   │
//! │  │  │  (Sr25519)      │         │  (Sr25519 or    │              │   │
//! │  │  │                 │         │   Ed25519)      │              │   │
//! │  │  │ • DID auth key  │         │ • Account keys  │              │   │
//! │  │  │ • Extrinsic     │         │ • Attestation   │              │   │
//! │  │  │   authorization │         │   keys          │              │   │
//! │  │  └─────────────────┘         └─────────────────┘              │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ADDRESSES                                       │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  SS58: base58(prefix ║ public key ║ checksum)                  │   │
//! │  │  checksum = Blake2b-512("SS58PRE" ║ prefix ║ key)[..2]        │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices
//!
//! | Algorithm | Purpose | Crate |
//! |-----------|---------|-------|
//! | Sr25519 | DID keys, hard and soft derivation | schnorrkel |
//! | Ed25519 | Hard-only account keys | ed25519-dalek |
//! | Blake2b | SS58 checksum, chain codes, Ed25519 HDKD | blake2-rfc |
//! | PBKDF2-HMAC-SHA512 | Mini-secret from mnemonic | pbkdf2, hmac, sha2 |
//! | SHA-256 | Identity-only fallback | sha2 |
//! | BIP39 | Recovery phrase | bip39 |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: Private keys and seeds are zeroized when dropped
//! 2. **No Caching**: Nothing derived outlives the call that produced it
//! 3. **Redacted Debug**: Secret-holding types never print their contents

pub mod junction;
pub mod kdf;
mod keys;
mod signing;
pub mod ss58;

pub use junction::{
    coerce_to_primitive, did_authentication_path, DerivationPath, Junction, JunctionKind,
    PrimitiveJunction,
};
pub(crate) use keys::hex_bytes;
pub use keys::{
    DerivationBackend, DerivedKey, FallbackPolicy, IdentityOnlyKey, KeyAlgorithm,
    KeyDerivationService, KeyOrigin, KeyPairInfo, SubstrateBackend,
};
pub use signing::{sign, verify, Signature, SIGNATURE_SIZE, SIGNING_CONTEXT};
pub use ss58::{NetworkAddress, NetworkPrefix};

/// Size of public keys in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;
