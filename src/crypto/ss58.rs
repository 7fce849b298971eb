//! # SS58 Addresses
//!
//! Network-prefixed, checksummed base58 addresses used by Substrate chains.
//!
//! ## Wire Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SS58 LAYOUT                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  base58( prefix (1 or 2 bytes) ║ public key (32) ║ checksum (2) )      │
//! │                                                                         │
//! │  checksum = Blake2b-512("SS58PRE" ║ prefix ║ public key)[0..2]          │
//! │                                                                         │
//! │  Prefix 0..=63      → one byte, the value itself                       │
//! │  Prefix 64..=16383  → two bytes, first byte has bit 6 set              │
//! │                                                                         │
//! │    first  = 0b01 ║ ident[7..2]                                        │
//! │    second = ident[1..0] ║ ident[13..8]                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prefixes 46 and 47 are reserved by the SS58 registry and are rejected in
//! both directions.

use serde::{Deserialize, Serialize};

use crate::crypto::PUBLIC_KEY_SIZE;
use crate::error::{Error, Result};

/// Domain prefix hashed in front of every checksum
const CHECKSUM_PREFIX: &[u8] = b"SS58PRE";

/// Number of checksum bytes appended to the payload
const CHECKSUM_LEN: usize = 2;

/// Largest prefix expressible in the two-byte form
pub const MAX_PREFIX: u16 = 0x3fff;

/// A network identifier embedded in SS58 addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct NetworkPrefix(u16);

impl NetworkPrefix {
    /// Polkadot relay chain, the first network in the registry
    pub const POLKADOT: Self = Self(0);
    /// Kusama relay chain
    pub const KUSAMA: Self = Self(2);
    /// KILT spiritnet; every DID address uses this prefix
    pub const KILT: Self = Self(38);
    /// Generic Substrate development networks
    pub const SUBSTRATE: Self = Self(42);

    /// Create a prefix, rejecting reserved and out-of-range values
    pub fn new(value: u16) -> Result<Self> {
        if value > MAX_PREFIX {
            return Err(Error::InvalidAddress(format!(
                "prefix {} exceeds the maximum of {}",
                value, MAX_PREFIX
            )));
        }
        if value == 46 || value == 47 {
            return Err(Error::InvalidAddress(format!("prefix {} is reserved", value)));
        }
        Ok(Self(value))
    }

    /// Raw numeric value
    pub fn value(self) -> u16 {
        self.0
    }

    /// Registry name for the prefixes this wallet ships with
    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("polkadot"),
            2 => Some("kusama"),
            38 => Some("kilt"),
            42 => Some("substrate"),
            _ => None,
        }
    }

    /// Encode into the one- or two-byte wire form
    fn to_bytes(self) -> ([u8; 2], usize) {
        let ident = self.0;
        if ident < 64 {
            ([ident as u8, 0], 1)
        } else {
            let first = ((ident & 0b0000_0000_1111_1100) as u8 >> 2) | 0b0100_0000;
            let second = ((ident >> 8) as u8) | (((ident & 0b0000_0000_0000_0011) as u8) << 6);
            ([first, second], 2)
        }
    }

    /// Decode the prefix at the start of `data`, returning it and its width
    fn from_bytes(data: &[u8]) -> Result<(Self, usize)> {
        let first = *data
            .first()
            .ok_or_else(|| Error::InvalidAddress("empty payload".into()))?;

        match first {
            0..=63 => Ok((Self::new(first as u16)?, 1)),
            64..=127 => {
                let second = *data
                    .get(1)
                    .ok_or_else(|| Error::InvalidAddress("truncated two-byte prefix".into()))?;
                let lower = (first << 2) | (second >> 6);
                let upper = second & 0b0011_1111;
                let ident = (lower as u16) | ((upper as u16) << 8);
                if ident < 64 {
                    return Err(Error::InvalidAddress(
                        "two-byte prefix encodes a one-byte value".into(),
                    ));
                }
                Ok((Self::new(ident)?, 2))
            }
            _ => Err(Error::InvalidAddress(format!(
                "unsupported prefix byte 0x{:02x}",
                first
            ))),
        }
    }
}

impl TryFrom<u16> for NetworkPrefix {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        Self::new(value)
    }
}

impl From<NetworkPrefix> for u16 {
    fn from(prefix: NetworkPrefix) -> Self {
        prefix.0
    }
}

impl std::fmt::Display for NetworkPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An SS58 address together with the prefix it was encoded under
///
/// Serializes as the plain address string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkAddress {
    address: String,
    prefix: NetworkPrefix,
    public_key: [u8; PUBLIC_KEY_SIZE],
}

impl NetworkAddress {
    /// Encode a public key under `prefix`
    pub fn from_public_key(public_key: &[u8; PUBLIC_KEY_SIZE], prefix: NetworkPrefix) -> Self {
        Self {
            address: encode_checked(public_key, prefix),
            prefix,
            public_key: *public_key,
        }
    }

    /// Parse and verify an address string
    pub fn parse(address: &str) -> Result<Self> {
        let (public_key, prefix) = decode(address)?;
        Ok(Self {
            address: address.to_string(),
            prefix,
            public_key,
        })
    }

    /// The encoded string
    pub fn as_str(&self) -> &str {
        &self.address
    }

    /// The prefix the address was encoded under
    pub fn prefix(&self) -> NetworkPrefix {
        self.prefix
    }

    /// The 32-byte public key
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.public_key
    }
}

impl std::fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address)
    }
}

impl std::str::FromStr for NetworkAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NetworkAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<NetworkAddress> for String {
    fn from(address: NetworkAddress) -> Self {
        address.address
    }
}

impl AsRef<str> for NetworkAddress {
    fn as_ref(&self) -> &str {
        &self.address
    }
}

/// Blake2b-512 over the checksum preimage, truncated to two bytes
fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = blake2_rfc::blake2b::Blake2b::new(64);
    hasher.update(CHECKSUM_PREFIX);
    hasher.update(payload);
    let digest = hasher.finalize();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest.as_bytes()[..CHECKSUM_LEN]);
    out
}

fn encode_checked(public_key: &[u8; PUBLIC_KEY_SIZE], prefix: NetworkPrefix) -> String {
    let (prefix_bytes, prefix_len) = prefix.to_bytes();

    let mut payload = Vec::with_capacity(prefix_len + PUBLIC_KEY_SIZE + CHECKSUM_LEN);
    payload.extend_from_slice(&prefix_bytes[..prefix_len]);
    payload.extend_from_slice(public_key);
    let check = checksum(&payload);
    payload.extend_from_slice(&check);

    bs58::encode(payload).into_string()
}

/// Encode a 32-byte public key as an SS58 address
///
/// ## Example
///
/// ```ignore
/// let address = encode(&[0u8; 32], NetworkPrefix::KILT)?;
/// assert!(address.starts_with('4'));
/// ```
pub fn encode(public_key: &[u8], prefix: NetworkPrefix) -> Result<String> {
    let key: &[u8; PUBLIC_KEY_SIZE] = public_key.try_into().map_err(|_| {
        Error::InvalidKey(format!(
            "public key must be {} bytes, got {}",
            PUBLIC_KEY_SIZE,
            public_key.len()
        ))
    })?;
    Ok(encode_checked(key, prefix))
}

/// Decode an SS58 address into its public key and prefix
///
/// Fails with [`Error::InvalidAddress`] when the string is not base58, the
/// decoded length does not match the prefix width, or the checksum differs.
pub fn decode(address: &str) -> Result<([u8; PUBLIC_KEY_SIZE], NetworkPrefix)> {
    let data = bs58::decode(address)
        .into_vec()
        .map_err(|e| Error::InvalidAddress(format!("invalid base58: {}", e)))?;

    let (prefix, prefix_len) = NetworkPrefix::from_bytes(&data)?;

    let expected_len = prefix_len + PUBLIC_KEY_SIZE + CHECKSUM_LEN;
    if data.len() != expected_len {
        return Err(Error::InvalidAddress(format!(
            "expected {} decoded bytes for a {}-byte prefix, got {}",
            expected_len,
            prefix_len,
            data.len()
        )));
    }

    let (body, check) = data.split_at(prefix_len + PUBLIC_KEY_SIZE);
    if checksum(body)[..] != *check {
        return Err(Error::InvalidAddress("checksum mismatch".into()));
    }

    let mut public_key = [0u8; PUBLIC_KEY_SIZE];
    public_key.copy_from_slice(&body[prefix_len..]);
    Ok((public_key, prefix))
}

/// Check whether a string is a well-formed SS58 address
pub fn validate_address(address: &str) -> bool {
    decode(address).is_ok()
}

/// Check whether an address decodes and was encoded under `prefix`
pub fn is_from_network(address: &str, prefix: NetworkPrefix) -> bool {
    matches!(decode(address), Ok((_, p)) if p == prefix)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";

    fn alice() -> [u8; 32] {
        hex::decode(ALICE).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_alice_known_addresses() {
        assert_eq!(
            encode(&alice(), NetworkPrefix::SUBSTRATE).unwrap(),
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
        );
        assert_eq!(
            encode(&alice(), NetworkPrefix::POLKADOT).unwrap(),
            "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5"
        );
        assert_eq!(
            encode(&alice(), NetworkPrefix::KILT).unwrap(),
            "4siJtc4dYq2gPre8Xj6KJcSjVAdi1gmjctUzjf3AwrtNnhvy"
        );
    }

    #[test]
    fn test_zero_key_differs_per_prefix() {
        let zero = [0u8; 32];
        let generic = encode(&zero, NetworkPrefix::POLKADOT).unwrap();
        let kilt = encode(&zero, NetworkPrefix::KILT).unwrap();

        assert_eq!(generic, "111111111111111111111111111111111HC1");
        assert_eq!(kilt, "4nv4phaKc4EcwENdRERuMF79ZSSB5xvnAk3zNySSbVbXhSwS");
        assert_ne!(generic, kilt);

        assert_eq!(decode(&generic).unwrap(), (zero, NetworkPrefix::POLKADOT));
        assert_eq!(decode(&kilt).unwrap(), (zero, NetworkPrefix::KILT));
    }

    #[test]
    fn test_two_byte_prefixes() {
        let zero = [0u8; 32];
        for (value, expected) in [
            (64u16, "cEVaCm5a61UpVfABWNjfSNHbhAPf92NWiACfxy89Fd2hGkJAc"),
            (255, "yGCjWUS4Y1wwGrhQ82uMnDnY7VmhbvfXDyvcwaFfjZXFpyjCq"),
            (16383, "yNVL4kwAwEH34hPtM6SnH1ZHtDLi8PDC1sBXDLKBhjPiYiEY9"),
        ] {
            let prefix = NetworkPrefix::new(value).unwrap();
            let address = encode(&zero, prefix).unwrap();
            assert_eq!(address, expected);
            assert_eq!(decode(&address).unwrap(), (zero, prefix));
        }
    }

    #[test]
    fn test_roundtrip_across_prefixes() {
        let key = alice();
        for value in [0u16, 1, 2, 38, 42, 63, 64, 100, 1000, 12345] {
            let prefix = NetworkPrefix::new(value).unwrap();
            let address = encode(&key, prefix).unwrap();
            assert_eq!(decode(&address).unwrap(), (key, prefix));
            assert!(is_from_network(&address, prefix));
        }
    }

    #[test]
    fn test_single_byte_corruption_rejected() {
        let address = encode(&alice(), NetworkPrefix::KILT).unwrap();
        let raw = bs58::decode(&address).into_vec().unwrap();

        for i in 0..raw.len() {
            let mut corrupted = raw.clone();
            corrupted[i] ^= 0x01;
            let tampered = bs58::encode(&corrupted).into_string();
            assert!(!validate_address(&tampered), "byte {} flip accepted", i);
        }
    }

    #[test]
    fn test_truncated_and_garbage_rejected() {
        let address = encode(&alice(), NetworkPrefix::KILT).unwrap();
        assert!(!validate_address(&address[..address.len() - 1]));
        assert!(!validate_address("not-base58-0OIl"));
        assert!(!validate_address(""));
        assert!(matches!(decode("0OIl"), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_high_prefix_byte_rejected() {
        let mut payload = vec![0x80u8];
        payload.extend_from_slice(&[0u8; 34]);
        let address = bs58::encode(payload).into_string();
        assert!(matches!(decode(&address), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_two_byte_form_of_small_prefix_rejected() {
        let key = [7u8; PUBLIC_KEY_SIZE];
        // 38 forced into the two-byte layout
        let mut payload = vec![0x49u8, 0x80];
        payload.extend_from_slice(&key);
        let check = checksum(&payload);
        payload.extend_from_slice(&check);
        let address = bs58::encode(payload).into_string();

        assert!(matches!(decode(&address), Err(Error::InvalidAddress(_))));
        assert!(!validate_address(&address));

        let canonical = encode(&key, NetworkPrefix::KILT).unwrap();
        assert_eq!(decode(&canonical).unwrap(), (key, NetworkPrefix::KILT));
    }

    #[test]
    fn test_reserved_prefixes() {
        assert!(NetworkPrefix::new(46).is_err());
        assert!(NetworkPrefix::new(47).is_err());
        assert!(NetworkPrefix::new(MAX_PREFIX + 1).is_err());
        assert!(serde_json::from_str::<NetworkPrefix>("46").is_err());
        assert_eq!(serde_json::from_str::<NetworkPrefix>("38").unwrap(), NetworkPrefix::KILT);
    }

    #[test]
    fn test_is_from_network() {
        let address = encode(&alice(), NetworkPrefix::KILT).unwrap();
        assert!(is_from_network(&address, NetworkPrefix::KILT));
        assert!(!is_from_network(&address, NetworkPrefix::SUBSTRATE));
        assert!(!is_from_network("garbage", NetworkPrefix::KILT));
    }

    #[test]
    fn test_encode_rejects_wrong_key_length() {
        assert!(matches!(
            encode(&[0u8; 31], NetworkPrefix::KILT),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_network_address_parse() {
        let address = NetworkAddress::from_public_key(&alice(), NetworkPrefix::KILT);
        let parsed: NetworkAddress = address.as_str().parse().unwrap();
        assert_eq!(parsed, address);
        assert_eq!(parsed.public_key(), &alice());
        assert_eq!(parsed.prefix().name(), Some("kilt"));
    }
}
