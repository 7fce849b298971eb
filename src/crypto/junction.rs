//! # Derivation Paths
//!
//! Hierarchical derivation paths in the Substrate "SURI" notation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       DERIVATION PATH GRAMMAR                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   path      := segment* ( "///" password )?                            │
//! │   segment   := "//" label        (hard junction)                       │
//! │              | "/"  label        (soft junction)                       │
//! │   label     := one or more characters other than "/"                   │
//! │   password  := one or more characters (may contain "/")                │
//! │                                                                         │
//! │   Example: //did//0            → [Hard("did"), Hard("0")]              │
//! │            //polkadot/0///pw   → [Hard("polkadot"), Soft("0")] + "pw"  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Chain Codes
//!
//! Each label becomes a 32-byte chain code:
//!
//! - a label that parses as `u64` is written little-endian in the first 8 bytes
//! - any other label is `compact(len) ║ bytes`, zero-padded to 32 bytes, or
//!   its Blake2b-256 hash when that encoding is longer than 32 bytes
//!
//! ## Junction Kinds
//!
//! Besides hard and soft junctions the wallet model knows PASSWORD, PARENT
//! and PLACEHOLDER junctions. Derivation primitives only understand hard and
//! soft, so [`coerce_to_primitive`] collapses those three kinds to hard.
//! The collapse is lossy: a coerced junction renders and derives exactly like
//! a hard junction with the same label.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Width of a junction chain code in bytes
pub const CHAIN_CODE_SIZE: usize = 32;

/// Semantic kind of a junction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JunctionKind {
    /// Mixes the label into the secret key
    Hard,
    /// Mixes the label into the public chain code only
    Soft,
    /// Password-tagged segment
    Password,
    /// Parent reference
    Parent,
    /// Placeholder reserved by the wallet UI
    Placeholder,
}

/// The only two junction kinds a derivation primitive accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveJunction {
    /// Hard derivation step with its chain code
    Hard([u8; CHAIN_CODE_SIZE]),
    /// Soft derivation step with its chain code
    Soft([u8; CHAIN_CODE_SIZE]),
}

impl PrimitiveJunction {
    /// Chain code regardless of kind
    pub fn chain_code(&self) -> &[u8; CHAIN_CODE_SIZE] {
        match self {
            PrimitiveJunction::Hard(cc) | PrimitiveJunction::Soft(cc) => cc,
        }
    }

    /// Whether this is a hard step
    pub fn is_hard(&self) -> bool {
        matches!(self, PrimitiveJunction::Hard(_))
    }
}

/// Map any junction kind onto the hard/soft pair understood by primitives
///
/// PASSWORD, PARENT and PLACEHOLDER all become HARD.
pub fn coerce_to_primitive(kind: JunctionKind) -> JunctionKind {
    match kind {
        JunctionKind::Soft => JunctionKind::Soft,
        JunctionKind::Hard
        | JunctionKind::Password
        | JunctionKind::Parent
        | JunctionKind::Placeholder => JunctionKind::Hard,
    }
}

/// One segment of a derivation path
///
/// Equality and hashing see the kind after coercion, so a password junction
/// equals the hard junction with the same label.
#[derive(Debug, Clone)]
pub struct Junction {
    kind: JunctionKind,
    label: String,
    chain_code: [u8; CHAIN_CODE_SIZE],
}

impl Junction {
    /// Create a junction of any kind
    ///
    /// The label must be non-empty and must not contain `/`.
    pub fn new(kind: JunctionKind, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(Error::MalformedPath("junction label is empty".into()));
        }
        if label.contains('/') {
            return Err(Error::MalformedPath("junction label contains '/'".into()));
        }
        let chain_code = chain_code_from_label(&label);
        Ok(Self {
            kind,
            label,
            chain_code,
        })
    }

    /// Hard junction
    pub fn hard(label: impl Into<String>) -> Result<Self> {
        Self::new(JunctionKind::Hard, label)
    }

    /// Soft junction
    pub fn soft(label: impl Into<String>) -> Result<Self> {
        Self::new(JunctionKind::Soft, label)
    }

    /// Semantic kind as constructed
    pub fn kind(&self) -> JunctionKind {
        self.kind
    }

    /// Label text the chain code was computed from
    pub fn label(&self) -> &str {
        &self.label
    }

    /// 32-byte chain code
    pub fn chain_code(&self) -> &[u8; CHAIN_CODE_SIZE] {
        &self.chain_code
    }

    /// Hand this junction to a primitive that only knows hard and soft
    pub fn to_primitive(&self) -> PrimitiveJunction {
        match coerce_to_primitive(self.kind) {
            JunctionKind::Soft => PrimitiveJunction::Soft(self.chain_code),
            _ => PrimitiveJunction::Hard(self.chain_code),
        }
    }
}

impl PartialEq for Junction {
    fn eq(&self, other: &Self) -> bool {
        coerce_to_primitive(self.kind) == coerce_to_primitive(other.kind)
            && self.label == other.label
    }
}

impl Eq for Junction {}

impl std::hash::Hash for Junction {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        coerce_to_primitive(self.kind).hash(state);
        self.label.hash(state);
    }
}

impl std::fmt::Display for Junction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match coerce_to_primitive(self.kind) {
            JunctionKind::Soft => write!(f, "/{}", self.label),
            _ => write!(f, "//{}", self.label),
        }
    }
}

/// An ordered list of junctions plus an optional password
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DerivationPath {
    junctions: Vec<Junction>,
    password: Option<String>,
}

impl DerivationPath {
    /// Path without junctions or password
    pub fn root() -> Self {
        Self::default()
    }

    /// Build from already constructed junctions
    pub fn from_junctions(junctions: Vec<Junction>) -> Self {
        Self {
            junctions,
            password: None,
        }
    }

    /// Attach a password, replacing any previous one
    pub fn with_password(mut self, password: impl Into<String>) -> Result<Self> {
        let password = password.into();
        if password.is_empty() {
            return Err(Error::MalformedPath("password is empty".into()));
        }
        self.password = Some(password);
        Ok(self)
    }

    /// Parse a path string such as `//did//0` or `//hard/soft///password`
    ///
    /// The empty string parses to the root path. Errors report the byte
    /// offset of the problem and never echo the input.
    pub fn parse(path: &str) -> Result<Self> {
        let bytes = path.as_bytes();
        let mut junctions = Vec::new();
        let mut password = None;
        let mut pos = 0;

        while pos < bytes.len() {
            if bytes[pos] != b'/' {
                return Err(Error::MalformedPath(format!(
                    "expected '/' at byte {}",
                    pos
                )));
            }

            let rest = &path[pos..];
            if rest.starts_with("///") {
                let secret = &rest[3..];
                if secret.is_empty() {
                    return Err(Error::MalformedPath(format!(
                        "unterminated password separator at byte {}",
                        pos
                    )));
                }
                password = Some(secret.to_string());
                break;
            }

            let (kind, sep_len) = if rest.starts_with("//") {
                (JunctionKind::Hard, 2)
            } else {
                (JunctionKind::Soft, 1)
            };

            let label_start = pos + sep_len;
            if label_start >= bytes.len() {
                return Err(Error::MalformedPath(format!(
                    "unterminated separator at byte {}",
                    pos
                )));
            }

            let label_len = path[label_start..]
                .find('/')
                .unwrap_or(path.len() - label_start);
            if label_len == 0 {
                return Err(Error::MalformedPath(format!(
                    "empty segment at byte {}",
                    label_start
                )));
            }

            junctions.push(Junction::new(
                kind,
                &path[label_start..label_start + label_len],
            )?);
            pos = label_start + label_len;
        }

        Ok(Self {
            junctions,
            password,
        })
    }

    /// Render the canonical string form
    ///
    /// `parse(path.to_canonical_string())` returns an equal path for every
    /// path built from junctions. Password, parent and placeholder junctions
    /// render as hard and compare equal to their hard form.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        for junction in &self.junctions {
            out.push_str(&junction.to_string());
        }
        if let Some(password) = &self.password {
            out.push_str("///");
            out.push_str(password);
        }
        out
    }

    /// Junctions in derivation order
    pub fn junctions(&self) -> &[Junction] {
        &self.junctions
    }

    /// Trailing password, if any
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Number of junctions
    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    /// Whether the path has no junctions
    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    /// Junctions coerced for a hard/soft primitive
    pub fn to_primitives(&self) -> Vec<PrimitiveJunction> {
        self.junctions.iter().map(Junction::to_primitive).collect()
    }

    /// Labels in order, fed to the identity-only fallback hash
    pub fn labels(&self) -> Vec<&str> {
        self.junctions.iter().map(Junction::label).collect()
    }

    /// Canonical form with the password masked, safe for logs and JSON
    pub fn to_display_string(&self) -> String {
        let mut out: String = self.junctions.iter().map(|j| j.to_string()).collect();
        if self.password.is_some() {
            out.push_str("///***");
        }
        out
    }
}

// Never print the password
impl std::fmt::Debug for DerivationPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationPath")
            .field("junctions", &self.junctions)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl std::str::FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Label of the first junction of the DID authentication path
pub const DID_ROOT_LABEL: &str = "did";

/// Label of the second junction of the DID authentication path
pub const DID_AUTHENTICATION_INDEX: &str = "0";

/// The DID authentication path `//did//0`
pub fn did_authentication_path() -> DerivationPath {
    let junctions = [DID_ROOT_LABEL, DID_AUTHENTICATION_INDEX]
        .into_iter()
        .map(|label| Junction {
            kind: JunctionKind::Hard,
            label: label.to_string(),
            chain_code: chain_code_from_label(label),
        })
        .collect();
    DerivationPath::from_junctions(junctions)
}

/// Compute the 32-byte chain code for a junction label
pub fn chain_code_from_label(label: &str) -> [u8; CHAIN_CODE_SIZE] {
    let mut chain_code = [0u8; CHAIN_CODE_SIZE];

    if let Ok(n) = label.parse::<u64>() {
        chain_code[..8].copy_from_slice(&n.to_le_bytes());
        return chain_code;
    }

    let code = label.as_bytes();
    let prefix = encode_scale_compact(code.len());

    if prefix.len() + code.len() > CHAIN_CODE_SIZE {
        let mut hasher = blake2_rfc::blake2b::Blake2b::new(CHAIN_CODE_SIZE);
        hasher.update(&prefix);
        hasher.update(code);
        chain_code.copy_from_slice(hasher.finalize().as_bytes());
    } else {
        chain_code[..prefix.len()].copy_from_slice(&prefix);
        chain_code[prefix.len()..prefix.len() + code.len()].copy_from_slice(code);
    }

    chain_code
}

/// SCALE compact encoding of a length
pub(crate) fn encode_scale_compact(value: usize) -> Vec<u8> {
    let value = value as u64;
    if value < 1 << 6 {
        vec![(value as u8) << 2]
    } else if value < 1 << 14 {
        (((value as u16) << 2) | 0b01).to_le_bytes().to_vec()
    } else if value < 1 << 30 {
        (((value as u32) << 2) | 0b10).to_le_bytes().to_vec()
    } else {
        let bytes = value.to_le_bytes();
        let used = 8 - (value.leading_zeros() as usize / 8);
        let mut out = Vec::with_capacity(used + 1);
        out.push((((used - 4) as u8) << 2) | 0b11);
        out.extend_from_slice(&bytes[..used]);
        out
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cc(hex_str: &str) -> [u8; 32] {
        hex::decode(hex_str).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_parse_did_path() {
        let path = DerivationPath::parse("//did//0").unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.labels(), vec!["did", "0"]);
        assert!(path.junctions().iter().all(|j| j.kind() == JunctionKind::Hard));
        assert_eq!(path.password(), None);
        assert_eq!(path, did_authentication_path());
    }

    #[test]
    fn test_did_authentication_path_renders() {
        assert_eq!(did_authentication_path().to_canonical_string(), "//did//0");
    }

    #[test]
    fn test_parse_mixed_with_password() {
        let path = DerivationPath::parse("//polkadot/0//x///my/pass").unwrap();
        let kinds: Vec<_> = path.junctions().iter().map(|j| j.kind()).collect();
        assert_eq!(
            kinds,
            vec![JunctionKind::Hard, JunctionKind::Soft, JunctionKind::Hard]
        );
        assert_eq!(path.password(), Some("my/pass"));
        assert_eq!(path.to_canonical_string(), "//polkadot/0//x///my/pass");
    }

    #[test]
    fn test_empty_is_root() {
        let path = DerivationPath::parse("").unwrap();
        assert!(path.is_empty());
        assert_eq!(path.to_canonical_string(), "");
    }

    #[test]
    fn test_malformed_paths() {
        for bad in ["/", "//", "//did/", "//did//", "did//0", "///", "//a///"] {
            assert!(
                matches!(DerivationPath::parse(bad), Err(Error::MalformedPath(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_errors_do_not_echo_password() {
        let err = DerivationPath::parse("//a//").unwrap_err().to_string();
        assert!(!err.contains("//a"));

        let path = DerivationPath::parse("//a///hunter2").unwrap();
        assert!(!format!("{:?}", path).contains("hunter2"));
        assert_eq!(path.to_display_string(), "//a///***");
    }

    #[test]
    fn test_roundtrip_built_paths() {
        let paths = vec![
            DerivationPath::from_junctions(vec![
                Junction::hard("kilt").unwrap(),
                Junction::soft("1").unwrap(),
                Junction::soft("attestation key").unwrap(),
            ]),
            DerivationPath::from_junctions(vec![Junction::soft("x").unwrap()])
                .with_password("p@ss")
                .unwrap(),
            DerivationPath::root(),
            did_authentication_path(),
        ];

        for path in paths {
            let reparsed = DerivationPath::parse(&path.to_canonical_string()).unwrap();
            assert_eq!(reparsed, path);
        }
    }

    #[test]
    fn test_roundtrip_every_junction_kind() {
        let kinds = [
            JunctionKind::Hard,
            JunctionKind::Soft,
            JunctionKind::Password,
            JunctionKind::Parent,
            JunctionKind::Placeholder,
        ];
        for kind in kinds {
            let path = DerivationPath::from_junctions(vec![
                Junction::new(kind, "x").unwrap(),
                Junction::new(kind, "7").unwrap(),
            ]);
            let reparsed = DerivationPath::parse(&path.to_canonical_string()).unwrap();
            assert_eq!(reparsed, path, "kind {:?}", kind);
        }

        assert_ne!(Junction::soft("x").unwrap(), Junction::hard("x").unwrap());
    }

    #[test]
    fn test_lossy_coercion() {
        assert_eq!(coerce_to_primitive(JunctionKind::Hard), JunctionKind::Hard);
        assert_eq!(coerce_to_primitive(JunctionKind::Soft), JunctionKind::Soft);
        assert_eq!(coerce_to_primitive(JunctionKind::Password), JunctionKind::Hard);
        assert_eq!(coerce_to_primitive(JunctionKind::Parent), JunctionKind::Hard);
        assert_eq!(coerce_to_primitive(JunctionKind::Placeholder), JunctionKind::Hard);
    }

    #[test]
    fn test_coerced_junction_matches_hard() {
        let hard = Junction::hard("did").unwrap();
        for kind in [JunctionKind::Password, JunctionKind::Parent, JunctionKind::Placeholder] {
            let junction = Junction::new(kind, "did").unwrap();
            assert_eq!(junction.to_primitive(), hard.to_primitive());
            assert_eq!(junction.to_string(), "//did");
        }
    }

    #[test]
    fn test_chain_codes() {
        assert_eq!(
            chain_code_from_label("did"),
            cc("0c64696400000000000000000000000000000000000000000000000000000000")
        );
        assert_eq!(chain_code_from_label("0"), [0u8; 32]);
        assert_eq!(
            chain_code_from_label("125"),
            cc("7d00000000000000000000000000000000000000000000000000000000000000")
        );
        assert_eq!(
            chain_code_from_label("Alice"),
            cc("14416c6963650000000000000000000000000000000000000000000000000000")
        );
        assert_eq!(
            chain_code_from_label(&"a".repeat(40)),
            cc("02ac7775ba44703a066694f26190321465637e184af457eefabbdefa677c3d18")
        );
    }

    #[test]
    fn test_scale_compact() {
        assert_eq!(encode_scale_compact(0), vec![0x00]);
        assert_eq!(encode_scale_compact(11), vec![44]);
        assert_eq!(encode_scale_compact(63), vec![0xfc]);
        assert_eq!(encode_scale_compact(64), vec![0x01, 0x01]);
        assert_eq!(encode_scale_compact(16383), vec![0xfd, 0xff]);
        assert_eq!(encode_scale_compact(16384), vec![0x02, 0x00, 0x01, 0x00]);
        assert_eq!(encode_scale_compact(1 << 30), vec![0x03, 0x00, 0x00, 0x00, 0x40]);
    }

    #[test]
    fn test_invalid_labels() {
        assert!(Junction::hard("").is_err());
        assert!(Junction::soft("a/b").is_err());
        assert!(DerivationPath::root().with_password("").is_err());
    }
}
