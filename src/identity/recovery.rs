//! # Recovery Phrase (BIP39)
//!
//! BIP39 mnemonic phrases that every DID key of a wallet is derived from.
//!
//! ## Supported Lengths
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      BIP39 MNEMONIC LENGTHS                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   Words │ Entropy │ Checksum                                           │
//! │   ──────┼─────────┼─────────                                            │
//! │     12  │ 128 bit │  4 bit                                             │
//! │     15  │ 160 bit │  5 bit                                             │
//! │     18  │ 192 bit │  6 bit                                             │
//! │     21  │ 224 bit │  7 bit                                             │
//! │     24  │ 256 bit │  8 bit                                             │
//! │                                                                         │
//! │  checksum = first (entropy_bits / 32) bits of SHA256(entropy)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Seed Derivation
//!
//! Substrate wallets do not use the BIP39 seed. The mini-secret is
//! PBKDF2 over the decoded *entropy*, see [`crate::crypto::kdf`].
//!
//! ## Security Considerations
//!
//! | Aspect | Measure |
//! |--------|---------|
//! | Entropy | OS CSPRNG |
//! | Checksum | Catches typos before any key is derived |
//! | Storage | Phrase should be written down, never stored digitally |
//! | Display | Show once, never log |

use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::crypto::kdf::{self, MINI_SECRET_SIZE};
use crate::error::{Error, Result};

/// Default number of words for a new wallet
pub const WORD_COUNT: usize = 12;

/// Word counts accepted for generation and parsing
pub const SUPPORTED_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Maximum number of autocomplete suggestions
const MAX_SUGGESTIONS: usize = 10;

/// A BIP39 recovery phrase
///
/// ## Security Warning
///
/// - This phrase can fully recover every key of the wallet
/// - Should be shown to the user exactly once
/// - Should never be logged or stored in plaintext
#[derive(ZeroizeOnDrop)]
pub struct RecoveryPhrase {
    #[zeroize(skip)] // bip39::Mnemonic doesn't implement Zeroize
    mnemonic: Mnemonic,
}

impl RecoveryPhrase {
    /// Generate a new random recovery phrase with `word_count` words
    pub fn generate(word_count: usize) -> Result<Self> {
        if !SUPPORTED_WORD_COUNTS.contains(&word_count) {
            return Err(Error::InvalidMnemonic(format!(
                "unsupported word count {}",
                word_count
            )));
        }

        // 32 bits of entropy per 3 words
        let mut entropy = Zeroizing::new([0u8; 32]);
        let entropy_len = word_count / 3 * 4;
        rand::rngs::OsRng.fill_bytes(&mut entropy[..entropy_len]);

        let mnemonic = Mnemonic::from_entropy(&entropy[..entropy_len])
            .map_err(|e| Error::Internal(format!("Failed to generate mnemonic: {}", e)))?;

        Ok(Self { mnemonic })
    }

    /// Parse a recovery phrase
    ///
    /// ## Validation
    ///
    /// - 12, 15, 18, 21 or 24 words
    /// - All words must be in the BIP39 English wordlist
    /// - Checksum must be valid
    pub fn from_phrase(phrase: &str) -> Result<Self> {
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
            .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;

        if !SUPPORTED_WORD_COUNTS.contains(&mnemonic.word_count()) {
            return Err(Error::InvalidMnemonic(format!(
                "unsupported word count {}",
                mnemonic.word_count()
            )));
        }

        Ok(Self { mnemonic })
    }

    /// Parse from a list of words
    pub fn from_words(words: &[&str]) -> Result<Self> {
        let phrase = Zeroizing::new(words.join(" "));
        Self::from_phrase(&phrase)
    }

    /// Get the words as a vector
    pub fn words(&self) -> Vec<&'static str> {
        self.mnemonic.words().collect()
    }

    /// Number of words
    pub fn word_count(&self) -> usize {
        self.mnemonic.word_count()
    }

    /// Get the phrase as a single string (words separated by spaces)
    ///
    /// ## Security Warning
    ///
    /// Only use this for display to user. Never log or store.
    pub fn phrase(&self) -> Zeroizing<String> {
        Zeroizing::new(self.mnemonic.to_string())
    }

    /// Substrate mini-secret for this phrase and an optional password
    pub fn to_mini_secret(&self, password: &str) -> Result<Zeroizing<[u8; MINI_SECRET_SIZE]>> {
        kdf::mini_secret_from_mnemonic(&self.mnemonic, password)
    }

    /// Validate a phrase without creating a RecoveryPhrase
    ///
    /// Useful for UI validation before submission.
    pub fn validate(phrase: &str) -> Result<()> {
        Self::from_phrase(phrase)?;
        Ok(())
    }

    /// Check if a single word is in the BIP39 wordlist
    pub fn is_valid_word(word: &str) -> bool {
        let word_lower = word.to_lowercase();
        Language::English
            .word_list()
            .iter()
            .any(|w| *w == word_lower)
    }

    /// Get word suggestions for autocomplete
    ///
    /// Returns words from the BIP39 wordlist that start with the given prefix.
    pub fn suggest_words(prefix: &str) -> Vec<&'static str> {
        if prefix.is_empty() {
            return vec![];
        }

        let prefix_lower = prefix.to_lowercase();
        Language::English
            .word_list()
            .iter()
            .filter(|word| word.starts_with(&prefix_lower))
            .take(MAX_SUGGESTIONS)
            .copied()
            .collect()
    }
}

// Prevent accidental logging
impl std::fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecoveryPhrase([REDACTED])")
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_recovery_phrase() {
        for count in SUPPORTED_WORD_COUNTS {
            let phrase = RecoveryPhrase::generate(count).unwrap();
            assert_eq!(phrase.words().len(), count);
            assert!(RecoveryPhrase::validate(&phrase.phrase()).is_ok());
        }
    }

    #[test]
    fn test_generate_rejects_odd_counts() {
        assert!(RecoveryPhrase::generate(13).is_err());
        assert!(RecoveryPhrase::generate(0).is_err());
    }

    #[test]
    fn test_parse_valid_phrase() {
        // This is a valid BIP39 phrase (DO NOT USE FOR REAL!)
        let test_phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";

        let phrase = RecoveryPhrase::from_phrase(test_phrase).unwrap();
        assert_eq!(phrase.word_count(), 24);

        let short = RecoveryPhrase::from_phrase(ABANDON).unwrap();
        assert_eq!(short.word_count(), 12);
    }

    #[test]
    fn test_parse_invalid_word() {
        let invalid_phrase = "invalid word here abandon abandon abandon abandon abandon abandon abandon abandon about";

        let result = RecoveryPhrase::from_phrase(invalid_phrase);
        assert!(matches!(result, Err(Error::InvalidMnemonic(_))));
    }

    #[test]
    fn test_parse_wrong_word_count() {
        let short_phrase = "abandon abandon abandon";
        let result = RecoveryPhrase::from_phrase(short_phrase);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_words() {
        let words: Vec<&str> = ABANDON.split(' ').collect();
        let phrase = RecoveryPhrase::from_words(&words).unwrap();
        assert_eq!(phrase.phrase().as_str(), ABANDON);
    }

    #[test]
    fn test_mini_secret_matches_kdf() {
        let phrase = RecoveryPhrase::from_phrase(ABANDON).unwrap();
        let seed = phrase.to_mini_secret("").unwrap();
        assert_eq!(
            hex::encode(*seed),
            "4ed8d4b17698ddeaa1f1559f152f87b5d472f725ca86d341bd0276f1b61197e2"
        );
        assert_ne!(*seed, *phrase.to_mini_secret("pass").unwrap());
    }

    #[test]
    fn test_is_valid_word() {
        assert!(RecoveryPhrase::is_valid_word("abandon"));
        assert!(RecoveryPhrase::is_valid_word("Zoo"));
        assert!(!RecoveryPhrase::is_valid_word("notaword"));
    }

    #[test]
    fn test_suggest_words() {
        let suggestions = RecoveryPhrase::suggest_words("ab");
        assert!(suggestions.contains(&"abandon"));
        assert!(suggestions.contains(&"ability"));
        assert!(suggestions.contains(&"able"));
        assert!(suggestions.len() <= MAX_SUGGESTIONS);
        assert!(RecoveryPhrase::suggest_words("").is_empty());
    }

    #[test]
    fn test_debug_redacts() {
        let phrase = RecoveryPhrase::from_phrase(ABANDON).unwrap();
        let debug = format!("{:?}", phrase);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("abandon"));
    }
}
