//! BIP-39 mnemonic generation and parsing.

use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::Zeroizing;

use quill_core::error::KeyError;

/// Bytes of entropy behind a 24-word phrase.
pub const ENTROPY_LEN: usize = 32;

/// Generate a fresh 24-word English phrase from the OS RNG.
pub fn generate_mnemonic() -> String {
    let mut entropy = Zeroizing::new([0u8; ENTROPY_LEN]);
    rand::rngs::OsRng.fill_bytes(entropy.as_mut_slice());
    entropy_to_mnemonic(&entropy)
}

/// Convert 32 bytes of entropy to a 24-word phrase.
pub fn entropy_to_mnemonic(entropy: &[u8; ENTROPY_LEN]) -> String {
    let m = Mnemonic::from_entropy_in(Language::English, entropy)
        .expect("32 bytes always produces valid mnemonic");
    m.to_string()
}

/// Parse an English phrase, checking words and checksum.
///
/// Normalizes whitespace and converts to lowercase before parsing. Any
/// standard word count (12 through 24) is accepted.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, KeyError> {
    let normalized = Zeroizing::new(
        phrase
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    );
    Mnemonic::parse_in(Language::English, normalized.as_str())
        .map_err(|e| KeyError::InvalidMnemonic(e.to_string()))
}

/// BIP-39 seed for `phrase` and `passphrase`.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, KeyError> {
    let m = parse_mnemonic(phrase)?;
    Ok(Zeroizing::new(m.to_seed(passphrase)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn generated_phrase_is_24_words_and_parses() {
        let phrase = generate_mnemonic();
        assert_eq!(phrase.split_whitespace().count(), 24);
        assert!(parse_mnemonic(&phrase).is_ok());
    }

    #[test]
    fn generated_phrases_differ() {
        assert_ne!(generate_mnemonic(), generate_mnemonic());
    }

    #[test]
    fn entropy_roundtrip() {
        let entropy = [0x55u8; 32];
        let phrase = entropy_to_mnemonic(&entropy);
        let parsed = parse_mnemonic(&phrase).unwrap();
        assert_eq!(parsed.to_entropy(), entropy.to_vec());
    }

    /// Reference vector from the BIP-39 test suite.
    #[test]
    fn bip39_seed_vector() {
        let seed = mnemonic_to_seed(ABANDON_ABOUT, "TREZOR").unwrap();
        assert_eq!(
            hex::encode(seed.as_ref()),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );
    }

    #[test]
    fn passphrase_changes_seed() {
        let a = mnemonic_to_seed(ABANDON_ABOUT, "").unwrap();
        let b = mnemonic_to_seed(ABANDON_ABOUT, "extra").unwrap();
        assert_ne!(a.as_ref(), b.as_ref());
    }

    #[test]
    fn whitespace_and_case_normalized() {
        let messy = ABANDON_ABOUT.to_uppercase().split(' ').collect::<Vec<_>>().join(" \t ");
        let a = mnemonic_to_seed(&messy, "").unwrap();
        let b = mnemonic_to_seed(ABANDON_ABOUT, "").unwrap();
        assert_eq!(a.as_ref(), b.as_ref());
    }

    #[test]
    fn invalid_word_rejected() {
        let err = parse_mnemonic("abandon abandon abandon invalidword").unwrap_err();
        assert!(matches!(err, KeyError::InvalidMnemonic(_)));
        assert!(err.to_string().contains("invalid mnemonic"));
    }

    #[test]
    fn bad_checksum_rejected() {
        let mut phrase = vec!["abandon"; 23].join(" ");
        phrase.push_str(" zoo");
        assert!(parse_mnemonic(&phrase).is_err());
    }

    #[test]
    fn wrong_word_count_rejected() {
        assert!(parse_mnemonic("abandon abandon").is_err());
        assert!(parse_mnemonic("").is_err());
    }
}
