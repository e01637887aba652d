//! Transaction engine settings and fee estimation.
//!
//! Fees are priced per 8-byte word of the canonical transaction encoding
//! plus a fixed witness allowance per required signature. Every computed fee
//! is clamped to at least `min_fee`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    COINBASE_MATURITY, DEFAULT_FEE_PER_WORD, MIN_FEE, WORD_BYTES, WORDS_PER_SIGNATURE,
};
use crate::types::{Amount, ProtocolVersion};

/// Immutable parameters for one protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxEngineSettings {
    pub version: ProtocolVersion,
    pub fee_per_word: Amount,
    pub min_fee: Amount,
    pub coinbase_maturity: u64,
    pub words_per_signature: u64,
}

impl TxEngineSettings {
    /// Main network, protocol v1.
    pub const V1_DEFAULT: Self = Self {
        version: ProtocolVersion::V1,
        fee_per_word: DEFAULT_FEE_PER_WORD,
        min_fee: MIN_FEE,
        coinbase_maturity: COINBASE_MATURITY,
        words_per_signature: WORDS_PER_SIGNATURE,
    };

    /// Bythos deployment, protocol v1 with a cheaper word price.
    pub const V1_BYTHOS: Self = Self {
        version: ProtocolVersion::V1,
        fee_per_word: DEFAULT_FEE_PER_WORD >> 2,
        min_fee: MIN_FEE,
        coinbase_maturity: COINBASE_MATURITY,
        words_per_signature: WORDS_PER_SIGNATURE,
    };

    pub fn v1_default() -> Self {
        Self::V1_DEFAULT
    }

    pub fn v1_bythos() -> Self {
        Self::V1_BYTHOS
    }

    /// Billable words for a transaction of the given shape.
    pub fn words_for(&self, shape: &TxShape) -> u64 {
        let body = shape.encoded_len.div_ceil(WORD_BYTES) as u64;
        body.saturating_add(shape.signatures.saturating_mul(self.words_per_signature))
    }

    /// Fee for a transaction of the given shape, never below `min_fee`.
    pub fn fee_for(&self, shape: &TxShape) -> Amount {
        self.fee_per_word
            .saturating_mul(self.words_for(shape))
            .max(self.min_fee)
    }
}

impl Default for TxEngineSettings {
    fn default() -> Self {
        Self::V1_DEFAULT
    }
}

/// Size inputs to fee estimation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxShape {
    /// Length of the canonical unsigned encoding.
    pub encoded_len: usize,
    /// Signatures the transaction will carry once fully signed.
    pub signatures: u64,
}

/// Named settings presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkPreset {
    #[default]
    Mainnet,
    Bythos,
}

impl NetworkPreset {
    pub fn settings(self) -> TxEngineSettings {
        match self {
            NetworkPreset::Mainnet => TxEngineSettings::V1_DEFAULT,
            NetworkPreset::Bythos => TxEngineSettings::V1_BYTHOS,
        }
    }
}

impl fmt::Display for NetworkPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkPreset::Mainnet => f.write_str("mainnet"),
            NetworkPreset::Bythos => f.write_str("bythos"),
        }
    }
}

impl FromStr for NetworkPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "v1" => Ok(NetworkPreset::Mainnet),
            "bythos" => Ok(NetworkPreset::Bythos),
            other => Err(format!("unknown network preset: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_share_version_and_floor() {
        let a = TxEngineSettings::v1_default();
        let b = TxEngineSettings::v1_bythos();
        assert_eq!(a.version, ProtocolVersion::V1);
        assert_eq!(b.version, ProtocolVersion::V1);
        assert_eq!(a.min_fee, 256);
        assert_eq!(a.fee_per_word, 1 << 15);
        assert!(b.fee_per_word < a.fee_per_word);
    }

    #[test]
    fn words_round_up() {
        let s = TxEngineSettings::V1_DEFAULT;
        let shape = TxShape {
            encoded_len: 9,
            signatures: 0,
        };
        assert_eq!(s.words_for(&shape), 2);
        let shape = TxShape {
            encoded_len: 16,
            signatures: 1,
        };
        assert_eq!(s.words_for(&shape), 2 + 12);
    }

    #[test]
    fn fee_clamped_to_minimum() {
        let s = TxEngineSettings {
            fee_per_word: 1,
            ..TxEngineSettings::V1_DEFAULT
        };
        assert_eq!(s.fee_for(&TxShape::default()), 256);
        let big = TxShape {
            encoded_len: 8 * 1000,
            signatures: 0,
        };
        assert_eq!(s.fee_for(&big), 1000);
    }

    #[test]
    fn fee_grows_with_signatures() {
        let s = TxEngineSettings::V1_DEFAULT;
        let one = TxShape {
            encoded_len: 200,
            signatures: 1,
        };
        let two = TxShape {
            signatures: 2,
            ..one
        };
        assert_eq!(s.fee_for(&two) - s.fee_for(&one), 12 * s.fee_per_word);
    }

    #[test]
    fn fee_saturates_instead_of_overflowing() {
        let s = TxEngineSettings {
            fee_per_word: u64::MAX,
            ..TxEngineSettings::V1_DEFAULT
        };
        let shape = TxShape {
            encoded_len: 64,
            signatures: 1,
        };
        assert_eq!(s.fee_for(&shape), u64::MAX);
    }

    proptest::proptest! {
        #[test]
        fn fee_never_below_floor(len in 0usize..100_000, sigs in 0u64..64) {
            let s = TxEngineSettings::V1_DEFAULT;
            let fee = s.fee_for(&TxShape { encoded_len: len, signatures: sigs });
            proptest::prop_assert!(fee >= s.min_fee);
        }

        #[test]
        fn fee_monotonic_in_size(len in 0usize..100_000, extra in 1usize..4096, sigs in 0u64..8) {
            let s = TxEngineSettings::V1_BYTHOS;
            let small = s.fee_for(&TxShape { encoded_len: len, signatures: sigs });
            let large = s.fee_for(&TxShape { encoded_len: len + extra, signatures: sigs });
            proptest::prop_assert!(large >= small);
        }
    }

    #[test]
    fn preset_parsing() {
        assert_eq!("mainnet".parse::<NetworkPreset>(), Ok(NetworkPreset::Mainnet));
        assert_eq!("Bythos".parse::<NetworkPreset>(), Ok(NetworkPreset::Bythos));
        assert!("testnet".parse::<NetworkPreset>().is_err());
        assert_eq!(NetworkPreset::Bythos.settings(), TxEngineSettings::V1_BYTHOS);
        assert_eq!(NetworkPreset::default().to_string(), "mainnet");
    }
}
