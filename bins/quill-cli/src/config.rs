//! CLI configuration loaded from environment variables.

use anyhow::{Context, Result, anyhow};
use quill_core::settings::NetworkPreset;
use zeroize::Zeroizing;

pub const MNEMONIC_VAR: &str = "QUILL_MNEMONIC";
pub const PASSPHRASE_VAR: &str = "QUILL_PASSPHRASE";
pub const NETWORK_VAR: &str = "QUILL_NETWORK";

pub struct Config {
    /// Wallet mnemonic; only commands that sign need it.
    pub mnemonic: Option<Zeroizing<String>>,
    /// BIP-39 passphrase (empty when unset).
    pub passphrase: Zeroizing<String>,
    /// Fee and protocol preset.
    pub network: NetworkPreset,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mnemonic = lookup(MNEMONIC_VAR)
            .filter(|m| !m.trim().is_empty())
            .map(Zeroizing::new);
        let passphrase = Zeroizing::new(lookup(PASSPHRASE_VAR).unwrap_or_default());
        let network = match lookup(NETWORK_VAR) {
            Some(name) => name
                .parse()
                .map_err(|e: String| anyhow!(e))
                .with_context(|| format!("{NETWORK_VAR} is invalid"))?,
            None => NetworkPreset::default(),
        };
        Ok(Config {
            mnemonic,
            passphrase,
            network,
        })
    }

    /// The configured mnemonic, or an error naming the variable to set.
    pub fn require_mnemonic(&self) -> Result<&str> {
        self.mnemonic
            .as_ref()
            .map(|m| m.as_str())
            .with_context(|| format!("{MNEMONIC_VAR} is required for this command"))
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}
