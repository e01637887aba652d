//! # quill-wallet
//!
//! Deterministic key derivation from BIP-39 mnemonics, note selection, the
//! staged transaction builder, and a wallet that ties them to a ledger.
//!
//! # Modules
//!
//! - [`error`]: `BuildError` and `WalletError`
//! - [`mnemonic`]: BIP-39 phrase generation and parsing
//! - [`keys`]: SLIP-10 Ed25519 derivation and the keyring
//! - [`selection`]: largest-first note selection
//! - [`builder`]: the Draft → Composed → Signed → Built transaction builder
//! - [`wallet`]: high-level spend and send

pub mod builder;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod selection;
pub mod wallet;

pub use builder::{BuilderState, SimpleSpend, TxBuilder};
pub use error::{BuildError, WalletError};
pub use keys::{ExtendedKey, Keyring, derive_master_key};
pub use selection::{NoteSelection, NoteSelector};
pub use wallet::{SendRequest, Wallet};
