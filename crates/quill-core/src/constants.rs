//! Protocol constants shared by the engine and the wallet.

/// Length in bytes of every digest (lock roots, name halves, key hashes).
pub const DIGEST_LEN: usize = 32;

/// Length in bytes of a serialized Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length in bytes of a serialized Ed25519 private key seed.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Length in bytes of an Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// Bytes per fee-accounting word.
pub const WORD_BYTES: usize = 8;

/// Blocks a coinbase note must wait before it can be spent.
pub const COINBASE_MATURITY: u64 = 100;

/// Default fee charged per transaction word.
pub const DEFAULT_FEE_PER_WORD: u64 = 1 << 15;

/// Floor applied to every computed fee.
pub const MIN_FEE: u64 = 256;

/// Witness words charged for each required Ed25519 signature.
pub const WORDS_PER_SIGNATURE: u64 = 12;

/// Upper bound on hash-lock preimage size accepted by the builder.
pub const MAX_PREIMAGE_LEN: usize = 1024;

/// Largest wire transaction `SignedTransaction::decode` will read. Also
/// caps every length prefix inside it.
pub const MAX_TX_BYTES: usize = 1 << 20;

/// Domain tag mixed into every signing payload.
pub const SIGNING_DOMAIN: &[u8] = b"quill/tx/v1";
