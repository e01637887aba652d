use thiserror::Error;

use crate::lock::PrimitiveKind;
use crate::tx::MissingUnlock;

/// Key material errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid key encoding: expected {expected} bytes, got {got}")]
    InvalidKeyEncoding { expected: usize, got: usize },
    #[error("public key is not a valid curve point")]
    InvalidPublicKey,
    #[error("invalid signature encoding: expected {expected} bytes, got {got}")]
    InvalidSignatureEncoding { expected: usize, got: usize },
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),
}

/// Spend condition construction and validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    #[error("spend condition has no primitives")]
    EmptyCondition,
    #[error("invalid threshold: {m} of {n}")]
    InvalidThreshold { m: u64, n: usize },
    #[error("duplicate {0} primitive")]
    DuplicatePrimitiveKind(PrimitiveKind),
    #[error("hash lock commits to no digests")]
    EmptyHashLock,
    #[error("unknown primitive uses reserved tag {0}")]
    ReservedTag(u8),
}

/// Canonical encoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),
    #[error("transaction id mismatch: declared {declared}, computed {computed}")]
    IdMismatch { declared: String, computed: String },
}

/// Digest parsing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    #[error("invalid base58: {0}")]
    InvalidBase58(String),
    #[error("invalid digest length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Errors raised while sealing or decoding a signed transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("{} input(s) lack signatures", .0.len())]
    IncompleteSignatures(Vec<MissingUnlock>),
    #[error("{} input(s) lack hash-lock preimages", .0.len())]
    MissingPreimages(Vec<MissingUnlock>),
    #[error("condition on input {index} is malformed: {source}")]
    MalformedCondition {
        index: usize,
        #[source]
        source: ConditionError,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<bincode::error::EncodeError> for CodecError {
    fn from(e: bincode::error::EncodeError) -> Self {
        CodecError::Encode(e.to_string())
    }
}

impl From<bincode::error::DecodeError> for CodecError {
    fn from(e: bincode::error::DecodeError) -> Self {
        CodecError::Decode(e.to_string())
    }
}
