//! Builder and wallet error types.

use quill_core::error::{CodecError, ConditionError, KeyError, TransactionError};
use quill_core::lock::PrimitiveKind;
use quill_core::tx::MissingUnlock;
use quill_core::types::{Amount, BlockHeight, Digest, Name, ProtocolVersion};
use thiserror::Error;

use crate::builder::BuilderState;

/// Errors raised by [`TxBuilder`](crate::builder::TxBuilder).
///
/// A failed operation never advances the builder: it stays in the state it
/// was in before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("{operation} is not allowed in the {state} state")]
    WrongBuilderState {
        operation: &'static str,
        state: BuilderState,
    },

    #[error("no inputs")]
    NoInputs,

    #[error("gift must be non-zero")]
    ZeroGift,

    #[error("note {0} is spent twice")]
    DuplicateInput(Name),

    /// The supplied condition does not hash to the note's lock root.
    #[error("condition for note {name} hashes to {actual}, note is locked to {expected}")]
    LockMismatch {
        name: Name,
        expected: Digest,
        actual: Digest,
    },

    #[error("condition for note {name} is malformed: {source}")]
    MalformedCondition {
        name: Name,
        #[source]
        source: ConditionError,
    },

    #[error("note {name} is guarded by an unspendable {kind} primitive")]
    UnspendableCondition { name: Name, kind: PrimitiveKind },

    #[error("settings are for protocol {settings}, note is {note}")]
    SettingsVersionMismatch {
        settings: ProtocolVersion,
        note: ProtocolVersion,
    },

    #[error("note {name} cannot be spent until height {spendable_at} (now {height})")]
    PrematureSpend {
        name: Name,
        height: BlockHeight,
        spendable_at: BlockHeight,
    },

    #[error("note {name} timelock expired at height {last_height} (now {height})")]
    TimelockExpired {
        name: Name,
        height: BlockHeight,
        last_height: BlockHeight,
    },

    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: Amount, need: Amount },

    /// Inputs exceed gift plus fee and no change output was requested.
    #[error("{0} units would be left unspent without a change output")]
    UnspentResidual(Amount),

    #[error("amount overflow")]
    ValueOverflow,

    #[error("signature does not verify against the signing payload")]
    InvalidSignature,

    #[error("preimage of {0} bytes exceeds the size limit")]
    PreimageTooLarge(usize),

    #[error("{} unlock(s) still need signatures", .0.len())]
    IncompleteSignatures(Vec<MissingUnlock>),

    #[error("{} unlock(s) still need preimages", .0.len())]
    MissingPreimages(Vec<MissingUnlock>),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transaction(TransactionError),
}

impl From<TransactionError> for BuildError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::IncompleteSignatures(missing) => {
                BuildError::IncompleteSignatures(missing)
            }
            TransactionError::MissingPreimages(missing) => BuildError::MissingPreimages(missing),
            TransactionError::Codec(c) => BuildError::Codec(c),
            other => BuildError::Transaction(other),
        }
    }
}

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Build(#[from] BuildError),

    /// No note in the balance can be spent by this wallet right now.
    #[error("no spendable notes")]
    NoSpendableNotes,

    #[error("no key for public key hash {0}")]
    KeyNotFound(Digest),

    #[error("ledger: {0}")]
    Ledger(String),
}

impl WalletError {
    pub fn ledger(e: impl std::error::Error) -> Self {
        WalletError::Ledger(e.to_string())
    }
}
