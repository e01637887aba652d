//! Shared fixtures for the integration tests.

use std::collections::HashSet;

use quill_core::lock::SpendCondition;
use quill_core::tx::SignedTransaction;
use quill_core::traits::{Acknowledgment, BalanceQuery, LedgerClient};
use quill_core::types::{Amount, Balance, BlockHeight, Digest, Name, Note, ProtocolVersion, Source};
use quill_core::crypto::PrivateKey;
use tokio::sync::Mutex;

pub const COIN: Amount = 100_000_000;

/// The BIP-39 all-zero entropy phrase.
pub const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Deterministic signing key from a seed byte.
pub fn key(seed: u8) -> PrivateKey {
    PrivateKey::from_seed(&[seed; 32])
}

/// Simple pubkey hash from a seed byte.
pub fn pkh(seed: u8) -> Digest {
    Digest([seed; 32])
}

/// A V1 note locked to `condition`. `tag` makes the name and source unique.
pub fn make_note(condition: &SpendCondition, assets: Amount, origin_height: BlockHeight, tag: u64) -> Note {
    let lock_root = condition.lock_root().unwrap();
    Note {
        name: Name::new(Name::first_for_lock(&lock_root), Digest::hash(&tag.to_le_bytes())),
        lock_root,
        assets,
        origin_height,
        source: Source {
            hash: Digest::hash(&tag.to_be_bytes()),
            is_coinbase: false,
        },
        version: ProtocolVersion::V1,
    }
}

/// A coinbase note with the matching reward lock for `owner`.
pub fn make_coinbase_note(owner: Digest, assets: Amount, origin_height: BlockHeight, tag: u64) -> (Note, SpendCondition) {
    let condition = SpendCondition::coinbase(owner);
    let mut note = make_note(&condition, assets, origin_height, tag);
    note.source.is_coinbase = true;
    (note, condition)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger unavailable")]
    Unavailable,
    #[error("transaction rejected: {0}")]
    Rejected(String),
}

/// In-memory ledger: serves a fixed note set and records submissions.
///
/// Submitted transactions are accepted immediately. Spent notes are removed
/// and outputs are not materialized.
#[derive(Default)]
pub struct MemoryLedger {
    notes: Mutex<Vec<Note>>,
    height: BlockHeight,
    submitted: Mutex<Vec<SignedTransaction>>,
    accepted: Mutex<HashSet<Digest>>,
    offline: bool,
}

impl MemoryLedger {
    pub fn new(notes: Vec<Note>, height: BlockHeight) -> Self {
        Self {
            notes: Mutex::new(notes),
            height,
            ..Self::default()
        }
    }

    /// A ledger whose every call fails with [`LedgerError::Unavailable`].
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub async fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.lock().await.clone()
    }

    pub async fn note_count(&self) -> usize {
        self.notes.lock().await.len()
    }

    fn check_online(&self) -> Result<(), LedgerError> {
        if self.offline {
            return Err(LedgerError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LedgerClient for MemoryLedger {
    type Error = LedgerError;

    async fn get_balance(&self, query: &BalanceQuery) -> Result<Balance, LedgerError> {
        self.check_online()?;
        let notes = self.notes.lock().await;
        let selected = match query {
            BalanceQuery::Address(pkh) => {
                let root = SpendCondition::single_pkh(*pkh)
                    .lock_root()
                    .map_err(|e| LedgerError::Rejected(e.to_string()))?;
                notes.iter().filter(|n| n.lock_root == root).cloned().collect()
            }
            BalanceQuery::FirstName(first) => {
                notes.iter().filter(|n| n.name.first == *first).cloned().collect()
            }
        };
        Ok(Balance {
            notes: selected,
            height: self.height,
            block_id: Digest::hash(&self.height.to_le_bytes()),
        })
    }

    async fn submit_transaction(&self, tx: &SignedTransaction) -> Result<Acknowledgment, LedgerError> {
        self.check_online()?;
        let id = tx.id();
        let mut accepted = self.accepted.lock().await;
        if accepted.contains(&id) {
            return Ok(Acknowledgment { id, already_known: true });
        }

        let mut notes = self.notes.lock().await;
        let spent: HashSet<Name> = tx.inputs().iter().map(|i| i.name).collect();
        if spent.iter().any(|name| !notes.iter().any(|n| n.name == *name)) {
            return Err(LedgerError::Rejected("input not found".into()));
        }
        notes.retain(|n| !spent.contains(&n.name));

        accepted.insert(id);
        self.submitted.lock().await.push(tx.clone());
        Ok(Acknowledgment { id, already_known: false })
    }

    async fn transaction_accepted(&self, id: &Digest) -> Result<bool, LedgerError> {
        self.check_online()?;
        Ok(self.accepted.lock().await.contains(id))
    }
}
