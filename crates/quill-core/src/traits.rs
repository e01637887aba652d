//! Trait interfaces between the engine and the outside world.
//!
//! - [`LedgerClient`]: balance lookups and transaction submission against a
//!   ledger node. The wallet drives it; tests and the CLI provide
//!   implementations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DigestError;
use crate::tx::SignedTransaction;
use crate::types::{Balance, Digest};

/// Which notes a balance request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BalanceQuery {
    /// Notes locked to a single-key condition for this public key hash.
    Address(Digest),
    /// Notes whose name starts with this first name.
    FirstName(Digest),
}

impl fmt::Display for BalanceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceQuery::Address(d) => write!(f, "address:{d}"),
            BalanceQuery::FirstName(d) => write!(f, "first-name:{d}"),
        }
    }
}

impl FromStr for BalanceQuery {
    type Err = DigestError;

    /// Accepts `address:<b58>`, `first-name:<b58>`, or a bare digest which
    /// is treated as an address.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("first-name:") {
            return Ok(BalanceQuery::FirstName(rest.parse()?));
        }
        let rest = s.strip_prefix("address:").unwrap_or(s);
        Ok(BalanceQuery::Address(rest.parse()?))
    }
}

/// Ledger response to a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgment {
    pub id: Digest,
    /// The ledger already had this transaction.
    pub already_known: bool,
}

/// Remote ledger the wallet reads balances from and submits to.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Snapshot of the notes matching `query` at the ledger's tip.
    async fn get_balance(&self, query: &BalanceQuery) -> Result<Balance, Self::Error>;

    /// Hand a signed transaction to the ledger.
    async fn submit_transaction(
        &self,
        tx: &SignedTransaction,
    ) -> Result<Acknowledgment, Self::Error>;

    /// Whether the ledger has accepted the transaction with this id.
    async fn transaction_accepted(&self, id: &Digest) -> Result<bool, Self::Error>;
}
