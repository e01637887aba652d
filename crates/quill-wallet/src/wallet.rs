//! High-level wallet: select notes, compose, sign with owned keys, submit.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use quill_core::lock::SpendCondition;
use quill_core::settings::TxEngineSettings;
use quill_core::traits::{Acknowledgment, BalanceQuery, LedgerClient};
use quill_core::tx::SignedTransaction;
use quill_core::types::{Amount, Balance, BlockHeight, Digest, Name, Note};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::builder::{BuilderState, SimpleSpend, TxBuilder};
use crate::error::{BuildError, WalletError};
use crate::keys::Keyring;
use crate::mnemonic::generate_mnemonic;
use crate::selection::NoteSelector;

/// A payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    /// Public key hash of the recipient.
    pub recipient: Digest,
    pub gift: Amount,
    #[serde(default)]
    pub fee_override: Option<Amount>,
    #[serde(default)]
    pub include_lock_data: bool,
}

impl SendRequest {
    pub fn new(recipient: Digest, gift: Amount) -> Self {
        Self {
            recipient,
            gift,
            fee_override: None,
            include_lock_data: false,
        }
    }
}

/// Deterministic wallet bound to one settings bundle.
///
/// Change always returns to the master key's address.
pub struct Wallet {
    keyring: Keyring,
    settings: TxEngineSettings,
}

impl Wallet {
    pub fn new(keyring: Keyring, settings: TxEngineSettings) -> Self {
        Self { keyring, settings }
    }

    /// Create a wallet from a fresh 24-word phrase. The phrase is returned
    /// so the caller can back it up.
    pub fn create(settings: TxEngineSettings) -> Result<(Self, String), WalletError> {
        let phrase = generate_mnemonic();
        let wallet = Self::from_mnemonic(&phrase, "", settings)?;
        Ok((wallet, phrase))
    }

    /// Restore a wallet from its mnemonic and passphrase.
    pub fn from_mnemonic(
        phrase: &str,
        passphrase: &str,
        settings: TxEngineSettings,
    ) -> Result<Self, WalletError> {
        let keyring = Keyring::from_mnemonic(phrase, passphrase)?;
        Ok(Self::new(keyring, settings))
    }

    /// Primary receive address (master key hash).
    pub fn address(&self) -> Digest {
        self.keyring.address()
    }

    /// Derive a fresh receive address.
    pub fn next_address(&mut self) -> Digest {
        self.keyring.next_key().pkh()
    }

    pub fn settings(&self) -> &TxEngineSettings {
        &self.settings
    }

    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    pub fn keyring_mut(&mut self) -> &mut Keyring {
        &mut self.keyring
    }

    /// Conditions this wallet can satisfy, keyed by lock root: a plain
    /// single-key lock and a coinbase lock for every known key.
    pub fn spend_conditions(&self) -> Result<HashMap<Digest, SpendCondition>, WalletError> {
        let mut conditions = HashMap::new();
        for pkh in self.keyring.known_hashes() {
            for condition in [SpendCondition::single_pkh(*pkh), SpendCondition::coinbase(*pkh)] {
                let root = condition
                    .lock_root()
                    .map_err(|e| WalletError::Build(e.into()))?;
                conditions.insert(root, condition);
            }
        }
        Ok(conditions)
    }

    /// Sum of the notes in `balance` this wallet could spend now.
    pub fn spendable_total(&self, balance: &Balance) -> Result<Amount, WalletError> {
        let conditions = self.spend_conditions()?;
        let total = balance
            .notes
            .iter()
            .filter(|n| conditions.contains_key(&n.lock_root))
            .filter(|n| n.version == self.settings.version)
            .filter(|n| n.is_mature(balance.height, self.settings.coinbase_maturity))
            .try_fold(0u64, |acc, n| acc.checked_add(n.assets))
            .ok_or(WalletError::Build(BuildError::ValueOverflow))?;
        Ok(total)
    }

    /// Build and sign a transaction paying `request` from `balance`.
    pub fn spend(
        &self,
        balance: &Balance,
        request: &SendRequest,
    ) -> Result<SignedTransaction, WalletError> {
        let conditions = self.spend_conditions()?;
        let selection = NoteSelector::select(
            &balance.notes,
            &conditions,
            request.gift,
            request.fee_override,
            &self.settings,
            balance.height,
        )
        .map_err(|e| match e {
            BuildError::NoInputs => WalletError::NoSpendableNotes,
            other => other.into(),
        })?;

        let mut spend = SimpleSpend::new(
            selection.selected,
            request.recipient,
            request.gift,
            self.address(),
            balance.height,
        );
        spend.fee_override = request.fee_override;
        spend.include_lock_data = request.include_lock_data;
        self.build_spend(spend)
    }

    /// Compose `spend`, sign it with every key this wallet holds for its
    /// inputs, and seal it.
    pub fn build_spend(&self, spend: SimpleSpend) -> Result<SignedTransaction, WalletError> {
        let mut builder = TxBuilder::new(self.settings);
        builder.simple_spend(spend)?;

        let signers: BTreeSet<Digest> = builder
            .unsigned()
            .map(|tx| {
                tx.inputs
                    .iter()
                    .flat_map(|i| i.condition.signer_hashes())
                    .collect()
            })
            .unwrap_or_default();
        if signers.is_empty() {
            // No input lists a signer; a master signature moves the builder
            // to `Signed` so `build` reports the unlock that is still missing.
            builder.sign(self.keyring.master().private_key())?;
        }
        for pkh in &signers {
            match self.keyring.key_for(pkh) {
                Some(key) => {
                    builder.sign(key)?;
                }
                None => warn!(%pkh, "no key for listed signer"),
            }
        }
        if builder.state() != BuilderState::Signed {
            if let Some(&missing) = signers.first() {
                return Err(WalletError::KeyNotFound(missing));
            }
        }

        Ok(builder.build()?)
    }

    /// Every note the ledger holds under a lock this wallet can satisfy,
    /// queried by first name per lock root. The snapshot takes the lowest
    /// height any query reported.
    pub async fn fetch_balance<C: LedgerClient>(&self, client: &C) -> Result<Balance, WalletError> {
        let mut roots: Vec<Digest> = self.spend_conditions()?.into_keys().collect();
        roots.sort();

        let mut notes: BTreeMap<Name, Note> = BTreeMap::new();
        let mut snapshot: Option<(BlockHeight, Digest)> = None;
        for root in roots {
            let query = BalanceQuery::FirstName(Name::first_for_lock(&root));
            let balance = client
                .get_balance(&query)
                .await
                .map_err(WalletError::ledger)?;
            if snapshot.is_none_or(|(height, _)| balance.height < height) {
                snapshot = Some((balance.height, balance.block_id));
            }
            for note in balance.notes {
                notes.entry(note.name).or_insert(note);
            }
        }

        let (height, block_id) = snapshot.unwrap_or((0, Digest::ZERO));
        debug!(notes = notes.len(), height, "fetched wallet balance");
        Ok(Balance {
            notes: notes.into_values().collect(),
            height,
            block_id,
        })
    }

    /// Fetch the balance, build a payment, and submit it.
    pub async fn send<C: LedgerClient>(
        &self,
        client: &C,
        request: &SendRequest,
    ) -> Result<Acknowledgment, WalletError> {
        let balance = self.fetch_balance(client).await?;
        let tx = self.spend(&balance, request)?;
        let ack = client
            .submit_transaction(&tx)
            .await
            .map_err(WalletError::ledger)?;
        info!(id = %ack.id, gift = request.gift, fee = tx.fee(), "submitted transaction");
        Ok(ack)
    }

    /// Whether the ledger has accepted the transaction with `id`.
    pub async fn is_accepted<C: LedgerClient>(
        &self,
        client: &C,
        id: &Digest,
    ) -> Result<bool, WalletError> {
        client
            .transaction_accepted(id)
            .await
            .map_err(WalletError::ledger)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("version", &self.settings.version)
            .field("keys", &self.keyring.next_index())
            .finish()
    }
}
