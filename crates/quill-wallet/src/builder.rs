//! Staged transaction builder.
//!
//! A [`TxBuilder`] moves through four states:
//!
//! 1. `Draft`: nothing composed yet
//! 2. `Composed`: [`TxBuilder::simple_spend`] produced an unsigned body
//! 3. `Signed`: at least one signature is attached
//! 4. `Built`: [`TxBuilder::build`] emitted a [`SignedTransaction`]
//!
//! Operations called in the wrong state fail with
//! [`BuildError::WrongBuilderState`]. A failing operation leaves the state
//! untouched, so a `build` that reports missing signatures can be retried
//! after more signers have signed.

use std::collections::BTreeSet;
use std::fmt;

use quill_core::constants::MAX_PREIMAGE_LEN;
use quill_core::crypto::{PrivateKey, PublicKey, Signature};
use quill_core::error::CodecError;
use quill_core::lock::{SpendCondition, TimelockStatus};
use quill_core::settings::TxEngineSettings;
use quill_core::tx::{
    Input, MissingUnlock, Output, SignatureEntry, SignedTransaction, UnsignedTransaction,
    missing_unlocks,
};
use quill_core::types::{Amount, BlockHeight, Digest, Note};
use tracing::{debug, info, warn};

use crate::error::BuildError;

/// Observable builder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderState {
    Draft,
    Composed,
    Signed,
    Built,
}

impl fmt::Display for BuilderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderState::Draft => f.write_str("draft"),
            BuilderState::Composed => f.write_str("composed"),
            BuilderState::Signed => f.write_str("signed"),
            BuilderState::Built => f.write_str("built"),
        }
    }
}

/// A payment of `gift` to a single recipient key hash.
///
/// Each input note is paired with the full condition its lock root commits
/// to. Outputs lock to single-key conditions: the recipient output comes
/// first and the change output, if any, goes to `refund` last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleSpend {
    pub inputs: Vec<(Note, SpendCondition)>,
    pub recipient: Digest,
    pub gift: Amount,
    /// Use this fee verbatim instead of estimating one.
    pub fee_override: Option<Amount>,
    pub refund: Digest,
    /// Return excess to `refund`. When false, inputs must match gift plus
    /// fee exactly.
    pub include_change: bool,
    /// Publish output conditions alongside their lock roots.
    pub include_lock_data: bool,
    /// Height the spend is evaluated at, for maturity and timelocks.
    pub height: BlockHeight,
}

impl SimpleSpend {
    /// Spend with change enabled, no lock data, and an estimated fee.
    pub fn new(
        inputs: Vec<(Note, SpendCondition)>,
        recipient: Digest,
        gift: Amount,
        refund: Digest,
        height: BlockHeight,
    ) -> Self {
        Self {
            inputs,
            recipient,
            gift,
            fee_override: None,
            refund,
            include_change: true,
            include_lock_data: false,
            height,
        }
    }
}

#[derive(Debug, Clone)]
struct Composition {
    tx: UnsignedTransaction,
    payload: Digest,
    /// In the order they were added.
    signatures: Vec<SignatureEntry>,
    preimages: Vec<Vec<u8>>,
}

#[derive(Debug, Clone)]
enum Stage {
    Draft,
    Composed(Composition),
    Signed(Composition),
    Built(SignedTransaction),
}

/// Builds, signs, and seals one transaction.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    settings: TxEngineSettings,
    stage: Stage,
}

impl TxBuilder {
    pub fn new(settings: TxEngineSettings) -> Self {
        Self {
            settings,
            stage: Stage::Draft,
        }
    }

    pub fn settings(&self) -> &TxEngineSettings {
        &self.settings
    }

    pub fn state(&self) -> BuilderState {
        match self.stage {
            Stage::Draft => BuilderState::Draft,
            Stage::Composed(_) => BuilderState::Composed,
            Stage::Signed(_) => BuilderState::Signed,
            Stage::Built(_) => BuilderState::Built,
        }
    }

    /// Compose an unsigned transaction paying `spend.gift` to
    /// `spend.recipient`. Draft → Composed.
    pub fn simple_spend(&mut self, spend: SimpleSpend) -> Result<&mut Self, BuildError> {
        if !matches!(self.stage, Stage::Draft) {
            return Err(self.wrong_state("simple_spend"));
        }
        let tx = self.compose(spend)?;
        let payload = tx.signing_payload()?;
        info!(
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            fee = tx.fee,
            %payload,
            "composed transaction"
        );
        self.stage = Stage::Composed(Composition {
            tx,
            payload,
            signatures: Vec::new(),
            preimages: Vec::new(),
        });
        Ok(self)
    }

    fn compose(&self, spend: SimpleSpend) -> Result<UnsignedTransaction, BuildError> {
        let SimpleSpend {
            inputs: notes,
            recipient,
            gift,
            fee_override,
            refund,
            include_change,
            include_lock_data,
            height,
        } = spend;

        if notes.is_empty() {
            return Err(BuildError::NoInputs);
        }
        if gift == 0 {
            return Err(BuildError::ZeroGift);
        }

        let mut seen = BTreeSet::new();
        let mut inputs = Vec::with_capacity(notes.len());
        for (note, condition) in notes {
            self.check_input(&note, &condition, height)?;
            if !seen.insert(note.name) {
                return Err(BuildError::DuplicateInput(note.name));
            }
            inputs.push(Input {
                name: note.name,
                assets: note.assets,
                condition,
            });
        }
        let have = inputs
            .iter()
            .try_fold(0u64, |acc, i| acc.checked_add(i.assets))
            .ok_or(BuildError::ValueOverflow)?;

        let recipient_lock = SpendCondition::single_pkh(recipient);
        let refund_lock = SpendCondition::single_pkh(refund);
        let gift_output = Output::new(&recipient_lock, gift, include_lock_data)?;
        let change_output = |assets| Output::new(&refund_lock, assets, include_lock_data);

        let (fee, change) = match fee_override {
            Some(fee) => {
                let need = gift.checked_add(fee).ok_or(BuildError::ValueOverflow)?;
                if have < need {
                    return Err(BuildError::InsufficientFunds { have, need });
                }
                let residual = have - need;
                if residual > 0 && !include_change {
                    return Err(BuildError::UnspentResidual(residual));
                }
                let mut outputs = vec![gift_output.clone()];
                if residual > 0 {
                    outputs.push(change_output(residual)?);
                }
                let estimate = estimate_fee(&self.settings, &inputs, &outputs)?;
                if fee < estimate {
                    warn!(fee, estimate, "fee override is below the estimated fee");
                }
                (fee, residual)
            }
            None => {
                let without = estimate_fee(&self.settings, &inputs, &[gift_output.clone()])?;
                let need = gift.checked_add(without).ok_or(BuildError::ValueOverflow)?;
                if have < need {
                    return Err(BuildError::InsufficientFunds { have, need });
                }
                let available = have - gift;
                if include_change {
                    let with = estimate_fee(
                        &self.settings,
                        &inputs,
                        &[gift_output.clone(), change_output(0)?],
                    )?;
                    match available.checked_sub(with) {
                        Some(change) if change > 0 => (with, change),
                        // Too little left to pay for a change output; the
                        // remainder goes to the fee.
                        _ => (available, 0),
                    }
                } else if available > without {
                    return Err(BuildError::UnspentResidual(available - without));
                } else {
                    (without, 0)
                }
            }
        };

        let mut outputs = vec![gift_output];
        if change > 0 {
            outputs.push(change_output(change)?);
        }
        let tx = UnsignedTransaction {
            version: self.settings.version,
            inputs,
            outputs,
            fee,
        };
        debug_assert!(tx.is_balanced());
        Ok(tx)
    }

    fn check_input(
        &self,
        note: &Note,
        condition: &SpendCondition,
        height: BlockHeight,
    ) -> Result<(), BuildError> {
        let name = note.name;
        if note.version != self.settings.version {
            return Err(BuildError::SettingsVersionMismatch {
                settings: self.settings.version,
                note: note.version,
            });
        }
        condition
            .check_well_formed()
            .map_err(|source| BuildError::MalformedCondition { name, source })?;
        let actual = condition.lock_root()?;
        if actual != note.lock_root {
            return Err(BuildError::LockMismatch {
                name,
                expected: note.lock_root,
                actual,
            });
        }
        if let Some(kind) = condition.unspendable_primitive() {
            return Err(BuildError::UnspendableCondition { name, kind });
        }
        if !note.is_mature(height, self.settings.coinbase_maturity) {
            return Err(BuildError::PrematureSpend {
                name,
                height,
                spendable_at: note.matures_at(self.settings.coinbase_maturity),
            });
        }
        if let Some(tim) = condition.timelock() {
            match tim.check(note.origin_height, height) {
                TimelockStatus::Satisfied => {}
                TimelockStatus::Premature { spendable_at } => {
                    return Err(BuildError::PrematureSpend {
                        name,
                        height,
                        spendable_at,
                    });
                }
                TimelockStatus::Expired { last_height } => {
                    return Err(BuildError::TimelockExpired {
                        name,
                        height,
                        last_height,
                    });
                }
            }
        }
        Ok(())
    }

    /// Sign the signing payload with `key`. Composed/Signed → Signed.
    ///
    /// Keys that no input lists are accepted; their signatures are inert and
    /// dropped when the transaction is built.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<&mut Self, BuildError> {
        let composition = self.composition_mut("sign")?;
        let entry = SignatureEntry {
            public_key: key.public_key(),
            signature: key.sign(composition.payload.as_bytes()),
        };
        let signer = entry.signer();
        if !lists_signer(&composition.tx, &signer) {
            debug!(%signer, "signing key unlocks no input");
        }
        composition.signatures.push(entry);
        self.promote();
        Ok(self)
    }

    /// Attach a signature produced elsewhere, e.g. by a hardware signer.
    /// Composed/Signed → Signed.
    pub fn attach_signature(
        &mut self,
        public_key: PublicKey,
        signature: Signature,
    ) -> Result<&mut Self, BuildError> {
        let composition = self.composition_mut("attach_signature")?;
        let entry = SignatureEntry {
            public_key,
            signature,
        };
        if !entry.verifies(&composition.payload) {
            return Err(BuildError::InvalidSignature);
        }
        composition.signatures.push(entry);
        self.promote();
        Ok(self)
    }

    /// Record a hash-lock preimage. Returns whether it opens any input's
    /// hash lock; unrelated preimages are ignored. Does not change state.
    pub fn add_preimage(&mut self, preimage: Vec<u8>) -> Result<bool, BuildError> {
        if preimage.len() > MAX_PREIMAGE_LEN {
            return Err(BuildError::PreimageTooLarge(preimage.len()));
        }
        let composition = self.composition_mut("add_preimage")?;
        let digest = Digest::hash(&preimage);
        let opens = composition.tx.inputs.iter().any(|i| {
            i.condition
                .hash_locks()
                .any(|h| h.digests().contains(&digest))
        });
        if !opens {
            debug!(%digest, "preimage opens no hash lock");
            return Ok(false);
        }
        if !composition.preimages.contains(&preimage) {
            composition.preimages.push(preimage);
        }
        Ok(true)
    }

    /// Unlock requirements not yet met by the attached witness data.
    pub fn missing_unlocks(&self) -> Result<Vec<MissingUnlock>, BuildError> {
        match &self.stage {
            Stage::Composed(c) | Stage::Signed(c) => {
                Ok(missing_unlocks(&c.tx, &c.signatures, &c.preimages)?)
            }
            _ => Err(self.wrong_state("missing_unlocks")),
        }
    }

    /// Seal the transaction. Signed → Built.
    ///
    /// Fails with [`BuildError::IncompleteSignatures`] or
    /// [`BuildError::MissingPreimages`] while any input is still locked, in
    /// which case the builder stays `Signed`.
    pub fn build(&mut self) -> Result<SignedTransaction, BuildError> {
        let Stage::Signed(composition) = &self.stage else {
            return Err(self.wrong_state("build"));
        };
        let signed = SignedTransaction::seal(
            composition.tx.clone(),
            composition.signatures.clone(),
            composition.preimages.clone(),
        )
        .inspect_err(|e| debug!(error = %e, "transaction not ready"))?;
        info!(id = %signed.id(), fee = signed.fee(), "built transaction");
        self.stage = Stage::Built(signed.clone());
        Ok(signed)
    }

    /// The composed body, once past `Draft`.
    pub fn unsigned(&self) -> Option<&UnsignedTransaction> {
        match &self.stage {
            Stage::Composed(c) | Stage::Signed(c) => Some(&c.tx),
            Stage::Built(signed) => Some(signed.unsigned()),
            Stage::Draft => None,
        }
    }

    pub fn signing_payload(&self) -> Option<Digest> {
        match &self.stage {
            Stage::Composed(c) | Stage::Signed(c) => Some(c.payload),
            _ => None,
        }
    }

    /// Attached signatures in the order they were added.
    pub fn signatures(&self) -> &[SignatureEntry] {
        match &self.stage {
            Stage::Composed(c) | Stage::Signed(c) => &c.signatures,
            Stage::Built(signed) => signed.signatures(),
            Stage::Draft => &[],
        }
    }

    pub fn built(&self) -> Option<&SignedTransaction> {
        match &self.stage {
            Stage::Built(signed) => Some(signed),
            _ => None,
        }
    }

    fn composition_mut(&mut self, operation: &'static str) -> Result<&mut Composition, BuildError> {
        let state = self.state();
        match &mut self.stage {
            Stage::Composed(c) | Stage::Signed(c) => Ok(c),
            _ => Err(BuildError::WrongBuilderState { operation, state }),
        }
    }

    fn promote(&mut self) {
        self.stage = match std::mem::replace(&mut self.stage, Stage::Draft) {
            Stage::Composed(c) => Stage::Signed(c),
            other => other,
        };
    }

    fn wrong_state(&self, operation: &'static str) -> BuildError {
        BuildError::WrongBuilderState {
            operation,
            state: self.state(),
        }
    }
}

fn lists_signer(tx: &UnsignedTransaction, signer: &Digest) -> bool {
    tx.inputs
        .iter()
        .any(|i| i.condition.pkhs().any(|p| p.hashes.contains(signer)))
}

/// Fee the engine would charge for a transaction with these inputs and
/// outputs. Amounts do not affect the result.
pub fn estimate_fee(
    settings: &TxEngineSettings,
    inputs: &[Input],
    outputs: &[Output],
) -> Result<Amount, CodecError> {
    let draft = UnsignedTransaction {
        version: settings.version,
        inputs: inputs.to_vec(),
        outputs: outputs.to_vec(),
        fee: 0,
    };
    Ok(settings.fee_for(&draft.shape()?))
}
