//! Note selection.
//!
//! Filters a balance down to notes the wallet can spend right now (known
//! condition, matching protocol version, mature, inside any timelock window,
//! no unspendable primitives), then greedily takes the largest notes first
//! until the gift plus the estimated fee is covered. Taking large notes
//! first keeps input counts, and therefore fees, low.

use std::collections::HashMap;

use quill_core::lock::{SpendCondition, TimelockStatus};
use quill_core::settings::TxEngineSettings;
use quill_core::tx::{Input, Output};
use quill_core::types::{Amount, BlockHeight, Digest, Note};
use tracing::debug;

use crate::builder::estimate_fee;
use crate::error::BuildError;

/// Notes chosen to fund a spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSelection {
    /// Notes paired with their conditions, largest first.
    pub selected: Vec<(Note, SpendCondition)>,
    /// Sum of selected note assets.
    pub total: Amount,
    /// Fee assumed during selection, including a change output.
    pub fee: Amount,
    /// Notes passed over as not currently spendable.
    pub skipped: usize,
}

/// Largest-first note selector.
pub struct NoteSelector;

impl NoteSelector {
    /// Select notes covering `gift` plus fee.
    ///
    /// `conditions` maps lock roots to the full conditions this wallet can
    /// satisfy. With `fee_override` set, that fee is used instead of an
    /// estimate.
    pub fn select(
        notes: &[Note],
        conditions: &HashMap<Digest, SpendCondition>,
        gift: Amount,
        fee_override: Option<Amount>,
        settings: &TxEngineSettings,
        height: BlockHeight,
    ) -> Result<NoteSelection, BuildError> {
        if gift == 0 {
            return Err(BuildError::ZeroGift);
        }

        let mut candidates: Vec<(&Note, &SpendCondition)> = notes
            .iter()
            .filter_map(|n| {
                let condition = conditions.get(&n.lock_root)?;
                is_spendable(n, condition, settings, height).then_some((n, condition))
            })
            .collect();
        let skipped = notes.len() - candidates.len();
        if candidates.is_empty() {
            return Err(BuildError::NoInputs);
        }

        // Largest first; name breaks ties so selection is deterministic.
        candidates.sort_by(|(a, _), (b, _)| b.assets.cmp(&a.assets).then(a.name.cmp(&b.name)));

        // Output amounts do not affect the fee, so placeholder outputs work.
        let placeholder = SpendCondition::single_pkh(Digest::ZERO);
        let outputs = [
            Output::new(&placeholder, 0, false)?,
            Output::new(&placeholder, 0, false)?,
        ];

        let mut selected = Vec::new();
        let mut inputs = Vec::new();
        let mut total: Amount = 0;
        let mut fee = 0;
        for (note, condition) in candidates {
            selected.push((note.clone(), condition.clone()));
            inputs.push(Input {
                name: note.name,
                assets: note.assets,
                condition: condition.clone(),
            });
            total = total.checked_add(note.assets).ok_or(BuildError::ValueOverflow)?;
            fee = match fee_override {
                Some(fee) => fee,
                None => estimate_fee(settings, &inputs, &outputs)?,
            };
            let need = gift.checked_add(fee).ok_or(BuildError::ValueOverflow)?;
            if total >= need {
                debug!(
                    selected = selected.len(),
                    skipped,
                    total,
                    fee,
                    "selected notes"
                );
                return Ok(NoteSelection {
                    selected,
                    total,
                    fee,
                    skipped,
                });
            }
        }

        Err(BuildError::InsufficientFunds {
            have: total,
            need: gift.saturating_add(fee),
        })
    }
}

fn is_spendable(
    note: &Note,
    condition: &SpendCondition,
    settings: &TxEngineSettings,
    height: BlockHeight,
) -> bool {
    note.version == settings.version
        && condition.check_well_formed().is_ok()
        && condition.unspendable_primitive().is_none()
        && note.is_mature(height, settings.coinbase_maturity)
        && condition
            .timelock()
            .is_none_or(|t| t.check(note.origin_height, height) == TimelockStatus::Satisfied)
}
