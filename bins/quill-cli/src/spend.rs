//! Offline spend composition for `quill spend`.
//!
//! Notes come from a JSON file: either a bare array of notes or a balance
//! snapshot (`{"notes": [...], "height": ..., "block_id": ...}`).

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::info;

use quill_core::tx::SignedTransaction;
use quill_core::types::{Amount, Balance, BlockHeight, Digest, Note};
use quill_wallet::{NoteSelector, SimpleSpend, Wallet};

#[derive(Deserialize)]
#[serde(untagged)]
enum NotesFile {
    Balance(Balance),
    Notes(Vec<Note>),
}

/// Load notes from `path`. A balance snapshot also yields its height.
pub fn load_notes(path: &Path) -> Result<(Vec<Note>, Option<BlockHeight>)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read notes file {}", path.display()))?;
    let parsed: NotesFile = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a note list or balance", path.display()))?;
    Ok(match parsed {
        NotesFile::Balance(balance) => (balance.notes, Some(balance.height)),
        NotesFile::Notes(notes) => (notes, None),
    })
}

#[derive(Debug, Clone)]
pub struct SpendOptions {
    pub recipient: Digest,
    pub gift: Amount,
    pub fee: Option<Amount>,
    /// Change address; the wallet's own address when unset.
    pub refund: Option<Digest>,
    pub change: bool,
    pub lock_data: bool,
    pub height: BlockHeight,
    /// Let the selector pick notes instead of spending all of them.
    pub select: bool,
}

/// Compose, sign, and seal a spend of `notes` with `wallet`'s keys.
pub fn compose(wallet: &Wallet, notes: Vec<Note>, opts: &SpendOptions) -> Result<SignedTransaction> {
    let conditions = wallet.spend_conditions()?;
    let inputs = if opts.select {
        NoteSelector::select(
            &notes,
            &conditions,
            opts.gift,
            opts.fee,
            wallet.settings(),
            opts.height,
        )?
        .selected
    } else {
        notes
            .into_iter()
            .map(|note| match conditions.get(&note.lock_root) {
                Some(condition) => Ok((note, condition.clone())),
                None => bail!(
                    "note {} is locked to {}, which no wallet key controls",
                    note.name,
                    note.lock_root
                ),
            })
            .collect::<Result<Vec<_>>>()?
    };

    let mut spend = SimpleSpend::new(
        inputs,
        opts.recipient,
        opts.gift,
        opts.refund.unwrap_or_else(|| wallet.address()),
        opts.height,
    );
    spend.fee_override = opts.fee;
    spend.include_change = opts.change;
    spend.include_lock_data = opts.lock_data;

    let tx = wallet.build_spend(spend)?;
    info!(id = %tx.id(), fee = tx.fee(), inputs = tx.inputs().len(), "spend ready");
    Ok(tx)
}
