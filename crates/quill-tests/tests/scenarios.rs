//! Payment scenarios driven through the public builder API.
//!
//! Each test composes a spend from explicit notes, signs it, and checks the
//! resulting transaction or the error the builder surfaces.

use quill_core::lock::{Hax, LockPrimitive, LockTim, Pkh, SpendCondition, TimelockRange};
use quill_core::settings::TxEngineSettings;
use quill_core::tx::{MissingUnlock, SignedTransaction};
use quill_core::types::ProtocolVersion;
use quill_tests::helpers::*;
use quill_wallet::{BuildError, BuilderState, SimpleSpend, TxBuilder};

const HEIGHT: u64 = 1_000;

fn single_key_spend(seed: u8, values: &[u64], gift: u64) -> SimpleSpend {
    let owner = key(seed);
    let condition = SpendCondition::single_pkh(owner.pkh());
    let inputs = values
        .iter()
        .enumerate()
        .map(|(i, v)| (make_note(&condition, *v, 10, i as u64), condition.clone()))
        .collect();
    SimpleSpend::new(inputs, pkh(0xAA), gift, owner.pkh(), HEIGHT)
}

// --- Conservation and change ---

#[test]
fn fee_override_with_change() {
    let mut spend = single_key_spend(1, &[1_000_000], 600_000);
    spend.fee_override = Some(50_000);

    let mut builder = TxBuilder::new(TxEngineSettings::V1_DEFAULT);
    builder.simple_spend(spend).unwrap();
    let tx = builder.unsigned().unwrap();

    let amounts: Vec<u64> = tx.outputs.iter().map(|o| o.assets).collect();
    assert_eq!(amounts, vec![600_000, 350_000]);
    assert_eq!(tx.fee, 50_000);
    assert_eq!(
        tx.outputs[0].lock_root,
        SpendCondition::single_pkh(pkh(0xAA)).lock_root().unwrap()
    );
    assert_eq!(
        tx.outputs[1].lock_root,
        SpendCondition::single_pkh(key(1).pkh()).lock_root().unwrap()
    );
}

#[test]
fn insufficient_funds_leaves_draft() {
    let mut builder = TxBuilder::new(TxEngineSettings::V1_DEFAULT);
    let err = builder
        .simple_spend(single_key_spend(1, &[100], 600_000))
        .unwrap_err();
    assert!(matches!(err, BuildError::InsufficientFunds { have: 100, .. }));
    assert_eq!(builder.state(), BuilderState::Draft);

    // The same builder can still compose a valid spend.
    builder
        .simple_spend(single_key_spend(1, &[10 * COIN], COIN))
        .unwrap();
    assert_eq!(builder.state(), BuilderState::Composed);
}

#[test]
fn exact_spend_without_change() {
    let settings = TxEngineSettings::V1_DEFAULT;
    let mut probe = TxBuilder::new(settings);
    let mut spend = single_key_spend(1, &[5 * COIN], COIN);
    spend.include_change = false;
    // Learn the fee for this shape, then fund it exactly.
    let err = probe.simple_spend(spend.clone()).unwrap_err();
    let BuildError::UnspentResidual(residual) = err else {
        panic!("expected residual, got {err:?}");
    };
    let fee = 4 * COIN - residual;

    let mut exact = single_key_spend(1, &[COIN + fee], COIN);
    exact.include_change = false;
    let mut builder = TxBuilder::new(settings);
    builder.simple_spend(exact).unwrap();
    let tx = builder.unsigned().unwrap();
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(tx.fee, fee);
    assert!(tx.is_balanced());
}

#[test]
fn dust_change_is_absorbed_into_fee() {
    let settings = TxEngineSettings::V1_DEFAULT;
    let mut exact = single_key_spend(1, &[5 * COIN], COIN);
    exact.include_change = false;
    let BuildError::UnspentResidual(residual) =
        TxBuilder::new(settings).simple_spend(exact).unwrap_err()
    else {
        panic!("expected residual");
    };
    let fee_without_change = 4 * COIN - residual;

    // One unit above the no-change fee cannot pay for a change output.
    let spend = single_key_spend(1, &[COIN + fee_without_change + 1], COIN);
    let mut builder = TxBuilder::new(settings);
    builder.simple_spend(spend).unwrap();
    let tx = builder.unsigned().unwrap();
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(tx.fee, fee_without_change + 1);
}

// --- Signatures ---

#[test]
fn correct_key_builds_unrelated_key_does_not() {
    let mut good = TxBuilder::new(TxEngineSettings::V1_DEFAULT);
    good.simple_spend(single_key_spend(1, &[10 * COIN], COIN)).unwrap();
    good.sign(&key(1)).unwrap();
    let tx = good.build().unwrap();
    assert_eq!(tx.signatures().len(), 1);
    assert_eq!(good.state(), BuilderState::Built);

    let mut bad = TxBuilder::new(TxEngineSettings::V1_DEFAULT);
    bad.simple_spend(single_key_spend(1, &[10 * COIN], COIN)).unwrap();
    bad.sign(&key(2)).unwrap();
    let err = bad.build().unwrap_err();
    assert!(matches!(err, BuildError::IncompleteSignatures(ref missing) if missing.len() == 1));
    assert_eq!(bad.state(), BuilderState::Signed);

    // Adding the right key afterwards completes the transaction and the
    // unrelated signature is dropped.
    bad.sign(&key(1)).unwrap();
    let tx = bad.build().unwrap();
    assert_eq!(tx.signatures().len(), 1);
    assert_eq!(tx.signatures()[0].signer(), key(1).pkh());
}

#[test]
fn two_pkh_primitives_both_required() {
    let (a, b) = (key(1), key(2));
    let condition = SpendCondition::new(vec![
        LockPrimitive::Pkh(Pkh::single(a.pkh())),
        LockPrimitive::Pkh(Pkh::single(b.pkh())),
    ])
    .unwrap();
    let note = make_note(&condition, 10 * COIN, 10, 1);
    let spend = SimpleSpend::new(vec![(note, condition)], pkh(0xAA), COIN, a.pkh(), HEIGHT);

    let mut builder = TxBuilder::new(TxEngineSettings::V1_DEFAULT);
    builder.simple_spend(spend).unwrap();
    builder.sign(&a).unwrap();
    let missing = builder.missing_unlocks().unwrap();
    assert!(matches!(
        missing.as_slice(),
        [MissingUnlock::Pkh { needed: 1, .. }]
    ));
    assert!(builder.build().is_err());

    builder.sign(&b).unwrap();
    assert!(builder.missing_unlocks().unwrap().is_empty());
    assert_eq!(builder.build().unwrap().signatures().len(), 2);
}

#[test]
fn two_of_three_multisig() {
    let keys = [key(1), key(2), key(3)];
    let lock = Pkh::new(2, keys.iter().map(|k| k.pkh())).unwrap();
    let condition = SpendCondition::new(vec![LockPrimitive::Pkh(lock)]).unwrap();
    let note = make_note(&condition, 10 * COIN, 10, 1);
    let spend = SimpleSpend::new(vec![(note, condition)], pkh(0xAA), COIN, keys[0].pkh(), HEIGHT);

    let mut builder = TxBuilder::new(TxEngineSettings::V1_DEFAULT);
    builder.simple_spend(spend).unwrap();
    builder.sign(&keys[2]).unwrap();
    assert!(matches!(builder.build(), Err(BuildError::IncompleteSignatures(_))));
    builder.sign(&keys[0]).unwrap();
    let tx = builder.build().unwrap();
    assert_eq!(tx.signatures().len(), 2);
}

#[test]
fn external_signature_attached() {
    let owner = key(7);
    let mut builder = TxBuilder::new(TxEngineSettings::V1_DEFAULT);
    builder.simple_spend(single_key_spend(7, &[10 * COIN], COIN)).unwrap();
    let payload = builder.signing_payload().unwrap();

    let forged = key(8).sign(payload.as_bytes());
    assert_eq!(
        builder.attach_signature(owner.public_key(), forged).unwrap_err(),
        BuildError::InvalidSignature
    );

    let signature = owner.sign(payload.as_bytes());
    builder.attach_signature(owner.public_key(), signature).unwrap();
    assert!(builder.build().is_ok());
}

// --- Hash locks ---

#[test]
fn hash_lock_needs_preimage() {
    let owner = key(1);
    let condition = SpendCondition::new(vec![
        LockPrimitive::Pkh(Pkh::single(owner.pkh())),
        LockPrimitive::Hax(Hax::for_preimage(b"open sesame")),
    ])
    .unwrap();
    let note = make_note(&condition, 10 * COIN, 10, 1);
    let spend = SimpleSpend::new(vec![(note, condition)], pkh(0xAA), COIN, owner.pkh(), HEIGHT);

    let mut builder = TxBuilder::new(TxEngineSettings::V1_DEFAULT);
    builder.simple_spend(spend).unwrap();
    builder.sign(&owner).unwrap();
    assert!(matches!(builder.build(), Err(BuildError::MissingPreimages(_))));

    assert!(builder.add_preimage(b"open sesame".to_vec()).unwrap());
    let tx = builder.build().unwrap();
    assert_eq!(tx.preimages(), &[b"open sesame".to_vec()]);
}

// --- Policy checks ---

#[test]
fn young_coinbase_is_premature() {
    let owner = key(1);
    let (note, condition) = make_coinbase_note(owner.pkh(), 50 * COIN, HEIGHT - 10, 1);
    let spend = SimpleSpend::new(vec![(note, condition)], pkh(0xAA), COIN, owner.pkh(), HEIGHT);

    let mut builder = TxBuilder::new(TxEngineSettings::V1_DEFAULT);
    let err = builder.simple_spend(spend).unwrap_err();
    assert!(matches!(
        err,
        BuildError::PrematureSpend { height: HEIGHT, spendable_at, .. } if spendable_at == HEIGHT + 90
    ));
    assert_eq!(builder.state(), BuilderState::Draft);
}

#[test]
fn mature_coinbase_spends() {
    let owner = key(1);
    let (note, condition) = make_coinbase_note(owner.pkh(), 50 * COIN, HEIGHT - 100, 1);
    let spend = SimpleSpend::new(vec![(note, condition)], pkh(0xAA), COIN, owner.pkh(), HEIGHT);

    let mut builder = TxBuilder::new(TxEngineSettings::V1_DEFAULT);
    builder.simple_spend(spend).unwrap();
    builder.sign(&owner).unwrap();
    assert!(builder.build().is_ok());
}

#[test]
fn expired_timelock_rejected() {
    let owner = key(1);
    let condition = SpendCondition::new(vec![
        LockPrimitive::Pkh(Pkh::single(owner.pkh())),
        LockPrimitive::Tim(LockTim::absolute(TimelockRange::new(None, Some(HEIGHT - 1)))),
    ])
    .unwrap();
    let note = make_note(&condition, 10 * COIN, 10, 1);
    let spend = SimpleSpend::new(vec![(note, condition)], pkh(0xAA), COIN, owner.pkh(), HEIGHT);
    assert!(matches!(
        TxBuilder::new(TxEngineSettings::V1_DEFAULT).simple_spend(spend),
        Err(BuildError::TimelockExpired { last_height, .. }) if last_height == HEIGHT - 1
    ));
}

#[test]
fn version_mismatch_rejected() {
    let mut spend = single_key_spend(1, &[10 * COIN], COIN);
    spend.inputs[0].0.version = ProtocolVersion::V0;
    assert_eq!(
        TxBuilder::new(TxEngineSettings::V1_DEFAULT).simple_spend(spend).unwrap_err(),
        BuildError::SettingsVersionMismatch {
            settings: ProtocolVersion::V1,
            note: ProtocolVersion::V0,
        }
    );
}

#[test]
fn burned_note_unspendable() {
    let condition = SpendCondition::new(vec![LockPrimitive::Brn]).unwrap();
    let note = make_note(&condition, 10 * COIN, 10, 1);
    let spend = SimpleSpend::new(vec![(note, condition)], pkh(0xAA), COIN, pkh(1), HEIGHT);
    assert!(matches!(
        TxBuilder::new(TxEngineSettings::V1_DEFAULT).simple_spend(spend),
        Err(BuildError::UnspendableCondition { .. })
    ));
}

// --- State machine ---

#[test]
fn calls_out_of_order_are_rejected() {
    let mut builder = TxBuilder::new(TxEngineSettings::V1_DEFAULT);
    assert!(matches!(
        builder.sign(&key(1)),
        Err(BuildError::WrongBuilderState { state: BuilderState::Draft, .. })
    ));
    assert!(matches!(
        builder.build(),
        Err(BuildError::WrongBuilderState { state: BuilderState::Draft, .. })
    ));

    builder.simple_spend(single_key_spend(1, &[10 * COIN], COIN)).unwrap();
    assert!(matches!(
        builder.build(),
        Err(BuildError::WrongBuilderState { state: BuilderState::Composed, .. })
    ));
    assert!(matches!(
        builder.simple_spend(single_key_spend(1, &[10 * COIN], COIN)),
        Err(BuildError::WrongBuilderState { state: BuilderState::Composed, .. })
    ));

    builder.sign(&key(1)).unwrap();
    builder.build().unwrap();
    assert!(matches!(
        builder.sign(&key(1)),
        Err(BuildError::WrongBuilderState { state: BuilderState::Built, .. })
    ));
}

// --- Wire format ---

#[test]
fn built_transaction_survives_the_wire() {
    let mut builder = TxBuilder::new(TxEngineSettings::V1_BYTHOS);
    builder.simple_spend(single_key_spend(3, &[2 * COIN, 3 * COIN], 4 * COIN)).unwrap();
    builder.sign(&key(3)).unwrap();
    let tx = builder.build().unwrap();

    let bytes = tx.encode().unwrap();
    let decoded = SignedTransaction::decode(&bytes).unwrap();
    assert_eq!(decoded, tx);
    assert_eq!(decoded.id(), tx.id());

    let mut padded = bytes.clone();
    padded.push(0);
    assert!(SignedTransaction::decode(&padded).is_err());
}
