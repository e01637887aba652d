//! Unsigned and signed transactions and their canonical encoding.
//!
//! The canonical encoding is bincode with fixed-width integers, so the size
//! of a transaction depends only on its structure and never on the amounts
//! it carries. Fee estimation relies on this.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::{MAX_TX_BYTES, SIGNING_DOMAIN};
use crate::crypto::{PublicKey, Signature};
use crate::error::{CodecError, TransactionError};
use crate::lock::SpendCondition;
use crate::settings::TxShape;
use crate::types::{Amount, Digest, Name, ProtocolVersion};

/// Bincode configuration used for every hashed or transmitted encoding.
pub fn canonical_config() -> impl bincode::config::Config {
    bincode::config::standard().with_fixed_int_encoding()
}

/// Canonical configuration with a byte limit, for decoding untrusted input.
/// Length prefixes beyond the limit fail before anything is allocated.
pub fn decode_config() -> impl bincode::config::Config {
    bincode::config::standard()
        .with_fixed_int_encoding()
        .with_limit::<MAX_TX_BYTES>()
}

/// A note being consumed, with the condition that unlocks it.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Input {
    pub name: Name,
    pub assets: Amount,
    pub condition: SpendCondition,
}

/// A new note created by the transaction.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Output {
    pub lock_root: Digest,
    pub assets: Amount,
    /// Full condition, published so the recipient can spend without
    /// learning it out of band.
    pub lock_data: Option<SpendCondition>,
}

impl Output {
    pub fn new(
        condition: &SpendCondition,
        assets: Amount,
        include_lock_data: bool,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            lock_root: condition.lock_root()?,
            assets,
            lock_data: include_lock_data.then(|| condition.clone()),
        })
    }
}

/// Transaction body before any witness data is attached.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct UnsignedTransaction {
    pub version: ProtocolVersion,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub fee: Amount,
}

impl UnsignedTransaction {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::encode_to_vec(self, canonical_config())?)
    }

    /// Digest every signer signs. Commits to the whole body, including the
    /// fee and output lock data.
    pub fn signing_payload(&self) -> Result<Digest, CodecError> {
        let encoded = self.encode()?;
        Ok(Digest::hash_parts(&[SIGNING_DOMAIN, &encoded]))
    }

    pub fn total_input(&self) -> Option<Amount> {
        self.inputs
            .iter()
            .try_fold(0u64, |acc, i| acc.checked_add(i.assets))
    }

    pub fn total_output(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.assets))
    }

    /// Whether inputs equal outputs plus fee, without overflow.
    pub fn is_balanced(&self) -> bool {
        match (self.total_input(), self.total_output()) {
            (Some(i), Some(o)) => o.checked_add(self.fee) == Some(i),
            _ => false,
        }
    }

    /// Size inputs for fee estimation.
    pub fn shape(&self) -> Result<TxShape, CodecError> {
        Ok(TxShape {
            encoded_len: self.encode()?.len(),
            signatures: self
                .inputs
                .iter()
                .map(|i| i.condition.required_signatures())
                .sum(),
        })
    }
}

/// One signature over a transaction's signing payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
pub struct SignatureEntry {
    pub public_key: PublicKey,
    pub signature: Signature,
}

impl SignatureEntry {
    /// Public key hash of the signer.
    pub fn signer(&self) -> Digest {
        self.public_key.pkh()
    }

    pub fn verifies(&self, payload: &Digest) -> bool {
        self.public_key.verify(payload.as_bytes(), &self.signature)
    }
}

/// What an input still needs before it can be spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MissingUnlock {
    /// A threshold key lock lacks `needed` more valid signatures from
    /// `candidates`.
    Pkh {
        input: Name,
        needed: u64,
        candidates: BTreeSet<Digest>,
    },
    /// A hash lock lacks preimages for `digests`.
    Hax { input: Name, digests: BTreeSet<Digest> },
}

impl MissingUnlock {
    pub fn input(&self) -> &Name {
        match self {
            MissingUnlock::Pkh { input, .. } | MissingUnlock::Hax { input, .. } => input,
        }
    }
}

/// Report every unmet `Pkh` and `Hax` clause of `tx` given the witness data.
///
/// Only signatures that verify against the signing payload count, and a key
/// counts once per clause no matter how often it signed.
pub fn missing_unlocks(
    tx: &UnsignedTransaction,
    signatures: &[SignatureEntry],
    preimages: &[Vec<u8>],
) -> Result<Vec<MissingUnlock>, CodecError> {
    let payload = tx.signing_payload()?;
    let signers: BTreeSet<Digest> = signatures
        .iter()
        .filter(|s| s.verifies(&payload))
        .map(SignatureEntry::signer)
        .collect();
    let opened: BTreeSet<Digest> = preimages.iter().map(|p| Digest::hash(p)).collect();

    let mut missing = Vec::new();
    for input in &tx.inputs {
        for pkh in input.condition.pkhs() {
            let have = pkh.signed_by(&signers);
            if have < pkh.m {
                missing.push(MissingUnlock::Pkh {
                    input: input.name,
                    needed: pkh.m - have,
                    candidates: pkh.hashes.difference(&signers).copied().collect(),
                });
            }
        }
        for hax in input.condition.hash_locks() {
            let digests: BTreeSet<Digest> = hax.digests().difference(&opened).copied().collect();
            if !digests.is_empty() {
                missing.push(MissingUnlock::Hax {
                    input: input.name,
                    digests,
                });
            }
        }
    }
    Ok(missing)
}

#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
struct TransactionBody {
    tx: UnsignedTransaction,
    signatures: Vec<SignatureEntry>,
    preimages: Vec<Vec<u8>>,
}

#[derive(bincode::Encode, bincode::Decode)]
struct Envelope {
    id: Digest,
    body: TransactionBody,
}

/// A fully unlocked transaction ready for submission.
///
/// Every instance has passed [`SignedTransaction::seal`]: its witness data
/// is canonical and satisfies every key and hash lock on its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    id: Digest,
    body: TransactionBody,
}

impl SignedTransaction {
    /// Canonicalize the witness data, check that every input is unlocked,
    /// and compute the transaction id.
    ///
    /// Signatures are sorted and deduplicated, and signatures that do not
    /// verify or whose signer no input lists are dropped, so the id does
    /// not depend on signing order.
    pub fn seal(
        tx: UnsignedTransaction,
        signatures: Vec<SignatureEntry>,
        preimages: Vec<Vec<u8>>,
    ) -> Result<Self, TransactionError> {
        for (index, input) in tx.inputs.iter().enumerate() {
            input
                .condition
                .check_well_formed()
                .map_err(|source| TransactionError::MalformedCondition { index, source })?;
        }

        let payload = tx.signing_payload()?;
        let listed: BTreeSet<Digest> = tx
            .inputs
            .iter()
            .flat_map(|i| i.condition.signer_hashes())
            .collect();
        let mut signatures: Vec<SignatureEntry> = signatures
            .into_iter()
            .filter(|s| listed.contains(&s.signer()) && s.verifies(&payload))
            .collect();
        signatures.sort_by_key(|s| (s.signer(), s.signature));
        signatures.dedup_by_key(|s| s.signer());

        let locked: BTreeSet<Digest> = tx
            .inputs
            .iter()
            .flat_map(|i| i.condition.hash_locks().flat_map(|h| h.digests().iter().copied()))
            .collect();
        let mut preimages: Vec<Vec<u8>> = preimages
            .into_iter()
            .filter(|p| locked.contains(&Digest::hash(p)))
            .collect();
        preimages.sort();
        preimages.dedup();

        let missing = missing_unlocks(&tx, &signatures, &preimages)?;
        if missing.iter().any(|m| matches!(m, MissingUnlock::Pkh { .. })) {
            return Err(TransactionError::IncompleteSignatures(missing));
        }
        if !missing.is_empty() {
            return Err(TransactionError::MissingPreimages(missing));
        }

        let body = TransactionBody {
            tx,
            signatures,
            preimages,
        };
        let id = Digest::hash(&bincode::encode_to_vec(&body, canonical_config()).map_err(CodecError::from)?);
        Ok(Self { id, body })
    }

    pub fn id(&self) -> Digest {
        self.id
    }

    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.body.tx
    }

    pub fn inputs(&self) -> &[Input] {
        &self.body.tx.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.body.tx.outputs
    }

    pub fn fee(&self) -> Amount {
        self.body.tx.fee
    }

    pub fn version(&self) -> ProtocolVersion {
        self.body.tx.version
    }

    /// Canonical signatures, ordered by signer hash.
    pub fn signatures(&self) -> &[SignatureEntry] {
        &self.body.signatures
    }

    pub fn preimages(&self) -> &[Vec<u8>] {
        &self.body.preimages
    }

    /// Wire form: the id followed by the canonical body.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let envelope = Envelope {
            id: self.id,
            body: self.body.clone(),
        };
        Ok(bincode::encode_to_vec(&envelope, canonical_config())?)
    }

    /// Parse and fully re-validate a wire transaction.
    ///
    /// Rejects input over [`MAX_TX_BYTES`], trailing bytes, non-canonical witness data, bodies that do
    /// not unlock their inputs, and ids that do not match the body.
    pub fn decode(bytes: &[u8]) -> Result<Self, TransactionError> {
        if bytes.len() > MAX_TX_BYTES {
            return Err(CodecError::Decode(format!(
                "transaction is {} bytes, limit is {MAX_TX_BYTES}",
                bytes.len()
            ))
            .into());
        }
        let (envelope, read): (Envelope, usize) =
            bincode::decode_from_slice(bytes, decode_config()).map_err(CodecError::from)?;
        if read != bytes.len() {
            return Err(CodecError::TrailingBytes(bytes.len() - read).into());
        }
        let Envelope { id, body } = envelope;
        let sealed = Self::seal(body.tx, body.signatures, body.preimages)?;
        if sealed.id != id {
            return Err(CodecError::IdMismatch {
                declared: id.to_string(),
                computed: sealed.id.to_string(),
            }
            .into());
        }
        Ok(sealed)
    }
}
