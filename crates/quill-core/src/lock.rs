//! Lock primitives and spend conditions.
//!
//! A [`SpendCondition`] is a conjunction of [`LockPrimitive`]s. Every
//! primitive must be satisfied for the guarded note to be spent. The digest
//! of a condition's canonical encoding is its lock root, which is what notes
//! actually commit to.
//!
//! Primitives encode as a one-byte tag followed by a length-prefixed payload.
//! Tags this engine does not understand decode into
//! [`LockPrimitive::Unknown`] with the payload preserved, so conditions from
//! newer protocol revisions survive a decode/encode cycle unchanged.

use bincode::de::{BorrowDecoder, Decoder};
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{BorrowDecode, Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::constants::COINBASE_MATURITY;
use crate::error::{CodecError, ConditionError};
use crate::tx::{canonical_config, decode_config};
use crate::types::{BlockHeight, Digest};

const TAG_PKH: u8 = 0;
const TAG_TIM: u8 = 1;
const TAG_HAX: u8 = 2;
const TAG_BRN: u8 = 3;

/// m-of-n public key hash lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct Pkh {
    /// Signatures required.
    pub m: u64,
    /// Hashes of the public keys allowed to sign.
    pub hashes: BTreeSet<Digest>,
}

impl Pkh {
    /// Build a threshold lock, rejecting `m == 0` and `m > n`.
    pub fn new(m: u64, hashes: impl IntoIterator<Item = Digest>) -> Result<Self, ConditionError> {
        let pkh = Self {
            m,
            hashes: hashes.into_iter().collect(),
        };
        pkh.check_threshold()?;
        Ok(pkh)
    }

    /// 1-of-1 lock to a single key hash.
    pub fn single(hash: Digest) -> Self {
        Self {
            m: 1,
            hashes: BTreeSet::from([hash]),
        }
    }

    pub fn check_threshold(&self) -> Result<(), ConditionError> {
        if self.m == 0 || self.m > self.hashes.len() as u64 {
            return Err(ConditionError::InvalidThreshold {
                m: self.m,
                n: self.hashes.len(),
            });
        }
        Ok(())
    }

    /// Number of listed hashes present in `signers`.
    pub fn signed_by(&self, signers: &BTreeSet<Digest>) -> u64 {
        self.hashes.intersection(signers).count() as u64
    }

    pub fn is_satisfied_by(&self, signers: &BTreeSet<Digest>) -> bool {
        self.signed_by(signers) >= self.m
    }
}

/// Inclusive height window. Either bound may be absent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub struct TimelockRange {
    pub min: Option<BlockHeight>,
    pub max: Option<BlockHeight>,
}

impl TimelockRange {
    /// A zero bound carries no constraint and is normalized away.
    pub fn new(min: Option<BlockHeight>, max: Option<BlockHeight>) -> Self {
        Self {
            min: min.filter(|&h| h != 0),
            max: max.filter(|&h| h != 0),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Outcome of checking a timelock at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelockStatus {
    Satisfied,
    Premature { spendable_at: BlockHeight },
    Expired { last_height: BlockHeight },
}

/// Relative and absolute height constraints.
///
/// Relative bounds count from the note's origin height.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub struct LockTim {
    pub rel: TimelockRange,
    pub abs: TimelockRange,
}

impl LockTim {
    pub fn new(rel: TimelockRange, abs: TimelockRange) -> Self {
        Self { rel, abs }
    }

    pub fn relative(range: TimelockRange) -> Self {
        Self::new(range, TimelockRange::none())
    }

    pub fn absolute(range: TimelockRange) -> Self {
        Self::new(TimelockRange::none(), range)
    }

    /// Relative lock used for block rewards.
    pub fn coinbase() -> Self {
        Self {
            rel: TimelockRange::new(Some(COINBASE_MATURITY), None),
            abs: TimelockRange::none(),
        }
    }

    /// First spendable height, combining both bounds.
    pub fn earliest(&self, origin: BlockHeight) -> Option<BlockHeight> {
        let rel = self.rel.min.map(|m| origin.saturating_add(m));
        rel.max(self.abs.min)
    }

    /// Last spendable height, combining both bounds.
    pub fn latest(&self, origin: BlockHeight) -> Option<BlockHeight> {
        let rel = self.rel.max.map(|m| origin.saturating_add(m));
        match (rel, self.abs.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn check(&self, origin: BlockHeight, height: BlockHeight) -> TimelockStatus {
        let earliest = self.earliest(origin);
        if let Some(last_height) = self.latest(origin) {
            let unreachable = earliest.is_some_and(|e| e > last_height);
            if height > last_height || unreachable {
                return TimelockStatus::Expired { last_height };
            }
        }
        match earliest {
            Some(spendable_at) if height < spendable_at => {
                TimelockStatus::Premature { spendable_at }
            }
            _ => TimelockStatus::Satisfied,
        }
    }
}

/// Hash lock: each listed digest must be opened with its preimage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct Hax(pub BTreeSet<Digest>);

impl Hax {
    pub fn new(digests: impl IntoIterator<Item = Digest>) -> Self {
        Self(digests.into_iter().collect())
    }

    /// Lock on the digest of `preimage`.
    pub fn for_preimage(preimage: &[u8]) -> Self {
        Self(BTreeSet::from([Digest::hash(preimage)]))
    }

    pub fn digests(&self) -> &BTreeSet<Digest> {
        &self.0
    }
}

/// Discriminant of a [`LockPrimitive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Pkh,
    Tim,
    Hax,
    Brn,
    Unknown(u8),
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::Pkh => f.write_str("pkh"),
            PrimitiveKind::Tim => f.write_str("tim"),
            PrimitiveKind::Hax => f.write_str("hax"),
            PrimitiveKind::Brn => f.write_str("brn"),
            PrimitiveKind::Unknown(tag) => write!(f, "unknown({tag})"),
        }
    }
}

/// One clause of a spend condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockPrimitive {
    Pkh(Pkh),
    Tim(LockTim),
    Hax(Hax),
    /// Provably unspendable.
    Brn,
    /// Primitive from a protocol revision this engine does not know.
    Unknown { tag: u8, payload: Vec<u8> },
}

impl LockPrimitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            LockPrimitive::Pkh(_) => PrimitiveKind::Pkh,
            LockPrimitive::Tim(_) => PrimitiveKind::Tim,
            LockPrimitive::Hax(_) => PrimitiveKind::Hax,
            LockPrimitive::Brn => PrimitiveKind::Brn,
            LockPrimitive::Unknown { tag, .. } => PrimitiveKind::Unknown(*tag),
        }
    }

    fn tag(&self) -> u8 {
        match self {
            LockPrimitive::Pkh(_) => TAG_PKH,
            LockPrimitive::Tim(_) => TAG_TIM,
            LockPrimitive::Hax(_) => TAG_HAX,
            LockPrimitive::Brn => TAG_BRN,
            LockPrimitive::Unknown { tag, .. } => *tag,
        }
    }

    /// Whether this engine can ever satisfy the primitive.
    pub fn is_spendable(&self) -> bool {
        !matches!(self, LockPrimitive::Brn | LockPrimitive::Unknown { .. })
    }
}

fn encode_payload<T: Encode>(value: &T) -> Result<Vec<u8>, EncodeError> {
    bincode::encode_to_vec(value, canonical_config())
}

fn decode_payload<T: Decode<()>>(payload: &[u8]) -> Result<T, DecodeError> {
    let (value, read) = bincode::decode_from_slice(payload, decode_config())?;
    if read != payload.len() {
        return Err(DecodeError::OtherString(format!(
            "{} unread bytes in lock primitive payload",
            payload.len() - read
        )));
    }
    Ok(value)
}

impl Encode for LockPrimitive {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        let payload = match self {
            LockPrimitive::Pkh(pkh) => encode_payload(pkh)?,
            LockPrimitive::Tim(tim) => encode_payload(tim)?,
            LockPrimitive::Hax(hax) => encode_payload(hax)?,
            LockPrimitive::Brn => Vec::new(),
            LockPrimitive::Unknown { payload, .. } => payload.clone(),
        };
        Encode::encode(&self.tag(), encoder)?;
        Encode::encode(&payload, encoder)
    }
}

impl<Context> Decode<Context> for LockPrimitive {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let tag = <u8 as Decode<Context>>::decode(decoder)?;
        let payload = <Vec<u8> as Decode<Context>>::decode(decoder)?;
        let primitive = match tag {
            TAG_PKH => LockPrimitive::Pkh(decode_payload(&payload)?),
            TAG_TIM => LockPrimitive::Tim(decode_payload(&payload)?),
            TAG_HAX => LockPrimitive::Hax(decode_payload(&payload)?),
            TAG_BRN if payload.is_empty() => LockPrimitive::Brn,
            TAG_BRN => {
                return Err(DecodeError::OtherString(
                    "burn primitive carries a payload".into(),
                ));
            }
            _ => LockPrimitive::Unknown { tag, payload },
        };
        Ok(primitive)
    }
}

impl<'de, Context> BorrowDecode<'de, Context> for LockPrimitive {
    fn borrow_decode<D: BorrowDecoder<'de, Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, DecodeError> {
        <Self as Decode<Context>>::decode(decoder)
    }
}

/// Conjunction of lock primitives guarding a note.
///
/// Multiple `Pkh` primitives are independent: each threshold must be met.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[serde(try_from = "Vec<LockPrimitive>")]
pub struct SpendCondition(Vec<LockPrimitive>);

impl TryFrom<Vec<LockPrimitive>> for SpendCondition {
    type Error = ConditionError;

    fn try_from(primitives: Vec<LockPrimitive>) -> Result<Self, Self::Error> {
        Self::new(primitives)
    }
}

impl SpendCondition {
    /// Build a condition, rejecting malformed primitive lists.
    pub fn new(primitives: Vec<LockPrimitive>) -> Result<Self, ConditionError> {
        let condition = Self(primitives);
        condition.check_well_formed()?;
        Ok(condition)
    }

    /// Single-key lock, the common case for wallet addresses.
    pub fn single_pkh(hash: Digest) -> Self {
        Self(vec![LockPrimitive::Pkh(Pkh::single(hash))])
    }

    pub fn coinbase(hash: Digest) -> Self {
        Self(vec![
            LockPrimitive::Pkh(Pkh::single(hash)),
            LockPrimitive::Tim(LockTim::coinbase()),
        ])
    }

    pub fn primitives(&self) -> &[LockPrimitive] {
        &self.0
    }

    /// Validate structure: non-empty, sane thresholds, at most one timelock
    /// and one burn, no repeated primitive. Unknown primitives may not reuse
    /// a tag the decoder maps to a known kind.
    pub fn check_well_formed(&self) -> Result<(), ConditionError> {
        if self.0.is_empty() {
            return Err(ConditionError::EmptyCondition);
        }
        let mut seen_tim = false;
        let mut seen_brn = false;
        for (i, primitive) in self.0.iter().enumerate() {
            if self.0[..i].contains(primitive) {
                return Err(ConditionError::DuplicatePrimitiveKind(primitive.kind()));
            }
            match primitive {
                LockPrimitive::Pkh(pkh) => pkh.check_threshold()?,
                LockPrimitive::Tim(_) if seen_tim => {
                    return Err(ConditionError::DuplicatePrimitiveKind(PrimitiveKind::Tim));
                }
                LockPrimitive::Tim(_) => seen_tim = true,
                LockPrimitive::Brn if seen_brn => {
                    return Err(ConditionError::DuplicatePrimitiveKind(PrimitiveKind::Brn));
                }
                LockPrimitive::Brn => seen_brn = true,
                LockPrimitive::Hax(hax) if hax.0.is_empty() => {
                    return Err(ConditionError::EmptyHashLock);
                }
                LockPrimitive::Unknown { tag, .. } if *tag <= TAG_BRN => {
                    return Err(ConditionError::ReservedTag(*tag));
                }
                LockPrimitive::Hax(_) | LockPrimitive::Unknown { .. } => {}
            }
        }
        Ok(())
    }

    pub fn pkhs(&self) -> impl Iterator<Item = &Pkh> {
        self.0.iter().filter_map(|p| match p {
            LockPrimitive::Pkh(pkh) => Some(pkh),
            _ => None,
        })
    }

    pub fn timelock(&self) -> Option<&LockTim> {
        self.0.iter().find_map(|p| match p {
            LockPrimitive::Tim(tim) => Some(tim),
            _ => None,
        })
    }

    pub fn hash_locks(&self) -> impl Iterator<Item = &Hax> {
        self.0.iter().filter_map(|p| match p {
            LockPrimitive::Hax(hax) => Some(hax),
            _ => None,
        })
    }

    /// First primitive the engine cannot satisfy, if any.
    pub fn unspendable_primitive(&self) -> Option<PrimitiveKind> {
        self.0.iter().find(|p| !p.is_spendable()).map(LockPrimitive::kind)
    }

    /// Every key hash that may contribute a signature.
    pub fn signer_hashes(&self) -> BTreeSet<Digest> {
        self.pkhs().flat_map(|p| p.hashes.iter().copied()).collect()
    }

    /// Total signatures needed to satisfy every `Pkh` clause.
    pub fn required_signatures(&self) -> u64 {
        self.pkhs().map(|p| p.m).sum()
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::encode_to_vec(self, canonical_config())?)
    }

    /// Digest of the canonical encoding.
    pub fn lock_root(&self) -> Result<Digest, CodecError> {
        Ok(Digest::hash(&self.encode()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(b: u8) -> Digest {
        Digest([b; 32])
    }

    // --- Pkh ---

    #[test]
    fn pkh_threshold_bounds() {
        assert!(Pkh::new(1, [d(1)]).is_ok());
        assert!(Pkh::new(2, [d(1), d(2)]).is_ok());
        assert_eq!(
            Pkh::new(0, [d(1)]),
            Err(ConditionError::InvalidThreshold { m: 0, n: 1 })
        );
        assert_eq!(
            Pkh::new(3, [d(1), d(2)]),
            Err(ConditionError::InvalidThreshold { m: 3, n: 2 })
        );
    }

    #[test]
    fn pkh_duplicate_hashes_collapse() {
        assert_eq!(
            Pkh::new(2, [d(1), d(1)]),
            Err(ConditionError::InvalidThreshold { m: 2, n: 1 })
        );
    }

    #[test]
    fn pkh_satisfaction_counts_listed_signers_only() {
        let pkh = Pkh::new(2, [d(1), d(2), d(3)]).unwrap();
        let mut signers = BTreeSet::from([d(1), d(9)]);
        assert_eq!(pkh.signed_by(&signers), 1);
        assert!(!pkh.is_satisfied_by(&signers));
        signers.insert(d(3));
        assert!(pkh.is_satisfied_by(&signers));
    }

    // --- Timelocks ---

    #[test]
    fn zero_bounds_are_normalized() {
        assert!(TimelockRange::new(Some(0), Some(0)).is_none());
        assert_eq!(TimelockRange::new(Some(5), Some(0)).min, Some(5));
    }

    #[test]
    fn coinbase_timelock_is_relative_100() {
        let tim = LockTim::coinbase();
        assert_eq!(tim.rel.min, Some(100));
        assert_eq!(tim.check(50, 149), TimelockStatus::Premature { spendable_at: 150 });
        assert_eq!(tim.check(50, 150), TimelockStatus::Satisfied);
    }

    #[test]
    fn absolute_and_relative_bounds_combine() {
        let tim = LockTim::new(
            TimelockRange::new(Some(10), Some(100)),
            TimelockRange::new(Some(30), Some(70)),
        );
        // origin 5: rel window [15, 105], abs [30, 70]
        assert_eq!(tim.earliest(5), Some(30));
        assert_eq!(tim.latest(5), Some(70));
        assert_eq!(tim.check(5, 29), TimelockStatus::Premature { spendable_at: 30 });
        assert_eq!(tim.check(5, 70), TimelockStatus::Satisfied);
        assert_eq!(tim.check(5, 71), TimelockStatus::Expired { last_height: 70 });
    }

    #[test]
    fn relative_and_absolute_constructors() {
        let rel = LockTim::relative(TimelockRange::new(Some(10), None));
        assert_eq!(rel.check(100, 109), TimelockStatus::Premature { spendable_at: 110 });
        let abs = LockTim::absolute(TimelockRange::new(None, Some(500)));
        assert_eq!(abs.check(100, 500), TimelockStatus::Satisfied);
        assert!(abs.rel.is_none());
    }

    #[test]
    fn empty_window_is_expired() {
        let tim = LockTim::absolute(TimelockRange::new(Some(50), Some(40)));
        assert_eq!(tim.check(0, 10), TimelockStatus::Expired { last_height: 40 });
    }

    #[test]
    fn unbounded_timelock_always_satisfied() {
        assert_eq!(LockTim::default().check(0, 0), TimelockStatus::Satisfied);
    }

    // --- SpendCondition ---

    #[test]
    fn empty_condition_rejected() {
        assert_eq!(SpendCondition::new(vec![]), Err(ConditionError::EmptyCondition));
    }

    #[test]
    fn two_timelocks_rejected() {
        let r = SpendCondition::new(vec![
            LockPrimitive::Tim(LockTim::coinbase()),
            LockPrimitive::Tim(LockTim::default()),
        ]);
        assert_eq!(r, Err(ConditionError::DuplicatePrimitiveKind(PrimitiveKind::Tim)));
    }

    #[test]
    fn identical_pkh_rejected_distinct_pkh_allowed() {
        let p = LockPrimitive::Pkh(Pkh::single(d(1)));
        assert_eq!(
            SpendCondition::new(vec![p.clone(), p.clone()]),
            Err(ConditionError::DuplicatePrimitiveKind(PrimitiveKind::Pkh))
        );
        let q = LockPrimitive::Pkh(Pkh::single(d(2)));
        let cond = SpendCondition::new(vec![p, q]).unwrap();
        assert_eq!(cond.required_signatures(), 2);
        assert_eq!(cond.signer_hashes(), BTreeSet::from([d(1), d(2)]));
    }

    #[test]
    fn bad_threshold_inside_condition_rejected() {
        let bad = LockPrimitive::Pkh(Pkh {
            m: 2,
            hashes: BTreeSet::from([d(1)]),
        });
        assert_eq!(
            SpendCondition::new(vec![bad]),
            Err(ConditionError::InvalidThreshold { m: 2, n: 1 })
        );
    }

    #[test]
    fn empty_hash_lock_rejected() {
        assert_eq!(
            SpendCondition::new(vec![LockPrimitive::Hax(Hax::new([]))]),
            Err(ConditionError::EmptyHashLock)
        );
    }

    #[test]
    fn unspendable_primitives_detected() {
        let cond = SpendCondition::new(vec![LockPrimitive::Pkh(Pkh::single(d(1))), LockPrimitive::Brn])
            .unwrap();
        assert_eq!(cond.unspendable_primitive(), Some(PrimitiveKind::Brn));
        assert_eq!(SpendCondition::single_pkh(d(1)).unspendable_primitive(), None);
    }

    #[test]
    fn lock_root_is_deterministic_and_order_sensitive() {
        let a = SpendCondition::coinbase(d(1));
        assert_eq!(a.lock_root().unwrap(), a.clone().lock_root().unwrap());
        let reversed = SpendCondition::new(a.primitives().iter().rev().cloned().collect()).unwrap();
        assert_ne!(a.lock_root().unwrap(), reversed.lock_root().unwrap());
        assert_ne!(
            SpendCondition::single_pkh(d(1)).lock_root().unwrap(),
            SpendCondition::single_pkh(d(2)).lock_root().unwrap()
        );
    }

    #[test]
    fn primitive_codec_roundtrip() {
        let cond = SpendCondition::new(vec![
            LockPrimitive::Pkh(Pkh::new(1, [d(1), d(2)]).unwrap()),
            LockPrimitive::Tim(LockTim::coinbase()),
            LockPrimitive::Hax(Hax::for_preimage(b"secret")),
        ])
        .unwrap();
        let bytes = cond.encode().unwrap();
        let (back, read): (SpendCondition, usize) =
            bincode::decode_from_slice(&bytes, canonical_config()).unwrap();
        assert_eq!(read, bytes.len());
        assert_eq!(back, cond);
    }

    #[test]
    fn unknown_primitive_survives_roundtrip() {
        let unknown = LockPrimitive::Unknown {
            tag: 42,
            payload: vec![1, 2, 3],
        };
        let cond = SpendCondition::new(vec![unknown.clone()]).unwrap();
        let bytes = cond.encode().unwrap();
        let (back, _): (SpendCondition, usize) =
            bincode::decode_from_slice(&bytes, canonical_config()).unwrap();
        assert_eq!(back.primitives(), &[unknown]);
        assert_eq!(back.encode().unwrap(), bytes);
        assert_eq!(back.unspendable_primitive(), Some(PrimitiveKind::Unknown(42)));
    }

    #[test]
    fn burn_with_payload_fails_to_decode() {
        let bytes = bincode::encode_to_vec(
            LockPrimitive::Unknown {
                tag: TAG_BRN,
                payload: vec![0],
            },
            canonical_config(),
        )
        .unwrap();
        let r: Result<(LockPrimitive, usize), _> =
            bincode::decode_from_slice(&bytes, canonical_config());
        assert!(r.is_err());
    }

    #[test]
    fn pkh_payload_with_trailing_bytes_fails_to_decode() {
        let mut payload = encode_payload(&Pkh::single(d(1))).unwrap();
        payload.push(0xFF);
        let bytes = bincode::encode_to_vec(
            LockPrimitive::Unknown {
                tag: TAG_PKH,
                payload,
            },
            canonical_config(),
        )
        .unwrap();
        let r: Result<(LockPrimitive, usize), _> =
            bincode::decode_from_slice(&bytes, canonical_config());
        assert!(r.is_err());
    }

    #[test]
    fn serde_json_roundtrip() {
        let cond = SpendCondition::coinbase(d(7));
        let json = serde_json::to_string(&cond).unwrap();
        let back: SpendCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cond);
    }

    #[test]
    fn unknown_primitive_cannot_reuse_known_tag() {
        for tag in [TAG_PKH, TAG_TIM, TAG_HAX, TAG_BRN] {
            let unknown = LockPrimitive::Unknown {
                tag,
                payload: Vec::new(),
            };
            assert_eq!(
                SpendCondition::new(vec![unknown]),
                Err(ConditionError::ReservedTag(tag))
            );
        }
        let fresh = LockPrimitive::Unknown {
            tag: 9,
            payload: Vec::new(),
        };
        assert!(SpendCondition::new(vec![fresh]).is_ok());
    }

    #[test]
    fn serde_rejects_malformed_condition() {
        let json = serde_json::to_string(&vec![LockPrimitive::Unknown {
            tag: TAG_HAX,
            payload: vec![1],
        }])
        .unwrap();
        assert!(serde_json::from_str::<SpendCondition>(&json).is_err());
        assert!(serde_json::from_str::<SpendCondition>("[]").is_err());
    }
}
