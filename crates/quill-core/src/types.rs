//! Ledger data model: digests, note names, notes, and balances.
//!
//! All asset amounts are in the ledger's smallest unit and use u64.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::DIGEST_LEN;
use crate::error::DigestError;

/// Amount of assets, in the smallest ledger unit.
pub type Amount = u64;

/// Block height.
pub type BlockHeight = u64;

/// A 32-byte BLAKE3 digest.
///
/// Used for lock roots, note name halves, public key hashes, and
/// transaction ids. Renders as base58 in text form.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, bincode::Encode, bincode::Decode,
)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    /// The all-zero digest.
    pub const ZERO: Self = Self([0u8; DIGEST_LEN]);

    /// Hash arbitrary bytes.
    pub fn hash(data: &[u8]) -> Self {
        Self(blake3::hash(data).into())
    }

    /// Hash the concatenation of several byte strings.
    pub fn hash_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; DIGEST_LEN]
    }

    /// Base58 text form.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Parse a base58 string produced by [`Digest::to_base58`].
    pub fn from_base58(s: &str) -> Result<Self, DigestError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| DigestError::InvalidBase58(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_base58())
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = DigestError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|_| DigestError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base58(&s).map_err(serde::de::Error::custom)
    }
}

/// Ledger protocol version a note or settings bundle belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    V0,
    V1,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V0 => f.write_str("v0"),
            ProtocolVersion::V1 => f.write_str("v1"),
        }
    }
}

/// Unique two-part identifier of a note.
///
/// `first` is derived from the note's lock root so that all notes locked to
/// the same condition share a first name; `last` distinguishes them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
pub struct Name {
    pub first: Digest,
    pub last: Digest,
}

impl Name {
    pub fn new(first: Digest, last: Digest) -> Self {
        Self { first, last }
    }

    /// First name shared by every note locked to `lock_root`.
    pub fn first_for_lock(lock_root: &Digest) -> Digest {
        Digest::hash_parts(&[b"quill/first-name", lock_root.as_bytes()])
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.first, self.last)
    }
}

/// Where a note came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode,
    bincode::Decode,
)]
pub struct Source {
    /// Id of the transaction or block that created the note.
    pub hash: Digest,
    /// Whether the note is a block reward.
    pub is_coinbase: bool,
}

/// An unspent ledger entry.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Note {
    pub name: Name,
    /// Digest of the spend condition guarding this note.
    pub lock_root: Digest,
    pub assets: Amount,
    /// Height of the block that created the note.
    pub origin_height: BlockHeight,
    pub source: Source,
    pub version: ProtocolVersion,
}

impl Note {
    /// Blocks elapsed since the note was created.
    pub fn age_at(&self, height: BlockHeight) -> u64 {
        height.saturating_sub(self.origin_height)
    }

    /// Coinbase notes must wait `maturity` blocks; all others are mature
    /// immediately.
    pub fn is_mature(&self, height: BlockHeight, maturity: u64) -> bool {
        if !self.source.is_coinbase {
            return true;
        }
        self.age_at(height) >= maturity
    }

    /// First height at which a coinbase note becomes spendable.
    pub fn matures_at(&self, maturity: u64) -> BlockHeight {
        if self.source.is_coinbase {
            self.origin_height.saturating_add(maturity)
        } else {
            self.origin_height
        }
    }
}

/// Snapshot of the notes visible to a wallet at one block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub notes: Vec<Note>,
    pub height: BlockHeight,
    pub block_id: Digest,
}

impl Balance {
    /// Sum of all note assets, or `None` on overflow.
    pub fn total_assets(&self) -> Option<Amount> {
        self.notes
            .iter()
            .try_fold(0u64, |acc, n| acc.checked_add(n.assets))
    }

    pub fn find(&self, name: &Name) -> Option<&Note> {
        self.notes.iter().find(|n| &n.name == name)
    }

    /// Notes guarded by the given lock root.
    pub fn notes_locked_to<'a>(&'a self, lock_root: &'a Digest) -> impl Iterator<Item = &'a Note> {
        self.notes.iter().filter(move |n| &n.lock_root == lock_root)
    }
}
