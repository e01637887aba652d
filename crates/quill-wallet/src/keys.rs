//! Deterministic Ed25519 key derivation and the wallet keyring.
//!
//! Master keys come from a BIP-39 seed via SLIP-10: HMAC-SHA512 keyed with
//! `"ed25519 seed"`. Ed25519 has no public derivation, so every child index
//! is hardened.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use zeroize::Zeroizing;

use quill_core::crypto::{PrivateKey, PublicKey};
use quill_core::error::KeyError;
use quill_core::types::Digest;

use crate::mnemonic::mnemonic_to_seed;

/// Indices at or above this value are hardened.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

const MASTER_HMAC_KEY: &[u8] = b"ed25519 seed";

/// A private key together with the chain code needed to derive children.
///
/// The chain code is zeroized on drop; the private key zeroizes itself.
#[derive(Clone)]
pub struct ExtendedKey {
    private_key: PrivateKey,
    chain_code: Zeroizing<[u8; 32]>,
    depth: u8,
    index: u32,
}

impl ExtendedKey {
    /// SLIP-10 master key for a BIP-39 (or any) seed.
    pub fn from_seed(seed: &[u8]) -> Self {
        let i = hmac_sha512(MASTER_HMAC_KEY, &[seed]);
        Self::from_hmac_output(&i, 0, 0)
    }

    fn from_hmac_output(i: &[u8; 64], depth: u8, index: u32) -> Self {
        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&i[..32]);
        let mut chain_code = Zeroizing::new([0u8; 32]);
        chain_code.copy_from_slice(&i[32..]);
        Self {
            private_key: PrivateKey::from_seed(&secret),
            chain_code,
            depth,
            index,
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    /// Public key hash, the value `Pkh` locks commit to.
    pub fn pkh(&self) -> Digest {
        self.private_key.pkh()
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Hardened index this key was derived at (0 for a master key).
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Hardened child at `index`. Indices below [`HARDENED_OFFSET`] are
    /// hardened implicitly.
    pub fn derive_child(&self, index: u32) -> Self {
        let hardened = index | HARDENED_OFFSET;
        let secret = self.private_key.to_bytes();
        let i = hmac_sha512(
            self.chain_code.as_slice(),
            &[&[0u8][..], secret.as_slice(), &hardened.to_be_bytes()[..]],
        );
        Self::from_hmac_output(&i, self.depth.saturating_add(1), hardened)
    }

    /// Walk a sequence of child indices.
    pub fn derive_path(&self, path: &[u32]) -> Self {
        path.iter()
            .fold(self.clone(), |key, &index| key.derive_child(index))
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("public_key", &self.public_key())
            .field("depth", &self.depth)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Zeroizing<[u8; 64]> {
    // HMAC pads short keys and hashes long ones, so `new_from_slice` has no
    // failing input for `Hmac<Sha512>`.
    let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("HMAC accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    let bytes = mac.finalize().into_bytes();
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&bytes);
    out
}

/// Derive the master key for a mnemonic phrase and optional passphrase.
pub fn derive_master_key(mnemonic: &str, passphrase: &str) -> Result<ExtendedKey, KeyError> {
    let seed = mnemonic_to_seed(mnemonic, passphrase)?;
    Ok(ExtendedKey::from_seed(seed.as_slice()))
}

/// Parse a path such as `m/44'/0'/1`. Every component is hardened.
pub fn parse_path(path: &str) -> Result<Vec<u32>, KeyError> {
    let mut parts = path.trim().split('/');
    if parts.next() != Some("m") {
        return Err(KeyError::InvalidDerivationPath(format!(
            "{path}: must start with m"
        )));
    }
    parts
        .map(|p| {
            let digits = p.trim_end_matches(['\'', 'h', 'H']);
            let index: u32 = digits
                .parse()
                .map_err(|_| KeyError::InvalidDerivationPath(format!("{path}: bad component {p}")))?;
            if index >= HARDENED_OFFSET {
                return Err(KeyError::InvalidDerivationPath(format!(
                    "{path}: component {p} out of range"
                )));
            }
            Ok(index | HARDENED_OFFSET)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySlot {
    Master,
    Child(u32),
}

/// Master key plus a cache of derived child keys, indexed by public key
/// hash for signing lookups.
pub struct Keyring {
    master: ExtendedKey,
    next_index: u32,
    children: BTreeMap<u32, ExtendedKey>,
    by_pkh: HashMap<Digest, KeySlot>,
}

impl Keyring {
    pub fn new(master: ExtendedKey) -> Self {
        let mut by_pkh = HashMap::new();
        by_pkh.insert(master.pkh(), KeySlot::Master);
        Self {
            master,
            next_index: 0,
            children: BTreeMap::new(),
            by_pkh,
        }
    }

    pub fn from_mnemonic(phrase: &str, passphrase: &str) -> Result<Self, KeyError> {
        Ok(Self::new(derive_master_key(phrase, passphrase)?))
    }

    pub fn master(&self) -> &ExtendedKey {
        &self.master
    }

    /// Public key hash of the master key, the wallet's primary address.
    pub fn address(&self) -> Digest {
        self.master.pkh()
    }

    /// Derive (or fetch from cache) the child at `index`.
    pub fn derive(&mut self, index: u32) -> &ExtendedKey {
        let master = &self.master;
        let by_pkh = &mut self.by_pkh;
        self.children.entry(index).or_insert_with(|| {
            let child = master.derive_child(index);
            by_pkh.insert(child.pkh(), KeySlot::Child(index));
            child
        })
    }

    /// Derive the next unused child, advancing the internal index.
    pub fn next_key(&mut self) -> &ExtendedKey {
        let index = self.next_index;
        self.next_index = self.next_index.saturating_add(1);
        self.derive(index)
    }

    pub fn address_at(&mut self, index: u32) -> Digest {
        self.derive(index).pkh()
    }

    /// Signing key whose public key hashes to `pkh`, if derived.
    pub fn key_for(&self, pkh: &Digest) -> Option<&PrivateKey> {
        match self.by_pkh.get(pkh)? {
            KeySlot::Master => Some(self.master.private_key()),
            KeySlot::Child(index) => self.children.get(index).map(ExtendedKey::private_key),
        }
    }

    pub fn contains(&self, pkh: &Digest) -> bool {
        self.by_pkh.contains_key(pkh)
    }

    /// Derive every child below `n` so their hashes become known.
    pub fn restore_to_index(&mut self, n: u32) {
        for i in 0..n {
            self.derive(i);
        }
        self.next_index = self.next_index.max(n);
    }

    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Every public key hash the keyring can sign for.
    pub fn known_hashes(&self) -> impl Iterator<Item = &Digest> {
        self.by_pkh.keys()
    }
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("address", &self.address())
            .field("next_index", &self.next_index)
            .field("cached_keys", &self.children.len())
            .finish()
    }
}
