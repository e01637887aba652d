//! Ed25519 keys and signatures.
//!
//! Public key hashes (BLAKE3 of the raw 32-byte key) are what `Pkh` lock
//! primitives commit to. Signatures are made over a transaction's 32-byte
//! signing payload, see [`UnsignedTransaction::signing_payload`].
//!
//! [`UnsignedTransaction::signing_payload`]: crate::tx::UnsignedTransaction::signing_payload

use bincode::de::{BorrowDecoder, Decoder};
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{BorrowDecode, Decode, Encode};
use ed25519_dalek::Signer;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

use crate::constants::{PRIVATE_KEY_LEN, PUBLIC_KEY_LEN, SIGNATURE_LEN};
use crate::error::KeyError;
use crate::types::Digest;

/// Ed25519 signing key. The secret is zeroized on drop.
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: ed25519_dalek::SigningKey,
}

impl PrivateKey {
    /// Random key from the OS RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Key from an exactly 32-byte secret.
    pub fn from_seed(secret: &[u8; PRIVATE_KEY_LEN]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(secret),
        }
    }

    /// Import a 32-byte secret.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let secret: Zeroizing<[u8; PRIVATE_KEY_LEN]> =
            Zeroizing::new(bytes.try_into().map_err(|_| KeyError::InvalidKeyEncoding {
                expected: PRIVATE_KEY_LEN,
                got: bytes.len(),
            })?);
        Ok(Self::from_seed(&secret))
    }

    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_LEN]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Hash of the matching public key.
    pub fn pkh(&self) -> Digest {
        self.public_key().pkh()
    }

    pub fn sign(&self, payload: &[u8]) -> Signature {
        Signature(self.signing_key.sign(payload).to_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Ed25519 verifying key.
#[derive(Clone, Copy)]
pub struct PublicKey {
    verifying_key: ed25519_dalek::VerifyingKey,
}

impl PublicKey {
    /// Import a 32-byte compressed point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; PUBLIC_KEY_LEN] =
            bytes.try_into().map_err(|_| KeyError::InvalidKeyEncoding {
                expected: PUBLIC_KEY_LEN,
                got: bytes.len(),
            })?;
        let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&arr)
            .map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { verifying_key })
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.verifying_key.to_bytes()
    }

    /// BLAKE3 hash of the raw key, as committed to by `Pkh` locks.
    pub fn pkh(&self) -> Digest {
        Digest::hash(&self.to_bytes())
    }

    /// Strict Ed25519 verification. Malformed signatures verify as `false`.
    pub fn verify(&self, payload: &[u8], signature: &Signature) -> bool {
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        self.verifying_key.verify_strict(payload, &sig).is_ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.to_bytes()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.to_bytes()))
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl Encode for PublicKey {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        Encode::encode(&self.to_bytes(), encoder)
    }
}

impl<Context> Decode<Context> for PublicKey {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let bytes = <[u8; PUBLIC_KEY_LEN] as Decode<Context>>::decode(decoder)?;
        Self::from_bytes(&bytes).map_err(|e| DecodeError::OtherString(e.to_string()))
    }
}

impl<'de, Context> BorrowDecode<'de, Context> for PublicKey {
    fn borrow_decode<D: BorrowDecoder<'de, Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, DecodeError> {
        <Self as Decode<Context>>::decode(decoder)
    }
}

/// Raw 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct Signature(pub [u8; SIGNATURE_LEN]);

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; SIGNATURE_LEN] =
            bytes
                .try_into()
                .map_err(|_| KeyError::InvalidSignatureEncoding {
                    expected: SIGNATURE_LEN,
                    got: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let key = PrivateKey::generate();
        let sig = key.sign(b"payload");
        assert!(key.public_key().verify(b"payload", &sig));
        assert!(!key.public_key().verify(b"other", &sig));
    }

    #[test]
    fn verify_with_wrong_key_is_false() {
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();
        let sig = a.sign(b"payload");
        assert!(!b.public_key().verify(b"payload", &sig));
    }

    #[test]
    fn malformed_signature_verifies_false() {
        let key = PrivateKey::generate();
        assert!(!key.public_key().verify(b"payload", &Signature([0xFF; 64])));
        assert!(!key.public_key().verify(b"payload", &Signature([0; 64])));
    }

    #[test]
    fn private_key_import_rejects_wrong_length() {
        assert_eq!(
            PrivateKey::from_bytes(&[1u8; 31]).unwrap_err(),
            KeyError::InvalidKeyEncoding {
                expected: 32,
                got: 31
            }
        );
        assert!(PrivateKey::from_bytes(&[1u8; 33]).is_err());
    }

    #[test]
    fn private_key_bytes_roundtrip() {
        let key = PrivateKey::generate();
        let again = PrivateKey::from_bytes(&key.to_bytes()[..]).unwrap();
        assert_eq!(key.public_key(), again.public_key());
    }

    #[test]
    fn public_key_import_checks_length() {
        assert!(matches!(
            PublicKey::from_bytes(&[0u8; 5]),
            Err(KeyError::InvalidKeyEncoding { expected: 32, got: 5 })
        ));
    }

    #[test]
    fn pkh_is_blake3_of_key() {
        let key = PrivateKey::generate();
        let pk = key.public_key();
        assert_eq!(pk.pkh(), Digest::hash(&pk.to_bytes()));
        assert_eq!(key.pkh(), pk.pkh());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let key = PrivateKey::from_bytes(&[0xAB; 32]).unwrap();
        let dbg = format!("{key:?}");
        assert!(!dbg.contains(&hex::encode([0xAB; 32])));
        assert!(dbg.contains("PrivateKey"));
    }

    #[test]
    fn signature_from_bytes_length() {
        assert!(Signature::from_bytes(&[0u8; 64]).is_ok());
        assert_eq!(
            Signature::from_bytes(&[0u8; 63]),
            Err(KeyError::InvalidSignatureEncoding {
                expected: 64,
                got: 63
            })
        );
    }

    #[test]
    fn serde_hex_roundtrip() {
        let key = PrivateKey::generate();
        let pk = key.public_key();
        let sig = key.sign(b"x");
        let pk_back: PublicKey = serde_json::from_str(&serde_json::to_string(&pk).unwrap()).unwrap();
        let sig_back: Signature =
            serde_json::from_str(&serde_json::to_string(&sig).unwrap()).unwrap();
        assert_eq!(pk_back, pk);
        assert_eq!(sig_back, sig);
    }

    #[test]
    fn deterministic_signatures() {
        let key = PrivateKey::from_bytes(&[7u8; 32]).unwrap();
        assert_eq!(key.sign(b"m"), key.sign(b"m"));
    }
}
