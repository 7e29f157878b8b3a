//! Kind-tagged key pairs and public keys.

use crate::{constants::*, encoding, errors::*, kinds::KeyKind};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Public half of an identity key.
///
/// This is the permanent identifier of an entity and the only part of a key
/// that is ever embedded in a claim.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    kind: KeyKind,
    bytes: [u8; PUBLIC_KEY_SIZE],
}

impl PublicKey {
    /// Create from raw bytes
    pub fn from_bytes(kind: KeyKind, bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self { kind, bytes }
    }

    /// Kind of identity this key belongs to
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.bytes
    }

    /// Prefixed text encoding
    pub fn encode(&self) -> String {
        encoding::encode_public(self.kind, &self.bytes)
    }

    /// Ed25519 verification key
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        VerifyingKey::from_bytes(&self.bytes).map_err(|e| KeyError::InvalidEncoding(e.to_string()))
    }

    /// Fail with [`KeyError::KeyMismatch`] unless this key is of `expected` kind
    pub fn expect_kind(&self, expected: KeyKind) -> Result<()> {
        if self.kind != expected {
            return Err(KeyError::KeyMismatch {
                expected,
                found: self.kind,
            });
        }
        Ok(())
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, bytes) = encoding::decode_public(s)?;
        Ok(Self { kind, bytes })
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.encode())
    }
}

/// Ed25519 signing key pair tagged with the kind of identity it belongs to.
///
/// `ed25519-dalek` zeroizes the signing key on drop.
#[derive(Clone)]
pub struct KeyPair {
    kind: KeyKind,
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new key pair using the OS random number generator
    pub fn generate(kind: KeyKind) -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { kind, signing_key }
    }

    /// Create a key pair from a raw seed
    pub fn from_seed(kind: KeyKind, seed: &[u8; SEED_SIZE]) -> Self {
        Self {
            kind,
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Decode an encoded seed (`S<prefix>...`)
    pub fn from_encoded_seed(input: &str) -> Result<Self> {
        let (kind, seed) = encoding::decode_seed(input)?;
        Ok(Self::from_seed(kind, &seed))
    }

    /// Kind of identity this key belongs to
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Public half
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_bytes(self.kind, self.signing_key.verifying_key().to_bytes())
    }

    /// Encoded seed
    ///
    /// # Security
    ///
    /// Only the key store should persist this value. Never log it.
    pub fn encoded_seed(&self) -> Zeroizing<String> {
        let seed = Zeroizing::new(self.signing_key.to_bytes());
        encoding::encode_seed(self.kind, &seed)
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("kind", &self.kind)
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}
