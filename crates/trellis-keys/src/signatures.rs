//! Digital signature operations using Ed25519.

use crate::{constants::*, errors::*, keys::{KeyPair, PublicKey}};
use ed25519_dalek::{Signature, Verifier};

/// Sign a message with Ed25519
///
/// # Returns
///
/// 64-byte Ed25519 signature
pub fn sign_message(keypair: &KeyPair, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
    keypair.sign(message)
}

/// Verify an Ed25519 signature
///
/// # Returns
///
/// `Ok(())` if signature is valid, `Err` otherwise
pub fn verify_signature(public_key: &PublicKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let signature: [u8; SIGNATURE_SIZE] =
        signature
            .try_into()
            .map_err(|_| KeyError::InvalidKeySize {
                expected: SIGNATURE_SIZE,
                actual: signature.len(),
            })?;

    let verifying_key = public_key.verifying_key()?;
    let sig = Signature::from_bytes(&signature);

    verifying_key
        .verify(message, &sig)
        .map_err(|_| KeyError::SignatureVerificationFailed)
}
