//! Key error types.

use crate::kinds::KeyKind;
use crate::prompt::PromptError;
use std::path::PathBuf;
use thiserror::Error;

/// Key encoding, resolution and signing errors
#[derive(Debug, Error)]
pub enum KeyError {
    /// The string is not a valid encoded key
    #[error("Invalid key encoding: {0}")]
    InvalidEncoding(String),

    /// The key prefix does not name a known kind
    #[error("Unknown key prefix: {0:?}")]
    UnknownPrefix(char),

    /// The embedded checksum does not match the key bytes
    #[error("Key checksum mismatch")]
    ChecksumMismatch,

    /// Decoded payload has the wrong length
    #[error("Invalid key size: expected {expected}, got {actual}")]
    InvalidKeySize {
        /// Expected size in bytes
        expected: usize,
        /// Actual size in bytes
        actual: usize,
    },

    /// The resolved key is not of the expected kind
    #[error("specified key is not a valid {expected} key (found {found} key)")]
    KeyMismatch {
        /// Kind the caller asked for
        expected: KeyKind,
        /// Kind of the key that was supplied
        found: KeyKind,
    },

    /// No key could be resolved and prompting is not allowed
    #[error("no {kind} key was provided and none could be resolved")]
    MissingKey {
        /// Kind the caller asked for
        kind: KeyKind,
    },

    /// A private key was required but only a public key is known
    #[error("{0} is a public key - a seed is required to sign")]
    PublicOnly(String),

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Reading a key file failed
    #[error("error reading key file {path:?}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Interactive prompting failed
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Result type for key operations
pub type Result<T> = std::result::Result<T, KeyError>;
