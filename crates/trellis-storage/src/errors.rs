//! Storage error types.

use std::path::PathBuf;
use thiserror::Error;
use trellis_claims::ClaimError;
use trellis_keys::{KeyError, KeyKind};

/// Claim store and key store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("IO error at {path:?}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// No entity with that name
    #[error("{kind} {name:?} does not exist")]
    NotFound {
        /// Entity kind
        kind: KeyKind,
        /// Entity name
        name: String,
    },

    /// An entity with that name already exists under the same parent
    #[error("{kind} {name:?} already exists")]
    AlreadyExists {
        /// Entity kind
        kind: KeyKind,
        /// Entity name
        name: String,
    },

    /// Users and servers are addressed through their account or cluster
    #[error("a parent name is required to address a {kind}")]
    MissingParent {
        /// Entity kind
        kind: KeyKind,
    },

    /// No local parent entity matches a token's issuer
    #[error("no local {kind} issued {issuer}")]
    UnknownIssuer {
        /// Kind of the missing parent
        kind: KeyKind,
        /// Issuer public key from the token
        issuer: String,
    },

    /// Names become path components and must be plain
    #[error("invalid name {0:?}")]
    InvalidName(String),

    /// Store info file is missing or unreadable
    #[error("{0:?} is not a trellis store")]
    NotAStore(PathBuf),

    /// Claim decoding or validation error
    #[error("Claim error: {0}")]
    Claim(#[from] ClaimError),

    /// Key decoding error
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;

pub(crate) fn io_error(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.into();
    move |source| StoreError::Io { path, source }
}
