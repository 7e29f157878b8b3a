use thiserror::Error;
use trellis_claims::ClaimError;
use trellis_keys::KeyKind;
use trellis_storage::StoreError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned no data")]
    NoData { url: String },

    #[error("{url} returned an invalid token: {source}")]
    Decode {
        url: String,
        #[source]
        source: ClaimError,
    },

    #[error("{url} returned a {kind} token; only operator and account tokens can be pulled")]
    UnsupportedType { url: String, kind: KeyKind },

    #[error("{url} returned {kind} {found} instead of {expected}")]
    SubjectMismatch {
        url: String,
        kind: KeyKind,
        expected: String,
        found: String,
    },

    #[error("remote {kind} {local:?} is named {remote:?}; rename it locally before pulling")]
    Renamed {
        kind: KeyKind,
        local: String,
        remote: String,
    },

    #[error("local {kind} {name:?} is newer than the remote copy; pull with --overwrite to replace it")]
    Conflict { kind: KeyKind, name: String },

    #[error("fetch of {url} did not complete")]
    Aborted { url: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
