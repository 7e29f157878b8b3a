use crate::lifecycle::Phase;
use thiserror::Error;
use trellis_claims::ClaimError;
use trellis_keys::{KeyError, PromptError};
use trellis_storage::StoreError;

#[derive(Error, Debug)]
pub enum ActionError {
    /// Missing or contradictory parameters
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl ActionError {
    pub fn usage(message: impl Into<String>) -> Self {
        ActionError::Usage(message.into())
    }
}

/// An action failed in `phase`
#[derive(Error, Debug)]
#[error("{source}")]
pub struct LifecycleError {
    pub phase: Phase,
    #[source]
    pub source: ActionError,
}

impl LifecycleError {
    /// Whether the command's usage text should be shown.
    ///
    /// Validation failures are usage errors; everything else is a runtime error.
    pub fn show_usage(&self) -> bool {
        self.phase == Phase::Validate
    }
}

pub type Result<T> = std::result::Result<T, ActionError>;
