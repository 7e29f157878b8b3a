//! Per-invocation execution context.

use crate::errors::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trellis_keys::{KeyResolver, Prompter, ResolveMode};
use trellis_storage::{ClaimStore, KeyStore, OperatorContext};

/// Everything an action needs to know about its environment.
///
/// Built once before the action starts and never changed afterwards. The
/// operator selection lives here rather than in any global state.
#[derive(Clone)]
pub struct ExecContext {
    store_root: PathBuf,
    keys_root: PathBuf,
    operator: Option<OperatorContext>,
    account: Option<String>,
    interactive: bool,
    prompter: Arc<dyn Prompter>,
}

impl ExecContext {
    pub fn new(
        store_root: impl Into<PathBuf>,
        keys_root: impl Into<PathBuf>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            store_root: store_root.into(),
            keys_root: keys_root.into(),
            operator: None,
            account: None,
            interactive: false,
            prompter,
        }
    }

    /// Target operator `name`
    pub fn with_operator(mut self, name: impl Into<String>) -> Self {
        self.operator = Some(OperatorContext::new(self.store_root.clone(), name));
        self
    }

    /// Account used when a command does not name one
    pub fn with_account(mut self, name: Option<String>) -> Self {
        self.account = name;
        self
    }

    /// Run the interactive phases and allow prompting
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn store_root(&self) -> &Path {
        &self.store_root
    }

    pub fn keys_root(&self) -> &Path {
        &self.keys_root
    }

    pub fn operator(&self) -> Option<&OperatorContext> {
        self.operator.as_ref()
    }

    pub fn default_account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn prompter(&self) -> &dyn Prompter {
        self.prompter.as_ref()
    }

    /// Key resolver honouring the interactive flag
    pub fn resolver(&self) -> KeyResolver<'_> {
        let mode = if self.interactive {
            ResolveMode::Interactive
        } else {
            ResolveMode::NonInteractive
        };
        KeyResolver::new(mode, self.prompter.as_ref())
    }

    fn require_operator(&self) -> Result<&OperatorContext> {
        self.operator
            .as_ref()
            .ok_or_else(|| ActionError::usage("no operator selected; set one with --operator"))
    }

    /// Claim store of the selected operator
    pub fn claim_store(&self) -> Result<ClaimStore> {
        Ok(self.require_operator()?.open_store()?)
    }

    /// Key store of the selected operator
    pub fn key_store(&self) -> Result<KeyStore> {
        let operator = self.require_operator()?;
        Ok(self.key_store_for(operator.operator()))
    }

    /// Key store for operator `name`, which need not exist yet
    pub fn key_store_for(&self, name: &str) -> KeyStore {
        KeyStore::new(self.keys_root.clone(), name)
    }
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("store_root", &self.store_root)
            .field("keys_root", &self.keys_root)
            .field("operator", &self.operator)
            .field("account", &self.account)
            .field("interactive", &self.interactive)
            .finish_non_exhaustive()
    }
}
