//! Shared fixtures for action tests.

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;
use trellis_actions::{run_action, AddAccount, AddOperator, ExecContext};
use trellis_keys::{Answer, KeyPair, ScriptedPrompter};
use trellis_storage::ClaimStore;

pub const OPERATOR: &str = "acme";

/// Temporary claim and key stores
pub struct TestEnv {
    pub store: TempDir,
    pub keys: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            store: tempfile::tempdir().unwrap(),
            keys: tempfile::tempdir().unwrap(),
        }
    }

    /// Non-interactive context targeting [`OPERATOR`]
    pub fn ctx(&self) -> ExecContext {
        self.base(Arc::new(ScriptedPrompter::default()))
            .with_operator(OPERATOR)
    }

    /// Interactive context answering with `answers`
    pub fn interactive(&self, answers: Vec<Answer>) -> (ExecContext, Arc<ScriptedPrompter>) {
        let prompter = Arc::new(ScriptedPrompter::new(answers));
        let ctx = self
            .base(prompter.clone())
            .with_operator(OPERATOR)
            .with_interactive(true);
        (ctx, prompter)
    }

    fn base(&self, prompter: Arc<ScriptedPrompter>) -> ExecContext {
        ExecContext::new(self.store.path(), self.keys.path(), prompter)
    }

    pub fn claim_store(&self) -> ClaimStore {
        ClaimStore::open(self.store.path(), OPERATOR).unwrap()
    }

    /// Create [`OPERATOR`] with a generated key
    pub async fn with_operator(self) -> Self {
        let mut action = AddOperator::default();
        action.entity.name = OPERATOR.to_string();
        action.entity.key_spec = Some("generate".to_string());
        let ctx = ExecContext::new(
            self.store.path(),
            self.keys.path(),
            Arc::new(ScriptedPrompter::default()),
        );
        run_action(&ctx, &mut action).await.unwrap();
        self
    }

    /// Add account `name` with a generated key
    pub async fn add_account(&self, name: &str) {
        let mut action = AddAccount::default();
        action.entity.name = name.to_string();
        action.entity.key_spec = Some("generate".to_string());
        run_action(&self.ctx(), &mut action).await.unwrap();
    }
}

pub fn text(value: &str) -> Answer {
    Answer::Text(value.to_string())
}

pub fn seed_of(pair: &KeyPair) -> String {
    pair.encoded_seed().to_string()
}
