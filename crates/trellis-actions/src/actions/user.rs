use crate::{
    context::ExecContext,
    entity::{Entity, Signer},
    errors::*,
    lifecycle::Action,
    prompts,
    report::Report,
};
use async_trait::async_trait;
use trellis_claims::UserEdit;
use trellis_keys::{KeyKind, PublicKey};
use trellis_storage::StoreError;

/// Add a user signed by one of the operator's accounts
#[derive(Debug, Clone)]
pub struct AddUser {
    pub entity: Entity,
    pub signer: Signer,
    pub edit: UserEdit,
    /// Account the user belongs to
    pub account: Option<String>,
    account_key: Option<PublicKey>,
}

impl Default for AddUser {
    fn default() -> Self {
        Self {
            entity: Entity::new(KeyKind::User),
            signer: Signer::new(KeyKind::Account),
            edit: UserEdit::default(),
            account: None,
            account_key: None,
        }
    }
}

#[async_trait]
impl Action for AddUser {
    async fn set_defaults(&mut self, _ctx: &ExecContext) -> Result<()> {
        self.entity.kind = KeyKind::User;
        self.entity.create = true;
        Ok(())
    }

    async fn pre_interactive(&mut self, ctx: &ExecContext) -> Result<()> {
        let store = ctx.claim_store()?;
        let current = prompts::default_parent(ctx, &store, KeyKind::Account, self.account.as_deref())?;
        self.account = Some(prompts::select_parent(
            ctx,
            &store,
            KeyKind::Account,
            current.as_deref(),
        )?);
        self.entity.edit(ctx)?;
        prompts::edit_time_params(ctx, &mut self.edit.time)
    }

    async fn load(&mut self, ctx: &ExecContext) -> Result<()> {
        let store = ctx.claim_store()?;
        self.account = prompts::default_parent(ctx, &store, KeyKind::Account, self.account.as_deref())?;
        if let Some(account) = &self.account {
            if store.has(KeyKind::Account, None, account) {
                let key = store.read_account_claim(account)?.subject_key()?;
                self.signer.load(&ctx.key_store()?, &key)?;
                self.account_key = Some(key);
            }
        }
        Ok(())
    }

    async fn post_interactive(&mut self, ctx: &ExecContext) -> Result<()> {
        match &self.account_key {
            Some(key) => self.signer.prompt(ctx, key),
            None => Ok(()),
        }
    }

    async fn validate(&mut self, ctx: &ExecContext) -> Result<()> {
        let account = self
            .account
            .clone()
            .ok_or_else(|| ActionError::usage("an account is required; name one with --account"))?;
        if self.account_key.is_none() {
            return Err(StoreError::NotFound {
                kind: KeyKind::Account,
                name: account,
            }
            .into());
        }
        if self.entity.name.is_empty() {
            return Err(ActionError::usage("user name is required"));
        }
        self.edit.time.validate()?;
        let store = ctx.claim_store()?;
        if store.has(KeyKind::User, Some(&account), &self.entity.name) {
            return Err(StoreError::AlreadyExists {
                kind: KeyKind::User,
                name: self.entity.name.clone(),
            }
            .into());
        }
        self.signer.require()?;
        self.entity.valid(ctx)
    }

    async fn run(&mut self, ctx: &ExecContext) -> Result<Report> {
        let store = ctx.claim_store()?;
        self.entity
            .generate_claim(self.signer.require()?, &self.edit, None, &store)?;
        self.entity
            .store_keys(&ctx.key_store()?, self.account.as_deref())?;
        Ok(self.entity.report("added"))
    }
}
