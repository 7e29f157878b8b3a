use crate::{
    context::ExecContext,
    entity::{Entity, Signer},
    errors::*,
    lifecycle::Action,
    prompts,
    report::Report,
};
use async_trait::async_trait;
use trellis_claims::{AccountEdit, Claim, ClaimBody};
use trellis_keys::{KeyKind, PublicKey};
use trellis_storage::StoreError;

/// Add an account signed by the selected operator
#[derive(Debug, Clone)]
pub struct AddAccount {
    pub entity: Entity,
    pub signer: Signer,
    pub edit: AccountEdit,
    operator_key: Option<PublicKey>,
}

impl Default for AddAccount {
    fn default() -> Self {
        Self {
            entity: Entity::new(KeyKind::Account),
            signer: Signer::new(KeyKind::Operator),
            edit: AccountEdit::default(),
            operator_key: None,
        }
    }
}

#[async_trait]
impl Action for AddAccount {
    async fn set_defaults(&mut self, _ctx: &ExecContext) -> Result<()> {
        self.entity.kind = KeyKind::Account;
        self.entity.create = true;
        Ok(())
    }

    async fn pre_interactive(&mut self, ctx: &ExecContext) -> Result<()> {
        self.entity.edit(ctx)?;
        prompts::edit_time_params(ctx, &mut self.edit.time)
    }

    async fn load(&mut self, ctx: &ExecContext) -> Result<()> {
        let store = ctx.claim_store()?;
        let operator: PublicKey = store.operator_key().parse()?;
        self.signer.load(&ctx.key_store()?, &operator)?;
        self.operator_key = Some(operator);
        Ok(())
    }

    async fn post_interactive(&mut self, ctx: &ExecContext) -> Result<()> {
        match &self.operator_key {
            Some(operator) => self.signer.prompt(ctx, operator),
            None => Ok(()),
        }
    }

    async fn validate(&mut self, ctx: &ExecContext) -> Result<()> {
        if self.entity.name.is_empty() {
            return Err(ActionError::usage("account name is required"));
        }
        self.edit.time.validate()?;
        let store = ctx.claim_store()?;
        if store.has(KeyKind::Account, None, &self.entity.name) {
            return Err(StoreError::AlreadyExists {
                kind: KeyKind::Account,
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
        self.entity.store_keys(&ctx.key_store()?, None)?;
        Ok(self.entity.report("added"))
    }
}

/// Edit an existing account
#[derive(Debug, Clone)]
pub struct EditAccount {
    pub entity: Entity,
    pub signer: Signer,
    pub edit: AccountEdit,
    previous: Option<Claim>,
}

impl Default for EditAccount {
    fn default() -> Self {
        Self {
            entity: Entity::new(KeyKind::Account),
            signer: Signer::new(KeyKind::Operator),
            edit: AccountEdit::default(),
            previous: None,
        }
    }
}

#[async_trait]
impl Action for EditAccount {
    async fn set_defaults(&mut self, _ctx: &ExecContext) -> Result<()> {
        self.entity.kind = KeyKind::Account;
        self.entity.create = false;
        Ok(())
    }

    async fn pre_interactive(&mut self, ctx: &ExecContext) -> Result<()> {
        let store = ctx.claim_store()?;
        let current = prompts::default_parent(ctx, &store, KeyKind::Account, Some(self.entity.name.as_str()))?;
        self.entity.name = prompts::select_parent(ctx, &store, KeyKind::Account, current.as_deref())?;
        Ok(())
    }

    async fn load(&mut self, ctx: &ExecContext) -> Result<()> {
        let store = ctx.claim_store()?;
        if let Some(name) =
            prompts::default_parent(ctx, &store, KeyKind::Account, Some(self.entity.name.as_str()))?
        {
            self.entity.name = name;
        }
        if !self.entity.name.is_empty() && store.has(KeyKind::Account, None, &self.entity.name) {
            let claim = store.read_account_claim(&self.entity.name)?;
            self.signer.load(&ctx.key_store()?, &claim.issuer_key()?)?;
            self.previous = Some(claim);
        }
        Ok(())
    }

    async fn post_interactive(&mut self, ctx: &ExecContext) -> Result<()> {
        let Some(previous) = &self.previous else {
            return Ok(());
        };
        let issuer = previous.issuer_key()?;
        if let ClaimBody::Account(account) = &previous.body {
            let limits = account.limits;
            let edit = &mut self.edit;
            edit.max_connections.get_or_insert(limits.conn);
            edit.max_subscriptions.get_or_insert(limits.subs);
            edit.max_data.get_or_insert(limits.data);
            edit.max_payload.get_or_insert(limits.payload);
            prompts::edit_limit(ctx, "max connections (-1 is unlimited)", &mut edit.max_connections)?;
            prompts::edit_limit(ctx, "max subscriptions (-1 is unlimited)", &mut edit.max_subscriptions)?;
            prompts::edit_limit(ctx, "max data in bytes (-1 is unlimited)", &mut edit.max_data)?;
            prompts::edit_limit(ctx, "max payload in bytes (-1 is unlimited)", &mut edit.max_payload)?;
        }
        prompts::edit_time_params(ctx, &mut self.edit.time)?;
        self.signer.prompt(ctx, &issuer)
    }

    async fn validate(&mut self, ctx: &ExecContext) -> Result<()> {
        if self.entity.name.is_empty() {
            return Err(ActionError::usage(
                "an account is required; name one with --name",
            ));
        }
        if self.previous.is_none() {
            return Err(StoreError::NotFound {
                kind: KeyKind::Account,
                name: self.entity.name.clone(),
            }
            .into());
        }
        if !ctx.interactive() && self.edit == AccountEdit::default() {
            return Err(ActionError::usage("specify an edit option"));
        }
        self.edit.time.validate()?;
        self.signer.require()?;
        self.entity.valid(ctx)
    }

    async fn run(&mut self, ctx: &ExecContext) -> Result<Report> {
        let store = ctx.claim_store()?;
        self.entity.generate_claim(
            self.signer.require()?,
            &self.edit,
            self.previous.as_ref(),
            &store,
        )?;
        Ok(self.entity.report("edited"))
    }
}
