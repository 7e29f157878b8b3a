use crate::{
    context::ExecContext,
    entity::{Entity, Signer},
    errors::*,
    lifecycle::Action,
    prompts,
    report::Report,
};
use async_trait::async_trait;
use tracing::info;
use trellis_claims::{Claim, ClaimBody, OperatorEdit};
use trellis_keys::KeyKind;
use trellis_storage::{ClaimStore, StoreError};

fn prompt_account_server_url(ctx: &ExecContext, edit: &mut OperatorEdit, current: &str) -> Result<()> {
    let url = ctx
        .prompter()
        .prompt("account server url (blank for none)", current, None)?;
    edit.account_server_url = Some(url.trim().to_string());
    Ok(())
}

/// Create an operator and its claim store.
///
/// The operator claim is self-signed, so the operator key must include its seed.
#[derive(Debug, Clone)]
pub struct AddOperator {
    pub entity: Entity,
    pub edit: OperatorEdit,
}

impl Default for AddOperator {
    fn default() -> Self {
        Self {
            entity: Entity::new(KeyKind::Operator),
            edit: OperatorEdit::default(),
        }
    }
}

#[async_trait]
impl Action for AddOperator {
    async fn set_defaults(&mut self, _ctx: &ExecContext) -> Result<()> {
        self.entity.kind = KeyKind::Operator;
        self.entity.create = true;
        Ok(())
    }

    async fn pre_interactive(&mut self, ctx: &ExecContext) -> Result<()> {
        self.entity.edit(ctx)?;
        prompts::edit_time_params(ctx, &mut self.edit.time)?;
        prompt_account_server_url(ctx, &mut self.edit, "")
    }

    async fn load(&mut self, _ctx: &ExecContext) -> Result<()> {
        Ok(())
    }

    async fn post_interactive(&mut self, _ctx: &ExecContext) -> Result<()> {
        Ok(())
    }

    async fn validate(&mut self, ctx: &ExecContext) -> Result<()> {
        self.entity.valid(ctx)?;
        self.edit.time.validate()?;
        if ClaimStore::open(ctx.store_root(), &self.entity.name).is_ok() {
            return Err(StoreError::AlreadyExists {
                kind: KeyKind::Operator,
                name: self.entity.name.clone(),
            }
            .into());
        }
        let self_signed = self
            .entity
            .resolution()
            .map_or(false, |r| r.key.key_pair().is_some());
        if !self_signed {
            return Err(ActionError::usage(
                "an operator seed is required to sign the operator claim",
            ));
        }
        Ok(())
    }

    async fn run(&mut self, ctx: &ExecContext) -> Result<Report> {
        let pair = self
            .entity
            .resolution()
            .and_then(|r| r.key.key_pair())
            .cloned()
            .ok_or_else(|| ActionError::usage("operator key is not resolved"))?;

        let (_, token) = self.entity.seal_claim(&pair, &self.edit, None)?;
        let store = ClaimStore::create(ctx.store_root(), &self.entity.name, &token)?;

        let keys = ctx.key_store_for(&self.entity.name);
        self.entity.store_keys(&keys, None)?;
        info!(operator = %store.name(), "added operator");
        Ok(self.entity.report("added"))
    }
}

/// Edit the selected operator's claim
#[derive(Debug, Clone)]
pub struct EditOperator {
    pub signer: Signer,
    pub edit: OperatorEdit,
    entity: Entity,
    previous: Option<Claim>,
}

impl Default for EditOperator {
    fn default() -> Self {
        Self {
            signer: Signer::new(KeyKind::Operator),
            edit: OperatorEdit::default(),
            entity: Entity::new(KeyKind::Operator),
            previous: None,
        }
    }
}

#[async_trait]
impl Action for EditOperator {
    async fn set_defaults(&mut self, _ctx: &ExecContext) -> Result<()> {
        self.entity.create = false;
        Ok(())
    }

    async fn pre_interactive(&mut self, _ctx: &ExecContext) -> Result<()> {
        Ok(())
    }

    async fn load(&mut self, ctx: &ExecContext) -> Result<()> {
        let store = ctx.claim_store()?;
        let claim = store.read_operator_claim()?;
        self.entity.name = store.name().to_string();
        self.signer.load(&ctx.key_store()?, &claim.subject_key()?)?;
        self.previous = Some(claim);
        Ok(())
    }

    async fn post_interactive(&mut self, ctx: &ExecContext) -> Result<()> {
        let Some(previous) = &self.previous else {
            return Ok(());
        };
        prompts::edit_time_params(ctx, &mut self.edit.time)?;
        let current = match &previous.body {
            ClaimBody::Operator(operator) => operator.account_server_url.clone().unwrap_or_default(),
            _ => String::new(),
        };
        prompt_account_server_url(ctx, &mut self.edit, &current)?;
        let subject = previous.subject_key()?;
        self.signer.prompt(ctx, &subject)
    }

    async fn validate(&mut self, ctx: &ExecContext) -> Result<()> {
        if !ctx.interactive() && self.edit == OperatorEdit::default() {
            return Err(ActionError::usage("specify an edit option"));
        }
        self.edit.time.validate()?;
        self.signer.require()?;
        Ok(())
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
