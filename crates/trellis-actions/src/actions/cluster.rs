use crate::{
    context::ExecContext,
    entity::{Entity, Signer},
    errors::*,
    lifecycle::Action,
    prompts,
    report::Report,
};
use async_trait::async_trait;
use trellis_claims::ClusterEdit;
use trellis_keys::{KeyKind, PublicKey};
use trellis_storage::StoreError;

/// Add a cluster signed by the selected operator.
///
/// The cluster trusts its issuing operator unless other operators are given.
#[derive(Debug, Clone)]
pub struct AddCluster {
    pub entity: Entity,
    pub signer: Signer,
    pub edit: ClusterEdit,
    operator_key: Option<PublicKey>,
}

impl Default for AddCluster {
    fn default() -> Self {
        Self {
            entity: Entity::new(KeyKind::Cluster),
            signer: Signer::new(KeyKind::Operator),
            edit: ClusterEdit::default(),
            operator_key: None,
        }
    }
}

#[async_trait]
impl Action for AddCluster {
    async fn set_defaults(&mut self, _ctx: &ExecContext) -> Result<()> {
        self.entity.kind = KeyKind::Cluster;
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
        if self.edit.trust.is_empty() {
            self.edit.trust.push(operator);
        }
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
            return Err(ActionError::usage("cluster name is required"));
        }
        self.edit.time.validate()?;
        let store = ctx.claim_store()?;
        if store.has(KeyKind::Cluster, None, &self.entity.name) {
            return Err(StoreError::AlreadyExists {
                kind: KeyKind::Cluster,
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
