use crate::{
    context::ExecContext,
    entity::{Entity, Signer},
    errors::*,
    lifecycle::Action,
    prompts,
    report::Report,
};
use async_trait::async_trait;
use trellis_claims::ServerEdit;
use trellis_keys::{KeyKind, PublicKey};
use trellis_storage::StoreError;

/// Add a server signed by one of the operator's clusters
#[derive(Debug, Clone)]
pub struct AddServer {
    pub entity: Entity,
    pub signer: Signer,
    pub edit: ServerEdit,
    /// Cluster the server belongs to
    pub cluster: Option<String>,
    cluster_key: Option<PublicKey>,
}

impl Default for AddServer {
    fn default() -> Self {
        Self {
            entity: Entity::new(KeyKind::Server),
            signer: Signer::new(KeyKind::Cluster),
            edit: ServerEdit::default(),
            cluster: None,
            cluster_key: None,
        }
    }
}

#[async_trait]
impl Action for AddServer {
    async fn set_defaults(&mut self, _ctx: &ExecContext) -> Result<()> {
        self.entity.kind = KeyKind::Server;
        self.entity.create = true;
        Ok(())
    }

    async fn pre_interactive(&mut self, ctx: &ExecContext) -> Result<()> {
        let store = ctx.claim_store()?;
        let current = prompts::default_parent(ctx, &store, KeyKind::Cluster, self.cluster.as_deref())?;
        self.cluster = Some(prompts::select_parent(
            ctx,
            &store,
            KeyKind::Cluster,
            current.as_deref(),
        )?);
        self.entity.edit(ctx)?;
        prompts::edit_time_params(ctx, &mut self.edit.time)
    }

    async fn load(&mut self, ctx: &ExecContext) -> Result<()> {
        let store = ctx.claim_store()?;
        self.cluster = prompts::default_parent(ctx, &store, KeyKind::Cluster, self.cluster.as_deref())?;
        if let Some(cluster) = &self.cluster {
            if store.has(KeyKind::Cluster, None, cluster) {
                let key = store.read_cluster_claim(cluster)?.subject_key()?;
                self.signer.load(&ctx.key_store()?, &key)?;
                self.cluster_key = Some(key);
            }
        }
        Ok(())
    }

    async fn post_interactive(&mut self, ctx: &ExecContext) -> Result<()> {
        match &self.cluster_key {
            Some(key) => self.signer.prompt(ctx, key),
            None => Ok(()),
        }
    }

    async fn validate(&mut self, ctx: &ExecContext) -> Result<()> {
        let cluster = self
            .cluster
            .clone()
            .ok_or_else(|| ActionError::usage("a cluster is required; name one with --cluster"))?;
        if self.cluster_key.is_none() {
            return Err(StoreError::NotFound {
                kind: KeyKind::Cluster,
                name: cluster,
            }
            .into());
        }
        if self.entity.name.is_empty() {
            return Err(ActionError::usage("server name is required"));
        }
        self.edit.time.validate()?;
        let store = ctx.claim_store()?;
        if store.has(KeyKind::Server, Some(&cluster), &self.entity.name) {
            return Err(StoreError::AlreadyExists {
                kind: KeyKind::Server,
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
            .store_keys(&ctx.key_store()?, self.cluster.as_deref())?;
        Ok(self.entity.report("added"))
    }
}
