//! The `pull` action.

use crate::{fetch::Fetcher, job::PullJob};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use trellis_actions::{prompts, Action, ActionError, ExecContext, Report, Result};
use trellis_claims::ClaimBody;
use trellis_keys::KeyKind;
use trellis_storage::StoreError;

/// Replace local operator and account claims with the account server's copies.
///
/// All fetches run concurrently; the store is only written once every fetch
/// has finished, one job at a time and in job order. A failed job becomes an
/// error line in the report and does not stop the others.
pub struct Pull {
    /// Pull the operator and every account
    pub all: bool,
    /// Pull a single account
    pub account: Option<String>,
    /// Replace local claims even when they are newer
    pub overwrite: bool,
    fetcher: Arc<dyn Fetcher>,
    server_url: Option<String>,
    jobs: Vec<PullJob>,
}

impl Pull {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            all: false,
            account: None,
            overwrite: false,
            fetcher,
            server_url: None,
            jobs: Vec::new(),
        }
    }

    async fn fetch_all(&mut self) {
        let mut tasks = JoinSet::new();
        for (index, job) in self.jobs.iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let url = job.url.clone();
            debug!(url = %url, "dispatching pull job");
            tasks.spawn(async move { (index, fetcher.fetch(&url).await) });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => self.jobs[index].result = Some(result),
                Err(e) => warn!(error = %e, "pull task did not complete"),
            }
        }
    }
}

impl fmt::Debug for Pull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pull")
            .field("all", &self.all)
            .field("account", &self.account)
            .field("overwrite", &self.overwrite)
            .field("server_url", &self.server_url)
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Action for Pull {
    async fn set_defaults(&mut self, _ctx: &ExecContext) -> Result<()> {
        if self.all {
            self.account = None;
        }
        Ok(())
    }

    async fn pre_interactive(&mut self, ctx: &ExecContext) -> Result<()> {
        if self.all || self.account.is_some() {
            return Ok(());
        }
        self.all = ctx.prompter().confirm("pull the operator and all accounts", true)?;
        if !self.all {
            let store = ctx.claim_store()?;
            let current = prompts::default_parent(ctx, &store, KeyKind::Account, None)?;
            self.account = Some(prompts::select_parent(
                ctx,
                &store,
                KeyKind::Account,
                current.as_deref(),
            )?);
        }
        Ok(())
    }

    async fn load(&mut self, ctx: &ExecContext) -> Result<()> {
        let store = ctx.claim_store()?;
        let operator = store.read_operator_claim()?;
        self.server_url = match &operator.body {
            ClaimBody::Operator(body) => body.account_server_url.clone(),
            _ => None,
        };
        let Some(server_url) = self.server_url.clone() else {
            return Ok(());
        };

        self.jobs.clear();
        if self.all {
            self.jobs.push(PullJob::operator(&operator, &server_url));
            for name in store.list(KeyKind::Account, None)? {
                let claim = store.read_account_claim(&name)?;
                self.jobs.push(PullJob::account(&claim, &server_url));
            }
        } else if let Some(name) = &self.account {
            if store.has(KeyKind::Account, None, name) {
                let claim = store.read_account_claim(name)?;
                self.jobs.push(PullJob::account(&claim, &server_url));
            }
        }
        Ok(())
    }

    async fn post_interactive(&mut self, _ctx: &ExecContext) -> Result<()> {
        Ok(())
    }

    async fn validate(&mut self, _ctx: &ExecContext) -> Result<()> {
        if !self.all && self.account.is_none() {
            return Err(ActionError::usage("specify --all or an account"));
        }
        if self.server_url.is_none() {
            return Err(ActionError::usage(
                "operator has no account server url; set one with `edit operator --account-server-url`",
            ));
        }
        if let (false, Some(name)) = (self.all, &self.account) {
            if self.jobs.is_empty() {
                return Err(StoreError::NotFound {
                    kind: KeyKind::Account,
                    name: name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    async fn run(&mut self, ctx: &ExecContext) -> Result<Report> {
        self.fetch_all().await;

        let store = ctx.claim_store()?;
        let mut report = Report::new();
        for job in self.jobs.drain(..) {
            let (kind, name) = (job.kind, job.name.clone());
            match job.reconcile(&store, self.overwrite) {
                Ok(pulled) if pulled.replaced_newer => {
                    report.warn(format!("{}; replaced a newer local copy", pulled.message))
                }
                Ok(pulled) => report.ok(pulled.message),
                Err(e) => report.error(format!("{} {:?}: {}", kind, name, e)),
            }
        }
        info!(errors = report.error_count(), "pull finished");
        Ok(report)
    }
}
