//! The action lifecycle.
//!
//! Every command that creates or edits an entity runs the same phases:
//!
//! ```text
//! SetDefaults -> [PreInteractive] -> Load -> [PostInteractive] -> Validate -> Run
//! ```
//!
//! The bracketed phases only run in interactive mode. The first failing
//! phase stops the action; nothing is written before `Run`.

use crate::{context::ExecContext, errors::*, report::Report};
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    SetDefaults,
    PreInteractive,
    Load,
    PostInteractive,
    Validate,
    Run,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::SetDefaults => "set-defaults",
            Phase::PreInteractive => "pre-interactive",
            Phase::Load => "load",
            Phase::PostInteractive => "post-interactive",
            Phase::Validate => "validate",
            Phase::Run => "run",
        })
    }
}

/// A command built on the lifecycle.
///
/// All six phases must be provided; a phase an action does not need is an
/// empty `Ok(())`.
#[async_trait]
pub trait Action: Send {
    /// In-memory defaults only; no I/O
    async fn set_defaults(&mut self, ctx: &ExecContext) -> Result<()>;

    /// Prompt for missing fields and keys (interactive only)
    async fn pre_interactive(&mut self, ctx: &ExecContext) -> Result<()>;

    /// Load existing state needed for validation; never prompts
    async fn load(&mut self, ctx: &ExecContext) -> Result<()>;

    /// Follow-up prompts once state is loaded (interactive only)
    async fn post_interactive(&mut self, ctx: &ExecContext) -> Result<()>;

    /// Check parameters, uniqueness and cross-field constraints
    async fn validate(&mut self, ctx: &ExecContext) -> Result<()>;

    /// Perform the mutation
    async fn run(&mut self, ctx: &ExecContext) -> Result<Report>;
}

fn at(phase: Phase) -> impl FnOnce(ActionError) -> LifecycleError {
    move |source| LifecycleError { phase, source }
}

/// Run `action` through its phases
pub async fn run_action<A>(ctx: &ExecContext, action: &mut A) -> std::result::Result<Report, LifecycleError>
where
    A: Action + ?Sized,
{
    debug!(phase = %Phase::SetDefaults, "entering phase");
    action.set_defaults(ctx).await.map_err(at(Phase::SetDefaults))?;

    if ctx.interactive() {
        debug!(phase = %Phase::PreInteractive, "entering phase");
        action
            .pre_interactive(ctx)
            .await
            .map_err(at(Phase::PreInteractive))?;
    }

    debug!(phase = %Phase::Load, "entering phase");
    action.load(ctx).await.map_err(at(Phase::Load))?;

    if ctx.interactive() {
        debug!(phase = %Phase::PostInteractive, "entering phase");
        action
            .post_interactive(ctx)
            .await
            .map_err(at(Phase::PostInteractive))?;
    }

    debug!(phase = %Phase::Validate, "entering phase");
    action.validate(ctx).await.map_err(at(Phase::Validate))?;

    debug!(phase = %Phase::Run, "entering phase");
    let report = action.run(ctx).await.map_err(at(Phase::Run))?;
    info!(errors = report.error_count(), "action completed");
    Ok(report)
}
