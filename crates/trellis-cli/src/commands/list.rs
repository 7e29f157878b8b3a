/*!
 * List command
 */

use super::{EntityKind, Outcome};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::*;
use std::sync::Arc;
use trellis_actions::{prompts, ExecContext};
use trellis_keys::{KeyKind, Prompter};
use trellis_storage::ClaimStore;

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// What to list
    #[arg(value_enum)]
    pub kind: EntityKind,

    /// Account whose users are listed
    #[arg(short, long)]
    pub account: Option<String>,

    /// Cluster whose servers are listed
    #[arg(short, long)]
    pub cluster: Option<String>,
}

pub fn list(config: &Config, args: ListArgs, prompter: Arc<dyn Prompter>) -> Result<Outcome> {
    let kind = KeyKind::from(args.kind);
    if kind == KeyKind::Operator {
        println!("{}", "Operators".bold().cyan());
        for name in config.operators()? {
            let marker = if config.operator.as_deref() == Some(name.as_str()) {
                "*"
            } else {
                " "
            };
            println!("{} {}", marker.green(), name);
        }
        return Ok(Outcome::Success);
    }

    let ctx = config.context(prompter, false);
    let store = ctx.claim_store()?;
    let parent = match kind {
        KeyKind::User => Some(parent_name(&ctx, &store, KeyKind::Account, args.account.as_deref())?),
        KeyKind::Server => Some(parent_name(&ctx, &store, KeyKind::Cluster, args.cluster.as_deref())?),
        _ => None,
    };

    let heading = match &parent {
        Some(parent) => format!("{}s of {:?}", kind, parent),
        None => format!("{}s of operator {:?}", kind, store.name()),
    };
    println!("{}", heading.bold().cyan());
    for name in store.list(kind, parent.as_deref())? {
        let claim = store.read(kind, parent.as_deref(), &name)?;
        println!("  {:<24} {}", name, claim.sub.dimmed());
    }
    Ok(Outcome::Success)
}

/// Parent account or cluster, from the flag, the selection, or the only one
pub fn parent_name(
    ctx: &ExecContext,
    store: &ClaimStore,
    kind: KeyKind,
    explicit: Option<&str>,
) -> Result<String> {
    prompts::default_parent(ctx, store, kind, explicit)?
        .ok_or_else(|| anyhow!("no {} selected; name one with --{}", kind, kind))
}
