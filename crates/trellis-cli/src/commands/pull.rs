/*!
 * Pull command
 */

use super::{execute, Outcome};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use trellis_keys::Prompter;
use trellis_sync::{HttpFetcher, Pull};

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PullArgs {
    /// Pull the operator and all accounts
    #[arg(short = 'A', long)]
    pub all: bool,

    /// Pull a single account
    #[arg(short, long)]
    pub account: Option<String>,

    /// Replace local claims even when they were issued later
    #[arg(long)]
    pub overwrite: bool,
}

pub async fn pull(
    config: &Config,
    args: PullArgs,
    prompter: Arc<dyn Prompter>,
    usage: &str,
) -> Result<Outcome> {
    let interactive = args == PullArgs::default();
    let ctx = config.context(prompter, interactive);
    let mut action = Pull::new(Arc::new(HttpFetcher::new()?));
    action.all = args.all;
    action.account = args.account;
    action.overwrite = args.overwrite;
    execute(&ctx, &mut action, usage).await
}
