/*!
 * Edit commands
 */

use super::{execute, limit, Outcome, TimeArgs};
use crate::config::Config;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::sync::Arc;
use trellis_actions::{EditAccount, EditOperator};
use trellis_keys::Prompter;

#[derive(Subcommand, Debug)]
pub enum EditCommand {
    /// Edit the operator claim
    Operator(EditOperatorArgs),
    /// Edit an account claim
    Account(EditAccountArgs),
}

impl EditCommand {
    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::Operator(_) => "operator",
            EditCommand::Account(_) => "account",
        }
    }

    pub fn is_interactive(&self) -> bool {
        match self {
            EditCommand::Operator(args) => *args == EditOperatorArgs::default(),
            EditCommand::Account(args) => *args == EditAccountArgs::default(),
        }
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOperatorArgs {
    /// Account server url used by pull ('' removes it)
    #[arg(long)]
    pub account_server_url: Option<String>,

    /// Add an operator service url
    #[arg(long = "service-url")]
    pub service_urls: Vec<String>,

    /// Remove an operator service url
    #[arg(long = "rm-service-url")]
    pub remove_service_urls: Vec<String>,

    /// Operator seed or key file, when it is not in the key store
    #[arg(long)]
    pub signer: Option<String>,

    #[command(flatten)]
    pub time: TimeArgs,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct EditAccountArgs {
    /// Account to edit
    #[arg(short, long)]
    pub name: Option<String>,

    /// Account description ('' removes it)
    #[arg(long)]
    pub description: Option<String>,

    /// Max connections (-1 is unlimited)
    #[arg(long)]
    pub max_conn: Option<String>,

    /// Max subscriptions (-1 is unlimited)
    #[arg(long)]
    pub max_subs: Option<String>,

    /// Max data in bytes, with optional K/M/G suffix (-1 is unlimited)
    #[arg(long)]
    pub max_data: Option<String>,

    /// Max message payload in bytes, with optional K/M/G suffix (-1 is unlimited)
    #[arg(long)]
    pub max_payload: Option<String>,

    /// Operator seed or key file, when it is not in the key store
    #[arg(long)]
    pub signer: Option<String>,

    #[command(flatten)]
    pub time: TimeArgs,
}

pub async fn edit(
    config: &Config,
    command: EditCommand,
    prompter: Arc<dyn Prompter>,
    usage: &str,
) -> Result<Outcome> {
    let ctx = config.context(prompter, command.is_interactive());
    match command {
        EditCommand::Operator(args) => {
            let mut action = EditOperator::default();
            action.signer.spec = args.signer;
            action.edit.account_server_url = args.account_server_url;
            action.edit.add_service_urls = args.service_urls;
            action.edit.remove_service_urls = args.remove_service_urls;
            action.edit.time = args.time.params();
            execute(&ctx, &mut action, usage).await
        }
        EditCommand::Account(args) => {
            let mut action = EditAccount::default();
            action.entity.name = args.name.unwrap_or_default();
            action.signer.spec = args.signer;
            action.edit.description = args.description;
            action.edit.max_connections = limit(&args.max_conn)?;
            action.edit.max_subscriptions = limit(&args.max_subs)?;
            action.edit.max_data = limit(&args.max_data)?;
            action.edit.max_payload = limit(&args.max_payload)?;
            action.edit.time = args.time.params();
            execute(&ctx, &mut action, usage).await
        }
    }
}
