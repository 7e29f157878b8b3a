/*!
 * Add commands
 */

use super::{execute, limit, Outcome, TimeArgs};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::sync::Arc;
use trellis_actions::{AddAccount, AddCluster, AddOperator, AddServer, AddUser, ExecContext};
use trellis_claims::PermissionEdit;
use trellis_keys::{KeyKind, Prompter, PublicKey};

#[derive(Subcommand, Debug)]
pub enum AddCommand {
    /// Add an operator and create its store
    Operator(AddOperatorArgs),
    /// Add an account signed by the operator
    Account(AddAccountArgs),
    /// Add a user signed by an account
    User(AddUserArgs),
    /// Add a cluster signed by the operator
    Cluster(AddClusterArgs),
    /// Add a server signed by a cluster
    Server(AddServerArgs),
}

impl AddCommand {
    pub fn name(&self) -> &'static str {
        match self {
            AddCommand::Operator(_) => "operator",
            AddCommand::Account(_) => "account",
            AddCommand::User(_) => "user",
            AddCommand::Cluster(_) => "cluster",
            AddCommand::Server(_) => "server",
        }
    }

    /// No flags were given, so missing values are prompted for
    pub fn is_interactive(&self) -> bool {
        match self {
            AddCommand::Operator(args) => *args == AddOperatorArgs::default(),
            AddCommand::Account(args) => *args == AddAccountArgs::default(),
            AddCommand::User(args) => *args == AddUserArgs::default(),
            AddCommand::Cluster(args) => *args == AddClusterArgs::default(),
            AddCommand::Server(args) => *args == AddServerArgs::default(),
        }
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOperatorArgs {
    /// Operator name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Operator seed, public key, key file, or 'generate'
    #[arg(short, long)]
    pub key: Option<String>,

    /// Account server url used by pull
    #[arg(long)]
    pub account_server_url: Option<String>,

    #[command(flatten)]
    pub time: TimeArgs,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AddAccountArgs {
    /// Account name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Account seed, public key, key file, or 'generate'
    #[arg(short, long)]
    pub key: Option<String>,

    /// Operator seed or key file, when it is not in the key store
    #[arg(long)]
    pub signer: Option<String>,

    /// Account description
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

    #[command(flatten)]
    pub time: TimeArgs,
}

/// Publish and subscribe flags for users and servers
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionArgs {
    /// Subjects the entity may publish to
    #[arg(long = "allow-pub")]
    pub allow_pub: Vec<String>,

    /// Subjects the entity may subscribe to
    #[arg(long = "allow-sub")]
    pub allow_sub: Vec<String>,

    /// Both publish and subscribe
    #[arg(long = "allow-pubsub")]
    pub allow_pubsub: Vec<String>,
}

impl PermissionArgs {
    fn edit(&self) -> PermissionEdit {
        PermissionEdit {
            allow_publish: self.allow_pub.iter().chain(&self.allow_pubsub).cloned().collect(),
            allow_subscribe: self.allow_sub.iter().chain(&self.allow_pubsub).cloned().collect(),
            remove: Vec::new(),
        }
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AddUserArgs {
    /// Account the user belongs to
    #[arg(short, long)]
    pub account: Option<String>,

    /// User name
    #[arg(short, long)]
    pub name: Option<String>,

    /// User seed, public key, key file, or 'generate'
    #[arg(short, long)]
    pub key: Option<String>,

    /// Account seed or key file, when it is not in the key store
    #[arg(long)]
    pub signer: Option<String>,

    #[command(flatten)]
    pub permissions: PermissionArgs,

    #[command(flatten)]
    pub time: TimeArgs,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AddClusterArgs {
    /// Cluster name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Cluster seed, public key, key file, or 'generate'
    #[arg(short, long)]
    pub key: Option<String>,

    /// Operator seed or key file, when it is not in the key store
    #[arg(long)]
    pub signer: Option<String>,

    /// Operator public keys the cluster trusts (defaults to the issuing operator)
    #[arg(long)]
    pub trust: Vec<String>,

    /// Cluster urls
    #[arg(long = "url")]
    pub urls: Vec<String>,

    #[command(flatten)]
    pub time: TimeArgs,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AddServerArgs {
    /// Cluster the server belongs to
    #[arg(short, long)]
    pub cluster: Option<String>,

    /// Server name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Server seed, public key, key file, or 'generate'
    #[arg(short, long)]
    pub key: Option<String>,

    /// Cluster seed or key file, when it is not in the key store
    #[arg(long)]
    pub signer: Option<String>,

    #[command(flatten)]
    pub permissions: PermissionArgs,

    #[command(flatten)]
    pub time: TimeArgs,
}

pub async fn add(
    config: &mut Config,
    command: AddCommand,
    prompter: Arc<dyn Prompter>,
    usage: &str,
) -> Result<Outcome> {
    let ctx = config.context(prompter, command.is_interactive());
    match command {
        AddCommand::Operator(args) => add_operator(config, &ctx, args, usage).await,
        AddCommand::Account(args) => add_account(config, &ctx, args, usage).await,
        AddCommand::User(args) => {
            let mut action = AddUser::default();
            action.account = args.account;
            action.entity.name = args.name.unwrap_or_default();
            action.entity.key_spec = args.key;
            action.signer.spec = args.signer;
            action.edit.permissions = args.permissions.edit();
            action.edit.time = args.time.params();
            execute(&ctx, &mut action, usage).await
        }
        AddCommand::Cluster(args) => {
            let mut action = AddCluster::default();
            action.entity.name = args.name.unwrap_or_default();
            action.entity.key_spec = args.key;
            action.signer.spec = args.signer;
            action.edit.trust = parse_operator_keys(&args.trust)?;
            action.edit.cluster_urls = args.urls;
            action.edit.time = args.time.params();
            execute(&ctx, &mut action, usage).await
        }
        AddCommand::Server(args) => {
            let mut action = AddServer::default();
            action.cluster = args.cluster;
            action.entity.name = args.name.unwrap_or_default();
            action.entity.key_spec = args.key;
            action.signer.spec = args.signer;
            action.edit.permissions = args.permissions.edit();
            action.edit.time = args.time.params();
            execute(&ctx, &mut action, usage).await
        }
    }
}

async fn add_operator(
    config: &mut Config,
    ctx: &ExecContext,
    args: AddOperatorArgs,
    usage: &str,
) -> Result<Outcome> {
    let mut action = AddOperator::default();
    action.entity.name = args.name.unwrap_or_default();
    action.entity.key_spec = args.key;
    action.edit.account_server_url = args.account_server_url;
    action.edit.time = args.time.params();
    let outcome = execute(ctx, &mut action, usage).await?;
    if outcome == Outcome::Success {
        config.operator = Some(action.entity.name.clone());
        config.account = None;
        config.save_selection()?;
    }
    Ok(outcome)
}

async fn add_account(
    config: &mut Config,
    ctx: &ExecContext,
    args: AddAccountArgs,
    usage: &str,
) -> Result<Outcome> {
    let mut action = AddAccount::default();
    action.entity.name = args.name.unwrap_or_default();
    action.entity.key_spec = args.key;
    action.signer.spec = args.signer;
    action.edit.description = args.description;
    action.edit.max_connections = limit(&args.max_conn)?;
    action.edit.max_subscriptions = limit(&args.max_subs)?;
    action.edit.max_data = limit(&args.max_data)?;
    action.edit.max_payload = limit(&args.max_payload)?;
    action.edit.time = args.time.params();
    let outcome = execute(ctx, &mut action, usage).await?;
    if outcome == Outcome::Success {
        config.account = Some(action.entity.name.clone());
        config.save_selection()?;
    }
    Ok(outcome)
}

fn parse_operator_keys(keys: &[String]) -> Result<Vec<PublicKey>> {
    keys.iter()
        .map(|key| {
            let public: PublicKey = key
                .parse()
                .with_context(|| format!("invalid operator key {:?}", key))?;
            public.expect_kind(KeyKind::Operator)?;
            Ok(public)
        })
        .collect()
}
