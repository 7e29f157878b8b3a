/*!
 * Trellis
 *
 * Manages a trust hierarchy of signed credentials:
 * 1. An operator signs its own claim and the claims of its accounts and clusters
 * 2. Accounts sign user claims; clusters sign server claims
 * 3. Private seeds live in a key store separate from the claim store
 * 4. Operator and account claims can be pulled from an account server
 *
 * Usage:
 *   trellis add operator --name acme --key generate
 *   trellis add account --name billing --key generate
 *   trellis add user --account billing --name alice --key generate
 *   trellis edit account --name billing --expiry 30d
 *   trellis pull --all
 *   trellis describe account --name billing
 *
 * Commands given without flags prompt for what they need.
 */

mod commands;
mod config;
mod output;
mod prompt;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use colored::*;
use commands::{
    add::AddCommand, describe::DescribeArgs, edit::EditCommand, list::ListArgs, pull::PullArgs,
    Outcome,
};
use config::Config;
use prompt::TerminalPrompter;
use std::process::ExitCode;
use std::sync::Arc;
use trellis_keys::Prompter;

#[derive(Parser, Debug)]
#[command(name = "trellis", version)]
#[command(about = "Manage operator, account and user credentials")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Operator to act on (overrides TRELLIS_OPERATOR)
    #[arg(short, long, global = true)]
    operator: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add an operator, account, user, cluster or server
    #[command(subcommand)]
    Add(AddCommand),
    /// Edit the operator or an account
    #[command(subcommand)]
    Edit(EditCommand),
    /// Pull operator and account claims from the account server
    Pull(PullArgs),
    /// List entities
    List(ListArgs),
    /// Describe an entity or a token
    Describe(DescribeArgs),
    /// Show the environment; with --operator or --account, select them
    Env {
        /// Account to select
        #[arg(short, long)]
        account: Option<String>,
    },
}

/// Usage line of the subcommand at `path`
fn usage_for(path: &[&str]) -> String {
    let mut command = Cli::command();
    command.build();
    for name in path {
        match command.find_subcommand(name) {
            Some(sub) => command = sub.clone(),
            None => break,
        }
    }
    command.render_usage().to_string()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trellis=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<Outcome> {
    let account = match &cli.command {
        Commands::Env { account } => account.clone(),
        _ => None,
    };
    let changed = cli.operator.is_some() || account.is_some();
    let mut config = Config::from_env()?.with_overrides(cli.operator, account);
    let prompter: Arc<dyn Prompter> = Arc::new(TerminalPrompter);

    match cli.command {
        Commands::Add(command) => {
            let usage = usage_for(&["add", command.name()]);
            commands::add::add(&mut config, command, prompter, &usage).await
        }
        Commands::Edit(command) => {
            let usage = usage_for(&["edit", command.name()]);
            commands::edit::edit(&config, command, prompter, &usage).await
        }
        Commands::Pull(args) => {
            commands::pull::pull(&config, args, prompter, &usage_for(&["pull"])).await
        }
        Commands::List(args) => commands::list::list(&config, args, prompter),
        Commands::Describe(args) => commands::describe::describe(&config, args, prompter),
        Commands::Env { .. } => commands::env::env(&config, changed),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
