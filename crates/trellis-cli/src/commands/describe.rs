/*!
 * Describe command
 */

use super::{list::parent_name, EntityKind, Outcome};
use crate::config::Config;
use crate::output::{read_input, write_output, STDIO};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::*;
use std::sync::Arc;
use trellis_claims::{armor, extract_token, Claim, ClaimBody, NO_LIMIT};
use trellis_keys::{KeyKind, Prompter};

#[derive(Args, Debug, Clone)]
pub struct DescribeArgs {
    /// What to describe
    #[arg(value_enum)]
    pub kind: EntityKind,

    /// Entity name (defaults to the only one, or the selected account)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Account of the user
    #[arg(short, long)]
    pub account: Option<String>,

    /// Cluster of the server
    #[arg(short, long)]
    pub cluster: Option<String>,

    /// Describe the token in this file instead ('--' reads stdin)
    #[arg(long)]
    pub file: Option<String>,

    /// Write the token instead of describing it
    #[arg(long)]
    pub raw: bool,

    /// Wrap the raw token in BEGIN/END lines
    #[arg(long, requires = "raw")]
    pub armor: bool,

    /// Where to write the raw token ('--' is stdout)
    #[arg(long, default_value = STDIO)]
    pub output_file: String,
}

pub fn describe(config: &Config, args: DescribeArgs, prompter: Arc<dyn Prompter>) -> Result<Outcome> {
    let token = match &args.file {
        Some(file) => extract_token(&read_input(file)?),
        None => stored_token(config, &args, prompter)?,
    };
    let claim = Claim::decode(&token)?;

    if args.raw {
        let contents = if args.armor {
            armor(claim.kind(), &token)
        } else {
            token
        };
        write_output(&args.output_file, &contents)?;
    } else {
        print_claim(&claim);
    }
    Ok(Outcome::Success)
}

fn stored_token(config: &Config, args: &DescribeArgs, prompter: Arc<dyn Prompter>) -> Result<String> {
    let ctx = config.context(prompter, false);
    let store = ctx.claim_store()?;
    let kind = KeyKind::from(args.kind);
    let parent = match kind {
        KeyKind::User => Some(parent_name(&ctx, &store, KeyKind::Account, args.account.as_deref())?),
        KeyKind::Server => Some(parent_name(&ctx, &store, KeyKind::Cluster, args.cluster.as_deref())?),
        _ => None,
    };
    let name = match (kind, &args.name) {
        (_, Some(name)) => name.clone(),
        (KeyKind::Operator, None) => store.name().to_string(),
        (KeyKind::Account | KeyKind::Cluster, None) => {
            parent_name(&ctx, &store, kind, None)?
        }
        (_, None) => {
            let mut names = store.list(kind, parent.as_deref())?;
            if names.len() != 1 {
                return Err(anyhow!("name the {} to describe with --name", kind));
            }
            names.remove(0)
        }
    };
    // Verifies the chain before the token is shown
    store.read(kind, parent.as_deref(), &name)?;
    Ok(store.read_raw(kind, parent.as_deref(), &name)?)
}

fn print_claim(claim: &Claim) {
    println!(
        "{}",
        format!("{} {:?}", claim.kind(), claim.name).bold().cyan()
    );
    for (label, value) in describe_claim(claim) {
        println!("  {:<22} {}", label.bold(), value);
    }
}

/// Label/value rows describing `claim`
pub fn describe_claim(claim: &Claim) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Name", claim.name.clone()),
        ("Subject", claim.sub.clone()),
        ("Issuer", claim.iss.clone()),
        ("Issued", format_time(claim.iat)),
        (
            "Valid from",
            claim.nbf.map(format_time).unwrap_or_else(|| "always".to_string()),
        ),
        (
            "Expires",
            claim.exp.map(format_time).unwrap_or_else(|| "never".to_string()),
        ),
        ("ID", claim.jti.clone()),
    ];
    match &claim.body {
        ClaimBody::Operator(operator) => {
            rows.push((
                "Account server url",
                operator.account_server_url.clone().unwrap_or_default(),
            ));
            rows.push(("Service urls", operator.operator_service_urls.join(", ")));
        }
        ClaimBody::Account(account) => {
            if let Some(description) = &account.description {
                rows.push(("Description", description.clone()));
            }
            rows.push(("Max connections", format_limit(account.limits.conn)));
            rows.push(("Max subscriptions", format_limit(account.limits.subs)));
            rows.push(("Max data", format_limit(account.limits.data)));
            rows.push(("Max payload", format_limit(account.limits.payload)));
        }
        ClaimBody::User(user) => {
            rows.push(("Publish", user.permissions.publish.join(", ")));
            rows.push(("Subscribe", user.permissions.subscribe.join(", ")));
        }
        ClaimBody::Cluster(cluster) => {
            rows.push(("Trusted operators", cluster.trust.join(", ")));
            rows.push(("Cluster urls", cluster.cluster_urls.join(", ")));
        }
        ClaimBody::Server(server) => {
            rows.push(("Publish", server.permissions.publish.join(", ")));
            rows.push(("Subscribe", server.permissions.subscribe.join(", ")));
        }
    }
    rows
}

fn format_time(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn format_limit(value: i64) -> String {
    if value == NO_LIMIT {
        "unlimited".to_string()
    } else {
        value.to_string()
    }
}
