/*!
 * Command implementations
 */

pub mod add;
pub mod describe;
pub mod edit;
pub mod env;
pub mod list;
pub mod pull;

use crate::output::print_report;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::*;
use std::process::ExitCode;
use trellis_actions::{run_action, Action, ExecContext};
use trellis_claims::{parse_number, TimeParams};
use trellis_keys::KeyKind;

/// Exit code for usage errors
pub const USAGE_EXIT: u8 = 2;

/// How a command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The command ran but reported errors
    Failed,
    /// The command was called incorrectly
    Usage,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::FAILURE,
            Outcome::Usage => ExitCode::from(USAGE_EXIT),
        }
    }
}

/// Validity window flags shared by add and edit commands
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeArgs {
    /// Valid from: '0' for always, YYYY-MM-DD, RFC 3339, or an offset like 1w
    #[arg(long)]
    pub start: Option<String>,

    /// Valid until: '0' for never expires, YYYY-MM-DD, RFC 3339, or an offset like 1y
    #[arg(long)]
    pub expiry: Option<String>,
}

impl TimeArgs {
    pub fn params(&self) -> TimeParams {
        TimeParams {
            start: self.start.clone(),
            expiry: self.expiry.clone(),
        }
    }
}

/// Entity kinds as named on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    #[value(alias = "operators")]
    Operator,
    #[value(alias = "accounts")]
    Account,
    #[value(alias = "users")]
    User,
    #[value(alias = "clusters")]
    Cluster,
    #[value(alias = "servers")]
    Server,
}

impl From<EntityKind> for KeyKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Operator => KeyKind::Operator,
            EntityKind::Account => KeyKind::Account,
            EntityKind::User => KeyKind::User,
            EntityKind::Cluster => KeyKind::Cluster,
            EntityKind::Server => KeyKind::Server,
        }
    }
}

/// Parse an optional limit flag such as `10K` or `-1`
pub fn limit(value: &Option<String>) -> Result<Option<i64>> {
    Ok(value.as_deref().map(parse_number).transpose()?)
}

/// Run `action` and print its report.
///
/// Validation failures print `usage` and exit with [`USAGE_EXIT`]; a report
/// with error lines exits with failure.
pub async fn execute<A: Action>(ctx: &ExecContext, action: &mut A, usage: &str) -> Result<Outcome> {
    match run_action(ctx, action).await {
        Ok(report) => {
            print_report(&report);
            Ok(if report.has_errors() {
                Outcome::Failed
            } else {
                Outcome::Success
            })
        }
        Err(e) if e.show_usage() => {
            eprintln!("{} {}", "error:".red().bold(), e);
            eprintln!("\n{}", usage);
            Ok(Outcome::Usage)
        }
        Err(e) => {
            let phase = e.phase;
            Err(anyhow::Error::new(e).context(format!("{} phase failed", phase)))
        }
    }
}
