//! Prompts shared by the interactive phases.

use crate::{context::ExecContext, errors::*};
use trellis_claims::{parse_number, parse_time, TimeParams};
use trellis_keys::KeyKind;
use trellis_storage::{validate_name, ClaimStore};

fn name_validator(value: &str) -> std::result::Result<(), String> {
    validate_name(value).map_err(|e| e.to_string())
}

fn time_validator(value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    parse_time(value, 0).map(|_| ()).map_err(|e| e.to_string())
}

fn number_validator(value: &str) -> std::result::Result<(), String> {
    parse_number(value).map(|_| ()).map_err(|e| e.to_string())
}

/// Ask for an entity name
pub fn prompt_name(ctx: &ExecContext, label: &str, default: &str) -> Result<String> {
    Ok(ctx
        .prompter()
        .prompt(label, default, Some(&name_validator))?
        .trim()
        .to_string())
}

/// Ask for start and expiry; an empty answer leaves the bound unchanged
pub fn edit_time_params(ctx: &ExecContext, params: &mut TimeParams) -> Result<()> {
    let start = ctx.prompter().prompt(
        "valid from ('0' is always, blank keeps the current value)",
        params.start.as_deref().unwrap_or_default(),
        Some(&time_validator),
    )?;
    let expiry = ctx.prompter().prompt(
        "valid until ('0' is always, blank keeps the current value)",
        params.expiry.as_deref().unwrap_or_default(),
        Some(&time_validator),
    )?;
    params.start = Some(start).filter(|s| !s.is_empty());
    params.expiry = Some(expiry).filter(|s| !s.is_empty());
    Ok(())
}

/// Ask for a limit; an empty answer leaves it unchanged
pub fn edit_limit(ctx: &ExecContext, label: &str, value: &mut Option<i64>) -> Result<()> {
    let current = value.map(|v| v.to_string()).unwrap_or_default();
    let answer = ctx
        .prompter()
        .prompt(label, &current, Some(&number_validator))?;
    if !answer.is_empty() {
        *value = Some(parse_number(&answer)?);
    }
    Ok(())
}

/// Pick the parent account or cluster for a command.
///
/// An explicit name wins, then the configured default account, then the only
/// entity of that kind if there is exactly one.
pub fn default_parent(
    ctx: &ExecContext,
    store: &ClaimStore,
    kind: KeyKind,
    explicit: Option<&str>,
) -> Result<Option<String>> {
    if let Some(name) = explicit.filter(|n| !n.is_empty()) {
        return Ok(Some(name.to_string()));
    }
    if kind == KeyKind::Account {
        if let Some(name) = ctx.default_account() {
            return Ok(Some(name.to_string()));
        }
    }
    let mut names = store.list(kind, None)?;
    Ok(if names.len() == 1 { names.pop() } else { None })
}

/// Ask which parent to use, defaulting to `current`
pub fn select_parent(
    ctx: &ExecContext,
    store: &ClaimStore,
    kind: KeyKind,
    current: Option<&str>,
) -> Result<String> {
    let names = store.list(kind, None)?;
    if names.is_empty() {
        return Err(ActionError::usage(format!("no {} exists yet", kind)));
    }
    let default = current
        .map(str::to_string)
        .unwrap_or_else(|| names[0].clone());
    let validator = move |value: &str| {
        if names.iter().any(|n| n == value) {
            Ok(())
        } else {
            Err(format!("unknown {} {:?}", kind, value))
        }
    };
    Ok(ctx
        .prompter()
        .prompt(&format!("{} name", kind), &default, Some(&validator))?)
}
