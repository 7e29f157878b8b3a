/*!
 * Env command
 */

use super::Outcome;
use crate::config::Config;
use anyhow::Result;
use colored::*;

/// Show the configuration, saving the selection when it was changed
pub fn env(config: &Config, changed: bool) -> Result<Outcome> {
    if changed {
        config.save_selection()?;
    }
    let none = || "(none)".dimmed().to_string();
    println!("{}", "Trellis environment".bold().cyan());
    println!("  {:<12} {}", "Home", config.home.display());
    println!("  {:<12} {}", "Store", config.store_root.display());
    println!("  {:<12} {}", "Keys", config.keys_root.display());
    println!(
        "  {:<12} {}",
        "Operator",
        config.operator.clone().unwrap_or_else(none)
    );
    println!(
        "  {:<12} {}",
        "Account",
        config.account.clone().unwrap_or_else(none)
    );
    Ok(Outcome::Success)
}
