//! Locations and the current operator/account selection.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trellis_actions::ExecContext;
use trellis_keys::Prompter;
use trellis_storage::ClaimStore;

/// Tool configuration file under the home directory
pub const TOOL_CONFIG_FILE: &str = "config.json";

const DEFAULT_HOME_DIR: &str = ".trellis";

/// Selection remembered between invocations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

/// Resolved configuration.
///
/// Precedence is command line flags, then environment, then the tool config
/// file. When no operator is selected and the store holds exactly one, that
/// one is used.
#[derive(Debug, Clone)]
pub struct Config {
    pub home: PathBuf,
    pub store_root: PathBuf,
    pub keys_root: PathBuf,
    pub operator: Option<String>,
    pub account: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::resolve(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    fn resolve(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let home = match env("TRELLIS_HOME") {
            Some(home) => PathBuf::from(home),
            None => dirs::home_dir()
                .context("cannot find the home directory; set TRELLIS_HOME")?
                .join(DEFAULT_HOME_DIR),
        };
        let store_root = env("TRELLIS_STORE")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("store"));
        let keys_root = env("TRELLIS_KEYS")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("keys"));

        let saved = load_tool_config(&home.join(TOOL_CONFIG_FILE))?;
        let mut config = Config {
            operator: env("TRELLIS_OPERATOR").or(saved.operator),
            account: env("TRELLIS_ACCOUNT").or(saved.account),
            home,
            store_root,
            keys_root,
        };
        if config.operator.is_none() {
            let mut operators = config.operators()?;
            if operators.len() == 1 {
                config.operator = operators.pop();
            }
        }
        Ok(config)
    }

    /// Apply command line overrides
    pub fn with_overrides(mut self, operator: Option<String>, account: Option<String>) -> Self {
        if operator.is_some() {
            self.operator = operator;
        }
        if account.is_some() {
            self.account = account;
        }
        self
    }

    pub fn tool_config_path(&self) -> PathBuf {
        self.home.join(TOOL_CONFIG_FILE)
    }

    /// Remember the current operator and account
    pub fn save_selection(&self) -> Result<()> {
        let path = self.tool_config_path();
        fs::create_dir_all(&self.home)
            .with_context(|| format!("failed to create {}", self.home.display()))?;
        let tool = ToolConfig {
            operator: self.operator.clone(),
            account: self.account.clone(),
        };
        fs::write(&path, serde_json::to_vec_pretty(&tool)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Names of operators with a claim store, sorted
    pub fn operators(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.store_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.store_root.display()))
            }
        };
        let mut names = Vec::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if ClaimStore::open(&self.store_root, &name).is_ok() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Execution context for one command
    pub fn context(&self, prompter: Arc<dyn Prompter>, interactive: bool) -> ExecContext {
        let ctx = ExecContext::new(&self.store_root, &self.keys_root, prompter)
            .with_account(self.account.clone())
            .with_interactive(interactive);
        match &self.operator {
            Some(operator) => ctx.with_operator(operator.clone()),
            None => ctx,
        }
    }
}

fn load_tool_config(path: &Path) -> Result<ToolConfig> {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .with_context(|| format!("invalid tool config {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ToolConfig::default()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::resolve(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_defaults_under_home() {
        let home = tempfile::tempdir().unwrap();
        let config = resolve(&[("TRELLIS_HOME", home.path().to_str().unwrap())]);
        assert_eq!(config.store_root, home.path().join("store"));
        assert_eq!(config.keys_root, home.path().join("keys"));
        assert!(config.operator.is_none());
        assert!(config.account.is_none());
    }

    #[test]
    fn test_environment_beats_saved_selection() {
        let home = tempfile::tempdir().unwrap();
        let home_str = home.path().to_str().unwrap();
        let saved = resolve(&[("TRELLIS_HOME", home_str)])
            .with_overrides(Some("acme".to_string()), Some("billing".to_string()));
        saved.save_selection().unwrap();

        let config = resolve(&[("TRELLIS_HOME", home_str)]);
        assert_eq!(config.operator.as_deref(), Some("acme"));
        assert_eq!(config.account.as_deref(), Some("billing"));

        let config = resolve(&[("TRELLIS_HOME", home_str), ("TRELLIS_ACCOUNT", "ops")]);
        assert_eq!(config.account.as_deref(), Some("ops"));

        let config = config.with_overrides(None, Some("payroll".to_string()));
        assert_eq!(config.operator.as_deref(), Some("acme"));
        assert_eq!(config.account.as_deref(), Some("payroll"));
    }

    #[test]
    fn test_explicit_roots() {
        let home = tempfile::tempdir().unwrap();
        let config = resolve(&[
            ("TRELLIS_HOME", home.path().to_str().unwrap()),
            ("TRELLIS_STORE", "/srv/trellis/store"),
            ("TRELLIS_KEYS", "/srv/trellis/keys"),
        ]);
        assert_eq!(config.store_root, PathBuf::from("/srv/trellis/store"));
        assert_eq!(config.keys_root, PathBuf::from("/srv/trellis/keys"));
    }

    #[test]
    fn test_invalid_tool_config_is_an_error() {
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join(TOOL_CONFIG_FILE), "{not json").unwrap();
        let home_str = home.path().to_str().unwrap().to_string();
        let result = Config::resolve(|key| (key == "TRELLIS_HOME").then(|| home_str.clone()));
        assert!(result.is_err());
    }
}
