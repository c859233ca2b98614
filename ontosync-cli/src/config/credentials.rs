//! MediaWiki admin credentials
//!
//! Resolution order: project file, the deployment `.env`, the process
//! environment, then an interactive prompt.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use super::ProjectConfig;

pub const USERNAME_VAR: &str = "MW_ADMIN_NAME";
pub const PASSWORD_VAR: &str = "MW_ADMIN_PASS";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Read key/value pairs from a dotenv file without touching the process environment
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to open env file: {}", path.display()))?;

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) =
            item.with_context(|| format!("Failed to parse env file: {}", path.display()))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Credentials from non-interactive sources; `None` where nothing was found
fn lookup(
    config: &ProjectConfig,
    env_file: &HashMap<String, String>,
    process_env: impl Fn(&str) -> Option<String>,
) -> (Option<String>, Option<String>) {
    let non_empty = |value: &String| !value.is_empty();
    let pick = |configured: &Option<String>, var: &str| {
        configured
            .clone()
            .filter(non_empty)
            .or_else(|| env_file.get(var).cloned().filter(non_empty))
            .or_else(|| process_env(var).filter(non_empty))
    };

    (
        pick(&config.wikibase.mw_admin_name, USERNAME_VAR),
        pick(&config.wikibase.mw_admin_password, PASSWORD_VAR),
    )
}

pub fn resolve_credentials(config: &ProjectConfig, interactive: bool) -> Result<Credentials> {
    let env_file = match config.deploy_env_path() {
        Some(path) if path.is_file() => {
            log::debug!("Reading deployment credentials from {}", path.display());
            read_env_file(&path)?
        }
        _ => HashMap::new(),
    };

    let (username, password) = lookup(config, &env_file, |var| std::env::var(var).ok());

    let username = match username {
        Some(name) => name,
        None if interactive => dialoguer::Input::<String>::new()
            .with_prompt("MediaWiki admin username")
            .interact_text()
            .context("Failed to read username")?,
        None => anyhow::bail!(
            "No MediaWiki username configured (set wikibase.mw_admin_name or {})",
            USERNAME_VAR
        ),
    };

    let password = match password {
        Some(password) => password,
        None if interactive => rpassword::prompt_password(format!("Password for {}: ", username))
            .context("Failed to read password")?,
        None => anyhow::bail!(
            "No MediaWiki password configured (set wikibase.mw_admin_password or {})",
            PASSWORD_VAR
        ),
    };

    Ok(Credentials { username, password })
}
