//! File-backed store of linked hosting accounts
//!
//! Accounts live in `~/.config/gitsync/accounts.toml`, separate from the
//! configuration so it can be shared without leaking tokens. The file must
//! have restrictive permissions (0600 on Unix).
//!
//! ```toml
//! [[accounts]]
//! provider = "github"
//! username = "octocat"
//! credential_handle = "env:OCTOCAT_TOKEN"
//! ```
//!
//! A credential handle of the form `env:NAME` reads the token from the
//! environment variable `NAME`; any other handle is the token itself.
//! When `GITHUB_TOKEN` is set it contributes one more `github` account,
//! named after `GITHUB_USER`, after the file accounts.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::credentials::{Credential, CredentialStore};
use crate::model::LinkedAccount;
use crate::{Error, Result};

const ENV_HANDLE_PREFIX: &str = "env:";

/// On-disk layout of the accounts file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AccountsFile {
    pub accounts: Vec<LinkedAccount>,
}

/// Linked accounts of the local user
#[derive(Debug, Clone, Default)]
pub struct AccountStore {
    accounts: Vec<LinkedAccount>,
}

impl AccountStore {
    /// Build a store from an explicit list
    pub fn from_accounts(accounts: Vec<LinkedAccount>) -> Self {
        Self { accounts }
    }

    /// Load accounts from the default location plus the environment
    ///
    /// A missing file yields only the environment account, if any.
    pub fn load() -> Result<Self> {
        let mut store = match Self::default_accounts_path() {
            Some(path) if path.exists() => Self::load_from_file(&path)?,
            _ => Self::default(),
        };

        if std::env::var("GITHUB_TOKEN").is_ok_and(|t| !t.trim().is_empty()) {
            let username =
                std::env::var("GITHUB_USER").unwrap_or_else(|_| "github-token".to_string());
            debug!(username = %username, "Adding account from GITHUB_TOKEN");
            store.accounts.push(LinkedAccount {
                provider: "github".to_string(),
                username,
                avatar_url: None,
                credential_handle: format!("{}GITHUB_TOKEN", ENV_HANDLE_PREFIX),
            });
        }

        Ok(store)
    }

    /// Load accounts from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Accounts file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let file: AccountsFile = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse accounts: {}", e)))?;

        debug!(path = %path.display(), count = file.accounts.len(), "Loaded linked accounts");

        Ok(Self {
            accounts: file.accounts,
        })
    }

    /// Get the default accounts file path
    ///
    /// Returns `~/.config/gitsync/accounts.toml` on Unix
    pub fn default_accounts_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitsync").join("accounts.toml"))
    }

    /// All linked accounts
    pub fn accounts(&self) -> &[LinkedAccount] {
        &self.accounts
    }
}

fn materialize_handle(handle: &str) -> Result<Credential> {
    let token = match handle.strip_prefix(ENV_HANDLE_PREFIX) {
        Some(var) => std::env::var(var)
            .map_err(|_| Error::Config(format!("Environment variable {} is not set", var)))?,
        None => handle.to_string(),
    };

    let token = token.trim();
    if token.is_empty() {
        return Err(Error::Config("Credential is empty".to_string()));
    }

    Ok(Credential::new(token))
}

#[async_trait]
impl CredentialStore for AccountStore {
    /// The file holds the local user's accounts only, so `user_id` is not
    /// used for filtering.
    async fn get_all_accounts(&self, _user_id: &str) -> Result<Vec<LinkedAccount>> {
        Ok(self.accounts.clone())
    }

    async fn materialize(&self, account: &LinkedAccount, _user_id: &str) -> Result<Credential> {
        materialize_handle(&account.credential_handle).inspect_err(|e| {
            warn!(username = %account.username, error = %e, "Unusable credential handle");
        })
    }
}
