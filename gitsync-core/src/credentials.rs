//! Credential resolution across linked accounts
//!
//! A workspace may be reachable through several linked accounts. The
//! resolver picks one in this order:
//! 1. The account explicitly linked to the workspace (username hint)
//! 2. The first account on the provider hosting the repository
//! 3. The first account of any provider
//!
//! and asks the credential store to turn it into a usable token.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::git::RepoUrl;
use crate::model::LinkedAccount;
use crate::Result;

/// A usable access token
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building an Authorization header
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Source of linked accounts and their tokens
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// All accounts the user has linked, in link order
    async fn get_all_accounts(&self, user_id: &str) -> Result<Vec<LinkedAccount>>;

    /// Exchange an account's stored reference for a token; may be slow
    async fn materialize(&self, account: &LinkedAccount, user_id: &str) -> Result<Credential>;
}

/// Pick the account to authenticate with, without contacting the store
pub fn select_account<'a>(
    accounts: &'a [LinkedAccount],
    repository_url: Option<&str>,
    linked_username: Option<&str>,
) -> Option<&'a LinkedAccount> {
    if let Some(hint) = linked_username {
        if let Some(account) = accounts
            .iter()
            .find(|a| a.username.eq_ignore_ascii_case(hint))
        {
            return Some(account);
        }
    }

    let provider = repository_url
        .and_then(|url| RepoUrl::parse(url).ok())
        .and_then(|url| url.provider());

    if let Some(provider) = provider {
        if let Some(account) = accounts
            .iter()
            .find(|a| a.provider.eq_ignore_ascii_case(provider))
        {
            return Some(account);
        }
    }

    accounts.first()
}

/// Resolves which credential to use for a repository
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Load the user's linked accounts
    pub async fn accounts(&self, user_id: &str) -> Result<Vec<LinkedAccount>> {
        self.store.get_all_accounts(user_id).await
    }

    /// Resolve a credential from an already-loaded account list
    ///
    /// Returns `None` when no account applies or materialization fails.
    pub async fn resolve(
        &self,
        user_id: &str,
        accounts: &[LinkedAccount],
        repository_url: Option<&str>,
        linked_username: Option<&str>,
    ) -> Option<Credential> {
        let account = select_account(accounts, repository_url, linked_username)?;

        debug!(
            provider = %account.provider,
            username = %account.username,
            "Materializing credential"
        );

        match self.store.materialize(account, user_id).await {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(
                    provider = %account.provider,
                    username = %account.username,
                    error = %e,
                    "Failed to materialize credential"
                );
                None
            }
        }
    }
}
