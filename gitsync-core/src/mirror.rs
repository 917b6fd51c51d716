//! Remote mirror abstraction: read-only access to a hosting provider's API

use async_trait::async_trait;

use crate::credentials::Credential;
use crate::model::{BranchRecord, CommitRecord};
use crate::Result;

/// Hosting provider API that can list commits and branches
///
/// Implementations report failures as [`crate::Error::EnrichmentUnavailable`];
/// the sync orchestrator swallows them and falls back to the backend clone.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Whether URLs on `host` can be served by this mirror
    fn supports_host(&self, host: &str) -> bool;

    /// Recent commits of the default branch, newest first
    async fn get_commits(
        &self,
        owner: &str,
        repo: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<CommitRecord>>;

    /// All branches of the repository
    async fn get_branches(
        &self,
        owner: &str,
        repo: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<BranchRecord>>;
}
