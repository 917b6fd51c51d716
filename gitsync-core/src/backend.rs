//! Backend clone abstraction: the checkout owned by the workspace backend

use async_trait::async_trait;

use crate::credentials::Credential;
use crate::model::{BranchRecord, CommitRecord, RemoteAction, StashOp, WorkingTreeStatus};
use crate::Result;

/// Repository state reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendStatus {
    pub is_repo: bool,
    pub branches: Vec<BranchRecord>,
    pub status: WorkingTreeStatus,
    pub current_branch: Option<String>,
    /// Some backends include recent history with the status
    pub commits: Option<Vec<CommitRecord>>,
}

/// Client for the backend that owns the on-disk checkout
///
/// Calls may be slow: the backend can need to boot the workspace VM first.
/// Reads fail with [`crate::Error::BackendUnavailable`]; rejected actions fail
/// with [`crate::Error::MutationFailed`].
#[async_trait]
pub trait BackendClone: Send + Sync {
    /// Working tree status, branches and optionally commits
    async fn get_status(&self, workspace_id: &str) -> Result<BackendStatus>;

    /// Fetch, pull or push against the hosting remote
    async fn run_action(
        &self,
        workspace_id: &str,
        action: RemoteAction,
        credential: &Credential,
    ) -> Result<()>;

    /// Commit the given paths
    async fn commit(
        &self,
        workspace_id: &str,
        paths: &[String],
        message: &str,
        credential: &Credential,
    ) -> Result<()>;

    /// Push or pop the stash
    async fn stash(
        &self,
        workspace_id: &str,
        op: StashOp,
        credential: &Credential,
        message: Option<&str>,
    ) -> Result<()>;
}
