//! `BackendClone` implementation over HTTP.

use crate::BackendClient;
use async_trait::async_trait;
use gitsync_core::{BackendClone, BackendStatus, Credential, GitAction, RemoteAction, StashOp};

#[async_trait]
impl BackendClone for BackendClient {
    async fn get_status(&self, workspace_id: &str) -> gitsync_core::Result<BackendStatus> {
        self.status(workspace_id).await.map_err(|e| e.for_read())
    }

    async fn run_action(
        &self,
        workspace_id: &str,
        action: RemoteAction,
        credential: &Credential,
    ) -> gitsync_core::Result<()> {
        self.remote_action(workspace_id, action, credential)
            .await
            .map_err(|e| e.for_action(action.into()))
    }

    async fn commit(
        &self,
        workspace_id: &str,
        paths: &[String],
        message: &str,
        credential: &Credential,
    ) -> gitsync_core::Result<()> {
        self.commit_paths(workspace_id, paths, message, credential)
            .await
            .map_err(|e| e.for_action(GitAction::Commit))
    }

    async fn stash(
        &self,
        workspace_id: &str,
        op: StashOp,
        credential: &Credential,
        message: Option<&str>,
    ) -> gitsync_core::Result<()> {
        self.stash_op(workspace_id, op, credential, message)
            .await
            .map_err(|e| e.for_action(op.into()))
    }
}
