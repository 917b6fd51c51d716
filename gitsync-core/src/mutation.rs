//! Mutation executor: fetch, pull, push, commit and the stash-wrapped pull
//!
//! Every mutation needs a credential; reads may go unauthenticated but writes
//! fail with [`Error::AuthRequired`] instead. After a successful mutation the
//! workspace cache entry is invalidated and a silent pass follows, superseding
//! any pass that began before the mutation.

use tracing::{debug, info, warn};

use crate::credentials::Credential;
use crate::model::{GitAction, RemoteAction, StashOp, Workspace};
use crate::sync::SyncOrchestrator;
use crate::{Error, Result};

/// Stash message used when wrapping a pull
pub const AUTO_STASH_MESSAGE: &str = "auto-stash before pull";

/// What a pull has to deal with, judged from the cached working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullPlan {
    /// Nothing uncommitted; pull directly
    Clean,
    /// Uncommitted changes; the caller must pick a [`PullMode`]
    Guarded { changed: usize },
    /// No working tree status cached yet, or the last status read failed
    Unknown,
}

/// How to pull over uncommitted changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PullMode {
    /// Pull as is; local changes may be lost
    #[default]
    Plain,
    /// Stash, pull, then restore the stash
    StashAndRestore,
}

/// Result of a mutation that reached the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Completed,
    /// The pull succeeded but the stashed changes could not be restored
    CompletedWithStashConflict { message: String },
}

/// Runs user-initiated git actions against the backend clone
#[derive(Debug, Clone)]
pub struct MutationExecutor {
    sync: SyncOrchestrator,
}

impl MutationExecutor {
    pub fn new(sync: SyncOrchestrator) -> Self {
        Self { sync }
    }

    /// Decide whether a pull needs the user's choice
    pub fn plan_pull(&self, workspace: &Workspace) -> PullPlan {
        let status = self
            .sync
            .context()
            .cache
            .peek(&workspace.id)
            .and_then(|entry| entry.snapshot.status);

        match status {
            None => PullPlan::Unknown,
            Some(status) if status.is_clean() => PullPlan::Clean,
            Some(status) => PullPlan::Guarded {
                changed: status.changed_count(),
            },
        }
    }

    pub async fn fetch(&self, workspace: &Workspace) -> Result<MutationOutcome> {
        self.remote_action(workspace, RemoteAction::Fetch).await
    }

    pub async fn push(&self, workspace: &Workspace) -> Result<MutationOutcome> {
        self.remote_action(workspace, RemoteAction::Push).await
    }

    /// Pull, optionally wrapped in stash push / stash pop
    ///
    /// `StashAndRestore` on a clean tree is a plain pull.
    pub async fn pull(&self, workspace: &Workspace, mode: PullMode) -> Result<MutationOutcome> {
        let credential = self.credential(workspace).await?;

        let stash = mode == PullMode::StashAndRestore && self.has_local_changes(workspace).await?;

        let outcome = if stash {
            self.stashed_pull(workspace, &credential).await?
        } else {
            if mode == PullMode::StashAndRestore {
                debug!(workspace = %workspace.id, "Working tree clean, nothing to stash");
            }
            self.sync
                .context()
                .backend
                .run_action(&workspace.id, RemoteAction::Pull, &credential)
                .await?;
            MutationOutcome::Completed
        };

        info!(
            workspace = %workspace.id,
            action = %GitAction::Pull,
            stashed = stash,
            "Pull completed"
        );
        self.refresh(workspace).await;
        Ok(outcome)
    }

    /// Cached status when known, otherwise read from the backend
    async fn has_local_changes(&self, workspace: &Workspace) -> Result<bool> {
        match self.plan_pull(workspace) {
            PullPlan::Clean => Ok(false),
            PullPlan::Guarded { .. } => Ok(true),
            PullPlan::Unknown => {
                debug!(workspace = %workspace.id, "No cached status, asking the backend");
                let status = self.sync.context().backend.get_status(&workspace.id).await?;
                Ok(status.is_repo && !status.status.is_clean())
            }
        }
    }

    async fn stashed_pull(
        &self,
        workspace: &Workspace,
        credential: &Credential,
    ) -> Result<MutationOutcome> {
        let backend = &self.sync.context().backend;

        backend
            .stash(&workspace.id, StashOp::Push, credential, Some(AUTO_STASH_MESSAGE))
            .await?;
        debug!(workspace = %workspace.id, "Stashed local changes");

        if let Err(pull_error) = backend
            .run_action(&workspace.id, RemoteAction::Pull, credential)
            .await
        {
            if let Err(e) = backend
                .stash(&workspace.id, StashOp::Pop, credential, None)
                .await
            {
                warn!(
                    workspace = %workspace.id,
                    error = %e,
                    "Could not restore stash after failed pull; changes remain stashed"
                );
            }
            return Err(pull_error);
        }

        match backend
            .stash(&workspace.id, StashOp::Pop, credential, None)
            .await
        {
            Ok(()) => Ok(MutationOutcome::Completed),
            Err(e) => {
                warn!(workspace = %workspace.id, error = %e, "Stash pop conflicted after pull");
                Ok(MutationOutcome::CompletedWithStashConflict {
                    message: format!(
                        "Pulled, but restoring your changes failed ({}). \
                         They are still in the stash.",
                        e
                    ),
                })
            }
        }
    }

    /// Commit `paths` with `message`
    ///
    /// Input is validated before the credential is resolved, and both before
    /// the backend is called.
    pub async fn commit(
        &self,
        workspace: &Workspace,
        paths: &[String],
        message: &str,
    ) -> Result<MutationOutcome> {
        if paths.is_empty() {
            return Err(Error::UserInput("select at least one file to commit".to_string()));
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::UserInput("commit message must not be empty".to_string()));
        }

        let credential = self.credential(workspace).await?;
        self.sync
            .context()
            .backend
            .commit(&workspace.id, paths, message, &credential)
            .await?;

        info!(workspace = %workspace.id, files = paths.len(), "Committed");
        self.refresh(workspace).await;
        Ok(MutationOutcome::Completed)
    }

    async fn remote_action(
        &self,
        workspace: &Workspace,
        action: RemoteAction,
    ) -> Result<MutationOutcome> {
        let credential = self.credential(workspace).await?;
        self.sync
            .context()
            .backend
            .run_action(&workspace.id, action, &credential)
            .await?;

        info!(
            workspace = %workspace.id,
            action = %GitAction::from(action),
            "Remote action completed"
        );
        self.refresh(workspace).await;
        Ok(MutationOutcome::Completed)
    }

    async fn credential(&self, workspace: &Workspace) -> Result<Credential> {
        self.sync
            .resolve_credential(workspace)
            .await
            .ok_or(Error::AuthRequired)
    }

    async fn refresh(&self, workspace: &Workspace) {
        match self.sync.refresh(workspace).await {
            Ok(_) => debug!(workspace = %workspace.id, "Reloaded after mutation"),
            Err(e) => warn!(workspace = %workspace.id, error = %e, "Reload after mutation failed"),
        }
    }
}
