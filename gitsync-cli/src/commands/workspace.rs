//! Workspace selection shared by the repository commands

use std::sync::Arc;

use clap::Args;
use gitsync_backend::BackendClient;
use gitsync_core::{
    AccountStore, Config, GitRepo, MutationExecutor, SyncContext, SyncOrchestrator, Workspace,
};
use gitsync_github::GitHubMirror;

/// Which workspace to operate on
#[derive(Args, Debug, Clone)]
pub struct WorkspaceArgs {
    /// Workspace identifier known to the backend
    #[arg(short, long)]
    pub workspace: String,

    /// User whose linked accounts are used
    #[arg(long, env = "USER", default_value = "default")]
    pub user: String,

    /// Repository remote URL (discovered from the current directory if not specified)
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Username of the hosting account linked to this workspace
    #[arg(long)]
    pub linked_user: Option<String>,
}

impl WorkspaceArgs {
    /// Build the workspace, discovering the remote URL when needed
    pub fn to_workspace(&self) -> Workspace {
        let mut workspace = Workspace::new(&self.workspace, &self.user);

        let url = self.repo_url.clone().or_else(|| {
            let cwd = std::env::current_dir().ok()?;
            match GitRepo::discover_remote_url(&cwd) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::debug!(error = %e, "No remote URL discovered");
                    None
                }
            }
        });
        if let Some(url) = url {
            workspace = workspace.with_repository_url(url);
        }
        if let Some(user) = &self.linked_user {
            workspace = workspace.with_linked_username(user);
        }

        workspace
    }
}

/// Orchestrator and executor wired to the real collaborators
pub struct Engine {
    pub sync: SyncOrchestrator,
    pub executor: MutationExecutor,
}

impl Engine {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let store = AccountStore::load()?;
        let mirror = GitHubMirror::new(&config.github)?;
        let backend = BackendClient::new(&config.backend)?;

        let ctx = SyncContext::new(
            &config.sync,
            Arc::new(store),
            Arc::new(mirror),
            Arc::new(backend),
        );
        let sync = SyncOrchestrator::new(ctx);
        let executor = MutationExecutor::new(sync.clone());

        Ok(Self { sync, executor })
    }
}
