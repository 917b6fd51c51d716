//! gitsync Core - repository reconciliation and mutation engine
//!
//! This crate keeps a workspace's source-control view in sync from two
//! sources: a hosting provider's API (the remote mirror) and the backend
//! that owns the on-disk checkout (the backend clone). It also runs the
//! mutating git actions against the backend.

pub mod accounts;
pub mod backend;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod git;
pub mod mirror;
pub mod model;
pub mod mutation;
pub mod session;
pub mod sync;

#[cfg(test)]
mod testing;

pub use accounts::AccountStore;
pub use backend::{BackendClone, BackendStatus};
pub use cache::{CacheEntry, SnapshotCache};
pub use config::{BackendConfig, Config, GitHubConfig, SyncConfig};
pub use credentials::{select_account, Credential, CredentialResolver, CredentialStore};
pub use error::{Error, Result};
pub use git::{GitRepo, RepoUrl};
pub use mirror::RemoteMirror;
pub use model::{
    BranchRecord, CommitAuthor, CommitRecord, GitAction, LinkedAccount, RemoteAction,
    RepoSnapshot, StashOp, WorkingTreeStatus, Workspace,
};
pub use mutation::{MutationExecutor, MutationOutcome, PullMode, PullPlan};
pub use session::{LoadFailure, LoadPhase, PanelHandle, PanelView, SessionState};
pub use sync::{SyncContext, SyncOrchestrator};
