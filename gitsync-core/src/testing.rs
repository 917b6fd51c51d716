//! Fake collaborators shared by the orchestrator and executor tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::backend::{BackendClone, BackendStatus};
use crate::credentials::tests::{account, MemoryStore};
use crate::credentials::Credential;
use crate::mirror::RemoteMirror;
use crate::model::{
    BranchRecord, CommitAuthor, CommitRecord, GitAction, RemoteAction, StashOp, Workspace,
    WorkingTreeStatus,
};
use crate::sync::{SyncContext, SyncOrchestrator};
use crate::{Error, Result};

pub(crate) const USER: &str = "u1";
pub(crate) const REPO_URL: &str = "https://github.com/acme/app";

pub(crate) fn workspace(id: &str) -> Workspace {
    Workspace::new(id, USER).with_repository_url(REPO_URL)
}

pub(crate) fn commits(prefix: &str, n: usize) -> Vec<CommitRecord> {
    (0..n)
        .map(|i| {
            CommitRecord::new(
                format!("{}{:07}", prefix, i),
                &format!("{} commit {}", prefix, i),
                CommitAuthor::default(),
                Utc.timestamp_opt(1_700_000_000 - i as i64 * 60, 0).unwrap(),
            )
        })
        .collect()
}

pub(crate) fn branch_names(branches: &[BranchRecord]) -> Vec<&str> {
    branches.iter().map(|b| b.name.as_str()).collect()
}

pub(crate) struct FakeMirror {
    pub commits: Mutex<std::result::Result<Vec<CommitRecord>, String>>,
    pub branches: Mutex<std::result::Result<Vec<BranchRecord>, String>>,
    pub delay: Duration,
    pub calls: AtomicUsize,
    pub credentials_seen: Mutex<Vec<Option<String>>>,
}

impl FakeMirror {
    pub fn new(commits: Vec<CommitRecord>, branches: &[&str]) -> Self {
        Self {
            commits: Mutex::new(Ok(commits)),
            branches: Mutex::new(Ok(branches.iter().map(|b| BranchRecord::remote(*b)).collect())),
            delay: Duration::from_millis(50),
            calls: AtomicUsize::new(0),
            credentials_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let mirror = Self::new(Vec::new(), &[]);
        *mirror.commits.lock().unwrap() = Err("rate limited".to_string());
        *mirror.branches.lock().unwrap() = Err("rate limited".to_string());
        mirror
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteMirror for FakeMirror {
    fn supports_host(&self, host: &str) -> bool {
        host == "github.com"
    }

    async fn get_commits(
        &self,
        _owner: &str,
        _repo: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<CommitRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.credentials_seen
            .lock()
            .unwrap()
            .push(credential.map(|c| c.token().to_string()));
        tokio::time::sleep(self.delay).await;
        self.commits
            .lock()
            .unwrap()
            .clone()
            .map_err(Error::EnrichmentUnavailable)
    }

    async fn get_branches(
        &self,
        _owner: &str,
        _repo: &str,
        _credential: Option<&Credential>,
    ) -> Result<Vec<BranchRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.branches
            .lock()
            .unwrap()
            .clone()
            .map_err(Error::EnrichmentUnavailable)
    }
}

/// Backend with a working tree and a stash stack
pub(crate) struct FakeBackend {
    pub is_repo: bool,
    pub branches: Vec<BranchRecord>,
    pub commits: Option<Vec<CommitRecord>>,
    pub tree: Mutex<WorkingTreeStatus>,
    pub stash: Mutex<Vec<WorkingTreeStatus>>,
    pub unreachable: bool,
    pub rejects: Mutex<HashSet<GitAction>>,
    pub delay: Duration,
    pub log: Mutex<Vec<String>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            is_repo: true,
            branches: vec![BranchRecord::local("main", true), BranchRecord::local("dev", false)],
            commits: Some(commits("b", 2)),
            tree: Mutex::new(WorkingTreeStatus::default()),
            stash: Mutex::new(Vec::new()),
            unreachable: false,
            rejects: Mutex::new(HashSet::new()),
            delay: Duration::from_millis(200),
            log: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBackend {
    pub fn with_modified(paths: &[&str]) -> Self {
        let backend = Self::default();
        *backend.tree.lock().unwrap() =
            WorkingTreeStatus::from_entries(vec![], paths.to_vec(), vec![], vec![]);
        backend
    }

    pub fn reject(&self, action: GitAction) {
        self.rejects.lock().unwrap().insert(action);
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }

    fn check(&self, action: GitAction) -> Result<()> {
        if self.rejects.lock().unwrap().contains(&action) {
            return Err(Error::MutationFailed {
                action,
                message: format!("backend rejected {}", action),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BackendClone for FakeBackend {
    async fn get_status(&self, _workspace_id: &str) -> Result<BackendStatus> {
        self.record("status");
        tokio::time::sleep(self.delay).await;
        if self.unreachable {
            return Err(Error::BackendUnavailable("connection refused".to_string()));
        }
        Ok(BackendStatus {
            is_repo: self.is_repo,
            branches: self.branches.clone(),
            status: self.tree.lock().unwrap().clone(),
            current_branch: Some("main".to_string()),
            commits: self.commits.clone(),
        })
    }

    async fn run_action(
        &self,
        _workspace_id: &str,
        action: RemoteAction,
        _credential: &Credential,
    ) -> Result<()> {
        self.record(action.as_str());
        self.check(action.into())
    }

    async fn commit(
        &self,
        _workspace_id: &str,
        paths: &[String],
        message: &str,
        _credential: &Credential,
    ) -> Result<()> {
        self.record(format!("commit {} '{}'", paths.join(","), message));
        self.check(GitAction::Commit)
    }

    async fn stash(
        &self,
        _workspace_id: &str,
        op: StashOp,
        _credential: &Credential,
        message: Option<&str>,
    ) -> Result<()> {
        let action = GitAction::from(op);
        match message {
            Some(m) => self.record(format!("{} '{}'", action, m)),
            None => self.record(action.to_string()),
        }
        self.check(action)?;

        match op {
            StashOp::Push => {
                let tree = std::mem::take(&mut *self.tree.lock().unwrap());
                self.stash.lock().unwrap().push(tree);
            }
            StashOp::Pop => {
                let saved = self
                    .stash
                    .lock()
                    .unwrap()
                    .pop()
                    .ok_or_else(|| Error::MutationFailed {
                        action,
                        message: "no stash entries".to_string(),
                    })?;
                *self.tree.lock().unwrap() = saved;
            }
        }
        Ok(())
    }
}

pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub mirror: Arc<FakeMirror>,
    pub backend: Arc<FakeBackend>,
    pub sync: SyncOrchestrator,
}

pub(crate) fn harness(mirror: FakeMirror, backend: FakeBackend) -> Harness {
    harness_with_store(
        MemoryStore::with_accounts(USER, vec![account("github", "alice")]),
        mirror,
        backend,
    )
}

pub(crate) fn harness_with_store(
    store: MemoryStore,
    mirror: FakeMirror,
    backend: FakeBackend,
) -> Harness {
    let store = Arc::new(store);
    let mirror = Arc::new(mirror);
    let backend = Arc::new(backend);
    let ctx = SyncContext::new(
        &crate::config::SyncConfig::default(),
        store.clone(),
        mirror.clone(),
        backend.clone(),
    );
    Harness {
        store,
        mirror,
        backend,
        sync: SyncOrchestrator::new(ctx),
    }
}
