//! Sync orchestrator: reconciles repository state for the source-control panel
//!
//! A reconciliation pass tries the remote mirror first (fast, but blind to
//! the working tree) and falls back to the backend clone (authoritative, but
//! possibly waiting on a cold VM):
//!
//! 1. A fresh cached snapshot is shown immediately and refreshed silently.
//! 2. Accounts and the credential are resolved under a timeout, falling back
//!    to the last known account list.
//! 3. Fast path: commits and branches from the mirror, concurrently. Commits
//!    replace the displayed list; branches are merged by name. The working
//!    tree status is patched in afterwards from the backend.
//! 4. Slow path, only when the fast path yields no commits: the backend
//!    status becomes the whole snapshot.
//!
//! Mirror failures never reach the panel. Other failures only surface when
//! no commits are on screen.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::backend::BackendClone;
use crate::cache::SnapshotCache;
use crate::config::SyncConfig;
use crate::credentials::{Credential, CredentialResolver, CredentialStore};
use crate::git::RepoUrl;
use crate::mirror::RemoteMirror;
use crate::model::{merge_branches, LinkedAccount, RepoSnapshot, Workspace, DEFAULT_BRANCH};
use crate::session::{LoadFailure, LoadPhase, LoadSession, PanelHandle, PanelView, SessionState};
use crate::{Error, Result};

/// Branch names the fast path treats as the repository's main line
const MAINLINE_BRANCHES: [&str; 2] = ["main", "master"];

/// Collaborators and shared state for the orchestrator and the executor
pub struct SyncContext {
    pub cache: Arc<SnapshotCache>,
    pub credentials: CredentialResolver,
    pub mirror: Arc<dyn RemoteMirror>,
    pub backend: Arc<dyn BackendClone>,
    pub credential_timeout: Duration,
}

impl SyncContext {
    pub fn new(
        config: &SyncConfig,
        store: Arc<dyn CredentialStore>,
        mirror: Arc<dyn RemoteMirror>,
        backend: Arc<dyn BackendClone>,
    ) -> Self {
        Self {
            cache: Arc::new(SnapshotCache::new(config.cache_ttl)),
            credentials: CredentialResolver::new(store),
            mirror,
            backend,
            credential_timeout: config.credential_timeout,
        }
    }
}

impl fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncContext")
            .field("cache", &self.cache)
            .field("credential_timeout", &self.credential_timeout)
            .finish_non_exhaustive()
    }
}

/// Result of the blocking part of a pass
struct Reconciled {
    snapshot: RepoSnapshot,
    /// Came from the mirror; working tree status still to be patched in
    needs_status: bool,
}

#[derive(Debug, Default)]
struct State {
    sessions: HashMap<String, LoadSession>,
    /// Workspace id -> pass currently running its blocking part
    in_flight: HashMap<String, u64>,
    /// User id -> last account list loaded successfully
    known_accounts: HashMap<String, Vec<LinkedAccount>>,
}

#[derive(Debug)]
struct Inner {
    ctx: SyncContext,
    state: Mutex<State>,
}

/// Drives the load protocol for every workspace
#[derive(Debug, Clone)]
pub struct SyncOrchestrator {
    inner: Arc<Inner>,
}

impl SyncOrchestrator {
    pub fn new(ctx: SyncContext) -> Self {
        Self {
            inner: Arc::new(Inner {
                ctx,
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn context(&self) -> &SyncContext {
        &self.inner.ctx
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Panel became visible for `workspace`
    ///
    /// Returns `None` if the panel is already open. Otherwise the returned
    /// view already holds a fresh cached snapshot, if there is one, and a
    /// reconciliation pass runs in the background. Must be called within a
    /// Tokio runtime.
    pub fn open_panel(&self, workspace: &Workspace) -> Option<PanelHandle> {
        let mut state = self.state();

        if state
            .sessions
            .get(&workspace.id)
            .is_some_and(|s| s.state == SessionState::Started)
        {
            debug!(workspace = %workspace.id, "Panel already open, ignoring");
            return None;
        }

        debug!(workspace = %workspace.id, phase = %LoadPhase::CheckingCache, "Opening panel");

        let cached = self.inner.ctx.cache.get_fresh(&workspace.id);
        let initial = match &cached {
            Some(entry) => {
                debug!(
                    workspace = %workspace.id,
                    age_secs = entry.age().as_secs(),
                    commits = entry.snapshot.commits.len(),
                    "Cache hit"
                );
                PanelView::cached(entry.snapshot.clone())
            }
            None => PanelView::empty_loading(),
        };
        let (mut session, view) = LoadSession::open(initial);

        if let Some(&pass) = state.in_flight.get(&workspace.id) {
            debug!(workspace = %workspace.id, pass, "Joining reconciliation already in flight");
            session.pass = Some(pass);
            state.sessions.insert(workspace.id.clone(), session);
            return Some(PanelHandle::new(view, None));
        }

        let pass = self.inner.ctx.cache.begin_pass();
        state.in_flight.insert(workspace.id.clone(), pass);
        session.pass = Some(pass);
        state.sessions.insert(workspace.id.clone(), session);
        drop(state);

        let this = self.clone();
        let workspace = workspace.clone();
        let silent = cached.is_some();
        let task = tokio::spawn(async move {
            // Failures are published to the panel and logged by the pass
            let _ = this.run_pass(&workspace, pass, silent).await;
        });

        Some(PanelHandle::new(view, Some(task)))
    }

    /// Panel hidden: drop the session so the next open starts a fresh pass
    ///
    /// A pass still running keeps updating the cache but no longer the view.
    pub fn close_panel(&self, workspace_id: &str) -> bool {
        let closed = self.state().sessions.remove(workspace_id).is_some();
        if closed {
            debug!(workspace = workspace_id, "Panel closed");
        }
        closed
    }

    /// Session state of a workspace panel
    pub fn session_state(&self, workspace_id: &str) -> SessionState {
        self.state()
            .sessions
            .get(workspace_id)
            .map(|s| s.state)
            .unwrap_or_default()
    }

    /// View of an open panel
    pub fn subscribe(&self, workspace_id: &str) -> Option<watch::Receiver<PanelView>> {
        self.state()
            .sessions
            .get(workspace_id)
            .map(|s| s.view.subscribe())
    }

    /// Run one silent pass now, e.g. after a mutation
    ///
    /// Returns `Ok(None)` without doing anything when a pass is already in
    /// flight for the workspace.
    pub async fn reload(&self, workspace: &Workspace) -> Result<Option<RepoSnapshot>> {
        let pass = {
            let mut state = self.state();
            if let Some(running) = state.in_flight.get(&workspace.id) {
                debug!(
                    workspace = %workspace.id,
                    running,
                    "Reconciliation in flight, skipping reload"
                );
                return Ok(None);
            }
            let pass = self.inner.ctx.cache.begin_pass();
            state.in_flight.insert(workspace.id.clone(), pass);
            if let Some(session) = state.sessions.get_mut(&workspace.id) {
                session.pass = Some(pass);
            }
            pass
        };

        self.run_pass(workspace, pass, true).await.map(Some)
    }

    /// Drop the cached snapshot and run a silent pass that supersedes any
    /// pass in flight
    ///
    /// A pass that began before the call can no longer write the cache or
    /// the view, so the new pass always runs. Used after mutations.
    pub async fn refresh(&self, workspace: &Workspace) -> Result<RepoSnapshot> {
        let pass = {
            let mut state = self.state();
            self.inner.ctx.cache.invalidate(&workspace.id);
            let pass = self.inner.ctx.cache.begin_pass();
            if let Some(previous) = state.in_flight.insert(workspace.id.clone(), pass) {
                debug!(
                    workspace = %workspace.id,
                    previous,
                    pass,
                    "Superseding reconciliation in flight"
                );
            }
            if let Some(session) = state.sessions.get_mut(&workspace.id) {
                session.pass = Some(pass);
            }
            pass
        };

        self.run_pass(workspace, pass, true).await
    }

    /// Resolve the credential for a workspace, bounded by the credential
    /// timeout
    ///
    /// On timeout or store failure the last account list loaded for the user
    /// is used instead, within what is left of the same deadline.
    pub async fn resolve_credential(&self, workspace: &Workspace) -> Option<Credential> {
        let ctx = &self.inner.ctx;
        let url = workspace.repository_url.as_deref();
        let hint = workspace.linked_username.as_deref();
        let deadline = Instant::now() + ctx.credential_timeout;

        let fresh = tokio::time::timeout_at(deadline, async {
            let accounts = ctx.credentials.accounts(&workspace.user_id).await?;
            self.state()
                .known_accounts
                .insert(workspace.user_id.clone(), accounts.clone());
            Ok::<_, Error>(
                ctx.credentials
                    .resolve(&workspace.user_id, &accounts, url, hint)
                    .await,
            )
        })
        .await;

        match fresh {
            Ok(Ok(credential)) => return credential,
            Ok(Err(e)) => {
                warn!(user = %workspace.user_id, error = %e, "Failed to load linked accounts");
            }
            Err(_) => {
                warn!(
                    user = %workspace.user_id,
                    timeout_secs = ctx.credential_timeout.as_secs(),
                    "Credential resolution timed out"
                );
            }
        }

        let known = self
            .state()
            .known_accounts
            .get(&workspace.user_id)
            .cloned()
            .unwrap_or_default();
        if known.is_empty() {
            return None;
        }

        debug!(user = %workspace.user_id, count = known.len(), "Using last known accounts");
        tokio::time::timeout_at(
            deadline,
            ctx.credentials.resolve(&workspace.user_id, &known, url, hint),
        )
        .await
        .ok()
        .flatten()
    }

    /// Apply `update` to the panel view if the panel follows `pass`
    fn publish(&self, workspace_id: &str, pass: u64, update: impl FnOnce(&mut PanelView)) {
        let state = self.state();
        if let Some(session) = state.sessions.get(workspace_id) {
            if session.pass == Some(pass) {
                session.view.send_modify(update);
            }
        }
    }

    fn finish_pass(&self, workspace_id: &str, pass: u64) {
        let mut state = self.state();
        if state.in_flight.get(workspace_id) == Some(&pass) {
            state.in_flight.remove(workspace_id);
        }
    }

    async fn run_pass(
        &self,
        workspace: &Workspace,
        pass: u64,
        silent: bool,
    ) -> Result<RepoSnapshot> {
        let result = self.reconcile(workspace, pass, silent).await;

        match result {
            Ok(Reconciled {
                snapshot,
                needs_status,
            }) => {
                let phase = if needs_status {
                    LoadPhase::FastDone
                } else {
                    LoadPhase::Ready
                };
                self.publish(&workspace.id, pass, |view| view.show(snapshot.clone(), phase));
                self.finish_pass(&workspace.id, pass);

                info!(
                    workspace = %workspace.id,
                    pass,
                    commits = snapshot.commits.len(),
                    branches = snapshot.branches.len(),
                    source = if needs_status { "mirror" } else { "backend" },
                    "Reconciled repository"
                );

                if needs_status {
                    if let Some(patched) = self.patch_status(workspace, pass).await {
                        return Ok(patched);
                    }
                }
                Ok(snapshot)
            }
            Err(e) => {
                self.publish(&workspace.id, pass, |view| {
                    view.loading = false;
                    if view.has_commits() {
                        debug!(error = %e, "Keeping displayed commits after failed reconciliation");
                    } else {
                        view.phase = LoadPhase::Failed;
                        view.failure = Some(LoadFailure {
                            message: e.to_string(),
                            retryable: e.is_retryable(),
                        });
                    }
                });
                self.finish_pass(&workspace.id, pass);
                warn!(workspace = %workspace.id, pass, error = %e, "Reconciliation failed");
                Err(e)
            }
        }
    }

    async fn reconcile(
        &self,
        workspace: &Workspace,
        pass: u64,
        silent: bool,
    ) -> Result<Reconciled> {
        let ctx = &self.inner.ctx;

        if !silent {
            self.publish(&workspace.id, pass, |view| {
                view.phase = LoadPhase::Loading;
                view.loading = true;
            });
        }

        let hosted = workspace
            .repository_url
            .as_deref()
            .and_then(|url| RepoUrl::parse(url).ok())
            .filter(|url| ctx.mirror.supports_host(&url.host));

        if let Some(url) = hosted {
            let existing = ctx.cache.peek(&workspace.id).map(|entry| entry.snapshot);
            let credential = self.resolve_credential(workspace).await;

            if let Some(snapshot) = self
                .fast_path(&url, existing, credential.as_ref())
                .await
            {
                ctx.cache.store(&workspace.id, pass, snapshot.clone());
                return Ok(Reconciled {
                    snapshot,
                    needs_status: true,
                });
            }
        } else {
            debug!(workspace = %workspace.id, "No hosting URL, skipping remote mirror");
        }

        if !silent {
            self.publish(&workspace.id, pass, |view| view.phase = LoadPhase::SlowPath);
        }

        let snapshot = self.slow_path(workspace).await?;
        ctx.cache.store(&workspace.id, pass, snapshot.clone());
        Ok(Reconciled {
            snapshot,
            needs_status: false,
        })
    }

    async fn fast_path(
        &self,
        url: &RepoUrl,
        existing: Option<RepoSnapshot>,
        credential: Option<&Credential>,
    ) -> Option<RepoSnapshot> {
        let mirror = &self.inner.ctx.mirror;

        debug!(
            repo = %url.full_name(),
            authenticated = credential.is_some(),
            "Querying remote mirror"
        );

        let (commits, branches) = tokio::join!(
            mirror.get_commits(&url.owner, &url.repo, credential),
            mirror.get_branches(&url.owner, &url.repo, credential),
        );

        let commits = absorb_enrichment(commits).filter(|c| !c.is_empty())?;
        let remote_branches = absorb_enrichment(branches).unwrap_or_default();

        let current_branch = MAINLINE_BRANCHES
            .iter()
            .find(|name| remote_branches.iter().any(|b| b.name == **name))
            .map_or_else(|| DEFAULT_BRANCH.to_string(), |name| name.to_string());

        let existing = existing.unwrap_or_default();
        let mut snapshot = RepoSnapshot {
            commits,
            branches: merge_branches(&existing.branches, remote_branches),
            current_branch,
            status: existing.status,
            is_git_repository: true,
        };
        snapshot.normalize_heads();
        Some(snapshot)
    }

    async fn slow_path(&self, workspace: &Workspace) -> Result<RepoSnapshot> {
        let status = self.inner.ctx.backend.get_status(&workspace.id).await?;

        if !status.is_repo {
            debug!(workspace = %workspace.id, "Backend reports no git repository");
            return Ok(RepoSnapshot::not_a_repository());
        }

        let current_branch = status
            .current_branch
            .or_else(|| {
                status
                    .branches
                    .iter()
                    .find(|b| b.current)
                    .map(|b| b.name.clone())
            })
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        let mut snapshot = RepoSnapshot {
            commits: status.commits.unwrap_or_default(),
            branches: merge_branches(&[], status.branches),
            current_branch,
            status: Some(status.status),
            is_git_repository: true,
        };
        snapshot.normalize_heads();
        Ok(snapshot)
    }

    /// Fetch the working tree status after a fast-path pass and patch it into
    /// the snapshot written by that pass
    async fn patch_status(&self, workspace: &Workspace, pass: u64) -> Option<RepoSnapshot> {
        let ctx = &self.inner.ctx;

        let patched = match ctx.backend.get_status(&workspace.id).await {
            Ok(status) if status.is_repo => {
                let patched = ctx.cache.patch_status(&workspace.id, pass, status.status);
                if patched.is_none() {
                    debug!(
                        workspace = %workspace.id,
                        pass,
                        "Snapshot superseded, dropping status patch"
                    );
                }
                patched
            }
            Ok(_) => {
                debug!(
                    workspace = %workspace.id,
                    "Backend reports no git repository, status left unset"
                );
                None
            }
            Err(e) => {
                warn!(workspace = %workspace.id, error = %e, "Working tree status unavailable");
                None
            }
        };

        self.publish(&workspace.id, pass, |view| {
            if let Some(snapshot) = &patched {
                view.snapshot = Some(snapshot.clone());
            }
            view.phase = LoadPhase::Ready;
        });

        patched
    }
}

/// Mirror failures are enrichment only: log and continue without them
fn absorb_enrichment<T>(result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "Remote mirror unavailable, continuing without it");
            None
        }
    }
}
