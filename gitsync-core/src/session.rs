//! Panel sessions and the view published to the presentation layer

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::model::RepoSnapshot;

/// Whether a panel is open for a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Panel hidden; the next open starts a fresh pass
    #[default]
    Idle,
    /// Panel open; further opens are ignored until it is closed
    Started,
}

/// Step of the load protocol a workspace view is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadPhase {
    #[default]
    Idle,
    CheckingCache,
    /// A fresh cached snapshot is displayed; a silent refresh may follow
    CacheHit,
    CacheMiss,
    Loading,
    /// Commits from the remote mirror are in; status still pending
    FastDone,
    /// Reading the backend clone
    SlowPath,
    Ready,
    Failed,
}

impl LoadPhase {
    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            LoadPhase::Idle => "Idle",
            LoadPhase::CheckingCache => "Checking cache",
            LoadPhase::CacheHit => "Showing cached data",
            LoadPhase::CacheMiss => "No cached data",
            LoadPhase::Loading => "Loading repository",
            LoadPhase::FastDone => "Loaded from hosting provider",
            LoadPhase::SlowPath => "Loading from workspace",
            LoadPhase::Ready => "Ready",
            LoadPhase::Failed => "Failed",
        }
    }

    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadPhase::Ready | LoadPhase::Failed)
    }
}

impl std::fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Why a view ended up empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub message: String,
    /// Reopening the panel may succeed
    pub retryable: bool,
}

/// What the source-control panel renders for one workspace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelView {
    pub snapshot: Option<RepoSnapshot>,
    pub phase: LoadPhase,
    /// Blocking load indicator; never set during a silent refresh
    pub loading: bool,
    pub failure: Option<LoadFailure>,
}

impl PanelView {
    /// View for a panel opened over a fresh cached snapshot
    pub fn cached(snapshot: RepoSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            phase: LoadPhase::CacheHit,
            loading: false,
            failure: None,
        }
    }

    /// View for a panel opened with nothing to show yet
    pub fn empty_loading() -> Self {
        Self {
            snapshot: None,
            phase: LoadPhase::CacheMiss,
            loading: true,
            failure: None,
        }
    }

    /// Whether commits are on screen
    pub fn has_commits(&self) -> bool {
        self.snapshot.as_ref().is_some_and(RepoSnapshot::has_commits)
    }

    pub(crate) fn show(&mut self, snapshot: RepoSnapshot, phase: LoadPhase) {
        self.snapshot = Some(snapshot);
        self.phase = phase;
        self.loading = false;
        self.failure = None;
    }
}

/// Per-workspace guard for one panel-open lifetime
#[derive(Debug)]
pub(crate) struct LoadSession {
    pub state: SessionState,
    /// Pass whose results this panel accepts; follows the latest pass started
    /// while the panel is open
    pub pass: Option<u64>,
    pub view: watch::Sender<PanelView>,
}

impl LoadSession {
    pub fn open(initial: PanelView) -> (Self, watch::Receiver<PanelView>) {
        let (view, rx) = watch::channel(initial);
        (
            Self {
                state: SessionState::Started,
                pass: None,
                view,
            },
            rx,
        )
    }
}

/// Returned by the first open of a panel
#[derive(Debug)]
pub struct PanelHandle {
    pub view: watch::Receiver<PanelView>,
    task: Option<JoinHandle<()>>,
}

impl PanelHandle {
    pub(crate) fn new(view: watch::Receiver<PanelView>, task: Option<JoinHandle<()>>) -> Self {
        Self { view, task }
    }

    /// Current view
    pub fn current(&self) -> PanelView {
        self.view.borrow().clone()
    }

    /// Wait until the pass started by this open, including its background
    /// status patch, has finished
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Reconciliation task aborted");
            }
        }
    }
}
