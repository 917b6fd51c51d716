//! Repository data model shared by the mirror, the backend and the cache

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the abbreviated commit hash shown in the panel
pub const SHORT_HASH_LEN: usize = 7;

/// Identity on a Git hosting provider
///
/// Owned by the credential store; never mutated once linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    /// Provider name (e.g., "github")
    pub provider: String,
    /// Username on the provider
    pub username: String,
    /// Avatar URL, if the provider exposes one
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Opaque reference the credential store can turn into a token
    pub credential_handle: String,
}

/// Author of a commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
    /// Hosting provider login, when the author is linked to an account
    pub login: Option<String>,
    pub avatar_url: Option<String>,
}

/// A single commit as displayed in the panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash
    pub hash: String,
    /// First 7 characters of the hash
    pub short_hash: String,
    /// First line of the commit message
    pub message: String,
    pub author: CommitAuthor,
    pub timestamp: DateTime<Utc>,
    /// True only for the newest commit of a list
    pub is_head: bool,
    pub branch: Option<String>,
    /// Link to the commit on the hosting provider
    pub web_url: Option<String>,
}

impl CommitRecord {
    /// Build a record, deriving the short hash and the message summary
    pub fn new(
        hash: impl Into<String>,
        message: &str,
        author: CommitAuthor,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let hash = hash.into();
        Self {
            short_hash: hash.chars().take(SHORT_HASH_LEN).collect(),
            message: first_line(message).to_string(),
            hash,
            author,
            timestamp,
            is_head: false,
            branch: None,
            web_url: None,
        }
    }

    /// Attach the branch label
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Attach the web URL
    pub fn with_web_url(mut self, url: impl Into<String>) -> Self {
        self.web_url = Some(url.into());
        self
    }
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("").trim_end()
}

/// A branch, identified by name regardless of which source reported it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub name: String,
    pub current: bool,
    pub remote: bool,
    pub ahead: Option<u32>,
    pub behind: Option<u32>,
}

impl BranchRecord {
    /// A branch known only from the hosting provider
    pub fn remote(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote: true,
            ..Default::default()
        }
    }

    /// A branch of the local checkout
    pub fn local(name: impl Into<String>, current: bool) -> Self {
        Self {
            name: name.into(),
            current,
            ..Default::default()
        }
    }
}

/// Merge `incoming` branches into `existing`, keyed by name
///
/// Existing records keep their position and content; incoming records whose
/// name is already present are dropped (first seen wins).
pub fn merge_branches(
    existing: &[BranchRecord],
    incoming: impl IntoIterator<Item = BranchRecord>,
) -> Vec<BranchRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(existing.len());
    let mut merged = Vec::with_capacity(existing.len());

    for branch in existing.iter().cloned().chain(incoming) {
        if seen.insert(branch.name.clone()) {
            merged.push(branch);
        }
    }

    merged
}

/// Changed paths of the working tree, split into four disjoint sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTreeStatus {
    pub staged: BTreeSet<String>,
    pub modified: BTreeSet<String>,
    pub untracked: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
}

impl WorkingTreeStatus {
    /// Build a status from raw lists, keeping each path in one set only
    ///
    /// Precedence when a path is reported more than once:
    /// staged > deleted > modified > untracked.
    pub fn from_entries<I, S>(staged: I, modified: I, untracked: I, deleted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let staged: BTreeSet<String> = staged.into_iter().map(Into::into).collect();
        let deleted: BTreeSet<String> = deleted
            .into_iter()
            .map(Into::into)
            .filter(|p| !staged.contains(p))
            .collect();
        let modified: BTreeSet<String> = modified
            .into_iter()
            .map(Into::into)
            .filter(|p| !staged.contains(p) && !deleted.contains(p))
            .collect();
        let untracked: BTreeSet<String> = untracked
            .into_iter()
            .map(Into::into)
            .filter(|p| !staged.contains(p) && !deleted.contains(p) && !modified.contains(p))
            .collect();

        Self {
            staged,
            modified,
            untracked,
            deleted,
        }
    }

    /// Total number of changed paths
    pub fn changed_count(&self) -> usize {
        self.staged.len() + self.modified.len() + self.untracked.len() + self.deleted.len()
    }

    /// True when nothing is changed
    pub fn is_clean(&self) -> bool {
        self.changed_count() == 0
    }

    /// Whether `path` appears in any of the sets
    pub fn contains(&self, path: &str) -> bool {
        self.staged.contains(path)
            || self.modified.contains(path)
            || self.untracked.contains(path)
            || self.deleted.contains(path)
    }
}

/// The reconciled view of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSnapshot {
    /// Newest first
    pub commits: Vec<CommitRecord>,
    /// Unique by name
    pub branches: Vec<BranchRecord>,
    pub current_branch: String,
    /// Only the backend clone can report this
    pub status: Option<WorkingTreeStatus>,
    pub is_git_repository: bool,
}

impl Default for RepoSnapshot {
    fn default() -> Self {
        Self {
            commits: Vec::new(),
            branches: Vec::new(),
            current_branch: DEFAULT_BRANCH.to_string(),
            status: None,
            is_git_repository: true,
        }
    }
}

/// Branch assumed current when no source says otherwise
pub const DEFAULT_BRANCH: &str = "main";

impl RepoSnapshot {
    /// Snapshot for a workspace whose checkout is not a git repository
    pub fn not_a_repository() -> Self {
        Self {
            is_git_repository: false,
            ..Default::default()
        }
    }

    /// Whether any commits are present
    pub fn has_commits(&self) -> bool {
        !self.commits.is_empty()
    }

    /// Number of changed paths in the working tree, zero when unknown
    pub fn changed_count(&self) -> usize {
        self.status.as_ref().map_or(0, WorkingTreeStatus::changed_count)
    }

    /// Mark exactly the first commit as head
    pub fn normalize_heads(&mut self) {
        for (i, commit) in self.commits.iter_mut().enumerate() {
            commit.is_head = i == 0;
        }
    }
}

/// A workspace as seen by the source-control panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub id: String,
    /// Owner of the linked accounts
    pub user_id: String,
    /// Remote URL of the project checkout, if known
    pub repository_url: Option<String>,
    /// Username of the account explicitly linked to this workspace
    pub linked_username: Option<String>,
}

impl Workspace {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            repository_url: None,
            linked_username: None,
        }
    }

    pub fn with_repository_url(mut self, url: impl Into<String>) -> Self {
        self.repository_url = Some(url.into());
        self
    }

    pub fn with_linked_username(mut self, username: impl Into<String>) -> Self {
        self.linked_username = Some(username.into());
        self
    }
}

/// Backend actions that talk to the hosting remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteAction {
    Fetch,
    Pull,
    Push,
}

impl RemoteAction {
    /// Path segment used by the backend endpoints
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteAction::Fetch => "fetch",
            RemoteAction::Pull => "pull",
            RemoteAction::Push => "push",
        }
    }
}

/// Stash operations supported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StashOp {
    Push,
    Pop,
}

/// Every state-changing action, for error reporting and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitAction {
    Fetch,
    Pull,
    Push,
    Commit,
    StashPush,
    StashPop,
}

impl From<RemoteAction> for GitAction {
    fn from(action: RemoteAction) -> Self {
        match action {
            RemoteAction::Fetch => GitAction::Fetch,
            RemoteAction::Pull => GitAction::Pull,
            RemoteAction::Push => GitAction::Push,
        }
    }
}

impl From<StashOp> for GitAction {
    fn from(op: StashOp) -> Self {
        match op {
            StashOp::Push => GitAction::StashPush,
            StashOp::Pop => GitAction::StashPop,
        }
    }
}

impl fmt::Display for GitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GitAction::Fetch => "fetch",
            GitAction::Pull => "pull",
            GitAction::Push => "push",
            GitAction::Commit => "commit",
            GitAction::StashPush => "stash push",
            GitAction::StashPop => "stash pop",
        };
        f.write_str(name)
    }
}
