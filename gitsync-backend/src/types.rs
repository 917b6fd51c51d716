//! Wire types of the backend git endpoints.

use chrono::{DateTime, Utc};
use gitsync_core::{
    BackendStatus, BranchRecord, CommitAuthor, CommitRecord, StashOp, WorkingTreeStatus,
};
use serde::{Deserialize, Serialize};

/// Response of `GET /status/{workspace}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_repo: bool,
    #[serde(default)]
    pub branches: Vec<BranchEntry>,
    #[serde(default)]
    pub status: TreeEntries,
    pub current_branch: Option<String>,
    pub commits: Option<Vec<CommitEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchEntry {
    pub name: String,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub remote: bool,
    pub ahead: Option<u32>,
    pub behind: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TreeEntries {
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitEntry {
    pub hash: String,
    pub message: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub email: String,
    pub date: DateTime<Utc>,
    pub branch: Option<String>,
}

/// Body of `POST /commit/{workspace}`.
#[derive(Debug, Serialize)]
pub struct CommitRequest<'a> {
    pub files: &'a [String],
    pub message: &'a str,
}

/// Body of `POST /stash/{workspace}`.
#[derive(Debug, Serialize)]
pub struct StashRequest<'a> {
    pub action: StashOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

/// Error body; backends use either field.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl From<BranchEntry> for BranchRecord {
    fn from(entry: BranchEntry) -> Self {
        BranchRecord {
            name: entry.name,
            current: entry.current,
            remote: entry.remote,
            ahead: entry.ahead,
            behind: entry.behind,
        }
    }
}

impl From<CommitEntry> for CommitRecord {
    fn from(entry: CommitEntry) -> Self {
        let author = CommitAuthor {
            name: entry.author,
            email: entry.email,
            ..Default::default()
        };
        let record = CommitRecord::new(entry.hash, &entry.message, author, entry.date);
        match entry.branch {
            Some(branch) => record.with_branch(branch),
            None => record,
        }
    }
}

impl From<StatusResponse> for BackendStatus {
    fn from(response: StatusResponse) -> Self {
        let tree = response.status;
        BackendStatus {
            is_repo: response.is_repo,
            branches: response.branches.into_iter().map(BranchRecord::from).collect(),
            status: WorkingTreeStatus::from_entries(
                tree.staged,
                tree.modified,
                tree.untracked,
                tree.deleted,
            ),
            current_branch: response.current_branch,
            commits: response
                .commits
                .map(|commits| commits.into_iter().map(CommitRecord::from).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_response_conversion() {
        let response: StatusResponse = serde_json::from_value(json!({
            "isRepo": true,
            "branches": [
                {"name": "main", "current": true, "ahead": 1, "behind": 0},
                {"name": "origin/dev", "remote": true}
            ],
            "status": {"staged": ["a.rs"], "modified": ["a.rs", "b.rs"], "untracked": ["c.rs"]},
            "currentBranch": "main",
            "commits": [
                {
                    "hash": "1234567890",
                    "message": "Add x\n\nbody",
                    "author": "Ada",
                    "email": "ada@example.com",
                    "date": "2024-05-01T10:00:00Z"
                }
            ]
        }))
        .unwrap();

        let status = BackendStatus::from(response);
        assert!(status.is_repo);
        assert_eq!(status.branches.len(), 2);
        assert!(status.branches[0].current);
        assert_eq!(status.branches[0].ahead, Some(1));
        assert!(status.branches[1].remote);
        assert_eq!(status.status.changed_count(), 3);
        assert!(status.status.staged.contains("a.rs"));
        assert!(!status.status.modified.contains("a.rs"));
        assert_eq!(status.current_branch.as_deref(), Some("main"));

        let commits = status.commits.unwrap();
        assert_eq!(commits[0].short_hash, "1234567");
        assert_eq!(commits[0].message, "Add x");
    }

    #[test]
    fn test_minimal_non_repo_response() {
        let response: StatusResponse = serde_json::from_value(json!({"isRepo": false})).unwrap();
        let status = BackendStatus::from(response);
        assert!(!status.is_repo);
        assert!(status.branches.is_empty());
        assert!(status.status.is_clean());
        assert!(status.commits.is_none());
    }

    #[test]
    fn test_stash_request_omits_missing_message() {
        let pop = serde_json::to_value(StashRequest {
            action: StashOp::Pop,
            message: None,
        })
        .unwrap();
        assert_eq!(pop, json!({"action": "pop"}));

        let push = serde_json::to_value(StashRequest {
            action: StashOp::Push,
            message: Some("auto-stash before pull"),
        })
        .unwrap();
        assert_eq!(push, json!({"action": "push", "message": "auto-stash before pull"}));
    }
}
