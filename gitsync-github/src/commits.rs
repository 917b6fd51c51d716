//! Recent commits of a repository's default branch

use crate::{Error, GitHubMirror, Result};
use chrono::{DateTime, Utc};
use gitsync_core::{CommitAuthor, CommitRecord, Credential};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Query parameters of a paged list request
#[derive(Debug, Serialize)]
pub(crate) struct PageParams {
    pub per_page: u8,
}

/// Entry of `GET /repos/{owner}/{repo}/commits`
#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    html_url: Option<String>,
    commit: CommitDetail,
    /// GitHub user linked to the git author, if any
    author: Option<UserRef>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: Option<GitActor>,
    committer: Option<GitActor>,
}

#[derive(Debug, Deserialize)]
struct GitActor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    login: String,
    avatar_url: Option<String>,
}

impl From<CommitItem> for CommitRecord {
    fn from(item: CommitItem) -> Self {
        let timestamp = item
            .commit
            .author
            .as_ref()
            .and_then(|a| a.date)
            .or_else(|| item.commit.committer.as_ref().and_then(|c| c.date))
            .unwrap_or_default();

        let (name, email) = item
            .commit
            .author
            .map(|a| (a.name, a.email))
            .unwrap_or_default();

        let author = CommitAuthor {
            name,
            email,
            login: item.author.as_ref().map(|u| u.login.clone()),
            avatar_url: item.author.and_then(|u| u.avatar_url),
        };

        let record = CommitRecord::new(item.sha, &item.commit.message, author, timestamp);
        match item.html_url {
            Some(url) => record.with_web_url(url),
            None => record,
        }
    }
}

impl GitHubMirror {
    /// Fetch the newest commits, newest first, with `is_head` on the first
    pub async fn fetch_commits(
        &self,
        owner: &str,
        repo: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<CommitRecord>> {
        let full_name = format!("{}/{}", owner, repo);
        debug!(repo = %full_name, per_page = self.commits_per_page(), "Fetching commits");

        let items: Vec<CommitItem> = self
            .client(credential)?
            .get(
                format!("/repos/{}/{}/commits", owner, repo),
                Some(&PageParams {
                    per_page: self.commits_per_page(),
                }),
            )
            .await
            .map_err(|e| Error::from_api(e, &full_name))?;

        let mut commits: Vec<CommitRecord> = items.into_iter().map(CommitRecord::from).collect();
        if let Some(head) = commits.first_mut() {
            head.is_head = true;
        }

        debug!(repo = %full_name, count = commits.len(), "Fetched commits");
        Ok(commits)
    }
}
