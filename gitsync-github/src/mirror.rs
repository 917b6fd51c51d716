//! `RemoteMirror` implementation for GitHub

use crate::GitHubMirror;
use async_trait::async_trait;
use gitsync_core::{BranchRecord, CommitRecord, Credential, RemoteMirror};

#[async_trait]
impl RemoteMirror for GitHubMirror {
    fn supports_host(&self, host: &str) -> bool {
        self.serves_host(host)
    }

    async fn get_commits(
        &self,
        owner: &str,
        repo: &str,
        credential: Option<&Credential>,
    ) -> gitsync_core::Result<Vec<CommitRecord>> {
        Ok(self.fetch_commits(owner, repo, credential).await?)
    }

    async fn get_branches(
        &self,
        owner: &str,
        repo: &str,
        credential: Option<&Credential>,
    ) -> gitsync_core::Result<Vec<BranchRecord>> {
        Ok(self.fetch_branches(owner, repo, credential).await?)
    }
}
