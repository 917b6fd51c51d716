//! Branch listing

use crate::commits::PageParams;
use crate::{Error, GitHubMirror, Result};
use gitsync_core::{BranchRecord, Credential};
use serde::Deserialize;
use tracing::debug;

/// Branches requested per call; the panel does not page further
const BRANCHES_PER_PAGE: u8 = 100;

#[derive(Debug, Deserialize)]
struct BranchItem {
    name: String,
}

impl GitHubMirror {
    /// Fetch the repository's branches as remote branch records
    pub async fn fetch_branches(
        &self,
        owner: &str,
        repo: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<BranchRecord>> {
        let full_name = format!("{}/{}", owner, repo);
        debug!(repo = %full_name, "Fetching branches");

        let items: Vec<BranchItem> = self
            .client(credential)?
            .get(
                format!("/repos/{}/{}/branches", owner, repo),
                Some(&PageParams {
                    per_page: BRANCHES_PER_PAGE,
                }),
            )
            .await
            .map_err(|e| Error::from_api(e, &full_name))?;

        Ok(items
            .into_iter()
            .map(|item| BranchRecord::remote(item.name))
            .collect())
    }
}
