//! GitHub API client using octocrab

use crate::{Error, Result};
use gitsync_core::{Credential, GitHubConfig};
use octocrab::Octocrab;
use tracing::debug;

/// Host of the public GitHub web UI
const GITHUB_HOST: &str = "github.com";

/// Read-only GitHub client backing the remote mirror
///
/// A new octocrab client is built per request because the credential
/// differs between workspaces.
pub struct GitHubMirror {
    api_url: String,
    /// Web host of a GitHub Enterprise instance, derived from `api_url`
    enterprise_host: Option<String>,
    commits_per_page: u8,
}

impl GitHubMirror {
    /// Create a mirror client from configuration
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let parsed = url::Url::parse(&config.api_url).map_err(|e| {
            Error::Parse(format!("Invalid GitHub API URL {}: {}", config.api_url, e))
        })?;

        let enterprise_host = parsed
            .host_str()
            .map(|host| host.to_ascii_lowercase())
            .filter(|host| host != "api.github.com" && host != GITHUB_HOST);

        debug!(api_url = %config.api_url, "Created GitHub mirror");

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            enterprise_host,
            commits_per_page: config.commits_per_page.max(1),
        })
    }

    /// API base URL requests are sent to
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Number of commits requested per call
    pub fn commits_per_page(&self) -> u8 {
        self.commits_per_page
    }

    /// Whether repository URLs on `host` are served by this API
    pub fn serves_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        host == GITHUB_HOST || self.enterprise_host.as_deref() == Some(host)
    }

    /// Build an octocrab client, authenticated when a credential is given
    pub(crate) fn client(&self, credential: Option<&Credential>) -> Result<Octocrab> {
        let mut builder = Octocrab::builder()
            .base_uri(self.api_url.as_str())
            .map_err(|e| Error::Parse(format!("Invalid GitHub API URL {}: {}", self.api_url, e)))?;

        if let Some(credential) = credential {
            builder = builder.personal_token(credential.token().to_string());
        }

        builder
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))
    }
}

impl std::fmt::Debug for GitHubMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubMirror")
            .field("api_url", &self.api_url)
            .field("commits_per_page", &self.commits_per_page)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str) -> GitHubConfig {
        GitHubConfig {
            api_url: api_url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_public_github_hosts() {
        let mirror = GitHubMirror::new(&GitHubConfig::default()).unwrap();
        assert!(mirror.serves_host("github.com"));
        assert!(mirror.serves_host("GitHub.com"));
        assert!(mirror.serves_host("www.github.com"));
        assert!(!mirror.serves_host("gitlab.com"));
        assert!(!mirror.serves_host("api.github.com.evil.io"));
    }

    #[test]
    fn test_enterprise_host_from_api_url() {
        let mirror = GitHubMirror::new(&config("https://git.corp.example/api/v3/")).unwrap();
        assert!(mirror.serves_host("git.corp.example"));
        assert!(mirror.serves_host("github.com"));
        assert_eq!(mirror.api_url(), "https://git.corp.example/api/v3");
    }

    #[test]
    fn test_invalid_api_url() {
        assert!(matches!(
            GitHubMirror::new(&config("not a url")),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_commits_per_page_at_least_one() {
        let mirror = GitHubMirror::new(&GitHubConfig {
            commits_per_page: 0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(mirror.commits_per_page(), 1);
    }
}
