//! Repository URL parsing

use crate::{Error, Result};

/// Owner and name of a repository hosted at `https://<host>/<owner>/<repo>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    /// Host (e.g., "github.com")
    pub host: String,
    /// Repository owner/organization
    pub owner: String,
    /// Repository name, without a `.git` suffix
    pub repo: String,
}

impl RepoUrl {
    /// Parse a hosting provider URL
    ///
    /// Accepts:
    /// - `https://github.com/owner/repo`
    /// - `https://github.com/owner/repo.git`
    /// - the same with `http://` or a trailing `/`
    ///
    /// Shorthands, SSH remotes and local paths are rejected: they cannot be
    /// mapped onto a hosting API.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if !input.starts_with("https://") && !input.starts_with("http://") {
            return Err(Error::Config(format!(
                "Not a hosting URL: {}. Expected https://<host>/<owner>/<repo>",
                input
            )));
        }

        let url = url::Url::parse(input)
            .map_err(|e| Error::Config(format!("Invalid repository URL {}: {}", input, e)))?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Config(format!("Repository URL has no host: {}", input)))?
            .to_lowercase();

        let path = url.path().trim_matches('/');
        let parts: Vec<&str> = path.split('/').collect();

        match parts.as_slice() {
            [owner, repo] if !owner.is_empty() => {
                let repo = repo.strip_suffix(".git").unwrap_or(repo);
                if repo.is_empty() {
                    return Err(Error::Config(format!("Missing repository name: {}", input)));
                }
                Ok(Self {
                    host,
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(Error::Config(format!(
                "Invalid repository path: {}. Expected /<owner>/<repo>",
                path
            ))),
        }
    }

    /// Hosting provider inferred from the host, if it is a well-known one
    pub fn provider(&self) -> Option<&'static str> {
        provider_for_host(&self.host)
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Map a host to the provider name linked accounts use
pub fn provider_for_host(host: &str) -> Option<&'static str> {
    let host = host.trim_start_matches("www.");
    match host {
        "github.com" => Some("github"),
        "gitlab.com" => Some("gitlab"),
        "bitbucket.org" => Some("bitbucket"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https() {
        let url = RepoUrl::parse("https://github.com/owner/repo").unwrap();
        assert_eq!(url.owner, "owner");
        assert_eq!(url.repo, "repo");
        assert_eq!(url.host, "github.com");
        assert_eq!(url.provider(), Some("github"));
    }

    #[test]
    fn test_parse_https_with_git() {
        let url = RepoUrl::parse("https://github.com/owner/repo.git").unwrap();
        assert_eq!(url.repo, "repo");
        assert_eq!(url.full_name(), "owner/repo");
    }

    #[test]
    fn test_parse_trailing_slash() {
        let url = RepoUrl::parse("https://gitlab.com/group/project/").unwrap();
        assert_eq!(url.repo, "project");
        assert_eq!(url.provider(), Some("gitlab"));
    }

    #[test]
    fn test_unknown_host_has_no_provider() {
        let url = RepoUrl::parse("https://git.example.com/team/app").unwrap();
        assert_eq!(url.provider(), None);
    }

    #[test]
    fn test_rejects_non_hosting_inputs() {
        assert!(RepoUrl::parse("/home/user/project").is_err());
        assert!(RepoUrl::parse("owner/repo").is_err());
        assert!(RepoUrl::parse("git@github.com:owner/repo.git").is_err());
        assert!(RepoUrl::parse("https://github.com/owner").is_err());
        assert!(RepoUrl::parse("https://github.com/owner/repo/tree/main").is_err());
        assert!(RepoUrl::parse("https://github.com/owner/.git").is_err());
        assert!(RepoUrl::parse("").is_err());
    }
}
