//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API error
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// Repository missing or invisible to the credential used
    #[error("Repository {0} not found or not accessible")]
    RepoNotFound(String),

    /// Rate limit exceeded
    #[error("GitHub rate limit exceeded: {0}")]
    RateLimited(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Classify an octocrab failure for `repo` (`owner/name`)
    pub fn from_api(err: octocrab::Error, repo: &str) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => {
                let message = source.message.as_str();
                if message.contains("Not Found") {
                    Error::RepoNotFound(repo.to_string())
                } else if message.contains("Bad credentials")
                    || message.contains("Requires authentication")
                {
                    Error::Auth(message.to_string())
                } else if message.to_ascii_lowercase().contains("rate limit") {
                    Error::RateLimited(message.to_string())
                } else {
                    Error::Api(err)
                }
            }
            _ => Error::Api(err),
        }
    }
}

/// Mirror failures are enrichment failures to the orchestrator
impl From<Error> for gitsync_core::Error {
    fn from(err: Error) -> Self {
        gitsync_core::Error::EnrichmentUnavailable(err.to_string())
    }
}
