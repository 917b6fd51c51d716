//! Error types for gitsync

use thiserror::Error;

use crate::model::GitAction;

/// Result type alias for gitsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for gitsync operations
///
/// The first five variants are the reconciliation/mutation taxonomy that the
/// presentation layer branches on. The rest are ambient failures.
#[derive(Error, Debug)]
pub enum Error {
    /// The remote mirror could not be reached or refused the request.
    ///
    /// Always absorbed by the sync orchestrator, never shown to the user.
    #[error("Remote mirror unavailable: {0}")]
    EnrichmentUnavailable(String),

    /// The backend that owns the checkout failed and no cached data exists
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A mutating action needs a credential and none could be resolved
    #[error("Authentication required: link a Git hosting account to continue")]
    AuthRequired,

    /// Rejected locally before any network call
    #[error("Invalid input: {0}")]
    UserInput(String),

    /// The backend rejected a fetch/pull/push/commit/stash
    #[error("{action} failed: {message}")]
    MutationFailed {
        /// Which action was rejected
        action: GitAction,
        /// Backend-provided message when available
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the user can fix this by linking an account
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Error::AuthRequired)
    }

    /// Whether retrying later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::BackendUnavailable(_) | Error::EnrichmentUnavailable(_)
        )
    }
}
