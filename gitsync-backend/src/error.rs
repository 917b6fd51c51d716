//! Error types for the backend clone client.

use gitsync_core::GitAction;
use thiserror::Error;

/// Errors that can occur when talking to the workspace backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend did not answer in time or refused the connection
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Backend answered with a non-2xx status
    #[error("Backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Invalid backend URL
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse backend response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl BackendError {
    /// Map onto the engine taxonomy for a read
    pub fn for_read(self) -> gitsync_core::Error {
        gitsync_core::Error::BackendUnavailable(self.to_string())
    }

    /// Map onto the engine taxonomy for a mutating `action`
    ///
    /// Rejections carry the backend's own message.
    pub fn for_action(self, action: GitAction) -> gitsync_core::Error {
        match self {
            BackendError::Rejected { message, .. } => {
                gitsync_core::Error::MutationFailed { action, message }
            }
            BackendError::Unreachable(_) => {
                gitsync_core::Error::BackendUnavailable(self.to_string())
            }
            other => gitsync_core::Error::MutationFailed {
                action,
                message: other.to_string(),
            },
        }
    }
}

/// Result type for backend client operations.
pub type Result<T> = std::result::Result<T, BackendError>;
