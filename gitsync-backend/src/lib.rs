//! gitsync Backend - HTTP client for the workspace backend's git endpoints
//!
//! The backend owns each workspace's on-disk checkout. It is the only source
//! of working tree status and the only place mutating git actions run.

mod client;
mod clone;
mod error;
mod types;

pub use client::BackendClient;
pub use error::{BackendError, Result};
pub use types::{BranchEntry, CommitEntry, StatusResponse, TreeEntries};
