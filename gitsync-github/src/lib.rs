//! gitsync GitHub - GitHub remote mirror for gitsync
//!
//! This crate reads commits and branches from the GitHub REST API so the
//! source-control panel can render before the workspace backend answers.

mod branches;
mod client;
mod commits;
mod error;
mod mirror;

pub use client::GitHubMirror;
pub use error::{Error, Result};
