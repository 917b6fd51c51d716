//! Git helpers: repository URL parsing and local checkout inspection

mod repo;
mod remote_url;

pub use repo::{GitRepo, RemoteInfo};
pub use remote_url::{provider_for_host, RepoUrl};
