//! CLI command implementations

pub mod accounts;
pub mod commit;
pub mod remote;
pub mod status;
pub mod workspace;

pub use accounts::AccountsArgs;
pub use commit::CommitArgs;
pub use remote::{PullArgs, RemoteArgs};
pub use status::StatusArgs;
