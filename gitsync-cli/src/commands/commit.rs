//! Commit command

use clap::Args;
use gitsync_core::Config;

use super::remote::report;
use super::workspace::{Engine, WorkspaceArgs};

/// Commit selected files in a workspace
#[derive(Args, Debug)]
pub struct CommitArgs {
    #[command(flatten)]
    pub target: WorkspaceArgs,

    /// Commit message
    #[arg(short, long)]
    pub message: String,

    /// Paths to commit
    pub paths: Vec<String>,
}

impl CommitArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let engine = Engine::new(config)?;
        let outcome = engine
            .executor
            .commit(&self.target.to_workspace(), &self.paths, &self.message)
            .await?;
        report(&format!("Committed {} file(s)", self.paths.len()), &outcome);
        Ok(())
    }
}
