//! Fetch, pull and push commands

use clap::Args;
use gitsync_core::{Config, MutationOutcome, PullMode, PullPlan};

use super::workspace::{Engine, WorkspaceArgs};

/// Run a remote action on a workspace
#[derive(Args, Debug)]
pub struct RemoteArgs {
    #[command(flatten)]
    pub target: WorkspaceArgs,
}

impl RemoteArgs {
    pub async fn execute_fetch(&self, config: &Config) -> anyhow::Result<()> {
        let engine = Engine::new(config)?;
        let outcome = engine.executor.fetch(&self.target.to_workspace()).await?;
        report("Fetched", &outcome);
        Ok(())
    }

    pub async fn execute_push(&self, config: &Config) -> anyhow::Result<()> {
        let engine = Engine::new(config)?;
        let outcome = engine.executor.push(&self.target.to_workspace()).await?;
        report("Pushed", &outcome);
        Ok(())
    }
}

/// Pull, choosing how to treat uncommitted changes
#[derive(Args, Debug)]
pub struct PullArgs {
    #[command(flatten)]
    pub target: WorkspaceArgs,

    /// Stash uncommitted changes and restore them after the pull
    #[arg(long, conflicts_with = "force")]
    pub stash: bool,

    /// Pull over uncommitted changes
    #[arg(long)]
    pub force: bool,
}

impl PullArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let engine = Engine::new(config)?;
        let workspace = self.target.to_workspace();

        // The pull plan is judged from cached status
        if let Err(e) = engine.sync.reload(&workspace).await {
            tracing::warn!(error = %e, "Could not read working tree before pull");
        }

        let mode = match engine.executor.plan_pull(&workspace) {
            PullPlan::Clean => PullMode::Plain,
            _ if self.stash => PullMode::StashAndRestore,
            _ if self.force => PullMode::Plain,
            PullPlan::Guarded { changed } => anyhow::bail!(
                "{} uncommitted change(s) in workspace {}. \
                 Re-run with --stash to keep them or --force to pull anyway",
                changed,
                workspace.id
            ),
            PullPlan::Unknown => anyhow::bail!(
                "Working tree status of workspace {} is unknown. \
                 Re-run with --stash to keep any changes or --force to pull anyway",
                workspace.id
            ),
        };

        let outcome = engine.executor.pull(&workspace, mode).await?;
        report("Pulled", &outcome);
        Ok(())
    }
}

pub(super) fn report(done: &str, outcome: &MutationOutcome) {
    match outcome {
        MutationOutcome::Completed => println!("{}.", done),
        MutationOutcome::CompletedWithStashConflict { message } => {
            println!("{}, with a warning:", done);
            println!("  {}", message);
        }
    }
}
