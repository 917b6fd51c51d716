//! Status command - reconcile a workspace and print the result

use chrono::Utc;
use clap::Args;
use gitsync_core::{Config, LoadPhase, RepoSnapshot};

use super::workspace::{Engine, WorkspaceArgs};

/// Reconcile and show a workspace's repository
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: WorkspaceArgs,

    /// Number of commits to show
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let engine = Engine::new(config)?;
        let workspace = self.target.to_workspace();

        let Some(mut handle) = engine.sync.open_panel(&workspace) else {
            anyhow::bail!("Panel for workspace {} is already open", workspace.id);
        };
        handle.finished().await;
        engine.sync.close_panel(&workspace.id);

        let view = handle.current();
        if view.phase == LoadPhase::Failed {
            let failure = view.failure.map(|f| f.message).unwrap_or_default();
            anyhow::bail!("Failed to load repository: {}", failure);
        }

        match view.snapshot {
            Some(snapshot) => print_snapshot(&snapshot, self.limit),
            None => println!("No repository data available."),
        }

        Ok(())
    }
}

fn print_snapshot(snapshot: &RepoSnapshot, limit: usize) {
    println!();
    if !snapshot.is_git_repository {
        println!("Not a git repository.");
        return;
    }

    println!("On branch {}", snapshot.current_branch);
    println!();

    match &snapshot.status {
        Some(status) if status.is_clean() => println!("Working tree clean."),
        Some(status) => {
            println!("Changes ({}):", status.changed_count());
            for path in &status.staged {
                println!("  staged:    {}", path);
            }
            for path in &status.modified {
                println!("  modified:  {}", path);
            }
            for path in &status.deleted {
                println!("  deleted:   {}", path);
            }
            for path in &status.untracked {
                println!("  untracked: {}", path);
            }
        }
        None => println!("Working tree status unavailable."),
    }
    println!();

    if !snapshot.branches.is_empty() {
        println!("Branches:");
        for branch in &snapshot.branches {
            let marker = if branch.current { "*" } else { " " };
            let origin = if branch.remote { " (remote)" } else { "" };
            println!("  {} {}{}", marker, branch.name, origin);
        }
        println!();
    }

    if snapshot.commits.is_empty() {
        println!("No commits.");
        return;
    }

    println!("Recent commits:");
    let now = Utc::now();
    for commit in snapshot.commits.iter().take(limit) {
        let head = if commit.is_head { " (HEAD)" } else { "" };
        let ago = format_duration((now - commit.timestamp).num_seconds());
        println!(
            "  {} {}{} - {} ({} ago)",
            commit.short_hash, commit.message, head, commit.author.name, ago
        );
    }
    if snapshot.commits.len() > limit {
        println!("  ... and {} more", snapshot.commits.len() - limit);
    }
}

/// Format a duration in seconds into a human-readable string
fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s", seconds.max(0))
    } else if seconds < 3600 {
        format!("{}m", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h", seconds / 3600)
    } else {
        format!("{}d", seconds / 86400)
    }
}
