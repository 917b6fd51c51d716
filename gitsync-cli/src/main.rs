//! gitsync CLI - Command line interface for the gitsync engine
//!
//! Reconcile a workspace's repository view and run git actions through the
//! workspace backend.

mod commands;

use clap::{Parser, Subcommand};
use gitsync_core::{AccountStore, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{AccountsArgs, CommitArgs, PullArgs, RemoteArgs, StatusArgs};

/// gitsync: keep a workspace's source-control view in sync
#[derive(Parser, Debug)]
#[command(name = "gitsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend git endpoint base URL (overrides config and env)
    #[arg(long, global = true, env = "GITSYNC_BACKEND_URL")]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Reconcile and show a workspace's repository
    #[command(visible_alias = "st")]
    Status(StatusArgs),

    /// Fetch from the hosting remote
    Fetch(RemoteArgs),

    /// Pull from the hosting remote
    Pull(PullArgs),

    /// Push to the hosting remote
    Push(RemoteArgs),

    /// Commit selected files
    #[command(visible_alias = "ci")]
    Commit(CommitArgs),

    /// List linked hosting accounts
    Accounts(AccountsArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load_with_overrides(cli.backend_url.clone())?;

    if cli.verbose {
        tracing::info!(
            backend = %config.backend.url,
            github = %config.github.api_url,
            cache_ttl = ?config.sync.cache_ttl,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("gitsync {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Status(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Fetch(args)) => {
            args.execute_fetch(&config).await?;
        }
        Some(Commands::Pull(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Push(args)) => {
            args.execute_push(&config).await?;
        }
        Some(Commands::Commit(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Accounts(args)) => {
            args.execute()?;
        }
        Some(Commands::Config) => {
            println!("gitsync Configuration");
            println!("=====================");
            println!();
            println!("Sync Settings:");
            println!("  cache_ttl: {}", humanize(config.sync.cache_ttl));
            println!("  credential_timeout: {}", humanize(config.sync.credential_timeout));
            println!();
            println!("Backend Settings:");
            println!("  url: {}", config.backend.url);
            println!("  request_timeout: {}", humanize(config.backend.request_timeout));
            println!();
            println!("GitHub Settings:");
            println!("  api_url: {}", config.github.api_url);
            println!("  commits_per_page: {}", config.github.commits_per_page);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
            if let Some(path) = AccountStore::default_accounts_path() {
                println!("Accounts file: {}", path.display());
            }
        }
        None => {
            println!("gitsync - Git synchronization and mutation engine");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn humanize(duration: std::time::Duration) -> String {
    humantime::format_duration(duration).to_string()
}
