//! Accounts command - list linked hosting accounts

use clap::Args;
use gitsync_core::AccountStore;

/// List linked hosting accounts (tokens are never printed)
#[derive(Args, Debug)]
pub struct AccountsArgs {
    /// Show environment variable handles
    #[arg(long)]
    pub handles: bool,
}

impl AccountsArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let store = AccountStore::load()?;

        if store.accounts().is_empty() {
            println!("No linked accounts.");
            if let Some(path) = AccountStore::default_accounts_path() {
                println!("Add [[accounts]] entries to {}", path.display());
            }
            return Ok(());
        }

        println!("Linked accounts:");
        for account in store.accounts() {
            if self.handles && account.credential_handle.starts_with("env:") {
                println!(
                    "  {}: {} ({})",
                    account.provider, account.username, account.credential_handle
                );
            } else {
                println!("  {}: {}", account.provider, account.username);
            }
        }

        Ok(())
    }
}
