//! Per-workspace snapshot cache
//!
//! Every reconciliation pass draws a number from [`SnapshotCache::begin_pass`].
//! Writes are ordered by that number rather than by arrival: a whole-snapshot
//! write from an older pass never replaces a newer one, and a status patch
//! only lands on the snapshot written by its own pass.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::model::{RepoSnapshot, WorkingTreeStatus};

/// A cached snapshot and when it was produced
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub snapshot: RepoSnapshot,
    pub produced_at: Instant,
    /// Reconciliation pass that wrote the snapshot
    pub pass: u64,
}

impl CacheEntry {
    /// Time since the snapshot was produced
    pub fn age(&self) -> Duration {
        self.produced_at.elapsed()
    }
}

#[derive(Debug, Default)]
struct Slots {
    entries: HashMap<String, CacheEntry>,
    /// Passes at or below this number may no longer write the workspace
    floors: HashMap<String, u64>,
}

/// Snapshot store keyed by workspace id
#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    slots: Mutex<Slots>,
    last_pass: AtomicU64,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(Slots::default()),
            last_pass: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate the number of a new reconciliation pass
    pub fn begin_pass(&self) -> u64 {
        self.last_pass.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Entry younger than the TTL
    pub fn get_fresh(&self, workspace_id: &str) -> Option<CacheEntry> {
        self.peek(workspace_id)
            .filter(|entry| entry.age() < self.ttl)
    }

    /// Entry of any age
    pub fn peek(&self, workspace_id: &str) -> Option<CacheEntry> {
        self.slots().entries.get(workspace_id).cloned()
    }

    /// Replace the workspace snapshot
    ///
    /// Returns false when a newer pass already wrote, or the workspace was
    /// invalidated after this pass began.
    pub fn store(&self, workspace_id: &str, pass: u64, snapshot: RepoSnapshot) -> bool {
        let mut slots = self.slots();

        if slots.floors.get(workspace_id).is_some_and(|floor| pass <= *floor) {
            debug!(workspace = workspace_id, pass, "Dropping write from invalidated pass");
            return false;
        }

        if let Some(existing) = slots.entries.get(workspace_id) {
            if existing.pass > pass {
                debug!(
                    workspace = workspace_id,
                    pass,
                    newer = existing.pass,
                    "Dropping write from superseded pass"
                );
                return false;
            }
        }

        slots.entries.insert(
            workspace_id.to_string(),
            CacheEntry {
                snapshot,
                produced_at: Instant::now(),
                pass,
            },
        );
        true
    }

    /// Set only the working-tree status of the snapshot written by `pass`
    ///
    /// Returns the patched snapshot, or `None` when the entry is gone or was
    /// replaced by another pass.
    pub fn patch_status(
        &self,
        workspace_id: &str,
        pass: u64,
        status: WorkingTreeStatus,
    ) -> Option<RepoSnapshot> {
        let mut slots = self.slots();
        let entry = slots
            .entries
            .get_mut(workspace_id)
            .filter(|entry| entry.pass == pass)?;

        entry.snapshot.status = Some(status);
        Some(entry.snapshot.clone())
    }

    /// Drop the workspace entry and fence off passes already running
    pub fn invalidate(&self, workspace_id: &str) {
        let floor = self.last_pass.load(Ordering::SeqCst);
        let mut slots = self.slots();
        slots.entries.remove(workspace_id);
        slots.floors.insert(workspace_id.to_string(), floor);
        debug!(workspace = workspace_id, floor, "Invalidated cached snapshot");
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(5 * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BranchRecord;

    fn snapshot(branch: &str) -> RepoSnapshot {
        RepoSnapshot {
            branches: vec![BranchRecord::local(branch, true)],
            current_branch: branch.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_until_ttl() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        let pass = cache.begin_pass();
        assert!(cache.store("ws", pass, snapshot("main")));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get_fresh("ws").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get_fresh("ws").is_none());
        assert!(cache.peek("ws").is_some());
    }

    #[test]
    fn test_older_pass_cannot_overwrite_newer() {
        let cache = SnapshotCache::default();
        let first = cache.begin_pass();
        let second = cache.begin_pass();

        assert!(cache.store("ws", second, snapshot("dev")));
        assert!(!cache.store("ws", first, snapshot("main")));
        assert_eq!(cache.peek("ws").unwrap().snapshot.current_branch, "dev");
    }

    #[test]
    fn test_patch_only_applies_to_own_pass() {
        let cache = SnapshotCache::default();
        let first = cache.begin_pass();
        cache.store("ws", first, snapshot("main"));
        let second = cache.begin_pass();
        cache.store("ws", second, snapshot("dev"));

        let status = WorkingTreeStatus::from_entries(vec!["a"], vec![], vec![], vec![]);
        assert!(cache.patch_status("ws", first, status.clone()).is_none());
        assert!(cache.peek("ws").unwrap().snapshot.status.is_none());

        let patched = cache.patch_status("ws", second, status).unwrap();
        assert_eq!(patched.current_branch, "dev");
        assert_eq!(patched.changed_count(), 1);
    }

    #[test]
    fn test_invalidate_fences_running_passes() {
        let cache = SnapshotCache::default();
        let running = cache.begin_pass();
        cache.invalidate("ws");

        assert!(!cache.store("ws", running, snapshot("main")));
        assert!(cache.peek("ws").is_none());

        let next = cache.begin_pass();
        assert!(cache.store("ws", next, snapshot("main")));
    }

    #[test]
    fn test_workspaces_are_independent() {
        let cache = SnapshotCache::default();
        let pass = cache.begin_pass();
        cache.store("a", pass, snapshot("main"));
        cache.invalidate("b");
        assert!(cache.peek("a").is_some());
        assert!(cache.peek("b").is_none());
    }
}
