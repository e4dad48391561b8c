//! Run-scoped download de-duplication
//!
//! The cache is keyed by the local target file, so two URLs that map to the same
//! canonical path are fetched once. Every check-then-mark happens under a single lock.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct CacheState {
    fetched: HashSet<PathBuf>,
    in_flight: HashSet<PathBuf>,
    failed: HashSet<PathBuf>,
}

/// Tracks which local targets have been fetched, are being fetched, or failed
#[derive(Debug, Default)]
pub struct DownloadCache {
    state: Mutex<CacheState>,
}

impl DownloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `target` for download
    ///
    /// Returns false when the target was already fetched, is being fetched by another
    /// task, failed earlier in this run, or already exists on disk. Returns true at most
    /// once per target within a run.
    pub fn should_fetch(&self, target: &Path) -> bool {
        let mut state = self.lock();

        if state.fetched.contains(target)
            || state.in_flight.contains(target)
            || state.failed.contains(target)
        {
            return false;
        }

        if target.is_file() {
            state.fetched.insert(target.to_path_buf());
            return false;
        }

        state.in_flight.insert(target.to_path_buf());
        true
    }

    /// Records a confirmed successful download
    pub fn mark_fetched(&self, target: &Path) {
        let mut state = self.lock();
        state.in_flight.remove(target);
        state.fetched.insert(target.to_path_buf());
    }

    /// Records a failed download; the target is not retried within this run
    pub fn mark_failed(&self, target: &Path) {
        let mut state = self.lock();
        state.in_flight.remove(target);
        state.failed.insert(target.to_path_buf());
    }

    pub fn is_fetched(&self, target: &Path) -> bool {
        self.lock().fetched.contains(target)
    }

    pub fn is_failed(&self, target: &Path) -> bool {
        self.lock().failed.contains(target)
    }

    /// Number of targets known to be present locally
    pub fn fetched_count(&self) -> usize {
        self.lock().fetched.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
