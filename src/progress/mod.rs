//! Scrape progress tracking
//!
//! This module handles:
//! - Counting completed and already-scraped items, hand-offs and failures by kind
//! - Tracking active tasks with a guard that removes the task on drop
//! - Producing a statistics snapshot for the end-of-run summary

pub mod stats;

pub use stats::{print_statistics, ScrapeStatistics};

use crate::FailureKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

/// Shared counters updated by every crawl task
#[derive(Debug, Default)]
pub struct ScrapeProgress {
    next_task_id: AtomicU64,

    /// Tasks currently running, by id
    active: Mutex<HashMap<u64, Url>>,

    completed: AtomicU64,

    /// Items skipped because an earlier run completed them
    skipped: AtomicU64,

    media: AtomicU64,
    failed: [AtomicU64; FailureKind::COUNT],
}

impl ScrapeProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a running task
    ///
    /// The task stays listed until the returned guard is dropped, whatever path
    /// the task exits by.
    pub fn add_task(self: &Arc<Self>, url: &Url) -> TaskGuard {
        let id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, url.clone());

        TaskGuard {
            progress: Arc::clone(self),
            id,
        }
    }

    fn remove_task(&self, id: u64) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    /// Number of tasks currently running
    pub fn active_tasks(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: FailureKind) {
        self.failed[kind as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_media(&self) {
        self.media.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn media(&self) -> u64 {
        self.media.load(Ordering::Relaxed)
    }

    pub fn failures(&self, kind: FailureKind) -> u64 {
        self.failed[kind as usize].load(Ordering::Relaxed)
    }

    pub fn total_failures(&self) -> u64 {
        FailureKind::ALL.iter().map(|kind| self.failures(*kind)).sum()
    }

    /// Takes a point-in-time copy of every counter
    pub fn snapshot(&self) -> ScrapeStatistics {
        let failures_by_kind = FailureKind::ALL
            .iter()
            .map(|kind| (*kind, self.failures(*kind)))
            .filter(|(_, count)| *count > 0)
            .collect();

        ScrapeStatistics {
            completed: self.completed(),
            skipped: self.skipped(),
            failed: self.total_failures(),
            media_found: self.media(),
            active_tasks: self.active_tasks(),
            failures_by_kind,
        }
    }
}

/// Keeps a task listed as active while alive
#[derive(Debug)]
pub struct TaskGuard {
    progress: Arc<ScrapeProgress>,
    id: u64,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.progress.remove_task(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://xbunkr.com/a/1").unwrap()
    }

    #[test]
    fn test_task_guard_removes_on_drop() {
        let progress = Arc::new(ScrapeProgress::new());
        let first = progress.add_task(&url());
        let second = progress.add_task(&url());
        assert_eq!(progress.active_tasks(), 2);

        drop(first);
        assert_eq!(progress.active_tasks(), 1);
        drop(second);
        assert_eq!(progress.active_tasks(), 0);
    }

    #[test]
    fn test_task_removed_on_early_return() {
        fn failing_task(progress: &Arc<ScrapeProgress>, fail: bool) -> Result<(), &'static str> {
            let _task = progress.add_task(&url());
            if fail {
                return Err("boom");
            }
            Ok(())
        }

        let progress = Arc::new(ScrapeProgress::new());
        assert!(failing_task(&progress, true).is_err());
        assert!(failing_task(&progress, false).is_ok());
        assert_eq!(progress.active_tasks(), 0);
    }

    #[test]
    fn test_counters() {
        let progress = ScrapeProgress::new();
        progress.record_completed();
        progress.record_skipped();
        progress.record_media();
        progress.record_media();
        progress.record_failure(FailureKind::Restricted);
        progress.record_failure(FailureKind::Fetch);
        progress.record_failure(FailureKind::Fetch);

        let stats = progress.snapshot();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.media_found, 2);
        assert_eq!(stats.failed, 3);
        assert_eq!(
            stats.failures_by_kind,
            vec![(FailureKind::Fetch, 2), (FailureKind::Restricted, 1)]
        );
    }
}
