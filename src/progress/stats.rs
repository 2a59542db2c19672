//! End-of-run statistics
//!
//! This module provides the statistics snapshot and its terminal summary.

use crate::FailureKind;

/// Scrape statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeStatistics {
    /// Operations that finished successfully
    pub completed: u64,

    /// Items an earlier run already completed
    pub skipped: u64,

    /// Operations that failed with a classified error
    pub failed: u64,

    /// Media items handed to the download stage
    pub media_found: u64,

    /// Tasks still registered when the snapshot was taken
    pub active_tasks: usize,

    /// Non-zero failure counts, in `FailureKind` order
    pub failures_by_kind: Vec<(FailureKind, u64)>,
}

impl ScrapeStatistics {
    /// Share of finished operations that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        let total = self.completed + self.failed;
        if total > 0 {
            (self.completed as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ScrapeStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Overview:");
    println!("  Completed: {}", stats.completed);
    println!("  Already scraped: {}", stats.skipped);
    println!("  Failed: {}", stats.failed);
    println!("  Media found: {}", stats.media_found);
    println!();

    if !stats.failures_by_kind.is_empty() {
        println!("Failures by Kind:");
        let mut counts = stats.failures_by_kind.clone();
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        for (kind, count) in counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    if stats.active_tasks > 0 {
        println!("Unfinished tasks: {}", stats.active_tasks);
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} operations)",
        stats.success_rate(),
        stats.completed,
        stats.completed + stats.failed
    );
}
