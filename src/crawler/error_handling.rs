//! Error-handling wrapper around crawl operations
//!
//! Every operation runs through [`handle_errors`]. Classified failures are
//! logged with the item's URL and lineage, counted by kind, and turned into an
//! [`Outcome`] so sibling work carries on. Unclassified failures are returned
//! to the caller and abort the run.

use crate::crawler::Completion;
use crate::item::ItemOrigin;
use crate::manager::Manager;
use crate::{FailureKind, HarvestError, ScrapeError};
use std::future::Future;

/// How a wrapped operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,

    /// An earlier run completed the item
    Skipped,

    Failed(FailureKind),
}

/// Awaits `operation` and classifies its result
///
/// # Arguments
///
/// * `manager` - Provides the progress counters
/// * `origin` - URL and lineage of the item, captured before the operation
///   borrowed it
/// * `operation` - The crawl operation
///
/// # Returns
///
/// * `Ok(Outcome::Completed)` - The operation succeeded
/// * `Ok(Outcome::Skipped)` - An earlier run completed the item
/// * `Ok(Outcome::Failed(kind))` - A classified failure was recorded
/// * `Err(HarvestError)` - An unclassified failure that must stop the run
pub async fn handle_errors<F>(
    manager: &Manager,
    origin: ItemOrigin,
    operation: F,
) -> Result<Outcome, HarvestError>
where
    F: Future<Output = Result<Completion, ScrapeError>>,
{
    let kind = match operation.await {
        Ok(Completion::Scraped) => {
            manager.progress().record_completed();
            return Ok(Outcome::Completed);
        }
        Ok(Completion::AlreadyScraped) => {
            manager.progress().record_skipped();
            return Ok(Outcome::Skipped);
        }
        Err(error) => match error.classify() {
            Ok((kind, error)) => {
                log_failure(&origin, kind, &error);
                kind
            }
            Err(e) => {
                tracing::error!(url = %origin.url, lineage = %origin.lineage, "Unrecoverable error: {}", e);
                return Err(e);
            }
        },
    };

    manager.progress().record_failure(kind);
    Ok(Outcome::Failed(kind))
}

fn log_failure(origin: &ItemOrigin, kind: FailureKind, error: &ScrapeError) {
    let url = &origin.url;
    let lineage = &origin.lineage;

    match kind {
        FailureKind::Fetch | FailureKind::Transport | FailureKind::Extraction => {
            tracing::error!(url = %url, lineage = %lineage, %kind, "Scrape failed: {}", error);
        }
        FailureKind::Restricted | FailureKind::MaxChildren | FailureKind::NoExtension => {
            tracing::warn!(url = %url, lineage = %lineage, %kind, "Skipped: {}", error);
        }
        FailureKind::Unimplemented => {
            tracing::warn!(url = %url, lineage = %lineage, "Not supported yet: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::crawler::ChannelSink;
    use crate::storage::{MemoryStorage, StorageError};
    use std::sync::Arc;
    use url::Url;

    fn create_test_manager() -> Arc<Manager> {
        let (sink, _rx) = ChannelSink::new();
        Manager::with_storage(Config::default(), Arc::new(MemoryStorage::new()), Arc::new(sink))
            .unwrap()
    }

    fn origin() -> ItemOrigin {
        ItemOrigin {
            url: Url::parse("https://www.tokyomotion.net/video/1/clip").unwrap(),
            lineage: "alice/videos".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_is_counted() {
        let manager = create_test_manager();
        let outcome = handle_errors(&manager, origin(), async { Ok(Completion::Scraped) })
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(manager.progress().completed(), 1);
    }

    #[tokio::test]
    async fn test_already_scraped_is_skipped_not_completed() {
        let manager = create_test_manager();
        let outcome = handle_errors(&manager, origin(), async {
            Ok(Completion::AlreadyScraped)
        })
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Skipped);
        assert_eq!(manager.progress().skipped(), 1);
        assert_eq!(manager.progress().completed(), 0);
    }

    #[tokio::test]
    async fn test_classified_failure_is_recorded_by_kind() {
        let manager = create_test_manager();
        let outcome = handle_errors(&manager, origin(), async {
            Err(ScrapeError::Restricted {
                url: "https://www.tokyomotion.net/video/1/clip".to_string(),
                reason: "Private video".to_string(),
            })
        })
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Failed(FailureKind::Restricted));
        assert_eq!(manager.progress().failures(FailureKind::Restricted), 1);
        assert_eq!(manager.progress().completed(), 0);
    }

    #[tokio::test]
    async fn test_unimplemented_is_classified() {
        let manager = create_test_manager();
        let outcome = handle_errors(&manager, origin(), async {
            Err(ScrapeError::Unimplemented {
                operation: "album".to_string(),
                url: String::new(),
            })
        })
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Failed(FailureKind::Unimplemented));
    }

    #[tokio::test]
    async fn test_internal_error_propagates() {
        let manager = create_test_manager();
        let result = handle_errors(&manager, origin(), async {
            Err(ScrapeError::from(StorageError::Closed))
        })
        .await;

        assert!(matches!(
            result,
            Err(HarvestError::Storage(StorageError::Closed))
        ));
        assert_eq!(manager.progress().total_failures(), 0);
    }
}
