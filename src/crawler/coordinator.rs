//! Seed coordination
//!
//! This module turns the command-line seeds into crawl tasks:
//! - Resolving each seed to the crawler registered for its host
//! - Reporting and skipping seeds nobody handles
//! - Running the seeds concurrently, bounded by `crawler.max-concurrent-seeds`
//! - Propagating unrecoverable errors, which cancels the remaining seeds

use crate::crawler::{Crawler, CrawlerRegistry, Outcome};
use crate::item::ScrapeItem;
use crate::manager::Manager;
use crate::HarvestError;
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// What happened to the seeds of a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Seeds handed to a crawler
    pub dispatched: usize,

    /// Seeds whose operation completed
    pub completed: usize,

    /// Seeds an earlier run already completed
    pub already_scraped: usize,

    /// Seeds whose operation ended in a classified failure
    pub failed: usize,

    /// Seeds that were not valid URLs or had no crawler
    pub skipped: Vec<String>,
}

impl RunSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Completed => self.completed += 1,
            Outcome::Skipped => self.already_scraped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Dispatches seeds to crawlers
pub struct Coordinator {
    manager: Arc<Manager>,
    registry: Arc<CrawlerRegistry>,
}

impl Coordinator {
    /// Creates a coordinator over the built-in crawlers
    pub fn new(manager: Arc<Manager>) -> Result<Self, HarvestError> {
        let registry = CrawlerRegistry::with_builtin(&manager)?;
        Ok(Self::with_registry(manager, registry))
    }

    pub fn with_registry(manager: Arc<Manager>, registry: CrawlerRegistry) -> Self {
        Self {
            manager,
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &CrawlerRegistry {
        &self.registry
    }

    /// Parses a seed and finds its crawler
    ///
    /// # Returns
    ///
    /// * `Ok((url, crawler))` - The seed is supported
    /// * `Err(HarvestError::UrlParse)` - The seed is not a URL
    /// * `Err(HarvestError::NoCrawler)` - No crawler handles the seed's host
    pub fn resolve(&self, seed: &str) -> Result<(Url, Arc<dyn Crawler>), HarvestError> {
        let url = Url::parse(seed.trim())?;
        let crawler = self
            .registry
            .find(&url)
            .ok_or_else(|| HarvestError::NoCrawler {
                url: url.to_string(),
            })?;
        Ok((url, crawler))
    }

    /// Crawls every seed
    ///
    /// Classified failures are counted in the summary and never stop the run.
    /// The first unrecoverable error is returned; dropping the task set cancels
    /// the seeds still in flight.
    pub async fn run(&self, seeds: &[String]) -> Result<RunSummary, HarvestError> {
        let limit = self.manager.config().crawler.max_concurrent_seeds.max(1) as usize;
        let mut summary = RunSummary::default();
        let mut tasks = JoinSet::new();

        tracing::info!(seeds = seeds.len(), concurrency = limit, "Starting harvest");

        for seed in seeds {
            let (url, crawler) = match self.resolve(seed) {
                Ok(resolved) => resolved,
                Err(e) => {
                    tracing::warn!(seed = %seed, "Skipping seed: {}", e);
                    summary.skipped.push(seed.clone());
                    continue;
                }
            };

            while tasks.len() >= limit {
                match tasks.join_next().await {
                    Some(joined) => summary.record(joined??),
                    None => break,
                }
            }

            tracing::debug!(crawler = crawler.name(), url = %url, "Dispatching seed");
            tasks.spawn(async move { crawler.fetch(ScrapeItem::new(url)).await });
            summary.dispatched += 1;
        }

        while let Some(joined) = tasks.join_next().await {
            summary.record(joined??);
        }

        tracing::info!(
            "Harvest finished: {} dispatched, {} completed, {} already scraped, {} failed, {} skipped",
            summary.dispatched,
            summary.completed,
            summary.already_scraped,
            summary.failed,
            summary.skipped.len()
        );

        Ok(summary)
    }
}

/// Crawls `seeds` with the built-in crawlers
///
/// # Example
///
/// ```no_run
/// use sumi_harvest::config::load_config;
/// use sumi_harvest::crawler::{run_seeds, ChannelSink};
/// use sumi_harvest::Manager;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let (sink, _media) = ChannelSink::new();
/// let manager = Manager::open(config, Arc::new(sink))?;
/// let result = run_seeds(Arc::clone(&manager), &["https://xbunkr.com/a/abc".to_string()]).await;
/// manager.close()?;
/// result?;
/// # Ok(())
/// # }
/// ```
pub async fn run_seeds(
    manager: Arc<Manager>,
    seeds: &[String],
) -> Result<RunSummary, HarvestError> {
    Coordinator::new(manager)?.run(seeds).await
}
