//! Crawler module: the site contract and the machinery around it
//!
//! This module contains the core crawling logic, including:
//! - The [`Crawler`] trait every site implements
//! - Shared crawler helpers ([`CrawlerBase`]) and the lazy [`Pager`]
//! - The error-handling wrapper that classifies failures per item
//! - The registry that maps hosts to crawlers
//! - Seed coordination and the download hand-off

mod base;
mod coordinator;
mod error_handling;
mod pager;
mod registry;
mod sink;
pub mod tokyomotion;
pub mod xbunkr;

pub use base::{completion_key, CrawlerBase};
pub use coordinator::{run_seeds, Coordinator, RunSummary};
pub use error_handling::{handle_errors, Outcome};
pub use pager::Pager;
pub use registry::{builtin_sites, CrawlerRegistry};
pub use sink::{ChannelSink, MediaSink};
pub use tokyomotion::TokyoMotionCrawler;
pub use xbunkr::XBunkrCrawler;

use crate::item::ScrapeItem;
use crate::{HarvestError, ScrapeError};
use async_trait::async_trait;
use std::fmt;
use url::Url;

/// What a URL asks a crawler to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Video,
    Album,
    Photo,
    Profile,
    Search,
    Playlist,
    File,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Video => "video",
            Self::Album => "album",
            Self::Photo => "photo",
            Self::Profile => "profile",
            Self::Search => "search",
            Self::Playlist => "playlist",
            Self::File => "file",
        };
        f.write_str(name)
    }
}

/// How a successful [`Crawler::run_operation`] call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The operation ran
    Scraped,

    /// An earlier run already completed the item, nothing was done
    AlreadyScraped,
}

/// Broad category of a site, used to pick its cache lifetime
///
/// No forum crawler ships yet; `Forum` keeps `rate-limiting.forum-cache-secs`
/// wired to a site kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    FileHost,
    Forum,
}

/// Static description of a supported site
#[derive(Debug)]
pub struct SiteInfo {
    /// Short lowercase identifier (e.g., "tokyomotion")
    pub name: &'static str,

    /// Primary domain, also the rate limiter key
    pub domain: &'static str,

    /// Name appended to folder titles
    pub folder_domain: &'static str,

    /// Host globs this site's crawler answers for
    pub host_patterns: &'static [&'static str],

    pub kind: SiteKind,
}

/// The contract every site crawler implements
///
/// A crawler maps a URL to exactly one [`Operation`] and implements the
/// operations its site supports. The remaining ones keep their default body and
/// fail with `ScrapeError::Unimplemented`.
///
/// Operations receive the item by `&mut` so that counters updated on it (such
/// as accepted children) stay with the caller.
#[async_trait]
pub trait Crawler: Send + Sync {
    /// Shared helpers and the site description
    fn base(&self) -> &CrawlerBase;

    /// Chooses the operation for a URL
    fn route(&self, url: &Url) -> Operation;

    /// Rewrites an incoming URL before routing (e.g., onto the canonical host)
    fn canonicalize(&self, url: &Url) -> Url {
        url.clone()
    }

    fn name(&self) -> &'static str {
        self.base().site().name
    }

    fn domain(&self) -> &'static str {
        self.base().site().domain
    }

    fn folder_domain(&self) -> &'static str {
        self.base().site().folder_domain
    }

    fn host_patterns(&self) -> &'static [&'static str] {
        self.base().site().host_patterns
    }

    async fn video(&self, item: &mut ScrapeItem) -> Result<(), ScrapeError> {
        Err(unimplemented(Operation::Video, item))
    }

    async fn album(&self, item: &mut ScrapeItem) -> Result<(), ScrapeError> {
        Err(unimplemented(Operation::Album, item))
    }

    async fn photo(&self, item: &mut ScrapeItem) -> Result<(), ScrapeError> {
        Err(unimplemented(Operation::Photo, item))
    }

    async fn profile(&self, item: &mut ScrapeItem) -> Result<(), ScrapeError> {
        Err(unimplemented(Operation::Profile, item))
    }

    async fn search(&self, item: &mut ScrapeItem) -> Result<(), ScrapeError> {
        Err(unimplemented(Operation::Search, item))
    }

    async fn playlist(&self, item: &mut ScrapeItem) -> Result<(), ScrapeError> {
        Err(unimplemented(Operation::Playlist, item))
    }

    async fn file(&self, item: &mut ScrapeItem) -> Result<(), ScrapeError> {
        Err(unimplemented(Operation::File, item))
    }

    /// Runs one operation unless its URL is already recorded as completed
    ///
    /// Completion is recorded only when the operation succeeds and none of the
    /// children it ran failed, so a later run retries the failed ones.
    async fn run_operation(
        &self,
        operation: Operation,
        item: &mut ScrapeItem,
    ) -> Result<Completion, ScrapeError> {
        let base = self.base();
        if base.check_complete(&item.url)? {
            tracing::debug!(url = %item.url, "Skipping, already scraped");
            return Ok(Completion::AlreadyScraped);
        }

        match operation {
            Operation::Video => self.video(item).await,
            Operation::Album => self.album(item).await,
            Operation::Photo => self.photo(item).await,
            Operation::Profile => self.profile(item).await,
            Operation::Search => self.search(item).await,
            Operation::Playlist => self.playlist(item).await,
            Operation::File => self.file(item).await,
        }?;

        if item.failed_children() > 0 {
            tracing::info!(
                url = %item.url,
                failed = item.failed_children(),
                "Leaving incomplete, some children failed"
            );
        } else {
            base.mark_complete(&item.url)?;
        }
        Ok(Completion::Scraped)
    }

    /// Single entry point for an item
    ///
    /// Registers a progress task for the item's lifetime, canonicalizes the
    /// URL, routes it and runs the operation under the error-handling wrapper.
    /// Classified failures come back as `Ok(Outcome::Failed(_))` and items an
    /// earlier run completed as `Ok(Outcome::Skipped)`; only unclassified
    /// errors are returned as `Err`.
    async fn fetch(&self, mut item: ScrapeItem) -> Result<Outcome, HarvestError> {
        let base = self.base();
        let _task = base.manager().progress().add_task(&item.url);

        item.url = self.canonicalize(&item.url);
        let operation = self.route(&item.url);
        tracing::info!(crawler = self.name(), url = %item.url, %operation, "Scraping");

        let origin = item.origin();
        handle_errors(base.manager(), origin, self.run_operation(operation, &mut item)).await
    }
}

fn unimplemented(operation: Operation, item: &ScrapeItem) -> ScrapeError {
    ScrapeError::Unimplemented {
        operation: operation.to_string(),
        url: item.url.to_string(),
    }
}
