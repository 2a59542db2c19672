use crate::crawler::{tokyomotion, xbunkr, Crawler, SiteInfo, TokyoMotionCrawler, XBunkrCrawler};
use crate::manager::Manager;
use crate::HarvestError;
use crate::url::{best_match, extract_domain};
use std::sync::Arc;
use url::Url;

/// Sites with a built-in crawler
pub fn builtin_sites() -> Vec<&'static SiteInfo> {
    vec![&tokyomotion::SITE, &xbunkr::SITE]
}

/// Maps host globs to crawlers
///
/// Lookup picks the crawler whose pattern is most specific for the URL's host.
/// Ties keep the crawler registered first.
#[derive(Default)]
pub struct CrawlerRegistry {
    entries: Vec<(&'static str, Arc<dyn Crawler>)>,
}

impl CrawlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry holding every built-in crawler
    pub fn with_builtin(manager: &Arc<Manager>) -> Result<Self, HarvestError> {
        let mut registry = Self::new();
        registry.register(Arc::new(TokyoMotionCrawler::new(Arc::clone(manager))?));
        registry.register(Arc::new(XBunkrCrawler::new(Arc::clone(manager))?));
        Ok(registry)
    }

    /// Registers a crawler under each of its host patterns
    pub fn register(&mut self, crawler: Arc<dyn Crawler>) {
        for pattern in crawler.host_patterns() {
            tracing::debug!(crawler = crawler.name(), pattern = *pattern, "Registered crawler");
            self.entries.push((*pattern, Arc::clone(&crawler)));
        }
    }

    /// Finds the crawler responsible for `url`
    pub fn find(&self, url: &Url) -> Option<Arc<dyn Crawler>> {
        let host = extract_domain(url)?;
        best_match(
            self.entries.iter().map(|(pattern, crawler)| (*pattern, crawler)),
            &host,
        )
        .cloned()
    }

    /// Number of registered patterns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
