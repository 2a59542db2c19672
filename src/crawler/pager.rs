use crate::crawler::CrawlerBase;
use crate::http::Page;
use crate::url::{normalize, resolve_link};
use crate::ScrapeError;
use std::collections::HashSet;
use url::Url;

/// Lazy, single-pass walk over a chain of pages
///
/// Each call to [`Pager::next_page`] fetches exactly one page (through the
/// crawler's limiter and the response cache) and remembers where its "next"
/// link points. Nothing is fetched ahead of the consumer, and dropping the pager
/// stops the walk.
///
/// The walk ends when a page has no next link, when the next link points at a
/// page already yielded, when `max_pages` pages have been yielded, or after a
/// failed fetch.
pub struct Pager<'a> {
    base: &'a CrawlerBase,
    next: Option<Url>,
    visited: HashSet<String>,
    next_selector: String,
    next_attr: String,
    yielded: u32,
    max_pages: u32,
}

impl<'a> Pager<'a> {
    pub fn new(
        base: &'a CrawlerBase,
        start: Url,
        next_selector: &str,
        next_attr: &str,
        max_pages: u32,
    ) -> Self {
        Self {
            base,
            next: Some(start),
            visited: HashSet::new(),
            next_selector: next_selector.to_string(),
            next_attr: next_attr.to_string(),
            yielded: 0,
            max_pages,
        }
    }

    /// Pages yielded so far
    pub fn pages_yielded(&self) -> u32 {
        self.yielded
    }

    /// Fetches the next page of the chain
    ///
    /// Returns None once the chain is exhausted. A fetch failure is returned
    /// once and ends the chain.
    pub async fn next_page(&mut self) -> Option<Result<Page, ScrapeError>> {
        let url = self.next.take()?;

        if self.max_pages > 0 && self.yielded >= self.max_pages {
            tracing::warn!(url = %url, max_pages = self.max_pages, "Pager reached page limit");
            return None;
        }

        let key = normalize(url.clone()).unwrap_or_else(|_| url.clone());
        if !self.visited.insert(key.to_string()) {
            tracing::debug!(url = %url, "Pager cycle detected, stopping");
            return None;
        }

        let page = match self.base.get_page(&url).await {
            Ok(page) => page,
            Err(e) => return Some(Err(e)),
        };

        self.next = match page.select_attr(&self.next_selector, &self.next_attr) {
            Ok(href) => href.and_then(|href| resolve_link(&href, self.base.base_url())),
            Err(e) => {
                tracing::warn!(url = %url, "Could not look up the next page, stopping: {}", e);
                None
            }
        };
        self.yielded += 1;

        Some(Ok(page))
    }
}
