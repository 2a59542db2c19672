//! Fetched pages and HTML extraction helpers
//!
//! A [`Page`] keeps the raw body. Every helper parses the body on demand and
//! drops the document before returning, so a `Page` can be held across await
//! points while the parsed DOM never is.

use crate::url::resolve_link;
use crate::ScrapeError;
use scraper::{Html, Selector};
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// URL the page was requested from
    pub url: Url,

    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Page body
    pub body: String,

    /// Whether the body came from the response cache
    pub from_cache: bool,
}

impl Page {
    /// Parses the body into a document
    ///
    /// The returned `Html` is not `Send`; keep it out of async scopes.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }

    /// Returns the trimmed text of the `<title>` element
    pub fn title(&self) -> Option<String> {
        self.select_text("title").ok().flatten()
    }

    /// Returns the trimmed text of the first element matching `css`
    pub fn select_text(&self, css: &str) -> Result<Option<String>, ScrapeError> {
        let selector = self.selector(css)?;
        let document = self.document();
        let text = document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(text)
    }

    /// Returns `attr` of the first element matching `css` that carries it
    pub fn select_attr(&self, css: &str, attr: &str) -> Result<Option<String>, ScrapeError> {
        Ok(self.select_attrs(css, attr)?.into_iter().next())
    }

    /// Returns `attr` of every element matching `css`, in document order
    pub fn select_attrs(&self, css: &str, attr: &str) -> Result<Vec<String>, ScrapeError> {
        let selector = self.selector(css)?;
        let document = self.document();
        let values = document
            .select(&selector)
            .filter_map(|element| element.value().attr(attr))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect();
        Ok(values)
    }

    /// Resolves `attr` of every element matching `css` against `base`
    ///
    /// Links that cannot be resolved to an HTTP(S) URL are skipped.
    pub fn select_links(&self, css: &str, attr: &str, base: &Url) -> Result<Vec<Url>, ScrapeError> {
        Ok(self
            .select_attrs(css, attr)?
            .iter()
            .filter_map(|href| resolve_link(href, base))
            .collect())
    }

    /// Whether the raw body contains `needle`
    pub fn contains_text(&self, needle: &str) -> bool {
        self.body.contains(needle)
    }

    /// Builds an extraction failure for this page
    pub fn extraction_error(&self, message: impl Into<String>) -> ScrapeError {
        ScrapeError::Extraction {
            url: self.url.to_string(),
            message: message.into(),
        }
    }

    fn selector(&self, css: &str) -> Result<Selector, ScrapeError> {
        Selector::parse(css).map_err(|e| self.extraction_error(format!("bad selector '{}': {}", css, e)))
    }
}
