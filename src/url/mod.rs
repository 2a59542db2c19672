//! URL handling module for Sumi-Harvest
//!
//! This module provides URL normalization (cache and progress keys), host
//! extraction, canonical-host rebasing, link resolution and the domain glob
//! matcher used by the crawler registry, rate limiter overrides and cache scopes.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, rebase_onto, resolve_link};
pub use matcher::{best_match, matches_wildcard, specificity};
pub use normalize::{normalize, normalize_url};

use url::Url;

/// Returns the string a scope pattern is matched against
///
/// Patterns containing a `/` see `host + path`, all others see the bare host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_harvest::url::match_subject;
///
/// let url = Url::parse("https://simpcity.su/threads/abc").unwrap();
/// assert_eq!(match_subject("*.simpcity.su", &url), "simpcity.su");
/// assert_eq!(match_subject("*/threads/*", &url), "simpcity.su/threads/abc");
/// ```
pub fn match_subject(pattern: &str, url: &Url) -> String {
    let host = extract_domain(url).unwrap_or_default();
    if pattern.contains('/') {
        format!("{}{}", host, url.path())
    } else {
        host
    }
}
