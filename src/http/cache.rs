//! Response cache policy
//!
//! This module decides which responses are cached and for how long:
//! - Only GET requests are cached
//! - Only statuses 200, 404, 410 and 451 are stored
//! - URLs matching a `no-cache` glob, or rejected by the filter, bypass the cache
//! - The expiry of an entry comes from the most specific matching scope, or
//!   the default expiry when no scope matches
//!
//! Expired entries are treated as a miss and overwritten by the next fetch.

use crate::config::CacheConfig;
use crate::storage::{CachedResponse, StorageBackend, StorageResult};
use crate::url::{match_subject, matches_wildcard, specificity};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Statuses whose responses are worth keeping
pub const CACHEABLE_STATUSES: [u16; 4] = [200, 404, 410, 451];

/// Programmatic request filter; returning false keeps a URL out of the cache
pub type CacheFilter = Arc<dyn Fn(&Url) -> bool + Send + Sync>;

/// Response cache in front of a storage backend
pub struct ResponseCache {
    backend: Arc<dyn StorageBackend>,

    /// Expiry for URLs that match no scope
    default_ttl: Duration,

    /// (pattern, expiry) pairs
    scopes: Vec<(String, Duration)>,

    /// URL globs that are never cached
    no_cache: Vec<String>,

    filter: Option<CacheFilter>,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("default_ttl", &self.default_ttl)
            .field("scopes", &self.scopes)
            .field("no_cache", &self.no_cache)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

impl ResponseCache {
    /// Creates a cache from its configuration section
    pub fn new(backend: Arc<dyn StorageBackend>, config: &CacheConfig) -> Self {
        Self {
            backend,
            default_ttl: Duration::from_secs(config.default_expire_secs),
            scopes: config
                .scopes
                .iter()
                .map(|scope| (scope.pattern.clone(), Duration::from_secs(scope.expire_secs)))
                .collect(),
            no_cache: config.no_cache.clone(),
            filter: None,
        }
    }

    /// Adds an expiry scope
    ///
    /// Scopes added earlier win ties against scopes of equal specificity.
    pub fn with_scope(mut self, pattern: impl Into<String>, ttl: Duration) -> Self {
        self.scopes.push((pattern.into(), ttl));
        self
    }

    /// Installs a programmatic filter
    pub fn with_filter(mut self, filter: CacheFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Returns the expiry that applies to `url`
    ///
    /// Each scope pattern is matched against its own subject (the host, or
    /// host + path for patterns containing `/`); the most specific match wins.
    pub fn ttl_for(&self, url: &Url) -> Duration {
        let mut best: Option<(usize, Duration)> = None;

        for (pattern, ttl) in &self.scopes {
            if !matches_wildcard(pattern, &match_subject(pattern, url)) {
                continue;
            }
            let score = specificity(pattern);
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, *ttl));
            }
        }

        best.map_or(self.default_ttl, |(_, ttl)| ttl)
    }

    /// Whether a request may be served from or stored in the cache
    pub fn is_cacheable_request(&self, method: &str, url: &Url) -> bool {
        if !method.eq_ignore_ascii_case("GET") {
            return false;
        }

        if self
            .no_cache
            .iter()
            .any(|pattern| matches_wildcard(pattern, &match_subject(pattern, url)))
        {
            return false;
        }

        self.filter.as_ref().map_or(true, |filter| filter(url))
    }

    /// Looks up a fresh entry
    ///
    /// Returns None for uncacheable requests, missing entries and entries older
    /// than their scope's expiry.
    pub fn lookup(&self, method: &str, url: &Url) -> StorageResult<Option<CachedResponse>> {
        if !self.is_cacheable_request(method, url) {
            return Ok(None);
        }

        let Some(entry) = self.backend.get_response(method, url.as_str())? else {
            return Ok(None);
        };

        let ttl = self.ttl_for(url);
        let expired = Utc::now()
            .signed_duration_since(entry.stored_at)
            .to_std()
            .map(|age| age > ttl)
            .unwrap_or(false);

        if expired {
            tracing::debug!(url = %url, "Cached response expired");
            return Ok(None);
        }

        tracing::trace!(url = %url, status = entry.status, "Cache hit");
        Ok(Some(entry))
    }

    /// Stores a response if both the request and the status are cacheable
    ///
    /// Returns whether the response was stored.
    pub fn store(&self, method: &str, url: &Url, status: u16, body: &str) -> StorageResult<bool> {
        if !self.is_cacheable_request(method, url) || !CACHEABLE_STATUSES.contains(&status) {
            return Ok(false);
        }

        self.backend.put_response(
            method,
            url.as_str(),
            &CachedResponse {
                status,
                body: body.to_string(),
                stored_at: Utc::now(),
            },
        )?;
        Ok(true)
    }
}
