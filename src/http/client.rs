//! HTTP client facade
//!
//! This module handles all HTTP requests made by crawlers, including:
//! - Building the reqwest client with the configured user agent and timeouts
//! - Serving GET requests from the response cache
//! - Acquiring the domain limiter, then the global limiter, before any request
//! - Retrying transient failures with exponential backoff
//! - Classifying unexpected statuses as fetch failures

use crate::config::Config;
use crate::http::{Page, ResponseCache};
use crate::limiter::RateLimiter;
use crate::url::normalize;
use crate::{HarvestError, ScrapeError};
use reqwest::{Client, Method};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Upper bound for a single backoff delay
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The loaded configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.general.user_agent.clone())
        .timeout(config.rate_limiting.read_timeout())
        .connect_timeout(config.rate_limiting.connection_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited, cached HTTP access shared by every crawler
pub struct HttpClient {
    client: Client,
    cache: ResponseCache,
    global: Arc<RateLimiter>,

    /// Total attempts for a retryable failure
    attempts: u32,

    /// Delay before the first retry
    retry_delay: Duration,
}

impl HttpClient {
    pub fn new(
        config: &Config,
        cache: ResponseCache,
        global: Arc<RateLimiter>,
    ) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_http_client(config)?,
            cache,
            global,
            attempts: config.rate_limiting.download_attempts.max(1),
            retry_delay: config.rate_limiting.retry_delay(),
        })
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Fetches a page with GET
    ///
    /// # Request Flow
    ///
    /// 1. Normalize the URL into the cache key
    /// 2. On a fresh cache hit, return without network I/O or limiter tokens
    /// 3. Otherwise acquire `limiter`, then the global limiter, and send
    /// 4. Store the response if its status is cacheable
    /// 5. Return the page for 2xx, `ScrapeError::Fetch` for anything else
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx, 3xx, 4xx except 429 | Returned as is |
    /// | HTTP 429, 5xx | Retried with backoff |
    /// | Timeout, connection failure | Retried with backoff |
    ///
    /// Retries stop after `download-attempts` total attempts; the last failure
    /// is returned.
    pub async fn get(&self, limiter: &RateLimiter, url: &Url) -> Result<Page, ScrapeError> {
        let key = cache_key(url);

        if let Some(cached) = self.cache.lookup("GET", &key)? {
            return classify(url, cached.status, cached.body, true);
        }

        let (status, body) = self.send_with_retries(Method::GET, limiter, url, None).await?;
        if self.cache.store("GET", &key, status, &body)? {
            tracing::trace!(url = %url, status, "Stored response");
        }

        classify(url, status, body, false)
    }

    /// Sends a form with POST
    ///
    /// POST requests are never served from or stored in the cache.
    pub async fn post(
        &self,
        limiter: &RateLimiter,
        url: &Url,
        form: &[(&str, &str)],
    ) -> Result<Page, ScrapeError> {
        let (status, body) = self
            .send_with_retries(Method::POST, limiter, url, Some(form))
            .await?;
        classify(url, status, body, false)
    }

    async fn send_with_retries(
        &self,
        method: Method,
        limiter: &RateLimiter,
        url: &Url,
        form: Option<&[(&str, &str)]>,
    ) -> Result<(u16, String), ScrapeError> {
        let mut attempt = 1;

        loop {
            limiter.acquire().await;
            self.global.acquire().await;

            let error = match self.send_once(method.clone(), url, form).await {
                Ok((status, body)) if !is_retryable_status(status) => return Ok((status, body)),
                Ok((status, _)) => ScrapeError::Fetch {
                    url: url.to_string(),
                    status,
                },
                Err(e) => e,
            };

            if attempt >= self.attempts {
                return Err(error);
            }

            let delay = backoff_delay(self.retry_delay, attempt);
            tracing::warn!(
                url = %url,
                attempt,
                max_attempts = self.attempts,
                delay_ms = delay.as_millis() as u64,
                "Retrying after: {}",
                error
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_once(
        &self,
        method: Method,
        url: &Url,
        form: Option<&[(&str, &str)]>,
    ) -> Result<(u16, String), ScrapeError> {
        let mut request = self.client.request(method, url.clone());
        if let Some(form) = form {
            request = request.form(form);
        }

        let response = request.send().await.map_err(|e| transport_error(url, &e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(url, &e))?;

        tracing::debug!(url = %url, status, "Fetched");
        Ok((status, body))
    }
}

/// Normalized form of a URL used as the cache key
fn cache_key(url: &Url) -> Url {
    normalize(url.clone()).unwrap_or_else(|_| url.clone())
}

/// Turns a status and body into a page or a fetch failure
fn classify(url: &Url, status: u16, body: String, from_cache: bool) -> Result<Page, ScrapeError> {
    if (200..300).contains(&status) {
        Ok(Page {
            url: url.clone(),
            status,
            body,
            from_cache,
        })
    } else {
        Err(ScrapeError::Fetch {
            url: url.to_string(),
            status,
        })
    }
}

fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Delay before retry number `attempt` (1-based): base * 2^(attempt - 1), capped
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

fn transport_error(url: &Url, error: &reqwest::Error) -> ScrapeError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    };

    ScrapeError::Transport {
        url: url.to_string(),
        message,
    }
}
