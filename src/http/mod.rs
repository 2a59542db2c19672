//! HTTP access for crawlers
//!
//! - `HttpClient`: rate-limited, cached GET/POST with retries
//! - `ResponseCache`: which responses are kept and for how long
//! - `Page`: a fetched document with extraction helpers

mod cache;
mod client;
mod page;

pub use cache::{CacheFilter, ResponseCache, CACHEABLE_STATUSES};
pub use client::{backoff_delay, build_http_client, HttpClient};
pub use page::Page;
