//! Request rate limiting
//!
//! This module provides:
//! - `RateLimiter`: a token bucket that delays (never drops) acquisitions
//! - `LimiterRegistry`: the per-domain buckets plus the global bucket

mod bucket;
mod registry;

pub use bucket::RateLimiter;
pub use registry::{LimitSpec, LimiterRegistry};
