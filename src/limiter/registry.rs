use crate::config::{DomainLimit, RateLimitingConfig};
use crate::limiter::RateLimiter;
use crate::url::best_match;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Default bucket a crawler asks for when no override matches its domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitSpec {
    pub capacity: u32,
    pub interval: Duration,
}

impl LimitSpec {
    pub const fn new(capacity: u32, interval: Duration) -> Self {
        Self { capacity, interval }
    }

    /// `requests` per second
    pub const fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }
}

/// Owns every rate limiter of a run
///
/// The registry manages:
/// - One global bucket every request passes through
/// - One bucket per crawler domain, created on first use
/// - Configured overrides, matched against the domain by the most specific
///   pattern
///
/// Domain buckets are shared: asking twice for the same domain returns the same
/// limiter.
pub struct LimiterRegistry {
    /// Bucket shared by all crawlers
    global: Arc<RateLimiter>,

    /// Overrides from configuration
    overrides: Vec<DomainLimit>,

    /// Buckets handed out so far, keyed by domain
    domains: Mutex<HashMap<String, Arc<RateLimiter>>>,
}

impl LimiterRegistry {
    /// Creates a registry from the rate-limiting section of the configuration
    pub fn new(config: &RateLimitingConfig) -> Self {
        Self {
            global: Arc::new(RateLimiter::per_second(config.rate_limit)),
            overrides: config.domains.clone(),
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// The bucket every request passes after its domain bucket
    pub fn global(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.global)
    }

    /// Returns the bucket for `domain`, creating it on first use
    ///
    /// # Arguments
    ///
    /// * `domain` - The crawler's primary domain (e.g., "tokyomotion.net")
    /// * `default` - Capacity and interval used when no override matches
    pub fn for_domain(&self, domain: &str, default: LimitSpec) -> Arc<RateLimiter> {
        let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(limiter) = domains.get(domain) {
            return Arc::clone(limiter);
        }

        let spec = self.resolve(domain).unwrap_or(default);
        tracing::debug!(
            domain,
            capacity = spec.capacity,
            interval_ms = spec.interval.as_millis() as u64,
            "Created rate limiter"
        );

        let limiter = Arc::new(RateLimiter::new(spec.capacity, spec.interval));
        domains.insert(domain.to_string(), Arc::clone(&limiter));
        limiter
    }

    /// Finds the configured override for a domain, if any
    fn resolve(&self, domain: &str) -> Option<LimitSpec> {
        best_match(
            self.overrides.iter().map(|entry| {
                (
                    entry.pattern.as_str(),
                    LimitSpec::new(entry.capacity, Duration::from_millis(entry.interval_ms)),
                )
            }),
            domain,
        )
    }

    /// Number of domain buckets created so far
    pub fn domain_count(&self) -> usize {
        self.domains
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
