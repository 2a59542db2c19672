//! Sumi-Harvest: a polite media crawl orchestrator
//!
//! This crate runs site-specific crawlers concurrently against a shared
//! download hand-off, respecting per-domain rate limits, caching prior HTTP
//! responses, bounding fan-out and surviving partial failures.

pub mod config;
pub mod crawler;
pub mod http;
pub mod item;
pub mod limiter;
pub mod manager;
pub mod progress;
pub mod storage;
pub mod url;

use std::fmt;
use thiserror::Error;

/// Main error type for Sumi-Harvest operations
///
/// These are the failures a crawl cannot recover from; they abort the run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("No crawler registered for {url}")]
    NoCrawler { url: String },

    #[error("Media sink closed, could not hand off {url}")]
    SinkClosed { url: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Failure of a single crawl operation
///
/// Every variant except `Internal` is classified: the error-handling wrapper
/// records it against the item and lets sibling work continue. `Internal`
/// wraps a backend defect and aborts the run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP {status} for {url}")]
    Fetch { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Could not extract content from {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("{url} is restricted: {reason}")]
    Restricted { url: String, reason: String },

    #[error("{url} reached its limit of {limit} children")]
    MaxChildren { url: String, limit: u32 },

    #[error("{operation} is not supported for {url}")]
    Unimplemented { operation: String, url: String },

    #[error("No usable file extension in '{name}'")]
    NoExtension { name: String },

    #[error(transparent)]
    Internal(#[from] HarvestError),
}

impl From<storage::StorageError> for ScrapeError {
    fn from(err: storage::StorageError) -> Self {
        Self::Internal(HarvestError::Storage(err))
    }
}

impl From<UrlError> for ScrapeError {
    fn from(err: UrlError) -> Self {
        Self::Internal(HarvestError::UrlError(err))
    }
}

impl ScrapeError {
    /// Returns the classification of this failure, or None when unclassified
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Fetch { .. } => Some(FailureKind::Fetch),
            Self::Transport { .. } => Some(FailureKind::Transport),
            Self::Extraction { .. } => Some(FailureKind::Extraction),
            Self::Restricted { .. } => Some(FailureKind::Restricted),
            Self::MaxChildren { .. } => Some(FailureKind::MaxChildren),
            Self::Unimplemented { .. } => Some(FailureKind::Unimplemented),
            Self::NoExtension { .. } => Some(FailureKind::NoExtension),
            Self::Internal(_) => None,
        }
    }

    /// Separates classified failures from backend defects
    ///
    /// Returns the failure with its kind, or the wrapped `HarvestError` when
    /// the failure is unclassified.
    pub fn classify(self) -> std::result::Result<(FailureKind, Self), HarvestError> {
        let kind = match self {
            Self::Internal(e) => return Err(e),
            Self::Fetch { .. } => FailureKind::Fetch,
            Self::Transport { .. } => FailureKind::Transport,
            Self::Extraction { .. } => FailureKind::Extraction,
            Self::Restricted { .. } => FailureKind::Restricted,
            Self::MaxChildren { .. } => FailureKind::MaxChildren,
            Self::Unimplemented { .. } => FailureKind::Unimplemented,
            Self::NoExtension { .. } => FailureKind::NoExtension,
        };
        Ok((kind, self))
    }

    /// Whether repeating the request could succeed
    ///
    /// Transport errors (timeouts, refused connections) and 429/5xx responses
    /// are retryable; everything else is terminal for the item.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Fetch { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

/// Classified failure kinds, used for counters and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    Fetch,
    Transport,
    Extraction,
    Restricted,
    MaxChildren,
    Unimplemented,
    NoExtension,
}

impl FailureKind {
    pub const COUNT: usize = 7;

    pub const ALL: [FailureKind; Self::COUNT] = [
        FailureKind::Fetch,
        FailureKind::Transport,
        FailureKind::Extraction,
        FailureKind::Restricted,
        FailureKind::MaxChildren,
        FailureKind::Unimplemented,
        FailureKind::NoExtension,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Transport => "transport",
            Self::Extraction => "extraction",
            Self::Restricted => "restricted",
            Self::MaxChildren => "max-children",
            Self::Unimplemented => "unimplemented",
            Self::NoExtension => "no-extension",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, CrawlerRegistry, Operation};
pub use item::{ItemType, MediaItem, ScrapeItem};
pub use manager::Manager;
pub use url::{extract_domain, normalize_url};
