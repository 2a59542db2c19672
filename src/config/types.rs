use crate::item::ItemType;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Harvest
///
/// Every section falls back to its defaults, so an empty file is a valid
/// configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    #[serde(rename = "rate-limiting")]
    pub rate_limiting: RateLimitingConfig,
    pub cache: CacheConfig,
    #[serde(rename = "download-options")]
    pub download_options: DownloadOptions,
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    pub output: OutputConfig,
}

/// General HTTP identity and naming limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Longest file name handed to the download stage
    #[serde(rename = "max-file-name-length")]
    pub max_file_name_length: usize,

    /// Longest single folder (title) component
    #[serde(rename = "max-folder-name-length")]
    pub max_folder_name_length: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            user_agent:
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0"
                    .to_string(),
            max_file_name_length: 95,
            max_folder_name_length: 60,
        }
    }
}

/// Timeouts, retries, global rate limit and cache lifetimes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    /// Connection timeout (seconds)
    #[serde(rename = "connection-timeout")]
    pub connection_timeout: u64,

    /// Whole-request read timeout (seconds)
    #[serde(rename = "read-timeout")]
    pub read_timeout: u64,

    /// Global requests per second across every crawler
    #[serde(rename = "rate-limit")]
    pub rate_limit: u32,

    /// Total attempts for a retryable fetch failure
    #[serde(rename = "download-attempts")]
    pub download_attempts: u32,

    /// Base delay before the first retry (milliseconds), doubled per attempt
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// How long responses from file hosts stay cached (seconds)
    #[serde(rename = "file-host-cache-secs")]
    pub file_host_cache_secs: u64,

    /// How long responses from forums stay cached (seconds)
    #[serde(rename = "forum-cache-secs")]
    pub forum_cache_secs: u64,

    /// Per-domain limiter overrides
    #[serde(rename = "domain")]
    pub domains: Vec<DomainLimit>,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            connection_timeout: 15,
            read_timeout: 300,
            rate_limit: 50,
            download_attempts: 5,
            retry_delay_ms: 500,
            file_host_cache_secs: 7 * 24 * 60 * 60,
            forum_cache_secs: 28 * 24 * 60 * 60 + 12 * 60 * 60 + 30 * 60 + 15,
            domains: Vec::new(),
        }
    }
}

impl RateLimitingConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn file_host_cache_length(&self) -> Duration {
        Duration::from_secs(self.file_host_cache_secs)
    }

    pub fn forum_cache_length(&self) -> Duration {
        Duration::from_secs(self.forum_cache_secs)
    }
}

/// Token bucket override for the domains matching `pattern`
#[derive(Debug, Clone, Deserialize)]
pub struct DomainLimit {
    /// Domain pattern (e.g., "*.tokyomotion.net")
    pub pattern: String,

    /// Requests allowed per interval
    pub capacity: u32,

    /// Interval length (milliseconds)
    #[serde(rename = "interval-ms")]
    pub interval_ms: u64,
}

/// Response cache policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Expiry for URLs that match no scope (seconds)
    #[serde(rename = "default-expire-secs")]
    pub default_expire_secs: u64,

    /// URL globs whose responses are never cached
    #[serde(rename = "no-cache")]
    pub no_cache: Vec<String>,

    /// Extra expiry scopes; the most specific match wins
    #[serde(rename = "scope")]
    pub scopes: Vec<CacheScope>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_expire_secs: 7 * 24 * 60 * 60,
            no_cache: Vec::new(),
            scopes: Vec::new(),
        }
    }
}

/// Expiry for responses whose URL matches `pattern`
#[derive(Debug, Clone, Deserialize)]
pub struct CacheScope {
    pub pattern: String,

    #[serde(rename = "expire-secs")]
    pub expire_secs: u64,
}

/// Folder naming and fan-out limits
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DownloadOptions {
    #[serde(rename = "include-album-id-in-folder-name")]
    pub include_album_id_in_folder_name: bool,

    #[serde(rename = "remove-domains-from-folder-names")]
    pub remove_domains_from_folder_names: bool,

    #[serde(rename = "maximum-number-of-children")]
    pub maximum_number_of_children: ChildrenLimits,
}

/// Maximum accepted children per item type (0 means unlimited)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChildrenLimits {
    pub forum: u32,

    #[serde(rename = "forum-post")]
    pub forum_post: u32,

    #[serde(rename = "file-host-profile")]
    pub file_host_profile: u32,

    #[serde(rename = "file-host-album")]
    pub file_host_album: u32,
}

impl ChildrenLimits {
    /// Returns the configured limit for an item type
    pub fn limit_for(&self, item_type: ItemType) -> u32 {
        match item_type {
            ItemType::Forum => self.forum,
            ItemType::ForumPost => self.forum_post,
            ItemType::FileHostProfile => self.file_host_profile,
            ItemType::FileHostAlbum => self.file_host_album,
        }
    }
}

/// Crawl loop behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Hard cap on pages a single pager may walk
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Seeds crawled at the same time
    #[serde(rename = "max-concurrent-seeds")]
    pub max_concurrent_seeds: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 500,
            max_concurrent_seeds: 8,
        }
    }
}

/// Persistent storage locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database holding the response cache and progress store
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./harvest.db".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File that resolved media URLs are appended to
    #[serde(rename = "media-list")]
    pub media_list: Option<String>,
}
