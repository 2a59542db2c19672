//! Configuration module for Sumi-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The loaded [`Config`] is an immutable snapshot for the whole run.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Retry attempts: {}", config.rate_limiting.download_attempts);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    CacheConfig, CacheScope, ChildrenLimits, Config, CrawlerConfig, DomainLimit,
    DownloadOptions, GeneralConfig, OutputConfig, RateLimitingConfig, StorageConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
