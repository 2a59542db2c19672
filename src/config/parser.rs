use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Global rate limit: {}/s", config.rate_limiting.rate_limit);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the settings they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[general]
user-agent = "TestAgent/1.0"

[rate-limiting]
rate-limit = 20
download-attempts = 3
file-host-cache-secs = 3600

[[rate-limiting.domain]]
pattern = "*.tokyomotion.net"
capacity = 5
interval-ms = 2000

[cache]
no-cache = ["*/random*"]

[[cache.scope]]
pattern = "*.simpcity.su"
expire-secs = 60

[download-options.maximum-number-of-children]
file-host-album = 2

[storage]
database-path = "./test.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.general.user_agent, "TestAgent/1.0");
        assert_eq!(config.rate_limiting.rate_limit, 20);
        assert_eq!(config.rate_limiting.download_attempts, 3);
        assert_eq!(
            config.rate_limiting.file_host_cache_length(),
            Duration::from_secs(3600)
        );
        assert_eq!(config.rate_limiting.domains.len(), 1);
        assert_eq!(config.rate_limiting.domains[0].capacity, 5);
        assert_eq!(config.cache.no_cache, vec!["*/random*".to_string()]);
        assert_eq!(config.cache.scopes[0].expire_secs, 60);
        assert_eq!(
            config
                .download_options
                .maximum_number_of_children
                .limit_for(ItemType::FileHostAlbum),
            2
        );
        assert_eq!(config.storage.database_path, "./test.db");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.general.max_file_name_length, 95);
        assert_eq!(config.rate_limiting.connection_timeout, 15);
        assert_eq!(config.rate_limiting.read_timeout, 300);
        assert_eq!(config.rate_limiting.rate_limit, 50);
        assert_eq!(config.rate_limiting.download_attempts, 5);
        assert_eq!(config.cache.default_expire_secs, 604_800);
        assert_eq!(config.crawler.max_pages, 500);
        assert_eq!(
            config
                .download_options
                .maximum_number_of_children
                .limit_for(ItemType::Forum),
            0
        );
        assert!(config.output.media_list.is_none());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::Io(_)));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[rate-limiting]\ndownload-attempts = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("[crawler]\nmax-pages = 10\n");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("[crawler]\nmax-pages = 10\n");
        let file2 = create_temp_config("[crawler]\nmax-pages = 11\n");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
