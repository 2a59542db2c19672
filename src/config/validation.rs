use crate::config::types::{
    CacheConfig, Config, CrawlerConfig, GeneralConfig, RateLimitingConfig, StorageConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_general_config(&config.general)?;
    validate_rate_limiting_config(&config.rate_limiting)?;
    validate_cache_config(&config.cache)?;
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

fn validate_general_config(config: &GeneralConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.max_file_name_length < 10 {
        return Err(ConfigError::Validation(format!(
            "max_file_name_length must be >= 10, got {}",
            config.max_file_name_length
        )));
    }

    if config.max_folder_name_length < 10 {
        return Err(ConfigError::Validation(format!(
            "max_folder_name_length must be >= 10, got {}",
            config.max_folder_name_length
        )));
    }

    Ok(())
}

fn validate_rate_limiting_config(config: &RateLimitingConfig) -> Result<(), ConfigError> {
    if config.connection_timeout == 0 || config.read_timeout == 0 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be positive, got connection={}s read={}s",
            config.connection_timeout, config.read_timeout
        )));
    }

    if config.rate_limit == 0 {
        return Err(ConfigError::Validation(
            "rate_limit must be >= 1 request per second".to_string(),
        ));
    }

    if config.download_attempts == 0 {
        return Err(ConfigError::Validation(
            "download_attempts must be >= 1".to_string(),
        ));
    }

    for entry in &config.domains {
        validate_pattern(&entry.pattern)?;

        if entry.capacity == 0 || entry.interval_ms == 0 {
            return Err(ConfigError::Validation(format!(
                "limiter for '{}' needs a positive capacity and interval",
                entry.pattern
            )));
        }
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    for pattern in &config.no_cache {
        validate_pattern(pattern)?;
    }

    for scope in &config.scopes {
        validate_pattern(&scope.pattern)?;
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages == 0 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    if config.max_concurrent_seeds == 0 || config.max_concurrent_seeds > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_seeds must be between 1 and 100, got {}",
            config.max_concurrent_seeds
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a domain/URL glob pattern
///
/// Valid patterns are non-empty, contain no whitespace, and are not a lone `*`
/// (a catch-all would silently override every other scope).
fn validate_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() || pattern.chars().all(|c| c == '*') {
        return Err(ConfigError::InvalidPattern(format!(
            "'{}' matches everything",
            pattern
        )));
    }

    if pattern.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidPattern(format!(
            "'{}' contains whitespace",
            pattern
        )));
    }

    if pattern.contains("://") {
        return Err(ConfigError::InvalidPattern(format!(
            "'{}' must not include a scheme",
            pattern
        )));
    }

    Ok(())
}
