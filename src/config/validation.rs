use crate::config::types::{CacheConfig, Config, FetchConfig, RateLimitConfig, ScraperConfig};
use crate::ConfigError;

/// Upper bound on the batch size, shared with the export boundary
pub const MAX_BATCH_SIZE: usize = 300;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_fetch_config(&config.fetch)?;
    validate_cache_config(&config.cache)?;
    validate_rate_limit_config(&config.rate_limit)?;
    for pattern in &config.security.allowed_hosts {
        validate_host_pattern(pattern)?;
    }
    Ok(())
}

fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if !(1..=5).contains(&config.concurrency) {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 5, got {}",
            config.concurrency
        )));
    }

    if config.domain_delay_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "domain_delay_ms must be <= 60000ms, got {}ms",
            config.domain_delay_ms
        )));
    }

    if !(1..=MAX_BATCH_SIZE).contains(&config.max_batch_size) {
        return Err(ConfigError::Validation(format!(
            "max_batch_size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE, config.max_batch_size
        )));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if !(1..=120).contains(&config.timeout_secs) {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 120, got {}",
            config.timeout_secs
        )));
    }

    if config.max_retries > 5 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 5, got {}",
            config.max_retries
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.ttl_secs < 1 {
        return Err(ConfigError::Validation(
            "cache ttl_secs must be >= 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.limit < 1 {
        return Err(ConfigError::Validation(format!(
            "rate limit must be >= 1, got {}",
            config.limit
        )));
    }

    if config.window_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "rate limit window_secs must be >= 1, got {}",
            config.window_secs
        )));
    }

    Ok(())
}

/// Validates an allow-list host pattern (supports a `*.` prefix)
pub fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    let host = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_host_string(host)
}

/// Validates a host string (without wildcard prefix)
fn validate_host_string(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::InvalidPattern("Host cannot be empty".to_string()));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    if !host.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' must contain at least one dot (e.g., 'example.com')",
            host
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_host_pattern() {
        assert!(validate_host_pattern("example.com").is_ok());
        assert!(validate_host_pattern("*.example.com").is_ok());
        assert!(validate_host_pattern("sub.example.com").is_ok());

        assert!(validate_host_pattern("").is_err());
        assert!(validate_host_pattern("*.").is_err());
        assert!(validate_host_pattern("example").is_err());
        assert!(validate_host_pattern(".example.com").is_err());
        assert!(validate_host_pattern("example.com.").is_err());
        assert!(validate_host_pattern("exa mple.com").is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = Config::default();
        config.scraper.concurrency = 6;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.scraper.concurrency = 5;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_batch_size_bounds() {
        let mut config = Config::default();
        config.scraper.max_batch_size = MAX_BATCH_SIZE + 1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_fetch_bounds() {
        let mut config = Config::default();
        config.fetch.timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.fetch.max_retries = 6;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.fetch.user_agent = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rate_limit_and_cache_bounds() {
        let mut config = Config::default();
        config.rate_limit.limit = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_allowed_host() {
        let mut config = Config::default();
        config.security.allowed_hosts.push("not a host".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidPattern(_))));
    }
}
