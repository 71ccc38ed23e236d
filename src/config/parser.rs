use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable whose comma-separated hosts extend `security.allowed-hosts`
pub const ALLOWED_HOSTS_ENV: &str = "SCRAPER_ALLOWED_HOSTS";

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
/// use circuit_scraper::config::load_config;
///
/// let config = load_config(Path::new("scraper.toml")).unwrap();
/// println!("Concurrency: {}", config.scraper.concurrency);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
///
/// Hosts listed in `SCRAPER_ALLOWED_HOSTS` are appended to the allow-list
/// before validation.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(content)?;
    apply_env_overrides(&mut config, std::env::var(ALLOWED_HOSTS_ENV).ok().as_deref());
    validate(&config)?;
    Ok(config)
}

/// Default configuration with environment overrides applied
pub fn default_config() -> Result<Config, ConfigError> {
    parse_config("")
}

/// Appends the comma-separated hosts in `env_hosts` to the allow-list
pub fn apply_env_overrides(config: &mut Config, env_hosts: Option<&str>) {
    let Some(raw) = env_hosts else {
        return;
    };

    for host in raw.split(',').map(str::trim).filter(|h| !h.is_empty()) {
        let host = host.to_lowercase();
        if !config.security.allowed_hosts.contains(&host) {
            config.security.allowed_hosts.push(host);
        }
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is logged at startup so two runs can be compared.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}
