use crate::config::types::{Config, LivenessProvider};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable holding the ProxyScrape API key
pub const PROXYSCRAPE_KEY_VAR: &str = "PROXYSCRAPE_API_KEY";

/// Environment variable holding the SiteRelic API key
pub const SITERELIC_KEY_VAR: &str = "SITERELIC_API_KEY";

/// Environment variable holding the UptimeRobot API key
pub const UPTIMEROBOT_KEY_VAR: &str = "UPTIMEROBOT_API_KEY";

/// Loads and parses a configuration file from the given path
///
/// API keys left empty in the file are filled from the process environment
/// before validation runs.
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
/// use contact_crawler::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Workers: {}", config.crawler.workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, |name| std::env::var(name).ok())
}

/// Parses configuration text, resolving missing secrets through `lookup`
pub fn parse_config<F>(content: &str, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = toml::from_str(content)?;

    apply_env_overrides(&mut config, lookup);

    validate(&config)?;

    Ok(config)
}

/// Fills empty API keys from the environment
fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if config.proxy.api_key.is_empty() {
        if let Some(key) = lookup(PROXYSCRAPE_KEY_VAR) {
            config.proxy.api_key = key;
        }
    }

    if config.liveness.api_key.is_empty() {
        let var = match config.liveness.provider {
            LivenessProvider::Siterelic => Some(SITERELIC_KEY_VAR),
            LivenessProvider::Uptimerobot => Some(UPTIMEROBOT_KEY_VAR),
            LivenessProvider::None => None,
        };
        if let Some(key) = var.and_then(&lookup) {
            config.liveness.api_key = key;
        }
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a results file can be traced back to the exact
/// configuration that produced it.
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
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
