use crate::config::types::{
    Config, CrawlerConfig, FetcherConfig, LivenessConfig, LivenessProvider, ProxyConfig,
    ProxySource, SitemapConfig,
};
use crate::crawler::ProxyEndpoint;
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrently processed targets
const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_proxy_config(&config.proxy)?;
    validate_liveness_config(&config.liveness)?;
    validate_sitemap_config(&config.sitemap)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.proxy_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "proxy_attempts must be >= 1, got {}",
            config.proxy_attempts
        )));
    }

    Ok(())
}

/// Validates proxy pool configuration
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    match config.provider {
        ProxySource::Proxyscrape => {
            Url::parse(&config.endpoint).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid proxy endpoint '{}': {}", config.endpoint, e))
            })?;
        }
        ProxySource::Static => {
            if config.proxies.is_empty() {
                return Err(ConfigError::Validation(
                    "static proxy provider requires at least one entry in proxies".to_string(),
                ));
            }
            for entry in &config.proxies {
                if ProxyEndpoint::parse(entry).is_none() {
                    return Err(ConfigError::Validation(format!(
                        "Proxy entry '{}' is not a host:port pair",
                        entry
                    )));
                }
            }
        }
        ProxySource::None => {}
    }

    if config.cache_ttl_secs == Some(0) {
        return Err(ConfigError::Validation(
            "cache_ttl_secs must be >= 1 when set".to_string(),
        ));
    }

    if config.test_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "test_timeout_secs must be >= 1, got {}",
            config.test_timeout_secs
        )));
    }

    Url::parse(&config.test_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy test_url: {}", e)))?;

    Ok(())
}

/// Validates liveness gate configuration
fn validate_liveness_config(config: &LivenessConfig) -> Result<(), ConfigError> {
    if config.provider == LivenessProvider::None {
        return Ok(());
    }

    if config.api_key.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "liveness provider {:?} requires an api_key",
            config.provider
        )));
    }

    let endpoint = config.effective_endpoint();
    Url::parse(endpoint).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid liveness endpoint '{}': {}", endpoint, e))
    })?;

    Ok(())
}

/// Validates sitemap configuration
fn validate_sitemap_config(config: &SitemapConfig) -> Result<(), ConfigError> {
    if config.max_documents < 1 {
        return Err(ConfigError::Validation(
            "sitemap max_documents must be >= 1".to_string(),
        ));
    }
    Ok(())
}
