//! Configuration module for Contact Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing values fall back to conservative defaults.
//!
//! # Example
//!
//! ```no_run
//! use contact_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Request timeout: {}s", config.fetcher.timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BatchConfig, Config, CrawlerConfig, FetcherConfig, LivenessConfig, LivenessProvider,
    LoggingConfig, ProxyConfig, ProxySource, SitemapConfig, DEFAULT_PROXYSCRAPE_ENDPOINT,
    DEFAULT_SITERELIC_ENDPOINT, DEFAULT_UPTIMEROBOT_ENDPOINT, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, PROXYSCRAPE_KEY_VAR,
    SITERELIC_KEY_VAR, UPTIMEROBOT_KEY_VAR,
};

pub use validation::validate;
