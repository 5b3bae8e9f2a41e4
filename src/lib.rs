//! Contact Crawler: harvests public contact details from websites
//!
//! This crate crawls each target site breadth-first within its own origin,
//! optionally seeded from the site's sitemap, and extracts email addresses and
//! phone numbers from every page it reaches. Blocked requests fall back to
//! rotating proxies, and an external liveness check can skip dead sites.

pub mod config;
pub mod crawler;
pub mod input;
pub mod liveness;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Contact Crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] crawler::ProxyError),

    #[error("Liveness check error: {0}")]
    Liveness(#[from] liveness::LivenessError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Input error: {0}")]
    Input(#[from] input::InputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Empty URL")]
    Empty,
}

/// Result type alias for Contact Crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{BatchRunner, ContactExtractor, CrawlEngine, CrawlOutcome};
pub use output::{ContactRecord, RecordError};
pub use url::{extract_domain, origin_of, parse_target};
