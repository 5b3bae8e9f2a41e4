//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! fetch, crawl and batch layers end-to-end.

mod batch_tests;
mod crawl_tests;
mod liveness_tests;

use contact_crawler::config::Config;

/// Configuration suited to local mock servers: short timeouts, near-zero backoff
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.fetcher.timeout_secs = 5;
    config.fetcher.max_retries = 2;
    config.fetcher.backoff_ms = 1;
    config
}
