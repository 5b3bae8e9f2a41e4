//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retries and proxy fallback
//! - Proxy pool acquisition
//! - Sitemap seeding
//! - Link and contact extraction
//! - The per-site crawl engine and the batch orchestrator

mod batch;
mod contacts;
mod engine;
mod fetcher;
mod parser;
mod proxy;
mod retry;
mod sitemap;

pub use batch::{record_from_outcome, BatchReport, BatchRunner};
pub use contacts::{is_allowed_domain, ContactExtractor, Contacts, KNOWN_EMAIL_PROVIDERS};
pub use engine::{CancelFlag, CrawlEngine, CrawlLimits, CrawlOutcome, PageFailure, StopReason};
pub use fetcher::{build_http_client, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use parser::extract_links;
pub use proxy::{
    build_proxy_provider, parse_proxy_list, pick_untried, probe_proxies, CachedProxyProvider,
    ProxyEndpoint, ProxyError, ProxyProvider, ProxyScrapeProvider, StaticProxyList,
};
pub use retry::{FailureKind, RetryPolicy};
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapKind, SitemapResolver};
