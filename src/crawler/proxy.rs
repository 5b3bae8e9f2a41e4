//! Proxy pool acquisition
//!
//! Proxies are plain `host:port` HTTP endpoints. They are fetched on demand,
//! never validated on the fetch path and never persisted.

use crate::config::{FetcherConfig, ProxyConfig, ProxySource};
use crate::crawler::fetcher::{build_http_client, send_once};
use crate::CrawlerError;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

/// Errors raised while retrieving a proxy list
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Proxy list request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Proxy list request returned HTTP {0}")]
    Status(u16),
}

/// A proxy endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
}

impl ProxyEndpoint {
    /// Parses `host:port`, optionally prefixed with `http://`
    ///
    /// Returns `None` for blank lines, missing or zero ports, and anything
    /// else that cannot be an endpoint.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix("http://").unwrap_or(trimmed);
        let trimmed = trimmed.trim_end_matches('/');

        let (host, port) = trimmed.rsplit_once(':')?;
        let host = host.trim();
        if host.is_empty() || host.contains(char::is_whitespace) || host.contains('/') {
            return None;
        }

        let port: u16 = port.trim().parse().ok()?;
        if port == 0 {
            return None;
        }

        Some(Self {
            host: host.to_string(),
            port,
        })
    }

    /// URL handed to the HTTP client for both plain and TLS traffic
    pub fn proxy_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Supplies candidate proxies on demand
#[async_trait]
pub trait ProxyProvider: Send + Sync {
    /// Returns the current pool; an empty pool is not an error
    async fn list_proxies(&self) -> Result<Vec<ProxyEndpoint>, ProxyError>;
}

/// Parses a newline-separated proxy listing, skipping unparsable lines
pub fn parse_proxy_list(text: &str) -> Vec<ProxyEndpoint> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let parsed = ProxyEndpoint::parse(line);
            if parsed.is_none() {
                tracing::debug!("Skipping malformed proxy entry: {}", line);
            }
            parsed
        })
        .collect()
}

/// Picks a random endpoint that is not in `tried`
pub fn pick_untried(
    pool: &[ProxyEndpoint],
    tried: &HashSet<ProxyEndpoint>,
) -> Option<ProxyEndpoint> {
    let candidates: Vec<&ProxyEndpoint> = pool.iter().filter(|p| !tried.contains(p)).collect();
    if candidates.is_empty() {
        return None;
    }
    let index = rand::random_range(0..candidates.len());
    Some(candidates[index].clone())
}

/// ProxyScrape-compatible listing endpoint
pub struct ProxyScrapeProvider {
    client: Client,
    endpoint: Url,
}

impl ProxyScrapeProvider {
    /// Creates a provider; a non-empty `api_key` is sent as the `apikey` query pair
    pub fn new(client: Client, endpoint: &str, api_key: &str) -> Result<Self, CrawlerError> {
        let mut endpoint = Url::parse(endpoint)?;
        if !api_key.is_empty() {
            endpoint.query_pairs_mut().append_pair("apikey", api_key);
        }
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ProxyProvider for ProxyScrapeProvider {
    async fn list_proxies(&self) -> Result<Vec<ProxyEndpoint>, ProxyError> {
        let response = self.client.get(self.endpoint.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let proxies = parse_proxy_list(&body);
        tracing::debug!("Retrieved {} proxies", proxies.len());
        Ok(proxies)
    }
}

/// Fixed list from the configuration file
pub struct StaticProxyList {
    proxies: Vec<ProxyEndpoint>,
}

impl StaticProxyList {
    pub fn new(proxies: Vec<ProxyEndpoint>) -> Self {
        Self { proxies }
    }

    /// Builds the list from raw entries, dropping unparsable ones
    pub fn from_entries(entries: &[String]) -> Self {
        Self::new(entries.iter().filter_map(|e| ProxyEndpoint::parse(e)).collect())
    }
}

#[async_trait]
impl ProxyProvider for StaticProxyList {
    async fn list_proxies(&self) -> Result<Vec<ProxyEndpoint>, ProxyError> {
        Ok(self.proxies.clone())
    }
}

/// Wraps a provider and reuses its last list until the TTL expires
pub struct CachedProxyProvider {
    inner: Arc<dyn ProxyProvider>,
    ttl: Duration,
    cached: Mutex<Option<(Instant, Vec<ProxyEndpoint>)>>,
}

impl CachedProxyProvider {
    pub fn new(inner: Arc<dyn ProxyProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ProxyProvider for CachedProxyProvider {
    async fn list_proxies(&self) -> Result<Vec<ProxyEndpoint>, ProxyError> {
        let mut cached = self.cached.lock().await;

        if let Some((fetched_at, proxies)) = cached.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(proxies.clone());
            }
        }

        let proxies = self.inner.list_proxies().await?;
        *cached = Some((Instant::now(), proxies.clone()));
        Ok(proxies)
    }
}

/// Builds the configured proxy provider, or `None` when proxies are disabled
pub fn build_proxy_provider(
    proxy: &ProxyConfig,
    fetcher: &FetcherConfig,
) -> Result<Option<Arc<dyn ProxyProvider>>, CrawlerError> {
    let provider: Arc<dyn ProxyProvider> = match proxy.provider {
        ProxySource::None => return Ok(None),
        ProxySource::Static => Arc::new(StaticProxyList::from_entries(&proxy.proxies)),
        ProxySource::Proxyscrape => {
            let client = build_http_client(fetcher, None)?;
            Arc::new(ProxyScrapeProvider::new(
                client,
                &proxy.endpoint,
                &proxy.api_key,
            )?)
        }
    };

    Ok(Some(match proxy.cache_ttl_secs {
        Some(ttl) => Arc::new(CachedProxyProvider::new(provider, Duration::from_secs(ttl))),
        None => provider,
    }))
}

/// Checks every endpoint against `test_url` and returns the ones answering 2xx
pub async fn probe_proxies(
    proxies: &[ProxyEndpoint],
    fetcher: &FetcherConfig,
    test_url: &Url,
    timeout: Duration,
) -> Vec<ProxyEndpoint> {
    let probe_config = FetcherConfig {
        timeout_secs: timeout.as_secs().max(1),
        ..fetcher.clone()
    };

    let mut working = Vec::new();
    for proxy in proxies {
        let client = match build_http_client(&probe_config, Some(proxy)) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Proxy {} failed: {}", proxy, e);
                continue;
            }
        };

        match send_once(&client, test_url).await {
            Ok(_) => {
                tracing::info!("Proxy {} is working", proxy);
                working.push(proxy.clone());
            }
            Err(e) => tracing::warn!("Proxy {} failed: {}", proxy, e),
        }
    }

    working
}
