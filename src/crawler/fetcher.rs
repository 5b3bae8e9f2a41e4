//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with a browser-like user agent
//! - GET requests with a fixed timeout
//! - Retry logic for transient failures
//! - Falling back to random proxies when a site blocks or keeps failing
//! - Error classification

use crate::config::FetcherConfig;
use crate::crawler::proxy::{pick_untried, ProxyEndpoint, ProxyProvider};
use crate::crawler::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Proxy};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors produced while fetching a single URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Timeout, connection refused, DNS failure, broken body...
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// Non-2xx response
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    /// Proxy fallback was needed but the pool was empty or exhausted
    #[error("No proxy available to fetch {url}")]
    NoProxyAvailable { url: String },
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Decoded response body
    pub body: String,
    /// Proxy that served the page, if any
    pub proxy: Option<ProxyEndpoint>,
}

impl FetchedPage {
    /// Returns the Content-Type header value, if present and readable
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Returns true if the body is worth parsing as markup or text
    ///
    /// A missing Content-Type is treated as textual.
    pub fn is_textual(&self) -> bool {
        match self.content_type() {
            None => true,
            Some(content_type) => {
                let content_type = content_type.to_ascii_lowercase();
                content_type.starts_with("text/")
                    || content_type.contains("html")
                    || content_type.contains("xml")
            }
        }
    }
}

/// Something that can turn a URL into a page
///
/// `use_proxy = false` tries the site directly first and may still fall back
/// to a proxy; `use_proxy = true` goes through a proxy from the start.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, use_proxy: bool) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration (user agent and timeout)
/// * `proxy` - Route every request through this endpoint when set
///
/// # Example
///
/// ```no_run
/// use contact_crawler::config::FetcherConfig;
/// use contact_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default(), None).unwrap();
/// ```
pub fn build_http_client(
    config: &FetcherConfig,
    proxy: Option<&ProxyEndpoint>,
) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy.proxy_url())?);
    }

    builder.build()
}

/// Sends a single GET request and classifies the outcome
pub(crate) async fn send_once(client: &Client, url: &Url) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| classify_transport_error(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();
    let headers = response.headers().clone();
    let body = response
        .text()
        .await
        .map_err(|e| classify_transport_error(url, &e))?;

    Ok(FetchedPage {
        url: final_url,
        status: status.as_u16(),
        headers,
        body,
        proxy: None,
    })
}

/// Maps a reqwest error onto a network failure with a readable message
fn classify_transport_error(url: &Url, error: &reqwest::Error) -> FetchError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    };

    FetchError::Network {
        url: url.to_string(),
        message,
    }
}

/// Production fetcher: direct requests with retries, then proxy fallback
pub struct HttpFetcher {
    client: Client,
    config: FetcherConfig,
    policy: RetryPolicy,
    proxies: Option<Arc<dyn ProxyProvider>>,
}

impl HttpFetcher {
    /// Creates a fetcher; without a proxy provider failures are never re-routed
    pub fn new(
        config: &FetcherConfig,
        proxies: Option<Arc<dyn ProxyProvider>>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, None)?,
            config: config.clone(),
            policy: RetryPolicy::from_config(config),
            proxies,
        })
    }

    /// Fetches directly, retrying transport errors and 5xx with backoff
    async fn fetch_direct(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut retries = 0;
        loop {
            match send_once(&self.client, url).await {
                Ok(page) => return Ok(page),
                Err(e) if self.policy.should_retry(&e, retries) => {
                    retries += 1;
                    let delay = self.policy.backoff(retries);
                    tracing::debug!(
                        "Retry {}/{} for {} in {:?}: {}",
                        retries,
                        self.policy.max_retries,
                        url,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetches through random proxies, never reusing one that already failed
    async fn fetch_via_proxy(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let no_proxy = || FetchError::NoProxyAvailable {
            url: url.to_string(),
        };

        let provider = self.proxies.as_ref().ok_or_else(no_proxy)?;

        let pool = match provider.list_proxies().await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::warn!("Failed to retrieve proxy list: {}", e);
                Vec::new()
            }
        };

        if pool.is_empty() {
            tracing::error!("No proxies available for {}", url);
            return Err(no_proxy());
        }

        let mut tried = HashSet::new();
        let mut last_error = None;

        for attempt in 1..=self.policy.proxy_attempts {
            let Some(proxy) = pick_untried(&pool, &tried) else {
                break;
            };
            tried.insert(proxy.clone());

            tracing::info!(
                "Fetching {} via proxy {} (attempt {}/{})",
                url,
                proxy,
                attempt,
                self.policy.proxy_attempts
            );

            let result = match build_http_client(&self.config, Some(&proxy)) {
                Ok(client) => send_once(&client, url).await,
                Err(e) => Err(FetchError::Network {
                    url: url.to_string(),
                    message: format!("Invalid proxy {}: {}", proxy, e),
                }),
            };

            match result {
                Ok(mut page) => {
                    page.proxy = Some(proxy);
                    return Ok(page);
                }
                Err(e) => {
                    tracing::warn!("Error fetching {} with proxy {}: {}", url, proxy, e);
                    last_error = Some(e);
                    if attempt < self.policy.proxy_attempts {
                        tokio::time::sleep(self.policy.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(no_proxy))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, use_proxy: bool) -> Result<FetchedPage, FetchError> {
        if use_proxy {
            return self.fetch_via_proxy(url).await;
        }

        match self.fetch_direct(url).await {
            Ok(page) => Ok(page),
            Err(e) if self.proxies.is_some() && self.policy.should_fall_back(&e) => {
                tracing::warn!("Failed to fetch {} without proxy: {}", url, e);
                self.fetch_via_proxy(url).await
            }
            Err(e) => Err(e),
        }
    }
}
