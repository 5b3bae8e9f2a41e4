//! Retry policy shared by the direct and proxied fetch paths

use crate::config::FetcherConfig;
use crate::crawler::fetcher::FetchError;
use std::time::Duration;

/// Longest pause between two attempts, whatever the attempt number
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How a failed fetch should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport error or 5xx: retry the same request, then try a proxy
    Retryable,
    /// 403 or 429: the site is refusing us, go straight to a proxy
    Blocked,
    /// Anything else (404, 410, no proxy left...): give up on this URL
    Terminal,
}

/// Retry policy for HTTP fetches
///
/// | Condition              | Direct path                       | Proxy fallback |
/// |------------------------|-----------------------------------|----------------|
/// | Timeout / connect / 5xx | retry up to `max_retries` times  | yes            |
/// | HTTP 403 / 429         | no retry                          | yes            |
/// | Other non-2xx          | no retry                          | no             |
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra direct attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every further retry
    pub base_backoff: Duration,
    /// Distinct proxies tried before giving up
    pub proxy_attempts: u32,
}

impl RetryPolicy {
    /// Builds the policy from fetcher configuration
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(config.backoff_ms),
            proxy_attempts: config.proxy_attempts,
        }
    }

    /// Classifies a fetch failure
    pub fn classify(&self, error: &FetchError) -> FailureKind {
        match error {
            FetchError::Network { .. } => FailureKind::Retryable,
            FetchError::Http { status, .. } if *status >= 500 => FailureKind::Retryable,
            FetchError::Http { status, .. } if *status == 403 || *status == 429 => {
                FailureKind::Blocked
            }
            FetchError::Http { .. } | FetchError::NoProxyAvailable { .. } => FailureKind::Terminal,
        }
    }

    /// Returns true if a direct failure may be retried after `retries_made` retries
    pub fn should_retry(&self, error: &FetchError, retries_made: u32) -> bool {
        retries_made < self.max_retries && self.classify(error) == FailureKind::Retryable
    }

    /// Returns true if a direct failure should be retried through a proxy
    pub fn should_fall_back(&self, error: &FetchError) -> bool {
        matches!(
            self.classify(error),
            FailureKind::Retryable | FailureKind::Blocked
        )
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`, capped
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(retry - 1).unwrap_or(u32::MAX);
        self.base_backoff
            .checked_mul(factor)
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetcherConfig::default())
    }
}
