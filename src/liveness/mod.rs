//! Site liveness gate
//!
//! Before a target is crawled an external uptime service can be asked whether
//! the site is down. What happens when the service itself fails is decided by
//! the caller (`liveness.fail-open`).

mod siterelic;
mod uptimerobot;

pub use siterelic::SiteRelicGate;
pub use uptimerobot::UptimeRobotGate;

use crate::config::{FetcherConfig, LivenessConfig, LivenessProvider};
use crate::crawler::build_http_client;
use crate::CrawlerError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Errors raised by a liveness provider
#[derive(Debug, Error)]
pub enum LivenessError {
    #[error("Liveness request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Liveness service returned HTTP {0}")]
    Status(u16),

    #[error("Unexpected liveness response: {0}")]
    UnexpectedResponse(String),
}

/// Answers "is this site down right now?"
#[async_trait]
pub trait LivenessGate: Send + Sync {
    async fn is_down(&self, url: &Url) -> Result<bool, LivenessError>;
}

/// Gate used when no provider is configured
pub struct AlwaysUp;

#[async_trait]
impl LivenessGate for AlwaysUp {
    async fn is_down(&self, _url: &Url) -> Result<bool, LivenessError> {
        Ok(false)
    }
}

/// Builds the configured liveness gate
pub fn build_liveness_gate(
    liveness: &LivenessConfig,
    fetcher: &FetcherConfig,
) -> Result<Arc<dyn LivenessGate>, CrawlerError> {
    let gate: Arc<dyn LivenessGate> = match liveness.provider {
        LivenessProvider::None => Arc::new(AlwaysUp),
        LivenessProvider::Siterelic => Arc::new(SiteRelicGate::new(
            build_http_client(fetcher, None)?,
            Url::parse(liveness.effective_endpoint())?,
            liveness.api_key.clone(),
        )),
        LivenessProvider::Uptimerobot => Arc::new(UptimeRobotGate::new(
            build_http_client(fetcher, None)?,
            Url::parse(liveness.effective_endpoint())?,
            liveness.api_key.clone(),
        )),
    };
    Ok(gate)
}

/// Resolves a gate answer, applying the fail policy when the provider errored
pub async fn check_site(gate: &dyn LivenessGate, url: &Url, fail_open: bool) -> bool {
    match gate.is_down(url).await {
        Ok(down) => {
            tracing::info!("Site {} is {}", url, if down { "down" } else { "up" });
            down
        }
        Err(e) => {
            tracing::error!("Error checking site status for {}: {}", url, e);
            !fail_open
        }
    }
}
