//! Batch orchestration
//!
//! For every input target: validate it, ask the liveness gate, resolve the
//! sitemap, then run one crawl per sitemap URL (or one on the target itself
//! when the sitemap is empty). Targets run on up to `crawler.workers` tasks;
//! records come back in input order.

use crate::config::Config;
use crate::crawler::contacts::ContactExtractor;
use crate::crawler::engine::{CancelFlag, CrawlEngine, CrawlLimits, CrawlOutcome, StopReason};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::proxy::build_proxy_provider;
use crate::crawler::sitemap::SitemapResolver;
use crate::liveness::{build_liveness_gate, check_site, LivenessGate};
use crate::output::{BatchStatistics, ContactRecord, RecordError};
use crate::url::{origin_of, parse_target};
use crate::CrawlerError;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Records of a finished batch plus its statistics
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub records: Vec<ContactRecord>,
    pub stats: BatchStatistics,
}

/// Drives crawls over a list of targets
pub struct BatchRunner {
    engine: Arc<CrawlEngine>,
    sitemap: Option<Arc<SitemapResolver>>,
    liveness: Arc<dyn LivenessGate>,
    fail_open: bool,
    check_sitemap_urls: bool,
    workers: usize,
    cancel: CancelFlag,
}

impl BatchRunner {
    pub fn new(
        engine: Arc<CrawlEngine>,
        sitemap: Option<Arc<SitemapResolver>>,
        liveness: Arc<dyn LivenessGate>,
        workers: usize,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            engine,
            sitemap,
            liveness,
            fail_open: true,
            check_sitemap_urls: true,
            workers: workers.max(1),
            cancel,
        }
    }

    /// Liveness provider failures count as "up" when true
    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    /// Also run the liveness gate on every sitemap-derived URL
    pub fn with_sitemap_checks(mut self, check: bool) -> Self {
        self.check_sitemap_urls = check;
        self
    }

    /// Wires every collaborator from configuration
    pub fn from_config(config: &Config, cancel: CancelFlag) -> Result<Self, CrawlerError> {
        let proxies = build_proxy_provider(&config.proxy, &config.fetcher)?;
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.fetcher, proxies)?);

        let sitemap = if config.sitemap.enabled {
            let direct: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.fetcher, None)?);
            Some(Arc::new(SitemapResolver::new(
                direct,
                config.sitemap.max_documents,
            )))
        } else {
            None
        };

        let engine = CrawlEngine::new(
            fetcher,
            ContactExtractor::new(config.crawler.restrict_emails),
            CrawlLimits::from_config(&config.crawler),
            cancel.clone(),
        );

        let liveness = build_liveness_gate(&config.liveness, &config.fetcher)?;

        Ok(Self::new(
            Arc::new(engine),
            sitemap,
            liveness,
            config.crawler.workers,
            cancel,
        )
        .with_fail_open(config.liveness.fail_open)
        .with_sitemap_checks(config.liveness.check_sitemap_urls))
    }

    /// Processes one input target into one or more records
    pub async fn process_target(&self, raw: &str) -> Vec<ContactRecord> {
        let raw = raw.trim();

        let target = match parse_target(raw) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!("Skipping invalid target '{}': {}", raw, e);
                return vec![ContactRecord::failed(
                    raw,
                    RecordError::InvalidTarget(e.to_string()),
                )];
            }
        };

        if self.cancel.is_cancelled() {
            return vec![ContactRecord::failed(raw, RecordError::Cancelled)];
        }

        if check_site(self.liveness.as_ref(), &target, self.fail_open).await {
            return vec![ContactRecord::failed(raw, RecordError::SiteDown)];
        }

        let seeds = match &self.sitemap {
            Some(resolver) => resolver.resolve(&origin_of(&target)).await,
            None => BTreeSet::new(),
        };

        if seeds.is_empty() {
            let outcome = self.engine.run(&target).await;
            return vec![record_from_outcome(raw, outcome)];
        }

        tracing::info!("URLs obtained from sitemap: {}", seeds.len());
        let mut records = Vec::with_capacity(seeds.len());
        for seed in seeds {
            records.push(self.process_sitemap_url(&seed).await);
        }
        records
    }

    async fn process_sitemap_url(&self, raw: &str) -> ContactRecord {
        let url = match parse_target(raw) {
            Ok(url) => url,
            Err(e) => return ContactRecord::failed(raw, RecordError::InvalidTarget(e.to_string())),
        };

        if self.cancel.is_cancelled() {
            return ContactRecord::failed(raw, RecordError::Cancelled);
        }

        if self.check_sitemap_urls && check_site(self.liveness.as_ref(), &url, self.fail_open).await
        {
            return ContactRecord::failed(raw, RecordError::SiteDown);
        }

        record_from_outcome(raw, self.engine.run(&url).await)
    }

    /// Lists a site's pages: its sitemap URLs, or the links found by crawling it
    pub async fn list_links(&self, target: &Url) -> BTreeSet<String> {
        if let Some(resolver) = &self.sitemap {
            let urls = resolver.resolve(&origin_of(target)).await;
            if !urls.is_empty() {
                return urls;
            }
        }

        tracing::info!("Sitemap not found or empty. Crawling website...");
        let outcome = self.engine.run(target).await;
        let mut links = outcome.discovered;
        links.extend(outcome.visited.iter().map(Url::to_string));
        links
    }

    /// Runs every target and returns the records in input order
    pub async fn run(self: Arc<Self>, targets: Vec<String>) -> BatchReport {
        let total = targets.len();
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        tracing::info!(
            "Processing {} targets with {} worker(s)",
            total,
            self.workers
        );

        for (index, raw) in targets.iter().cloned().enumerate() {
            let runner = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, Vec::new(), Duration::ZERO);
                };

                tracing::info!("Processing site {}/{}: {}", index + 1, total, raw.trim());
                let site_started = Instant::now();
                let records = runner.process_target(&raw).await;
                (index, records, site_started.elapsed())
            });
        }

        let mut slots: Vec<Option<Vec<ContactRecord>>> = vec![None; total];
        let mut processed = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, records, elapsed)) => {
                    processed += 1;
                    tracing::info!(
                        "Time consumed for site {}: {:.2} seconds",
                        index + 1,
                        elapsed.as_secs_f64()
                    );

                    let average = started.elapsed().as_secs_f64() / processed as f64;
                    tracing::info!(
                        "Progress: {}/{} sites, estimated time to complete: {:.2} seconds",
                        processed,
                        total,
                        average * total as f64
                    );
                    slots[index] = Some(records);
                }
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        let records: Vec<ContactRecord> = slots
            .into_iter()
            .zip(targets.iter())
            .flat_map(|(slot, raw)| match slot {
                Some(records) if !records.is_empty() => records,
                _ => vec![ContactRecord::failed(
                    raw.trim(),
                    RecordError::Fetch("Target was not processed".to_string()),
                )],
            })
            .collect();

        let elapsed = started.elapsed();
        tracing::info!("Total time consumed: {:.2} seconds", elapsed.as_secs_f64());

        let stats = BatchStatistics::from_records(total, &records, elapsed);
        BatchReport { records, stats }
    }
}

/// Turns a crawl outcome into the record for `url`
pub fn record_from_outcome(url: &str, outcome: CrawlOutcome) -> ContactRecord {
    if !outcome.contacts.is_empty() {
        return ContactRecord::found(url, outcome.contacts.emails, outcome.contacts.phones);
    }

    let error = match (outcome.seed_error, outcome.stop_reason) {
        (Some(e), _) => RecordError::Fetch(e.to_string()),
        (None, StopReason::Cancelled) if outcome.pages_fetched == 0 => RecordError::Cancelled,
        _ => RecordError::NoContactInfo,
    };
    ContactRecord::failed(url, error)
}
