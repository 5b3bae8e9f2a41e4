//! Crawl engine: breadth-first traversal of a single site
//!
//! One engine run owns its frontier and visited set; nothing is shared
//! between runs. Fetches inside a run are strictly sequential.

use crate::config::CrawlerConfig;
use crate::crawler::contacts::{ContactExtractor, Contacts};
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::parser::extract_links;
use crate::url::{extract_domain, same_network_location, strip_fragment};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Ceilings for a single crawl run; `None` means unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlLimits {
    pub max_pages: Option<usize>,
    pub max_duration: Option<Duration>,
}

impl CrawlLimits {
    /// Zero in the configuration means no limit
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_pages: Some(config.max_pages_per_run).filter(|&pages| pages > 0),
            max_duration: Some(config.max_run_seconds)
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
        }
    }
}

/// Cooperative cancellation shared between the CLI and every running crawl
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Frontier drained
    Exhausted,
    PageBudget,
    TimeBudget,
    Cancelled,
}

/// A page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub url: Url,
    pub error: FetchError,
}

/// Aggregate result of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub seed: Url,
    pub contacts: Contacts,
    pub pages_fetched: usize,
    /// URLs in the order they were fetched
    pub visited: Vec<Url>,
    /// Every same-origin link seen, fetched or not
    pub discovered: BTreeSet<String>,
    pub failures: Vec<PageFailure>,
    /// Failure of the seed page itself, if any
    pub seed_error: Option<FetchError>,
    pub stop_reason: StopReason,
}

impl CrawlOutcome {
    fn new(seed: Url) -> Self {
        Self {
            seed,
            contacts: Contacts::default(),
            pages_fetched: 0,
            visited: Vec::new(),
            discovered: BTreeSet::new(),
            failures: Vec::new(),
            seed_error: None,
            stop_reason: StopReason::Exhausted,
        }
    }
}

/// Breadth-first same-origin crawler
pub struct CrawlEngine {
    fetcher: Arc<dyn PageFetcher>,
    extractor: ContactExtractor,
    limits: CrawlLimits,
    cancel: CancelFlag,
}

impl CrawlEngine {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: ContactExtractor,
        limits: CrawlLimits,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            limits,
            cancel,
        }
    }

    /// Crawls everything reachable from `seed` within its network location
    ///
    /// Page failures are recorded and the crawl moves on; this never fails
    /// as a whole.
    pub async fn run(&self, seed: &Url) -> CrawlOutcome {
        let seed = strip_fragment(seed);
        let mut outcome = CrawlOutcome::new(seed.clone());

        let mut frontier = VecDeque::from([seed.clone()]);
        let mut queued: HashSet<Url> = HashSet::from([seed.clone()]);
        let mut visited: HashSet<Url> = HashSet::new();
        // Network locations this run may extract from: the seed's, plus
        // wherever the seed itself redirects
        let mut scope: Vec<Url> = vec![seed.clone()];
        let started = Instant::now();

        tracing::info!("Starting crawl at {}", seed);

        loop {
            if self.cancel.is_cancelled() {
                outcome.stop_reason = StopReason::Cancelled;
                break;
            }

            let Some(url) = frontier.pop_front() else {
                outcome.stop_reason = StopReason::Exhausted;
                break;
            };
            queued.remove(&url);

            if visited.contains(&url) {
                continue;
            }

            if let Some(max_pages) = self.limits.max_pages {
                if outcome.pages_fetched >= max_pages {
                    tracing::warn!("Page budget ({}) reached for {}", max_pages, seed);
                    outcome.stop_reason = StopReason::PageBudget;
                    break;
                }
            }
            if let Some(max_duration) = self.limits.max_duration {
                if started.elapsed() >= max_duration {
                    tracing::warn!("Time budget ({:?}) reached for {}", max_duration, seed);
                    outcome.stop_reason = StopReason::TimeBudget;
                    break;
                }
            }

            visited.insert(url.clone());
            outcome.visited.push(url.clone());
            tracing::info!("Crawling URL: {}", url);

            let page = match self.fetcher.fetch(&url, false).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!("Error crawling {}: {}", url, e);
                    if url == seed {
                        outcome.seed_error = Some(e.clone());
                    }
                    outcome.failures.push(PageFailure { url, error: e });
                    continue;
                }
            };
            outcome.pages_fetched += 1;

            // A redirect target counts as visited too
            let final_url = strip_fragment(&page.url);
            if final_url != url {
                visited.insert(final_url.clone());
            }

            let in_scope = scope.iter().any(|s| same_network_location(s, &final_url));
            if url == seed && !in_scope {
                tracing::info!("Seed {} redirected to {}", seed, final_url);
                scope.push(final_url.clone());
            } else if !in_scope {
                tracing::info!("Skipping {}: redirected off-site to {}", url, final_url);
                continue;
            }

            if !page.is_textual() {
                tracing::debug!(
                    "Skipping non-textual content at {} ({})",
                    url,
                    page.content_type().unwrap_or("unknown")
                );
                continue;
            }

            let page_domain = extract_domain(&final_url).unwrap_or_default();
            outcome
                .contacts
                .merge(self.extractor.extract_contacts(&page.body, &page_domain));

            let mut links: Vec<Url> = extract_links(&page.body, &final_url).into_iter().collect();
            links.sort_by(|a, b| a.as_str().cmp(b.as_str()));

            for link in links {
                outcome.discovered.insert(link.to_string());
                if !visited.contains(&link) && queued.insert(link.clone()) {
                    frontier.push_back(link);
                }
            }

            if outcome.pages_fetched % 10 == 0 {
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {:.1}s elapsed",
                    outcome.pages_fetched,
                    frontier.len(),
                    started.elapsed().as_secs_f64()
                );
            }
        }

        tracing::info!(
            "Crawl completed with {} unique emails and {} unique phones found ({} pages, {:?})",
            outcome.contacts.emails.len(),
            outcome.contacts.phones.len(),
            outcome.pages_fetched,
            outcome.stop_reason
        );

        outcome
    }
}
