use serde::Deserialize;

/// Browser-like identity sent on every request; some sites reject default clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_PROXYSCRAPE_ENDPOINT: &str = "https://api.proxyscrape.com/v2/?request=getproxies&protocol=http&timeout=10000&country=all&ssl=all&anonymity=all";

pub const DEFAULT_SITERELIC_ENDPOINT: &str = "https://api.siterelic.com/up";

pub const DEFAULT_UPTIMEROBOT_ENDPOINT: &str = "https://api.uptimerobot.com/v2/getMonitors";

/// Main configuration structure for Contact Crawler
///
/// Built once per batch run and never mutated afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub liveness: LivenessConfig,
    #[serde(default)]
    pub sitemap: SitemapConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched by a single crawl run; 0 for no limit
    #[serde(rename = "max-pages-per-run", default = "default_max_pages_per_run")]
    pub max_pages_per_run: usize,

    /// Wall-clock budget for a single crawl run, in seconds; 0 for no limit
    #[serde(rename = "max-run-seconds", default = "default_max_run_seconds")]
    pub max_run_seconds: u64,

    /// Number of input targets processed concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Keep only emails on the page's own domain or a well-known public provider
    #[serde(rename = "restrict-emails", default = "default_true")]
    pub restrict_emails: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages_per_run: default_max_pages_per_run(),
            max_run_seconds: default_max_run_seconds(),
            workers: default_workers(),
            restrict_emails: true,
        }
    }
}

/// HTTP fetching configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Direct retries on transport errors and 5xx responses
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff between attempts (milliseconds)
    #[serde(rename = "backoff-ms", default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Number of distinct proxies tried before giving up
    #[serde(rename = "proxy-attempts", default = "default_proxy_attempts")]
    pub proxy_attempts: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            proxy_attempts: default_proxy_attempts(),
        }
    }
}

/// Where proxy endpoints come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxySource {
    /// ProxyScrape-style HTTP listing of `host:port` lines
    Proxyscrape,
    /// The `proxies` list from this file
    Static,
    /// Proxy fallback disabled
    None,
}

/// Proxy pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_proxy_source")]
    pub provider: ProxySource,

    #[serde(default = "default_proxyscrape_endpoint")]
    pub endpoint: String,

    /// Falls back to `PROXYSCRAPE_API_KEY` when empty
    #[serde(rename = "api-key", default)]
    pub api_key: String,

    /// Static `host:port` entries, used with `provider = "static"`
    #[serde(default)]
    pub proxies: Vec<String>,

    /// Reuse a fetched proxy list for this many seconds (fresh on every call if absent)
    #[serde(rename = "cache-ttl-secs", default)]
    pub cache_ttl_secs: Option<u64>,

    /// Target used by `--test-proxies`
    #[serde(rename = "test-url", default = "default_proxy_test_url")]
    pub test_url: String,

    #[serde(rename = "test-timeout-secs", default = "default_proxy_test_timeout")]
    pub test_timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            provider: default_proxy_source(),
            endpoint: default_proxyscrape_endpoint(),
            api_key: String::new(),
            proxies: Vec::new(),
            cache_ttl_secs: None,
            test_url: default_proxy_test_url(),
            test_timeout_secs: default_proxy_test_timeout(),
        }
    }
}

/// Which uptime service answers the "is this site down?" question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivenessProvider {
    Siterelic,
    Uptimerobot,
    /// Every site is treated as up
    None,
}

/// Liveness gate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LivenessConfig {
    #[serde(default = "default_liveness_provider")]
    pub provider: LivenessProvider,

    /// Overrides the provider's default API endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Falls back to `SITERELIC_API_KEY` / `UPTIMEROBOT_API_KEY` when empty
    #[serde(rename = "api-key", default)]
    pub api_key: String,

    /// Treat a site as up when the provider itself fails
    #[serde(rename = "fail-open", default = "default_true")]
    pub fail_open: bool,

    /// Also check every sitemap-derived URL before crawling it
    #[serde(rename = "check-sitemap-urls", default = "default_true")]
    pub check_sitemap_urls: bool,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            provider: default_liveness_provider(),
            endpoint: None,
            api_key: String::new(),
            fail_open: true,
            check_sitemap_urls: true,
        }
    }
}

impl LivenessConfig {
    /// Returns the configured endpoint or the provider's default
    pub fn effective_endpoint(&self) -> &str {
        match (&self.endpoint, self.provider) {
            (Some(endpoint), _) => endpoint,
            (None, LivenessProvider::Siterelic) => DEFAULT_SITERELIC_ENDPOINT,
            (None, LivenessProvider::Uptimerobot) => DEFAULT_UPTIMEROBOT_ENDPOINT,
            (None, LivenessProvider::None) => "",
        }
    }
}

/// Sitemap seeding configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SitemapConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Upper bound on sitemap documents fetched per site (index + children)
    #[serde(rename = "max-documents", default = "default_max_sitemap_documents")]
    pub max_documents: usize,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_documents: default_max_sitemap_documents(),
        }
    }
}

/// Batch input/output defaults; command-line flags take precedence
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchConfig {
    #[serde(rename = "input-path", default)]
    pub input_path: Option<String>,

    #[serde(rename = "output-path", default)]
    pub output_path: Option<String>,

    #[serde(rename = "max-sites", default)]
    pub max_sites: Option<usize>,
}

/// Log file configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Directory receiving `logs_<timestamp>.log`; console only if absent
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_max_pages_per_run() -> usize {
    500
}

fn default_max_run_seconds() -> u64 {
    600
}

fn default_workers() -> usize {
    1
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_proxy_attempts() -> u32 {
    3
}

fn default_proxy_source() -> ProxySource {
    ProxySource::None
}

fn default_proxyscrape_endpoint() -> String {
    DEFAULT_PROXYSCRAPE_ENDPOINT.to_string()
}

fn default_proxy_test_url() -> String {
    "http://www.google.com".to_string()
}

fn default_proxy_test_timeout() -> u64 {
    5
}

fn default_liveness_provider() -> LivenessProvider {
    LivenessProvider::None
}

fn default_max_sitemap_documents() -> usize {
    10
}
