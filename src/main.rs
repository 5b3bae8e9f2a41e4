//! Contact Crawler main entry point
//!
//! This is the command-line interface for the contact-info crawler.

use anyhow::{bail, Context};
use clap::Parser;
use contact_crawler::config::{load_config_with_hash, Config};
use contact_crawler::crawler::{build_proxy_provider, probe_proxies, BatchRunner, CancelFlag};
use contact_crawler::input::{collect_urls, read_targets, write_url_list};
use contact_crawler::output::{print_statistics, CsvReportSink, ResultSink};
use contact_crawler::url::parse_target;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

const DEFAULT_OUTPUT_PATH: &str = "contact_info_results.csv";

/// Contact Crawler: harvests emails and phone numbers from websites
///
/// Reads target URLs from a CSV sheet, crawls each site (seeded from its
/// sitemap when there is one) and writes the contacts found to a CSV report.
#[derive(Parser, Debug)]
#[command(name = "contact-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Website contact-info crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Input sheet (CSV, one target URL per row); overrides [batch] input-path
    #[arg(short, long, value_name = "SHEET")]
    input: Option<PathBuf>,

    /// Output report (CSV); overrides [batch] output-path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Process at most this many targets
    #[arg(long, value_name = "N")]
    max_sites: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["list_links", "collect_urls", "test_proxies"])]
    dry_run: bool,

    /// Print every page URL of a site (sitemap first, crawl otherwise) and exit
    #[arg(long, value_name = "URL", conflicts_with_all = ["collect_urls", "test_proxies"])]
    list_links: Option<String>,

    /// Collect URL-looking cells of a sheet into a one-column CSV at --output
    #[arg(long, value_name = "SHEET", conflicts_with = "test_proxies")]
    collect_urls: Option<PathBuf>,

    /// Fetch the proxy list, check each proxy and report the working ones
    #[arg(long)]
    test_proxies: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            setup_logging(cli.verbose, cli.quiet, None)?;
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    setup_logging(cli.verbose, cli.quiet, config.logging.directory.as_deref())?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&cli, &config)
    } else if let Some(target) = cli.list_links.as_deref() {
        handle_list_links(&config, target).await
    } else if let Some(sheet) = cli.collect_urls.as_deref() {
        handle_collect_urls(sheet, cli.output.as_deref())
    } else if cli.test_proxies {
        handle_test_proxies(&config).await
    } else {
        handle_crawl(&cli, config).await
    }
}

/// Sets up console logging, plus a timestamped log file when `log_dir` is set
fn setup_logging(verbose: u8, quiet: bool, log_dir: Option<&str>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("contact_crawler=info,warn"),
            1 => EnvFilter::new("contact_crawler=debug,info"),
            2 => EnvFilter::new("contact_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory {}", dir))?;
            let name = format!(
                "logs_{}.log",
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            );
            let file = std::fs::File::create(Path::new(dir).join(&name))
                .with_context(|| format!("Cannot create log file {}", name))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .with(file_layer)
        .init();

    Ok(())
}

/// Resolves the input sheet, output report and target limit from flags and config
fn batch_paths(cli: &Cli, config: &Config) -> (Option<PathBuf>, PathBuf, Option<usize>) {
    let input = cli
        .input
        .clone()
        .or_else(|| config.batch.input_path.as_ref().map(PathBuf::from));
    let output = cli
        .output
        .clone()
        .or_else(|| config.batch.output_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));
    let max_sites = cli.max_sites.or(config.batch.max_sites);
    (input, output, max_sites)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    println!("=== Contact Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Max pages per run: {} (0 = unlimited)", config.crawler.max_pages_per_run);
    println!("  Max run seconds: {} (0 = unlimited)", config.crawler.max_run_seconds);
    println!("  Restrict emails: {}", config.crawler.restrict_emails);

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Max retries: {}", config.fetcher.max_retries);
    println!("  Proxy attempts: {}", config.fetcher.proxy_attempts);

    println!("\nProxy provider: {:?}", config.proxy.provider);
    println!(
        "Liveness provider: {:?} (fail-open: {})",
        config.liveness.provider, config.liveness.fail_open
    );
    println!(
        "Sitemap: {} (max documents: {})",
        if config.sitemap.enabled { "enabled" } else { "disabled" },
        config.sitemap.max_documents
    );

    let (input, output, max_sites) = batch_paths(cli, config);
    println!("\nOutput: {}", output.display());

    match input {
        Some(input) => {
            let targets = read_targets(&input, max_sites)?;
            let invalid = targets.iter().filter(|t| parse_target(t).is_err()).count();
            println!(
                "Input: {} ({} targets, {} invalid)",
                input.display(),
                targets.len(),
                invalid
            );
            for target in &targets {
                println!("  - {}", target);
            }
        }
        None => println!("Input: none given"),
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles --list-links: prints the site's URLs
async fn handle_list_links(config: &Config, target: &str) -> anyhow::Result<()> {
    let url = parse_target(target).with_context(|| format!("Invalid URL: {}", target))?;
    let runner = BatchRunner::from_config(config, install_ctrl_c())?;

    let links = runner.list_links(&url).await;
    for link in &links {
        println!("{}", link);
    }
    tracing::info!("Processing completed ({} URLs)", links.len());
    Ok(())
}

/// Handles --collect-urls: scans a sheet for URLs
fn handle_collect_urls(sheet: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let urls = collect_urls(sheet)?;

    println!("Collected URLs:");
    for url in &urls {
        println!("{}", url);
    }

    if let Some(output) = output {
        write_url_list(output, &urls)?;
        tracing::info!("Saved {} URLs to {}", urls.len(), output.display());
    }
    Ok(())
}

/// Handles --test-proxies: probes every proxy in the pool
async fn handle_test_proxies(config: &Config) -> anyhow::Result<()> {
    let Some(provider) = build_proxy_provider(&config.proxy, &config.fetcher)? else {
        bail!("Proxy provider is disabled; set [proxy] provider first");
    };

    let proxies = provider.list_proxies().await?;
    tracing::info!("Fetched {} proxies", proxies.len());

    let test_url = Url::parse(&config.proxy.test_url)?;
    let working = probe_proxies(
        &proxies,
        &config.fetcher,
        &test_url,
        Duration::from_secs(config.proxy.test_timeout_secs),
    )
    .await;

    tracing::info!("{} proxies are working", working.len());
    for proxy in &working {
        println!("{}", proxy);
    }
    Ok(())
}

/// Handles the main batch crawl
async fn handle_crawl(cli: &Cli, config: Config) -> anyhow::Result<()> {
    let (input, output, max_sites) = batch_paths(cli, &config);
    let Some(input) = input else {
        bail!("No input sheet given; pass --input or set [batch] input-path");
    };

    let targets = read_targets(&input, max_sites)?;
    if targets.is_empty() {
        tracing::warn!("No targets found in {}", input.display());
    }

    let runner = Arc::new(BatchRunner::from_config(&config, install_ctrl_c())?);
    let report = runner.run(targets).await;

    CsvReportSink::new(&output)
        .write_records(&report.records)
        .with_context(|| format!("Failed to write report to {}", output.display()))?;

    print_statistics(&report.stats);
    Ok(())
}

/// Returns a cancel flag raised by Ctrl-C
fn install_ctrl_c() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing current pages and writing the report");
            flag.cancel();
        }
    });
    cancel
}
