//! Circuit Scraper main entry point
//!
//! This is the command-line interface for the circuit scraper.

use anyhow::Context;
use circuit_scraper::config::{default_config, load_config_with_hash, Config};
use circuit_scraper::crawler::{build_orchestrator, BatchReport, Orchestrator, ScrapePipeline};
use circuit_scraper::output::{
    default_filename, print_summary, CsvSink, ExportError, JsonLinesSink, RecordSink,
};
use circuit_scraper::{validate_target_url, ScraperError, UrlPolicy};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Circuit Scraper: structured extraction of travel-package pages
///
/// Reads a list of circuit page URLs, scrapes them politely with a small
/// worker pool and writes one record (or one classified error) per URL.
#[derive(Parser, Debug)]
#[command(name = "circuit-scraper")]
#[command(version = "1.0.0")]
#[command(about = "Scrapes travel-package pages into structured records", long_about = None)]
struct Cli {
    /// Text file with one URL per line
    #[arg(value_name = "URLS")]
    urls: PathBuf,

    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the number of concurrent workers
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    concurrency: Option<u8>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Output file (stdout for JSON, a dated file name for CSV when omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Re-run the failed URLs once after the batch
    #[arg(long)]
    retry_errors: bool,

    /// Identity used for rate limiting
    #[arg(long, default_value = "cli")]
    caller: String,

    /// Validate config and URLs and show what would be scraped without fetching
    #[arg(long)]
    dry_run: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One JSON object per line
    Json,
    /// Spreadsheet CSV of the successful records
    Csv,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_configuration(cli.config.as_deref())?;
    if let Some(concurrency) = cli.concurrency {
        config.scraper.concurrency = usize::from(concurrency);
    }

    let urls = read_url_file(&cli.urls)?;
    tracing::info!("Loaded {} URLs from {}", urls.len(), cli.urls.display());

    if cli.dry_run {
        handle_dry_run(&config, &urls);
        return Ok(());
    }

    let orchestrator = Arc::new(build_orchestrator(&config)?);
    let report = handle_scrape(&cli, &orchestrator, urls).await?;
    write_results(&cli, &orchestrator, &report)?;
    print_summary(&report.summary);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("circuit_scraper=info,warn"),
            1 => EnvFilter::new("circuit_scraper=debug,info"),
            2 => EnvFilter::new("circuit_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(io::stderr)
        .init();
}

fn load_configuration(path: Option<&Path>) -> Result<Config, ScraperError> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((config, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    Ok(config)
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    Err(e.into())
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Ok(default_config()?)
        }
    }
}

/// Reads the URL list, skipping blanks, comments and lines too short to be a URL
fn read_url_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read URL list {}", path.display()))?;
    Ok(parse_url_list(&content))
}

fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter(|line| line.chars().count() > 10)
        .map(String::from)
        .collect()
}

/// Handles the --dry-run mode: validates config and every URL
fn handle_dry_run(config: &Config, urls: &[String]) {
    println!("=== Circuit Scraper Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Concurrency: {}", config.scraper.concurrency);
    println!("  Domain delay: {}ms", config.scraper.domain_delay_ms);
    println!("  Max batch size: {}", config.scraper.max_batch_size);

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!(
        "  Retries: {} (initial backoff {}ms)",
        config.fetch.max_retries, config.fetch.initial_backoff_ms
    );
    println!("  User agent: {}", config.fetch.user_agent);

    println!("\nCache:");
    println!(
        "  Enabled: {} (TTL {}s)",
        config.cache.enabled, config.cache.ttl_secs
    );

    println!(
        "\nRate limit: {} requests per {}s",
        config.rate_limit.limit, config.rate_limit.window_secs
    );

    println!(
        "\nAllowed Hosts ({}):",
        config.security.allowed_hosts.len()
    );
    for host in &config.security.allowed_hosts {
        println!("  - {}", host);
    }

    let policy = UrlPolicy::new(config.security.allowed_hosts.clone());
    let mut accepted = 0;
    println!("\nURLs ({}):", urls.len());
    for url in urls {
        match validate_target_url(url, &policy) {
            Ok(_) => {
                accepted += 1;
                println!("  ✓ {}", url);
            }
            Err(e) => println!("  ✗ {} ({})", url, e),
        }
    }

    println!("\n✓ Configuration is valid");
    if urls.len() > config.scraper.max_batch_size {
        println!(
            "✗ Batch of {} URLs exceeds the maximum of {}",
            urls.len(),
            config.scraper.max_batch_size
        );
    } else {
        println!("✓ Would scrape {} of {} URLs", accepted, urls.len());
    }
}

/// Handles the main scrape: one batch, plus an optional retry of the failures
async fn handle_scrape(
    cli: &Cli,
    orchestrator: &Arc<Orchestrator<ScrapePipeline>>,
    urls: Vec<String>,
) -> Result<BatchReport, ScraperError> {
    let token = CancellationToken::new();

    let signal_token = token.clone();
    let signal_orchestrator = Arc::clone(orchestrator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests");
            signal_token.cancel();
            signal_orchestrator.cancel();
        }
    });

    orchestrator.check_rate_limit(&cli.caller)?;
    let mut report = orchestrator.run_batch_with_token(urls, token.clone()).await?;

    if cli.retry_errors && report.summary.errors > 0 && !token.is_cancelled() {
        tracing::info!(
            "Retrying {} failed URLs",
            report.summary.errors
        );
        report = orchestrator.retry_errors(&cli.caller).await?;
    }

    Ok(report)
}

fn write_results(
    cli: &Cli,
    orchestrator: &Orchestrator<ScrapePipeline>,
    report: &BatchReport,
) -> Result<(), ScraperError> {
    let outcomes: Vec<_> = report.outcomes().collect();

    let written = match cli.format {
        Format::Json => match &cli.output {
            Some(path) => JsonLinesSink::new(BufWriter::new(File::create(path)?))
                .write_outcomes(&outcomes)?,
            None => JsonLinesSink::new(io::stdout().lock()).write_outcomes(&outcomes)?,
        },
        Format::Csv => {
            orchestrator.check_export_limit(&cli.caller)?;

            let path = cli.output.clone().unwrap_or_else(|| {
                PathBuf::from(default_filename(chrono::Local::now().date_naive()))
            });
            let mut sink = CsvSink::new(BufWriter::new(File::create(&path)?));
            match sink.write_outcomes(&outcomes) {
                Ok(written) => {
                    tracing::info!("Wrote {} records to {}", written, path.display());
                    written
                }
                Err(ExportError::Empty) => {
                    tracing::warn!("No successful records to export");
                    0
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    tracing::debug!("Wrote {} outcomes", written);
    io::stdout().flush()?;
    Ok(())
}
