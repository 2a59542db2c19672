//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest media crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_harvest::config::{load_config_with_hash, Config};
use sumi_harvest::crawler::{run_seeds, ChannelSink, Coordinator, Crawler, RunSummary};
use sumi_harvest::item::MediaItem;
use sumi_harvest::progress::print_statistics;
use sumi_harvest::storage::{MemoryStorage, ProgressStore};
use sumi_harvest::{HarvestError, Manager};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: a rate-limited media crawler
///
/// Sumi-Harvest walks albums, playlists and videos on supported hosts and
/// lists the direct media URLs it finds, together with the folder each file
/// belongs in. Downloading is left to the tool consuming that list.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A rate-limited media crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// URLs to harvest
    #[arg(value_name = "URL", required = true)]
    urls: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show which crawler would handle each URL
    #[arg(long, conflicts_with = "fresh")]
    dry_run: bool,

    /// Forget which items earlier runs completed
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(config, &cli.urls)
    } else {
        handle_harvest(config, &cli.urls, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and resolves every URL
fn handle_dry_run(config: Config, urls: &[String]) -> anyhow::Result<()> {
    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Rate limiting:");
    println!("  Global: {} requests/s", config.rate_limiting.rate_limit);
    println!("  Attempts: {}", config.rate_limiting.download_attempts);
    for domain in &config.rate_limiting.domains {
        println!(
            "  {}: {} per {}ms",
            domain.pattern, domain.capacity, domain.interval_ms
        );
    }

    println!("\nCrawler:");
    println!("  Max pages per listing: {}", config.crawler.max_pages);
    println!("  Concurrent seeds: {}", config.crawler.max_concurrent_seeds);
    println!("  Database: {}", config.storage.database_path);

    // Nothing is fetched, so an in-memory store keeps the database untouched
    let (sink, _media) = ChannelSink::new();
    let manager = Manager::with_storage(config, Arc::new(MemoryStorage::new()), Arc::new(sink))?;
    let coordinator = Coordinator::new(manager)?;

    println!("\nSeeds ({}):", urls.len());
    let mut supported = 0;
    for url in urls {
        match coordinator.resolve(url) {
            Ok((parsed, crawler)) => {
                supported += 1;
                println!("  * {} -> {}", parsed, crawler.name());
            }
            Err(e) => println!("  ! {} ({})", url, e),
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would harvest {} of {} URLs", supported, urls.len());

    Ok(())
}

/// Handles the main harvest
///
/// The database is closed whether the run succeeds or not; statistics are
/// printed in both cases.
async fn handle_harvest(config: Config, urls: &[String], fresh: bool) -> anyhow::Result<()> {
    let (sink, media) = ChannelSink::new();
    let drain = tokio::spawn(drain_media(media, config.output.media_list.clone()));

    let manager = Manager::open(config, Arc::new(sink)).context("failed to open database")?;

    let result: Result<RunSummary, HarvestError> = async {
        if fresh {
            tracing::info!("Starting fresh harvest (forgetting completed items)");
            manager.storage().clear()?;
        }
        run_seeds(Arc::clone(&manager), urls).await
    }
    .await;

    let closed = manager.close();
    let stats = manager.progress().snapshot();
    // Dropping the last manager handle closes the media channel
    drop(manager);
    let written = drain.await.context("media writer panicked")?;

    print_statistics(&stats);

    let summary = result.context("harvest aborted")?;
    closed.context("failed to close database")?;
    let written = written.context("failed to write media list")?;

    if !summary.skipped.is_empty() {
        tracing::warn!("{} URLs were not harvested (no matching crawler)", summary.skipped.len());
    }
    tracing::info!("Harvest completed successfully, {} media URLs listed", written);

    Ok(())
}

/// Prints every handed-off media item and appends it to the media list
async fn drain_media(
    mut media: UnboundedReceiver<MediaItem>,
    media_list: Option<String>,
) -> std::io::Result<u64> {
    let mut list = match media_list {
        Some(path) => Some(
            tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?,
        ),
        None => None,
    };

    let mut written = 0;
    while let Some(item) = media.recv().await {
        let name = item.custom_filename.as_deref().unwrap_or(&item.filename);
        let line = match item.origin.parent_title() {
            "" => format!("{}\t{}\n", item.url, name),
            folder => format!("{}\t{}/{}\n", item.url, folder, name),
        };

        print!("{}", line);
        if let Some(file) = list.as_mut() {
            file.write_all(line.as_bytes()).await?;
        }
        written += 1;
    }

    if let Some(file) = list.as_mut() {
        file.flush().await?;
    }

    Ok(written)
}
