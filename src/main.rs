//! Petrel main entry point
//!
//! Command-line interface for the petrel crawler. The binary loads a TOML
//! configuration, runs the crawl, attaches simple draining consumers to
//! both output streams, and prints a metrics summary on exit.

use clap::Parser;
use petrel::config::load_config;
use petrel::{Crawler, ImageRecord, TextRecord};
use std::path::PathBuf;
use tokio::sync::mpsc::Receiver;
use tracing_subscriber::EnvFilter;

/// Petrel: a concurrent, depth-bounded, polite web crawler
///
/// Petrel expands the configured seed set up to a depth bound, serializes
/// fetches per origin with adaptive delays, caches pages and images under
/// the cache directory, and streams extracted text and images to consumers.
#[derive(Parser, Debug)]
#[command(name = "petrel")]
#[command(version)]
#[command(about = "A polite, depth-bounded web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("loading configuration from {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let seeds = config.seed_urls()?;
    let (crawler, streams) = Crawler::new(&config)?;
    crawler.start(seeds);

    // The binary is the downstream consumer; the crawler core never reads
    // its own queues.
    let text_consumer = tokio::spawn(drain_text(streams.text));
    let image_consumer = tokio::spawn(drain_images(streams.images));

    tokio::select! {
        _ = crawler.wait() => {
            tracing::info!("crawl completed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
            crawler.stop().await;
        }
    }

    let snapshot = crawler.metrics();
    drop(crawler);

    let text_records = text_consumer.await.unwrap_or(0);
    let image_records = image_consumer.await.unwrap_or(0);

    println!("=== Crawl Summary ===\n");
    println!("  Pages crawled: {}", snapshot.pages_crawled);
    println!("  Bytes downloaded: {}", snapshot.bytes_downloaded);
    println!("  Cache hits: {}", snapshot.cache_hits);
    println!("  Successful requests: {}", snapshot.successful_requests);
    println!("  Failed requests: {}", snapshot.failed_requests);
    println!("  Success rate: {:.1}%", snapshot.success_rate * 100.0);
    println!("  Crawl rate: {:.2} pages/s", snapshot.crawl_rate);
    println!("  Elapsed: {:.1}s", snapshot.elapsed.as_secs_f64());
    println!("  Text records consumed: {}", text_records);
    println!("  Image records consumed: {}", image_records);

    if !snapshot.origin_stats.is_empty() {
        println!("\nOrigins:");
        let mut origins: Vec<_> = snapshot.origin_stats.iter().collect();
        origins.sort_by(|a, b| a.0.cmp(b.0));
        for (origin, stats) in origins {
            println!(
                "  {}: {} ok, {} errors",
                origin, stats.successes, stats.errors
            );
        }
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("petrel=info,warn"),
            1 => EnvFilter::new("petrel=debug,info"),
            2 => EnvFilter::new("petrel=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn drain_text(mut rx: Receiver<TextRecord>) -> u64 {
    let mut count = 0;
    while let Some(record) = rx.recv().await {
        count += 1;
        tracing::debug!(
            "text record from {} at depth {} ({} words)",
            record.url,
            record.depth,
            record.text.split_whitespace().count(),
        );
    }
    count
}

async fn drain_images(mut rx: Receiver<ImageRecord>) -> u64 {
    let mut count = 0;
    while let Some(record) = rx.recv().await {
        count += 1;
        tracing::debug!(
            "image record from {} at depth {} ({} bytes)",
            record.url,
            record.depth,
            record.bytes.len(),
        );
    }
    count
}
