//! Crawl lifecycle handle
//!
//! `Crawler` wires the cache, HTTP client, governor, pipeline, and metrics
//! together and owns the scheduler loop. All state lives behind one handle;
//! there are no process-wide singletons.

use crate::config::Config;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::governor::OriginGovernor;
use crate::crawler::scheduler::Frontier;
use crate::metrics::{CrawlMetrics, MetricsSnapshot};
use crate::output::{OutputPipeline, OutputStreams};
use crate::storage::open_cache;
use crate::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use url::Url;

/// Hard deadline for `stop()` before the scheduler task is aborted
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to one crawl: construction opens the cache, `start` spawns the
/// scheduler, `stop` winds it down
pub struct Crawler {
    frontier: Arc<Frontier>,
    metrics: Arc<CrawlMetrics>,
    done_rx: Mutex<Option<UnboundedReceiver<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Crawler {
    /// Builds a crawler from configuration
    ///
    /// Opens (or creates) the durable cache under the configured directory,
    /// rehydrates the visited set, and sizes the in-flight cap and queue
    /// capacities from the machine when not given explicitly. Returns the
    /// handle together with the consumer ends of both output streams.
    pub fn new(config: &Config) -> Result<(Self, OutputStreams)> {
        let limits = config.crawler.resolve_limits();

        let (pages, images) = open_cache(&config.crawler.cache_dir)?;
        let visited = pages.load_visited()?;
        tracing::info!("loaded {} visited URLs from cache", visited.len());

        let client = build_http_client()?;
        let metrics = Arc::new(CrawlMetrics::new());
        let (pipeline, streams) =
            OutputPipeline::bounded(limits.text_queue_capacity, limits.image_queue_capacity);

        let (frontier, done_rx) = Frontier::new(
            config.crawler.max_depth,
            limits.max_concurrent,
            visited,
            client,
            OriginGovernor::new(),
            pages,
            images,
            pipeline,
            Arc::clone(&metrics),
        );

        tracing::info!(
            "crawler initialized: max_depth={}, max_concurrent={}",
            config.crawler.max_depth,
            limits.max_concurrent,
        );

        Ok((
            Self {
                frontier,
                metrics,
                done_rx: Mutex::new(Some(done_rx)),
                handle: Mutex::new(None),
            },
            streams,
        ))
    }

    /// Spawns the scheduler loop over the given seeds
    ///
    /// A crawler starts at most once; repeated calls are ignored.
    pub fn start(&self, seeds: Vec<Url>) {
        let Some(done_rx) = self.done_rx.lock().unwrap().take() else {
            tracing::warn!("crawler already started");
            return;
        };

        tracing::info!("starting crawl with {} seed URLs", seeds.len());
        let frontier = Arc::clone(&self.frontier);
        let handle = tokio::spawn(frontier.run(seeds, done_rx));
        *self.handle.lock().unwrap() = Some(handle);
    }

    /// Resolves when the scheduler loop has exited (frontier drained or
    /// stop requested); returns immediately if the crawl never started
    pub async fn wait(&self) {
        if self.handle.lock().unwrap().is_none() {
            return;
        }
        self.frontier.finished_token().cancelled().await;
    }

    /// Requests a graceful stop and waits for the scheduler to exit,
    /// aborting it outright after a hard timeout
    pub async fn stop(&self) {
        tracing::info!("stopping crawler");
        self.frontier.request_stop();

        let started = self.handle.lock().unwrap().is_some();
        if started {
            let finished = self.frontier.finished_token();
            if tokio::time::timeout(STOP_TIMEOUT, finished.cancelled())
                .await
                .is_err()
            {
                tracing::warn!("crawler did not stop within {:?}, aborting", STOP_TIMEOUT);
                if let Some(handle) = self.handle.lock().unwrap().take() {
                    handle.abort();
                }
            }
        }
        tracing::info!("crawler stopped");
    }

    /// Whether the scheduler is still admitting work
    pub fn is_running(&self) -> bool {
        self.frontier.is_running()
    }

    /// Point-in-time metrics, including per-origin counters
    pub fn metrics(&self) -> MetricsSnapshot {
        let mut snapshot = self.metrics.snapshot();
        snapshot.origin_stats = self.frontier.governor().stats_snapshot();
        snapshot
    }
}

/// Runs a crawl over the configured seeds to completion and returns the
/// final metrics
///
/// Output records are not consumed here; with no reader attached the
/// bounded queues fill and further records are dropped, which makes this
/// entry point suitable for cache-warming runs.
pub async fn crawl(config: &Config) -> Result<MetricsSnapshot> {
    let seeds = config.seed_urls()?;
    let (crawler, _streams) = Crawler::new(config)?;
    crawler.start(seeds);
    crawler.wait().await;
    Ok(crawler.metrics())
}
