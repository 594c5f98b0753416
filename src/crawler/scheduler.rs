//! Frontier scheduling
//!
//! The frontier owns the in-flight task set and everything a task touches:
//! the cache, the governor, the output pipeline, and the metrics. Tasks are
//! fire-and-forget; the run loop only observes completions, never errors.
//! Every admission decision (running flag, depth bound, visited set,
//! capacity) happens synchronously at schedule time.

use crate::crawler::fetcher::{self, ImageFetch, PageFetch};
use crate::crawler::governor::OriginGovernor;
use crate::crawler::parser;
use crate::metrics::CrawlMetrics;
use crate::output::{ImageRecord, OutputPipeline, TextRecord};
use crate::storage::{ImageStore, PageCache};
use crate::url::Origin;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Minimum word count for an emitted text record
const MIN_TEXT_WORDS: usize = 51;

/// How long the run loop waits for a task completion before re-checking
const COMPLETION_POLL: Duration = Duration::from_secs(1);

/// Grace period for in-flight tasks to unwind after cancellation
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared crawl state and task spawner
pub(crate) struct Frontier {
    max_depth: u32,
    max_concurrent: usize,
    running: AtomicBool,
    cancel: CancellationToken,
    finished: CancellationToken,
    /// Mirror of the durable visited set, checked without touching SQLite.
    /// Each entry remembers the depth it was claimed at so links recovered
    /// from cached pages keep honoring the depth bound.
    visited_fast: Mutex<HashMap<String, u32>>,
    in_flight: Mutex<usize>,
    done_tx: UnboundedSender<()>,
    client: Client,
    governor: OriginGovernor,
    pages: PageCache,
    images: ImageStore,
    pipeline: OutputPipeline,
    metrics: Arc<CrawlMetrics>,
}

impl Frontier {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        max_depth: u32,
        max_concurrent: usize,
        visited: HashSet<String>,
        client: Client,
        governor: OriginGovernor,
        pages: PageCache,
        images: ImageStore,
        pipeline: OutputPipeline,
        metrics: Arc<CrawlMetrics>,
    ) -> (Arc<Self>, UnboundedReceiver<()>) {
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        // Rehydrated URLs carry no depth information; treating them as
        // depth 0 lets their cached links expand like seed links do.
        let visited_fast = visited.into_iter().map(|url| (url, 0)).collect();

        let frontier = Arc::new(Self {
            max_depth,
            max_concurrent,
            running: AtomicBool::new(true),
            cancel: CancellationToken::new(),
            finished: CancellationToken::new(),
            visited_fast: Mutex::new(visited_fast),
            in_flight: Mutex::new(0),
            done_tx,
            client,
            governor,
            pages,
            images,
            pipeline,
            metrics,
        });

        (frontier, done_rx)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.cancel.is_cancelled()
    }

    /// Asks the run loop to wind down; it cancels in-flight tasks itself
    pub(crate) fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Token that resolves once the run loop has fully exited
    pub(crate) fn finished_token(&self) -> CancellationToken {
        self.finished.clone()
    }

    pub(crate) fn governor(&self) -> &OriginGovernor {
        &self.governor
    }

    pub(crate) fn in_flight_count(&self) -> usize {
        *self.in_flight.lock().unwrap()
    }

    /// Admits a URL into the frontier, or drops it silently
    ///
    /// Dropped when: the crawl is stopping, the depth bound is exceeded, the
    /// URL was already claimed, or the in-flight set is at capacity. A
    /// capacity drop is not a loss: the parent page is cached, and the run
    /// loop re-extracts its links once tasks complete.
    pub(crate) fn schedule(self: &Arc<Self>, url: Url, depth: u32) -> bool {
        if !self.is_running() || depth > self.max_depth {
            return false;
        }

        if self.visited_fast.lock().unwrap().contains_key(url.as_str()) {
            return false;
        }

        {
            let mut in_flight = self.in_flight.lock().unwrap();
            if *in_flight >= self.max_concurrent {
                tracing::trace!("at capacity, dropping {}", url);
                return false;
            }
            *in_flight += 1;
        }

        let frontier = Arc::clone(self);
        tokio::spawn(async move {
            let cancel = frontier.cancel.clone();
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = frontier.process(&url, depth) => {}
            }

            {
                let mut in_flight = frontier.in_flight.lock().unwrap();
                *in_flight -= 1;
            }
            let _ = frontier.done_tx.send(());
        });

        true
    }

    /// Runs the crawl to completion: schedules seeds, then keeps the
    /// in-flight set topped up until it drains or a stop is requested
    pub(crate) async fn run(self: Arc<Self>, seeds: Vec<Url>, mut done_rx: UnboundedReceiver<()>) {
        for seed in seeds {
            self.schedule(seed, 0);
        }

        loop {
            if !self.is_running() {
                break;
            }

            let completion = tokio::time::timeout(COMPLETION_POLL, done_rx.recv()).await;
            let completed = matches!(completion, Ok(Some(())));
            if completed {
                // Coalesce a burst of completions into one wake
                while done_rx.try_recv().is_ok() {}
            }

            if !self.is_running() {
                break;
            }

            if completed || self.in_flight_count() == 0 {
                self.refill_from_cache();
            }

            let in_flight = self.in_flight_count();
            if in_flight == 0 {
                break;
            }
            if completed {
                self.log_progress(in_flight);
            }
        }

        self.shutdown(&mut done_rx).await;
        self.finished.cancel();
    }

    /// One crawl task: claim, cache check, fetch, extract, emit, expand
    ///
    /// This is an error firewall. Nothing propagates out; failures are
    /// logged and counted, and the task returns cleanly.
    async fn process(self: &Arc<Self>, url: &Url, depth: u32) {
        let origin = Origin::of(url);
        let hold = self.governor.acquire(&origin).await;

        // The durable claim decides ownership; the fast-path set only
        // pre-filters. A claimed URL stays claimed even if the fetch fails.
        match self.pages.claim_visited(url.as_str()) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => tracing::warn!("visited claim failed for {}: {}", url, e),
        }
        self.visited_fast
            .lock()
            .unwrap()
            .insert(url.to_string(), depth);

        tracing::info!("crawling {} at depth {}", url, depth);

        match self.pages.get_fresh_page(url.as_str()) {
            Ok(Some(html)) => {
                self.metrics.record_cache_hit();
                drop(hold);
                self.emit_text(url, &html, depth);
                self.expand(url, &html, depth);
                return;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("cache read failed for {}: {}", url, e),
        }

        let body = match fetcher::fetch_page(&self.client, url.as_str()).await {
            PageFetch::Success { body, byte_count } => {
                self.governor.record(&origin, true);
                self.metrics.record_fetch_success(byte_count);
                body
            }
            PageFetch::Status(code) => {
                self.governor.record(&origin, false);
                self.metrics.record_fetch_failure();
                tracing::warn!("{} returned status {}", url, code);
                return;
            }
            PageFetch::Transport(reason) => {
                self.governor.record(&origin, false);
                self.metrics.record_fetch_failure();
                tracing::warn!("network error fetching {}: {}", url, reason);
                return;
            }
            PageFetch::ContentType(content_type) => {
                tracing::debug!("skipping {} with content type {:?}", url, content_type);
                return;
            }
        };

        if let Err(e) = self.pages.put_page(url.as_str(), &body) {
            tracing::warn!("cache write failed for {}: {}", url, e);
        }

        self.emit_text(url, &body, depth);
        self.process_images(url, &body, depth).await;
        drop(hold);
        self.expand(url, &body, depth);
    }

    fn emit_text(&self, url: &Url, html: &str, depth: u32) {
        let text = parser::extract_text(html);
        if parser::word_count(&text) >= MIN_TEXT_WORDS {
            self.pipeline.publish_text(TextRecord {
                url: url.clone(),
                text,
                depth,
            });
        }
    }

    /// Fetches and caches every image referenced by a page
    ///
    /// Image failures never count against the origin; a broken image is
    /// skipped, the page processing continues.
    async fn process_images(&self, page_url: &Url, html: &str, depth: u32) {
        for image_url in parser::extract_image_refs(html, page_url) {
            if !self.is_running() {
                return;
            }

            let digest = ImageStore::digest(image_url.as_str());
            let bytes = match self.images.get(&digest) {
                Ok(Some(bytes)) => {
                    self.metrics.record_cache_hit();
                    bytes
                }
                Ok(None) => {
                    match fetcher::fetch_image(&self.client, image_url.as_str()).await {
                        ImageFetch::Success(raw) => match self.images.put(&digest, &raw) {
                            Ok(jpeg) => jpeg,
                            Err(e) => {
                                tracing::debug!("discarding image {}: {}", image_url, e);
                                continue;
                            }
                        },
                        ImageFetch::Status(code) => {
                            tracing::debug!("image {} returned status {}", image_url, code);
                            continue;
                        }
                        ImageFetch::Transport(reason) => {
                            tracing::debug!("image fetch failed for {}: {}", image_url, reason);
                            continue;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("image cache read failed for {}: {}", image_url, e);
                    continue;
                }
            };

            self.pipeline.publish_image(ImageRecord {
                url: image_url,
                bytes,
                depth,
            });
        }
    }

    fn expand(self: &Arc<Self>, page_url: &Url, html: &str, depth: u32) {
        for link in parser::extract_links(html, page_url) {
            self.schedule(link, depth + 1);
        }
    }

    /// Re-extracts links from cached pages to top the in-flight set back up
    ///
    /// Recovers links that were dropped at capacity. Walks a snapshot of the
    /// visited set and stops as soon as capacity is filled, so one wake does
    /// bounded work. Recovered links enter one hop below the page they came
    /// from, the same as links scheduled directly.
    fn refill_from_cache(self: &Arc<Self>) -> usize {
        if !self.is_running() || self.in_flight_count() >= self.max_concurrent {
            return 0;
        }

        let snapshot: Vec<(String, u32)> = {
            let visited = self.visited_fast.lock().unwrap();
            visited.iter().map(|(url, depth)| (url.clone(), *depth)).collect()
        };

        let mut scheduled = 0;
        'pages: for (visited_url, page_depth) in snapshot {
            if page_depth >= self.max_depth {
                continue;
            }
            let html = match self.pages.get_fresh_page(&visited_url) {
                Ok(Some(html)) => html,
                Ok(None) => continue,
                Err(_) => continue,
            };
            let Ok(base) = Url::parse(&visited_url) else {
                continue;
            };

            for link in parser::extract_links(&html, &base) {
                if self.schedule(link, page_depth + 1) {
                    scheduled += 1;
                }
                if self.in_flight_count() >= self.max_concurrent {
                    break 'pages;
                }
            }
        }

        if scheduled > 0 {
            tracing::debug!("rescheduled {} links from cached pages", scheduled);
        }
        scheduled
    }

    /// Cancels whatever is still in flight and waits briefly for it to unwind
    async fn shutdown(&self, done_rx: &mut UnboundedReceiver<()>) {
        self.running.store(false, Ordering::SeqCst);
        self.cancel.cancel();

        let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
        loop {
            let remaining = self.in_flight_count();
            if remaining == 0 {
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!("timed out waiting for {} tasks to unwind", remaining);
                return;
            }
            let _ = tokio::time::timeout_at(deadline, done_rx.recv()).await;
        }
    }

    fn log_progress(&self, in_flight: usize) {
        let snap = self.metrics.snapshot();
        tracing::info!(
            "active tasks: {}, pages crawled: {}, crawl rate: {:.2} pages/s, success rate: {:.1}%",
            in_flight,
            snap.pages_crawled,
            snap.crawl_rate,
            snap.success_rate * 100.0,
        );
    }
}
