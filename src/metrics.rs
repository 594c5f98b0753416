//! Crawl counters and derived rates
//!
//! Counters are monotonic atomics bumped from task context without locks;
//! a snapshot is cheap and can be taken at any time while the crawl runs.

use crate::state::OriginStats;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live counters for one crawl
#[derive(Debug)]
pub struct CrawlMetrics {
    pages_crawled: AtomicU64,
    bytes_downloaded: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    cache_hits: AtomicU64,
    started_at: Instant,
}

/// Point-in-time view of the crawl, including derived rates
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub pages_crawled: u64,
    pub bytes_downloaded: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub cache_hits: u64,
    pub elapsed: Duration,
    /// Pages per second since the crawl started
    pub crawl_rate: f64,
    /// successful / (successful + failed); zero when nothing was attempted
    pub success_rate: f64,
    /// Per-origin success/error counters for this run
    pub origin_stats: HashMap<String, OriginStats>,
}

impl CrawlMetrics {
    pub fn new() -> Self {
        Self {
            pages_crawled: AtomicU64::new(0),
            bytes_downloaded: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Records a successful page fetch and its decoded size
    pub fn record_fetch_success(&self, bytes: usize) {
        self.pages_crawled.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded
            .fetch_add(bytes as u64, Ordering::Relaxed);
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a transport or status failure
    pub fn record_fetch_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a fresh hit in either cache tier
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a snapshot; `origin_stats` starts empty and is filled by the
    /// lifecycle handle, which owns the governor
    pub fn snapshot(&self) -> MetricsSnapshot {
        let pages_crawled = self.pages_crawled.load(Ordering::Relaxed);
        let successful = self.successful_requests.load(Ordering::Relaxed);
        let failed = self.failed_requests.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed();

        let crawl_rate = if elapsed.as_secs_f64() > 0.0 {
            pages_crawled as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let success_rate = if successful + failed > 0 {
            successful as f64 / (successful + failed) as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            pages_crawled,
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            successful_requests: successful,
            failed_requests: failed,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            elapsed,
            crawl_rate,
            success_rate,
            origin_stats: HashMap::new(),
        }
    }
}

impl Default for CrawlMetrics {
    fn default() -> Self {
        Self::new()
    }
}
