use serde::Deserialize;
use std::path::PathBuf;

/// Hard ceiling on the in-flight cap, however large the machine
const MAX_CONCURRENT_CEILING: usize = 50;

/// Text queue slots per gigabyte of memory
const TEXT_QUEUE_PER_GB: f64 = 1000.0;

/// Image queue slots per gigabyte of memory
const IMAGE_QUEUE_PER_GB: f64 = 500.0;

/// Main configuration structure for petrel
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub seeds: SeedConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum hop distance from any seed
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// In-flight task cap; sized from the machine when omitted
    #[serde(rename = "max-concurrent", default)]
    pub max_concurrent: Option<u32>,

    /// Root directory for the persistent cache
    #[serde(rename = "cache-dir", default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

/// Seed URL list
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    pub urls: Vec<String>,
}

/// Machine-resolved runtime limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLimits {
    pub max_concurrent: usize,
    pub text_queue_capacity: usize,
    pub image_queue_capacity: usize,
}

fn default_max_depth() -> u32 {
    10
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./crawler_cache")
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_concurrent: None,
            cache_dir: default_cache_dir(),
        }
    }
}

impl CrawlerConfig {
    /// Resolves the in-flight cap and queue capacities against the machine
    ///
    /// The auto-sized cap is `min(2·cpus, 2·mem_gb, 50)`; queue capacities
    /// scale with memory so a larger machine buffers more records before
    /// the drop policy kicks in.
    pub fn resolve_limits(&self) -> ResolvedLimits {
        let mem_gb = detected_memory_gb();

        let max_concurrent = match self.max_concurrent {
            Some(n) => n as usize,
            None => auto_concurrency(num_cpus::get(), mem_gb),
        };

        ResolvedLimits {
            max_concurrent: max_concurrent.max(1),
            text_queue_capacity: ((TEXT_QUEUE_PER_GB * mem_gb) as usize).max(1),
            image_queue_capacity: ((IMAGE_QUEUE_PER_GB * mem_gb) as usize).max(1),
        }
    }
}

fn auto_concurrency(cpus: usize, mem_gb: f64) -> usize {
    let by_cpu = cpus * 2;
    let by_memory = (mem_gb * 2.0) as usize;
    by_cpu.min(by_memory).min(MAX_CONCURRENT_CEILING).max(1)
}

fn detected_memory_gb() -> f64 {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    let gb = system.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0);
    if gb > 0.0 {
        gb
    } else {
        1.0
    }
}
