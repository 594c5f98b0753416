//! Core crawling logic
//!
//! This module contains the crawl machinery:
//! - HTTP fetching with content gating
//! - HTML parsing and extraction
//! - Per-origin serialization with adaptive pacing
//! - Frontier scheduling and the crawl lifecycle

mod coordinator;
mod fetcher;
mod governor;
mod parser;
mod scheduler;

pub use coordinator::{crawl, Crawler};
pub use fetcher::{build_http_client, fetch_image, fetch_page, ImageFetch, PageFetch};
pub use governor::{OriginGovernor, OriginHold};
pub use parser::{extract_image_refs, extract_links, extract_text, word_count};
