//! Persistent two-tier cache
//!
//! HTML pages and the claimed-URL set live in an embedded SQLite database;
//! image blobs live beside it as content-addressed JPEG files. Both tiers
//! survive across runs. HTML is freshness-gated on read, images are not.

mod images;
mod schema;
mod sqlite;

pub use images::ImageStore;
pub use sqlite::PageCache;

use crate::PetrelError;
use std::fs;
use std::path::Path;

/// Database filename under the cache directory
pub const CACHE_DB_NAME: &str = "crawler_cache.db";

/// Opens both cache tiers under `cache_dir`, creating the layout if needed
pub fn open_cache(cache_dir: &Path) -> Result<(PageCache, ImageStore), PetrelError> {
    fs::create_dir_all(cache_dir)?;
    let pages = PageCache::open(&cache_dir.join(CACHE_DB_NAME))?;
    let images = ImageStore::open(cache_dir)?;
    Ok((pages, images))
}
