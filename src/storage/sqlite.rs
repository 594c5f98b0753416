//! SQLite-backed page cache and visited set
//!
//! Every operation is a single short autocommit statement; the connection
//! mutex is never held across an await point.

use crate::storage::schema::initialize_schema;
use crate::PetrelError;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

/// Pages older than this are treated as cache misses
const FRESHNESS_HOURS: i64 = 24;

/// Durable store for fetched HTML and the claimed-URL set
pub struct PageCache {
    conn: Mutex<Connection>,
}

impl PageCache {
    /// Opens or creates the cache database at `path`
    pub fn open(path: &Path) -> Result<Self, PetrelError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for concurrent short writers
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory cache (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, PetrelError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Claims a URL for crawling
    ///
    /// Atomic against concurrent callers: exactly one call per URL inserts
    /// the row and returns true. The winner owns the fetch; losers must back
    /// off. A claim is never released, even if the fetch later fails.
    pub fn claim_visited(&self, url: &str) -> Result<bool, PetrelError> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO visited_urls (url, timestamp) VALUES (?1, ?2)",
            params![url, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    /// Loads every claimed URL, called once at startup to rehydrate the
    /// in-memory fast-path set
    pub fn load_visited(&self) -> Result<HashSet<String>, PetrelError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT url FROM visited_urls")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut visited = HashSet::new();
        for row in rows {
            visited.insert(row?);
        }
        Ok(visited)
    }

    /// Returns the stored HTML iff it was fetched less than 24 hours ago
    ///
    /// Stale entries are ignored but not deleted; rows with an unparseable
    /// timestamp count as stale.
    pub fn get_fresh_page(&self, url: &str) -> Result<Option<String>, PetrelError> {
        let conn = self.conn.lock().unwrap();
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT content, last_crawled FROM pages WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((content, last_crawled)) = row else {
            return Ok(None);
        };

        let fresh = DateTime::parse_from_rfc3339(&last_crawled)
            .map(|t| Utc::now() - t.with_timezone(&Utc) < Duration::hours(FRESHNESS_HOURS))
            .unwrap_or(false);

        Ok(fresh.then_some(content))
    }

    /// Upserts a page, stamping `last_crawled` with the current time
    pub fn put_page(&self, url: &str, html: &str) -> Result<(), PetrelError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO pages (url, content, last_crawled) VALUES (?1, ?2, ?3)",
            params![url, html, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_visited_first_wins() {
        let cache = PageCache::open_in_memory().unwrap();

        assert!(cache.claim_visited("https://example.com/a").unwrap());
        assert!(!cache.claim_visited("https://example.com/a").unwrap());
        assert!(cache.claim_visited("https://example.com/b").unwrap());
    }

    #[test]
    fn test_load_visited() {
        let cache = PageCache::open_in_memory().unwrap();
        cache.claim_visited("https://example.com/a").unwrap();
        cache.claim_visited("https://example.com/b").unwrap();

        let visited = cache.load_visited().unwrap();
        assert_eq!(visited.len(), 2);
        assert!(visited.contains("https://example.com/a"));
        assert!(visited.contains("https://example.com/b"));
    }

    #[test]
    fn test_load_visited_empty() {
        let cache = PageCache::open_in_memory().unwrap();
        assert!(cache.load_visited().unwrap().is_empty());
    }

    #[test]
    fn test_get_fresh_page_miss_when_absent() {
        let cache = PageCache::open_in_memory().unwrap();
        assert!(cache.get_fresh_page("https://example.com/").unwrap().is_none());
    }

    #[test]
    fn test_put_then_get_fresh() {
        let cache = PageCache::open_in_memory().unwrap();
        cache.put_page("https://example.com/", "<html>hi</html>").unwrap();

        let page = cache.get_fresh_page("https://example.com/").unwrap();
        assert_eq!(page.as_deref(), Some("<html>hi</html>"));
    }

    #[test]
    fn test_put_page_upsert_idempotent() {
        let cache = PageCache::open_in_memory().unwrap();
        cache.put_page("https://example.com/", "<html>v1</html>").unwrap();
        cache.put_page("https://example.com/", "<html>v2</html>").unwrap();

        let count: i64 = cache
            .conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let page = cache.get_fresh_page("https://example.com/").unwrap();
        assert_eq!(page.as_deref(), Some("<html>v2</html>"));
    }

    #[test]
    fn test_stale_page_misses() {
        let cache = PageCache::open_in_memory().unwrap();
        cache.put_page("https://example.com/", "<html>old</html>").unwrap();

        // Backdate the row past the freshness window
        let old = (Utc::now() - Duration::hours(25)).to_rfc3339();
        cache
            .conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE pages SET last_crawled = ?1 WHERE url = ?2",
                params![old, "https://example.com/"],
            )
            .unwrap();

        assert!(cache.get_fresh_page("https://example.com/").unwrap().is_none());
    }

    #[test]
    fn test_page_just_inside_window_is_fresh() {
        let cache = PageCache::open_in_memory().unwrap();
        cache.put_page("https://example.com/", "<html>hi</html>").unwrap();

        let recent = (Utc::now() - Duration::hours(23)).to_rfc3339();
        cache
            .conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE pages SET last_crawled = ?1 WHERE url = ?2",
                params![recent, "https://example.com/"],
            )
            .unwrap();

        assert!(cache.get_fresh_page("https://example.com/").unwrap().is_some());
    }

    #[test]
    fn test_unparseable_timestamp_is_stale() {
        let cache = PageCache::open_in_memory().unwrap();
        cache.put_page("https://example.com/", "<html>hi</html>").unwrap();
        cache
            .conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE pages SET last_crawled = 'garbage' WHERE url = ?1",
                params!["https://example.com/"],
            )
            .unwrap();

        assert!(cache.get_fresh_page("https://example.com/").unwrap().is_none());
    }

    #[test]
    fn test_refetch_refreshes_stale_entry() {
        let cache = PageCache::open_in_memory().unwrap();
        cache.put_page("https://example.com/", "<html>old</html>").unwrap();

        let old = (Utc::now() - Duration::hours(48)).to_rfc3339();
        cache
            .conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE pages SET last_crawled = ?1 WHERE url = ?2",
                params![old, "https://example.com/"],
            )
            .unwrap();
        assert!(cache.get_fresh_page("https://example.com/").unwrap().is_none());

        cache.put_page("https://example.com/", "<html>new</html>").unwrap();
        let page = cache.get_fresh_page("https://example.com/").unwrap();
        assert_eq!(page.as_deref(), Some("<html>new</html>"));
    }

    #[test]
    fn test_visited_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("crawler_cache.db");

        {
            let cache = PageCache::open(&db_path).unwrap();
            assert!(cache.claim_visited("https://example.com/seed").unwrap());
        }

        let cache = PageCache::open(&db_path).unwrap();
        let visited = cache.load_visited().unwrap();
        assert!(visited.contains("https://example.com/seed"));
        // Still claimed: the second run must not re-fetch
        assert!(!cache.claim_visited("https://example.com/seed").unwrap());
    }
}
