//! Database schema for the durable page cache

use rusqlite::Connection;

/// SQL schema for the cache database
pub const SCHEMA_SQL: &str = r#"
-- Fetched HTML, freshness-gated on read
CREATE TABLE IF NOT EXISTS pages (
    url TEXT PRIMARY KEY,
    content TEXT,
    last_crawled TIMESTAMP
);

-- URLs claimed for crawling; grows monotonically across runs
CREATE TABLE IF NOT EXISTS visited_urls (
    url TEXT PRIMARY KEY,
    timestamp TIMESTAMP
);
"#;

/// Creates all tables if they do not exist
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
