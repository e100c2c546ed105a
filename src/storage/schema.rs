//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the linkrot database.
//! Timestamps are stored as epoch seconds so retention and queue comparisons
//! stay plain integer arithmetic.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every URL the crawler has seen, internal or external
CREATE TABLE IF NOT EXISTS urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    external INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    last_crawled INTEGER,
    needs_crawl INTEGER,
    http_code INTEGER NOT NULL DEFAULT 0,
    http_message TEXT,
    mime_type TEXT,
    title TEXT,
    file_size INTEGER,
    download_duration REAL,
    redirect TEXT,
    course_id INTEGER,
    context_id INTEGER,
    cm_id INTEGER,
    ignored_user_id INTEGER,
    ignored_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_urls_url ON urls(url);
CREATE INDEX IF NOT EXISTS idx_urls_queue ON urls(external, needs_crawl);
CREATE INDEX IF NOT EXISTS idx_urls_last_crawled ON urls(last_crawled);
CREATE INDEX IF NOT EXISTS idx_urls_course ON urls(course_id);

-- Directed links between recorded URLs
CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_url_id INTEGER NOT NULL REFERENCES urls(id),
    to_url_id INTEGER NOT NULL REFERENCES urls(id),
    created_at INTEGER NOT NULL,
    UNIQUE(from_url_id, to_url_id)
);

CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_url_id);
CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_url_id);

-- One row per crawl cycle
CREATE TABLE IF NOT EXISTS crawl_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_crawl INTEGER NOT NULL,
    end_crawl INTEGER,
    urls INTEGER NOT NULL DEFAULT 0,
    links INTEGER NOT NULL DEFAULT 0,
    broken INTEGER NOT NULL DEFAULT 0,
    oversize INTEGER NOT NULL DEFAULT 0,
    cron_ticks INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_history_start ON crawl_history(start_crawl);

-- Cycle state shared across invocations (crawl_start, crawl_end, crawl_tick)
CREATE TABLE IF NOT EXISTS crawl_state (
    key TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);
"#;

/// Creates all tables and indexes. Safe to run against an existing database;
/// every statement is IF NOT EXISTS.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

/// Current schema version, for future migrations.
pub fn get_schema_version() -> u32 {
    1
}
