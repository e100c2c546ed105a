//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - URL record persistence and queue queries
//! - Link-graph (edge) tracking
//! - Crawl cycle history and state persistence
//! - Retention cleanup

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::StatusClass;
use crate::LinkrotError;

use std::path::Path;

/// Opens the database at `path`, creating it and its schema on first use
pub fn open_storage(path: &Path) -> Result<SqliteStorage, LinkrotError> {
    tracing::debug!(
        "Opening storage at {} (schema v{})",
        path.display(),
        schema::get_schema_version()
    );
    SqliteStorage::new(path)
}

/// A URL known to the crawler, with the outcome of its most recent fetch
///
/// The normalized URL text is the record identity. All timestamps are epoch
/// seconds. `http_code` 0 means the URL has never been fetched, or the last
/// attempt failed before an HTTP response arrived.
#[derive(Debug, Clone)]
pub struct UrlRecord {
    pub id: i64,
    pub url: String,
    pub external: bool,
    pub created_at: i64,
    pub last_crawled: Option<i64>,
    /// When this URL is next due; NULL means not scheduled
    pub needs_crawl: Option<i64>,
    pub http_code: u16,
    pub http_message: Option<String>,
    pub mime_type: Option<String>,
    pub title: Option<String>,
    pub file_size: Option<i64>,
    /// Wall-clock transfer time of the last fetch, in seconds
    pub download_duration: Option<f64>,
    /// Resolved Location target of a 3xx response
    pub redirect: Option<String>,
    pub course_id: Option<i64>,
    pub context_id: Option<i64>,
    pub cm_id: Option<i64>,
    pub ignored_user_id: Option<i64>,
    pub ignored_at: Option<i64>,
}

impl UrlRecord {
    /// Status bucket of the most recent fetch outcome
    pub fn status_class(&self) -> StatusClass {
        StatusClass::from_code(self.http_code)
    }

    /// True when a broken-link alert for this URL has been manually suppressed
    pub fn is_ignored(&self) -> bool {
        self.ignored_user_id.is_some()
    }
}

/// A directed link between two recorded URLs
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub id: i64,
    pub from_url_id: i64,
    pub to_url_id: i64,
    pub created_at: i64,
}

/// One crawl cycle's audit row
///
/// Counters are recomputed from store aggregates at the end of every tick, so
/// a crashed invocation at worst leaves them stale, never wrong.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub id: i64,
    pub start_crawl: i64,
    pub end_crawl: Option<i64>,
    pub urls: i64,
    pub links: i64,
    pub broken: i64,
    pub oversize: i64,
    pub cron_ticks: i64,
}

/// Everything `mark_crawled` writes back after a fetch attempt
///
/// The reschedule decision (`needs_crawl`) is made by the orchestrator, not
/// by storage; this struct just carries it.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub http_code: u16,
    pub http_message: Option<String>,
    pub mime_type: Option<String>,
    pub title: Option<String>,
    pub file_size: Option<i64>,
    pub download_duration: Option<f64>,
    pub redirect: Option<String>,
    pub last_crawled: i64,
    pub needs_crawl: Option<i64>,
}

/// A broken link occurrence: the dead target plus one page referring to it
#[derive(Debug, Clone)]
pub struct BrokenLink {
    pub target: UrlRecord,
    pub referrer: UrlRecord,
}

/// What a retention pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub urls_deleted: u64,
    pub edges_deleted: u64,
}
