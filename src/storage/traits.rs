//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::{CrawlState, StatusClass};
use crate::storage::{
    BrokenLink, CleanupStats, CrawlOutcome, EdgeRecord, HistoryRecord, UrlRecord,
};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("No record for URL: {0}")]
    UrlNotFound(String),

    #[error("No history row for crawl started at {0}")]
    HistoryNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawl engine.
/// The orchestrator, queue manager, cleaner, and summary queries all go
/// through it, so tests can drive the whole pipeline against an in-memory
/// database.
pub trait Storage {
    // ===== Crawl State =====

    /// Loads the persisted cycle state; a fresh store reads as all zeros
    fn load_crawl_state(&self) -> StorageResult<CrawlState>;

    /// Persists the cycle state
    fn save_crawl_state(&mut self, state: &CrawlState) -> StorageResult<()>;

    // ===== URL Management =====

    /// Records a reference to a URL, inserting it if unknown
    ///
    /// A new record is queued immediately (`needs_crawl = now`) and inherits
    /// the scope associations (course, context, course-module) of the record
    /// the reference came from. An existing record keeps its crawl progress
    /// untouched, with one exception: a record that was never crawled and has
    /// no scheduled crawl is re-queued.
    ///
    /// # Arguments
    ///
    /// * `url` - The normalized URL text
    /// * `external` - Whether the URL is outside the configured site
    /// * `now` - Current time (epoch seconds)
    /// * `source` - The referring record, if the reference came from a page
    ///
    /// # Returns
    ///
    /// The up-to-date record for the URL
    fn ensure_url(
        &mut self,
        url: &str,
        external: bool,
        now: i64,
        source: Option<&UrlRecord>,
    ) -> StorageResult<UrlRecord>;

    /// Queues a URL for immediate crawling
    ///
    /// Like [`ensure_url`](Storage::ensure_url) without a source, but an
    /// already-known URL that is not yet due is pulled forward so it is due
    /// at `now`. Crawl outcome fields are untouched. Used to seed a cycle.
    fn mark_for_crawl(&mut self, url: &str, now: i64) -> StorageResult<UrlRecord>;

    /// Gets a URL record by ID
    fn get_url(&self, url_id: i64) -> StorageResult<UrlRecord>;

    /// Gets a URL record by its normalized text, if present
    fn find_url(&self, url: &str) -> StorageResult<Option<UrlRecord>>;

    /// Leases a queued URL until `until`
    ///
    /// Pushing `needs_crawl` forward before fetching keeps an overlapping
    /// invocation from pulling the same item.
    fn claim_url(&mut self, url_id: i64, until: i64) -> StorageResult<()>;

    /// Writes the outcome of a fetch attempt back to the record
    fn mark_crawled(&mut self, url_id: i64, outcome: &CrawlOutcome) -> StorageResult<()>;

    /// Returns the next internal URL due for crawling, if any
    ///
    /// Ordering is deterministic: oldest `needs_crawl` first, then lowest ID.
    /// External URLs are never returned.
    fn next_queued(&self, now: i64) -> StorageResult<Option<UrlRecord>>;

    /// Counts internal URLs currently due
    fn count_queued(&self, now: i64) -> StorageResult<u64>;

    /// Suppresses broken-link alerts for a URL on behalf of a user
    fn set_ignored(&mut self, url_id: i64, user_id: i64, at: i64) -> StorageResult<()>;

    /// Clears a previous suppression
    fn clear_ignored(&mut self, url_id: i64) -> StorageResult<()>;

    // ===== Edge Management =====

    /// Records a directed link between two URLs
    ///
    /// Idempotent: re-recording an existing pair changes nothing.
    fn add_edge(&mut self, from_url_id: i64, to_url_id: i64, now: i64) -> StorageResult<()>;

    /// Lists the recorded links leaving a URL, in insertion order
    fn outgoing_edges(&self, from_url_id: i64) -> StorageResult<Vec<EdgeRecord>>;

    /// Counts the total number of recorded links
    fn count_edges(&self) -> StorageResult<u64>;

    // ===== History Management =====

    /// Creates a history row for a cycle starting at `start_crawl`
    fn create_history(&mut self, start_crawl: i64) -> StorageResult<HistoryRecord>;

    /// Finds the history row for the cycle that started at `start_crawl`
    fn find_history(&self, start_crawl: i64) -> StorageResult<Option<HistoryRecord>>;

    /// Writes a history row's counters back
    fn update_history(&mut self, history: &HistoryRecord) -> StorageResult<()>;

    /// Returns the most recent history rows, newest first
    fn recent_history(&self, limit: u32) -> StorageResult<Vec<HistoryRecord>>;

    // ===== Statistics =====

    /// Counts URLs crawled at or after `since`
    fn count_crawled_since(&self, since: i64) -> StorageResult<u64>;

    /// Counts URLs crawled at or after `since` whose status is broken
    /// (anything outside 2xx/3xx)
    fn count_broken_since(&self, since: i64) -> StorageResult<u64>;

    /// Counts URLs crawled at or after `since` whose size exceeds `threshold`
    fn count_oversize_since(&self, since: i64, threshold: i64) -> StorageResult<u64>;

    // ===== Summary Queries =====

    /// Counts URLs per status class
    ///
    /// With a scope, only link targets referenced from pages carrying that
    /// course association are counted (each target once). Classes with no
    /// rows are absent from the map; callers fill in zeros.
    fn count_by_status_class(
        &self,
        scope: Option<i64>,
    ) -> StorageResult<HashMap<StatusClass, u64>>;

    /// Lists URLs whose recorded size exceeds `threshold`, largest first
    fn oversize_urls(
        &self,
        threshold: i64,
        scope: Option<i64>,
        limit: u32,
    ) -> StorageResult<Vec<UrlRecord>>;

    /// Lists broken-link occurrences: each crawled-and-broken target paired
    /// with one referring page, optionally restricted to a course scope
    fn broken_links(&self, scope: Option<i64>, limit: u32) -> StorageResult<Vec<BrokenLink>>;

    // ===== Retention =====

    /// Deletes URLs last crawled before `cutoff`, cascading their edges
    ///
    /// Never-crawled records are kept. Runs in a single transaction.
    fn delete_stale_urls(&mut self, cutoff: i64) -> StorageResult<CleanupStats>;
}
