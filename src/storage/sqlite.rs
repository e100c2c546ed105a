//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::{CrawlState, StatusClass};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    BrokenLink, CleanupStats, CrawlOutcome, EdgeRecord, HistoryRecord, UrlRecord,
};
use crate::LinkrotError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

/// Column list shared by every query that reconstructs a `UrlRecord`
const URL_COLUMNS: &str = "id, url, external, created_at, last_crawled, needs_crawl, \
     http_code, http_message, mime_type, title, file_size, download_duration, redirect, \
     course_id, context_id, cm_id, ignored_user_id, ignored_at";

/// `URL_COLUMNS` with a table alias prefix, for joined queries
fn prefixed_url_columns(alias: &str) -> String {
    URL_COLUMNS
        .split(", ")
        .map(|col| format!("{}.{}", alias, col.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reads a `UrlRecord` starting at column `base` of a result row
fn url_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<UrlRecord> {
    Ok(UrlRecord {
        id: row.get(base)?,
        url: row.get(base + 1)?,
        external: row.get(base + 2)?,
        created_at: row.get(base + 3)?,
        last_crawled: row.get(base + 4)?,
        needs_crawl: row.get(base + 5)?,
        http_code: row.get(base + 6)?,
        http_message: row.get(base + 7)?,
        mime_type: row.get(base + 8)?,
        title: row.get(base + 9)?,
        file_size: row.get(base + 10)?,
        download_duration: row.get(base + 11)?,
        redirect: row.get(base + 12)?,
        course_id: row.get(base + 13)?,
        context_id: row.get(base + 14)?,
        cm_id: row.get(base + 15)?,
        ignored_user_id: row.get(base + 16)?,
        ignored_at: row.get(base + 17)?,
    })
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryRecord> {
    Ok(HistoryRecord {
        id: row.get(0)?,
        start_crawl: row.get(1)?,
        end_crawl: row.get(2)?,
        urls: row.get(3)?,
        links: row.get(4)?,
        broken: row.get(5)?,
        oversize: row.get(6)?,
        cron_ticks: row.get(7)?,
    })
}

const HISTORY_COLUMNS: &str =
    "id, start_crawl, end_crawl, urls, links, broken, oversize, cron_ticks";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database at `path` and ensures the
    /// schema exists.
    pub fn new(path: &Path) -> Result<Self, LinkrotError> {
        let conn = Connection::open(path)?;

        // WAL so a status/summary reader never blocks a running tick
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, LinkrotError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn read_state_value(&self, key: &str) -> StorageResult<i64> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM crawl_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0))
    }

    fn write_state_value(&mut self, key: &str, value: i64) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO crawl_state (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    // ===== Crawl State =====

    fn load_crawl_state(&self) -> StorageResult<CrawlState> {
        Ok(CrawlState {
            crawl_start: self.read_state_value("crawl_start")?,
            crawl_end: self.read_state_value("crawl_end")?,
            crawl_tick: self.read_state_value("crawl_tick")?,
        })
    }

    fn save_crawl_state(&mut self, state: &CrawlState) -> StorageResult<()> {
        self.write_state_value("crawl_start", state.crawl_start)?;
        self.write_state_value("crawl_end", state.crawl_end)?;
        self.write_state_value("crawl_tick", state.crawl_tick)?;
        Ok(())
    }

    // ===== URL Management =====

    fn ensure_url(
        &mut self,
        url: &str,
        external: bool,
        now: i64,
        source: Option<&UrlRecord>,
    ) -> StorageResult<UrlRecord> {
        if let Some(existing) = self.find_url(url)? {
            // A record that was never crawled and fell out of the queue gets
            // re-queued by the fresh reference; everything else is untouched.
            if existing.last_crawled.is_none() && existing.needs_crawl.is_none() {
                self.conn.execute(
                    "UPDATE urls SET needs_crawl = ?1 WHERE id = ?2",
                    params![now, existing.id],
                )?;
                return self.get_url(existing.id);
            }
            return Ok(existing);
        }

        let (course_id, context_id, cm_id) = match source {
            Some(s) => (s.course_id, s.context_id, s.cm_id),
            None => (None, None, None),
        };

        self.conn.execute(
            "INSERT INTO urls (url, external, created_at, needs_crawl, course_id, context_id, cm_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![url, external, now, now, course_id, context_id, cm_id],
        )?;

        self.get_url(self.conn.last_insert_rowid())
    }

    fn mark_for_crawl(&mut self, url: &str, now: i64) -> StorageResult<UrlRecord> {
        let record = self.ensure_url(url, false, now, None)?;

        match record.needs_crawl {
            Some(due) if due <= now => Ok(record),
            _ => {
                self.conn.execute(
                    "UPDATE urls SET needs_crawl = ?1 WHERE id = ?2",
                    params![now, record.id],
                )?;
                self.get_url(record.id)
            }
        }
    }

    fn get_url(&self, url_id: i64) -> StorageResult<UrlRecord> {
        let sql = format!("SELECT {} FROM urls WHERE id = ?1", URL_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        let record = stmt
            .query_row(params![url_id], |row| url_from_row(row, 0))
            .map_err(|_| StorageError::UrlNotFound(format!("URL ID {}", url_id)))?;

        Ok(record)
    }

    fn find_url(&self, url: &str) -> StorageResult<Option<UrlRecord>> {
        let sql = format!("SELECT {} FROM urls WHERE url = ?1", URL_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        let record = stmt
            .query_row(params![url], |row| url_from_row(row, 0))
            .optional()?;

        Ok(record)
    }

    fn claim_url(&mut self, url_id: i64, until: i64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE urls SET needs_crawl = ?1 WHERE id = ?2",
            params![until, url_id],
        )?;
        Ok(())
    }

    fn mark_crawled(&mut self, url_id: i64, outcome: &CrawlOutcome) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE urls SET last_crawled = ?1, needs_crawl = ?2, http_code = ?3,
             http_message = ?4, mime_type = ?5, title = ?6, file_size = ?7,
             download_duration = ?8, redirect = ?9 WHERE id = ?10",
            params![
                outcome.last_crawled,
                outcome.needs_crawl,
                outcome.http_code,
                outcome.http_message,
                outcome.mime_type,
                outcome.title,
                outcome.file_size,
                outcome.download_duration,
                outcome.redirect,
                url_id
            ],
        )?;
        Ok(())
    }

    fn next_queued(&self, now: i64) -> StorageResult<Option<UrlRecord>> {
        let sql = format!(
            "SELECT {} FROM urls
             WHERE external = 0 AND needs_crawl IS NOT NULL AND needs_crawl <= ?1
             ORDER BY needs_crawl ASC, id ASC LIMIT 1",
            URL_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let record = stmt
            .query_row(params![now], |row| url_from_row(row, 0))
            .optional()?;

        Ok(record)
    }

    fn count_queued(&self, now: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls
             WHERE external = 0 AND needs_crawl IS NOT NULL AND needs_crawl <= ?1",
            params![now],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn set_ignored(&mut self, url_id: i64, user_id: i64, at: i64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE urls SET ignored_user_id = ?1, ignored_at = ?2 WHERE id = ?3",
            params![user_id, at, url_id],
        )?;
        Ok(())
    }

    fn clear_ignored(&mut self, url_id: i64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE urls SET ignored_user_id = NULL, ignored_at = NULL WHERE id = ?1",
            params![url_id],
        )?;
        Ok(())
    }

    // ===== Edge Management =====

    fn add_edge(&mut self, from_url_id: i64, to_url_id: i64, now: i64) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO edges (from_url_id, to_url_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![from_url_id, to_url_id, now],
        )?;
        Ok(())
    }

    fn outgoing_edges(&self, from_url_id: i64) -> StorageResult<Vec<EdgeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, from_url_id, to_url_id, created_at FROM edges
             WHERE from_url_id = ?1 ORDER BY id",
        )?;

        let edges = stmt
            .query_map(params![from_url_id], |row| {
                Ok(EdgeRecord {
                    id: row.get(0)?,
                    from_url_id: row.get(1)?,
                    to_url_id: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(edges)
    }

    fn count_edges(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== History Management =====

    fn create_history(&mut self, start_crawl: i64) -> StorageResult<HistoryRecord> {
        self.conn.execute(
            "INSERT INTO crawl_history (start_crawl) VALUES (?1)",
            params![start_crawl],
        )?;

        Ok(HistoryRecord {
            id: self.conn.last_insert_rowid(),
            start_crawl,
            end_crawl: None,
            urls: 0,
            links: 0,
            broken: 0,
            oversize: 0,
            cron_ticks: 0,
        })
    }

    fn find_history(&self, start_crawl: i64) -> StorageResult<Option<HistoryRecord>> {
        let sql = format!(
            "SELECT {} FROM crawl_history WHERE start_crawl = ?1 ORDER BY id DESC LIMIT 1",
            HISTORY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let record = stmt
            .query_row(params![start_crawl], history_from_row)
            .optional()?;

        Ok(record)
    }

    fn update_history(&mut self, history: &HistoryRecord) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE crawl_history SET end_crawl = ?1, urls = ?2, links = ?3,
             broken = ?4, oversize = ?5, cron_ticks = ?6 WHERE id = ?7",
            params![
                history.end_crawl,
                history.urls,
                history.links,
                history.broken,
                history.oversize,
                history.cron_ticks,
                history.id
            ],
        )?;
        Ok(())
    }

    fn recent_history(&self, limit: u32) -> StorageResult<Vec<HistoryRecord>> {
        let sql = format!(
            "SELECT {} FROM crawl_history ORDER BY start_crawl DESC, id DESC LIMIT ?1",
            HISTORY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let records = stmt
            .query_map(params![limit], history_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    // ===== Statistics =====

    fn count_crawled_since(&self, since: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls WHERE last_crawled IS NOT NULL AND last_crawled >= ?1",
            params![since],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_broken_since(&self, since: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls
             WHERE last_crawled IS NOT NULL AND last_crawled >= ?1
               AND (http_code < 200 OR http_code >= 400)",
            params![since],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_oversize_since(&self, since: i64, threshold: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls
             WHERE last_crawled IS NOT NULL AND last_crawled >= ?1
               AND file_size > ?2",
            params![since, threshold],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Summary Queries =====

    fn count_by_status_class(
        &self,
        scope: Option<i64>,
    ) -> StorageResult<HashMap<StatusClass, u64>> {
        let rows: Vec<(u16, i64)> = match scope {
            Some(course_id) => {
                let mut stmt = self.conn.prepare(
                    "SELECT b.http_code, COUNT(DISTINCT b.id)
                     FROM urls b
                     JOIN edges l ON l.to_url_id = b.id
                     JOIN urls a ON l.from_url_id = a.id
                     WHERE a.course_id = ?1
                     GROUP BY b.http_code",
                )?;
                let rows = stmt
                    .query_map(params![course_id], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT http_code, COUNT(*) FROM urls GROUP BY http_code")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        let mut counts = HashMap::new();
        for (code, count) in rows {
            *counts.entry(StatusClass::from_code(code)).or_insert(0) += count as u64;
        }

        Ok(counts)
    }

    fn oversize_urls(
        &self,
        threshold: i64,
        scope: Option<i64>,
        limit: u32,
    ) -> StorageResult<Vec<UrlRecord>> {
        let records = match scope {
            Some(course_id) => {
                let sql = format!(
                    "SELECT {} FROM urls b
                     JOIN edges l ON l.to_url_id = b.id
                     JOIN urls a ON l.from_url_id = a.id
                     WHERE b.file_size > ?1 AND a.course_id = ?2
                     GROUP BY b.id
                     ORDER BY b.file_size DESC LIMIT ?3",
                    prefixed_url_columns("b")
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![threshold, course_id, limit], |row| {
                        url_from_row(row, 0)
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM urls WHERE file_size > ?1
                     ORDER BY file_size DESC LIMIT ?2",
                    URL_COLUMNS
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![threshold, limit], |row| url_from_row(row, 0))?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(records)
    }

    fn broken_links(&self, scope: Option<i64>, limit: u32) -> StorageResult<Vec<BrokenLink>> {
        // Only confirmed failures: never-crawled targets (code 0 by default)
        // are pending, not broken.
        let base_sql = format!(
            "SELECT {}, {} FROM edges l
             JOIN urls b ON l.to_url_id = b.id
             JOIN urls a ON l.from_url_id = a.id
             WHERE b.last_crawled IS NOT NULL
               AND (b.http_code < 200 OR b.http_code >= 400)",
            prefixed_url_columns("b"),
            prefixed_url_columns("a")
        );

        let map_row = |row: &Row<'_>| -> rusqlite::Result<BrokenLink> {
            Ok(BrokenLink {
                target: url_from_row(row, 0)?,
                referrer: url_from_row(row, 18)?,
            })
        };

        let links = match scope {
            Some(course_id) => {
                let sql = format!(
                    "{} AND a.course_id = ?1 ORDER BY b.url ASC, a.url ASC LIMIT ?2",
                    base_sql
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![course_id, limit], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!("{} ORDER BY b.url ASC, a.url ASC LIMIT ?1", base_sql);
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![limit], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(links)
    }

    // ===== Retention =====

    fn delete_stale_urls(&mut self, cutoff: i64) -> StorageResult<CleanupStats> {
        let tx = self.conn.transaction()?;

        let edges_deleted = tx.execute(
            "DELETE FROM edges WHERE
                from_url_id IN
                    (SELECT id FROM urls WHERE last_crawled IS NOT NULL AND last_crawled < ?1)
             OR to_url_id IN
                    (SELECT id FROM urls WHERE last_crawled IS NOT NULL AND last_crawled < ?1)",
            params![cutoff],
        )?;

        let urls_deleted = tx.execute(
            "DELETE FROM urls WHERE last_crawled IS NOT NULL AND last_crawled < ?1",
            params![cutoff],
        )?;

        tx.commit()?;

        Ok(CleanupStats {
            urls_deleted: urls_deleted as u64,
            edges_deleted: edges_deleted as u64,
        })
    }
}
