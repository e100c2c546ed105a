//! Link-health summary generation from the crawl store
//!
//! This module provides functionality for extracting and displaying the
//! three report views: URL counts by status class, broken links with their
//! referring pages, and oversize URLs.

use crate::state::{CrawlState, StatusClass};
use crate::storage::{BrokenLink, HistoryRecord, Storage, UrlRecord};
use crate::Result;
use std::collections::HashMap;

/// Link-health summary for the whole site or one course scope
#[derive(Debug, Clone)]
pub struct Summary {
    /// URL counts per status class; every class is present, zeros included
    pub status_counts: HashMap<StatusClass, u64>,

    /// Broken link occurrences, suppressed targets excluded
    pub broken: Vec<BrokenLink>,

    /// URLs whose recorded size exceeds the threshold, largest first
    pub oversize: Vec<UrlRecord>,
}

/// Loads a summary from storage
///
/// # Arguments
///
/// * `storage` - The crawl store to query
/// * `scope` - Restrict to URLs linked from pages of one course, or `None`
///   for the whole site
/// * `threshold` - Byte size above which a URL counts as oversize
/// * `limit` - Maximum rows per list
pub fn load_summary(
    storage: &dyn Storage,
    scope: Option<i64>,
    threshold: i64,
    limit: u32,
) -> Result<Summary> {
    let raw_counts = storage.count_by_status_class(scope)?;

    // Every class appears in the report, crawled or not
    let mut status_counts = HashMap::new();
    for class in StatusClass::all_classes() {
        status_counts.insert(class, raw_counts.get(&class).copied().unwrap_or(0));
    }

    // A suppressed target stays in the store and the class counts; it just
    // stops being reported as broken.
    let broken = storage
        .broken_links(scope, limit)?
        .into_iter()
        .filter(|occurrence| !occurrence.target.is_ignored())
        .collect();

    let oversize = storage.oversize_urls(threshold, scope, limit)?;

    Ok(Summary {
        status_counts,
        broken,
        oversize,
    })
}

/// Prints a summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &Summary) {
    println!("=== Link Health Summary ===\n");

    println!("URLs by status:");
    for class in StatusClass::all_classes() {
        let count = summary.status_counts.get(&class).copied().unwrap_or(0);
        println!("  {}: {}", class, count);
    }
    println!();

    println!("Broken links ({}):", summary.broken.len());
    for occurrence in &summary.broken {
        println!(
            "  {} {} <- {}",
            occurrence.target.http_code, occurrence.target.url, occurrence.referrer.url
        );
    }
    println!();

    println!("Oversize URLs ({}):", summary.oversize.len());
    for record in &summary.oversize {
        println!(
            "  {} {}",
            format_size(record.file_size.unwrap_or(0)),
            record.url
        );
    }
}

/// Prints the crawl-cycle status to stdout
///
/// # Arguments
///
/// * `state` - The persisted cycle state
/// * `queued` - Number of URLs currently due
/// * `history` - Recent cycle records, newest first
pub fn print_status(state: &CrawlState, queued: u64, history: &[HistoryRecord]) {
    println!("=== Crawl Status ===\n");

    println!(
        "Cycle active: {}",
        if state.is_active() { "yes" } else { "no" }
    );
    println!("Cycle started: {}", format_time(state.crawl_start));
    println!("Cycle ended: {}", format_time(state.crawl_end));
    println!("Last tick: {}", format_time(state.crawl_tick));
    println!("URLs due: {}", queued);
    println!();

    println!("Recent cycles:");
    for record in history {
        println!(
            "  started {} ended {} | {} urls, {} links, {} broken, {} oversize, {} ticks",
            format_time(record.start_crawl),
            record
                .end_crawl
                .map(format_time)
                .unwrap_or_else(|| "-".to_string()),
            record.urls,
            record.links,
            record.broken,
            record.oversize,
            record.cron_ticks
        );
    }
}

/// Formats a byte count for display
fn format_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;

    let bytes = bytes.max(0) as f64;
    if bytes >= MB {
        format!("{:.1} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{} B", bytes as i64)
    }
}

/// Formats an epoch timestamp for display; zero reads as "never"
fn format_time(timestamp: i64) -> String {
    if timestamp == 0 {
        return "never".to_string();
    }

    match chrono::DateTime::from_timestamp(timestamp, 0) {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("@{}", timestamp),
    }
}
