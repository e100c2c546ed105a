//! Retention cleanup for crawl data
//!
//! Crawl records are evidence for link-health reports, not an archive. Once
//! a URL has gone unvisited for longer than the retention period it is
//! deleted together with every edge that references it; if the site still
//! links to it, the next cycle rediscovers it from scratch.

use crate::config::Config;
use crate::storage::{CleanupStats, Storage};
use crate::Result;

/// Deletes records whose last crawl predates the retention window
///
/// The cutoff is anchored to the end of the last completed cycle, not to
/// the invocation time, so a crawler that has been switched off for a month
/// does not delete its entire dataset on the first cleanup after it comes
/// back. `reference_time` identifies the scheduled run in logs.
///
/// # Arguments
///
/// * `storage` - The crawl store to clean
/// * `config` - The crawler configuration (retention period)
/// * `reference_time` - Invocation time (epoch seconds)
pub fn run_cleanup<S: Storage>(
    storage: &mut S,
    config: &Config,
    reference_time: i64,
) -> Result<CleanupStats> {
    let state = storage.load_crawl_state()?;

    if state.crawl_end == 0 {
        tracing::debug!("No completed crawl cycle yet, nothing to clean");
        return Ok(CleanupStats::default());
    }

    let cutoff = state.crawl_end - config.schedule.retention_period;
    tracing::info!(
        "Cleanup at {}: removing records last crawled before {}",
        reference_time,
        cutoff
    );

    let stats = storage.delete_stale_urls(cutoff)?;

    tracing::info!(
        "Cleanup removed {} URLs and {} links",
        stats.urls_deleted,
        stats.edges_deleted
    );

    Ok(stats)
}
