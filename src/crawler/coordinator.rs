//! Crawl orchestration - the tick loop
//!
//! This module drives crawl cycles against one site, including:
//! - Opening and closing cycles (seed, history row, cycle timestamps)
//! - The bounded per-invocation loop over queued URLs
//! - Processing one URL end-to-end: fetch, parse, record links, reschedule
//! - Recomputing cycle counters from store aggregates
//!
//! The crawl is deliberately sequential: one request in flight, one URL
//! processed per queue pull. Politeness comes from the invocation time
//! budget, not from concurrency controls.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_url};
use crate::crawler::parser::parse_html;
use crate::crawler::queue::QueueManager;
use crate::state::StatusClass;
use crate::storage::{open_storage, CrawlOutcome, Storage, UrlRecord};
use crate::url::{is_external, normalize_url};
use crate::Result;
use chrono::Utc;
use reqwest::Client;
use std::path::Path;
use url::Url;

/// Drives crawl cycles for one configured site
pub struct Crawler<S: Storage> {
    config: Config,
    storage: S,
    client: Client,
    site_root: Url,
}

impl<S: Storage> Crawler<S> {
    /// Creates a crawler for the configured site
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - The crawl store
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to tick
    /// * `Err(LinkrotError)` - Invalid seed URL or HTTP client build failure
    pub fn new(config: Config, storage: S) -> Result<Self> {
        let site_root = config.site_root()?;
        let client = build_http_client(&config)?;

        Ok(Self {
            config,
            storage,
            client,
            site_root,
        })
    }

    /// Read access to the underlying store
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs one bounded invocation of the crawl loop
    ///
    /// If no cycle is active, a new one is opened: the seed URL is queued,
    /// a history row is created and `crawl_start` is set. The loop then
    /// processes queued URLs one at a time until the queue has nothing due,
    /// the invocation URL ceiling is hit, or the time budget runs out. A
    /// drained queue closes the cycle; the other two exits leave it open for
    /// the next invocation to resume.
    ///
    /// Cycle counters are recomputed from store aggregates at the end of
    /// every invocation, so an invocation that dies mid-queue cannot leave
    /// them wrong.
    ///
    /// # Arguments
    ///
    /// * `verbose` - Log every processed URL at info level
    pub async fn run_tick(&mut self, verbose: bool) -> Result<()> {
        let mut state = self.storage.load_crawl_state()?;
        let now = Utc::now().timestamp();

        let mut history = if !state.is_active() {
            tracing::info!("Starting new crawl cycle from {}", self.site_root);
            state.begin_cycle(now);
            self.storage.save_crawl_state(&state)?;
            self.storage.mark_for_crawl(self.site_root.as_str(), now)?;
            self.storage.create_history(state.crawl_start)?
        } else {
            match self.storage.find_history(state.crawl_start)? {
                Some(history) => history,
                // The row can have been removed out-of-band; the cycle is
                // still worth finishing under a fresh row.
                None => self.storage.create_history(state.crawl_start)?,
            }
        };

        let cron_start = Utc::now().timestamp();
        let cron_stop = cron_start + self.config.limits.max_cron_time as i64;
        let mut queue = QueueManager::new(
            self.config.limits.max_urls,
            self.config.schedule.retry_cooldown,
        );

        let mut has_more = true;
        let mut has_time = true;
        while has_more && has_time {
            has_more = self.process_queue(&mut queue, verbose).await?;
            has_time = Utc::now().timestamp() < cron_stop;
            state.record_tick(Utc::now().timestamp());
            self.storage.save_crawl_state(&state)?;
        }

        // Time left with nothing due means the queue drained and the cycle
        // is complete. A ceiling pause is not a drain; the cycle stays open.
        if has_time && !queue.limit_reached() {
            let end = Utc::now().timestamp();
            state.finish_cycle(end);
            self.storage.save_crawl_state(&state)?;
            history.end_crawl = Some(end);
            tracing::info!(
                "Crawl cycle complete after {} URLs this invocation",
                queue.taken()
            );
        } else {
            tracing::info!(
                "Crawl cycle paused after {} URLs this invocation",
                queue.taken()
            );
        }

        history.urls = self.storage.count_crawled_since(state.crawl_start)? as i64;
        history.links = self.storage.count_edges()? as i64;
        history.broken = self.storage.count_broken_since(state.crawl_start)? as i64;
        history.oversize = self
            .storage
            .count_oversize_since(state.crawl_start, self.config.limits.max_url_size as i64)?
            as i64;
        history.cron_ticks += 1;
        self.storage.update_history(&history)?;

        Ok(())
    }

    /// Processes at most one queued URL
    ///
    /// Returns whether the queue may still have work for this invocation.
    async fn process_queue(&mut self, queue: &mut QueueManager, verbose: bool) -> Result<bool> {
        let now = Utc::now().timestamp();
        let record = match queue.take_next(&mut self.storage, now)? {
            Some(record) => record,
            None => return Ok(false),
        };

        if verbose {
            tracing::info!("Crawling {}", record.url);
        } else {
            tracing::debug!("Crawling {}", record.url);
        }

        self.process_url(&record).await?;
        Ok(true)
    }

    /// Processes a single URL end-to-end
    ///
    /// Fetches the URL, extracts and records outbound links when the
    /// response is parseable HTML, records the redirect target for 3xx
    /// responses, and writes the outcome with the next crawl time. Fetch
    /// failures are outcomes, not errors; only storage failures propagate.
    async fn process_url(&mut self, record: &UrlRecord) -> Result<()> {
        let url = match Url::parse(&record.url) {
            Ok(url) => url,
            Err(e) => {
                // A stored URL that no longer parses cannot be fetched;
                // record the failure so it leaves the queue.
                tracing::warn!("Stored URL {} does not parse: {}", record.url, e);
                let now = Utc::now().timestamp();
                let outcome = CrawlOutcome {
                    http_code: 0,
                    http_message: Some("Invalid URL".to_string()),
                    mime_type: None,
                    title: None,
                    file_size: None,
                    download_duration: None,
                    redirect: None,
                    last_crawled: now,
                    needs_crawl: None,
                };
                self.storage.mark_crawled(record.id, &outcome)?;
                return Ok(());
            }
        };

        let result = fetch_url(&self.client, &url, self.config.limits.max_url_size).await;
        let now = Utc::now().timestamp();

        let mut title = None;

        // Links are only extracted from HTML pages that arrived whole
        if result.is_success() && result.is_html() && !result.oversize {
            if let Some(body) = &result.body {
                let parsed = parse_html(body, &url);
                title = parsed.title;
                for link in &parsed.links {
                    self.record_link(record, link, now)?;
                }
            }
        }

        // A redirect target joins the graph like any discovered link; the
        // redirect itself was not followed in-request
        if let Some(target) = &result.redirect {
            match normalize_url(target) {
                Ok(target_url) => self.record_link(record, &target_url, now)?,
                Err(e) => {
                    tracing::debug!("Ignoring unusable redirect target {}: {}", target, e)
                }
            }
        }

        if StatusClass::from_code(result.http_code).is_broken() {
            tracing::warn!(
                "Broken link: {} ({} {})",
                record.url,
                result.http_code,
                result.http_message.as_deref().unwrap_or("")
            );
        } else if result.oversize {
            tracing::debug!(
                "Oversize: {} ({} bytes reported)",
                record.url,
                result.file_size.unwrap_or(0)
            );
        }

        let outcome = CrawlOutcome {
            http_code: result.http_code,
            http_message: result.http_message.clone(),
            mime_type: result.mime_type.clone(),
            title,
            file_size: result.file_size,
            download_duration: Some(result.download_duration),
            redirect: result.redirect.clone(),
            last_crawled: now,
            needs_crawl: self.reschedule_after(result.http_code, now),
        };
        self.storage.mark_crawled(record.id, &outcome)?;

        Ok(())
    }

    /// Records one discovered link: the target URL record and the edge
    fn record_link(&mut self, from: &UrlRecord, to: &Url, now: i64) -> Result<()> {
        let external = is_external(to, &self.site_root);
        let target = self
            .storage
            .ensure_url(to.as_str(), external, now, Some(from))?;
        self.storage.add_edge(from.id, target.id, now)?;
        Ok(())
    }

    /// Decides when a URL should next be crawled after an attempt
    ///
    /// Unreachable URLs retry after the cooldown. Definitive 4xx/5xx
    /// outcomes are final for the record; the report keeps showing them for
    /// as long as the site links to them. Everything else recrawls on the
    /// regular interval.
    fn reschedule_after(&self, http_code: u16, now: i64) -> Option<i64> {
        if http_code == 0 {
            return Some(now + self.config.schedule.retry_cooldown);
        }
        if StatusClass::from_code(http_code).is_broken() {
            return None;
        }
        Some(now + self.config.schedule.recrawl_interval)
    }
}

/// Runs one crawl tick against the store named in the configuration
///
/// Convenience wrapper for the CLI: opens the store, builds the crawler and
/// runs a single invocation of the tick loop.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `verbose` - Log every processed URL at info level
///
/// # Example
///
/// ```no_run
/// use linkrot::config::load_config;
/// use linkrot::crawler::run_tick;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("linkrot.toml"))?;
/// run_tick(config, false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_tick(config: Config, verbose: bool) -> Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    let mut crawler = Crawler::new(config, storage)?;
    crawler.run_tick(verbose).await
}
