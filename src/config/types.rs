use crate::UrlResult;
use serde::Deserialize;
use url::Url;

/// Main configuration structure for linkrot
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    pub output: OutputConfig,
}

/// Which site to crawl and how to identify ourselves to it
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Absolute URL the crawl starts from; also defines the internal origin
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Per-invocation resource ceilings
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Soft time budget for one tick invocation (seconds)
    #[serde(rename = "max-cron-time", default = "default_max_cron_time")]
    pub max_cron_time: u64,

    /// Maximum URLs processed in one tick invocation
    #[serde(rename = "max-urls", default = "default_max_urls")]
    pub max_urls: u64,

    /// Byte ceiling per fetched document; larger bodies are flagged oversize
    #[serde(rename = "max-url-size", default = "default_max_url_size")]
    pub max_url_size: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "fetch-timeout", default = "default_fetch_timeout")]
    pub fetch_timeout: u64,
}

/// Recrawl and retention timing
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// How long after a completed fetch a URL becomes due again (seconds)
    #[serde(rename = "recrawl-interval", default = "default_recrawl_interval")]
    pub recrawl_interval: i64,

    /// How long to wait before retrying a network failure (seconds);
    /// also the lease duration while a URL is being fetched
    #[serde(rename = "retry-cooldown", default = "default_retry_cooldown")]
    pub retry_cooldown: i64,

    /// How long crawled records are kept past the end of a cycle (seconds)
    #[serde(rename = "retention-period", default = "default_retention_period")]
    pub retention_period: i64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Config {
    /// Parses and normalizes the configured seed URL
    ///
    /// The result doubles as the site root for internal/external
    /// classification.
    pub fn site_root(&self) -> UrlResult<Url> {
        crate::url::normalize_url(&self.site.seed_url)
    }
}

fn default_user_agent() -> String {
    format!("linkrot/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_cron_time() -> u64 {
    60
}

fn default_max_urls() -> u64 {
    500
}

fn default_max_url_size() -> u64 {
    // 1 MiB: anything bigger gets flagged for the oversize report
    1024 * 1024
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_recrawl_interval() -> i64 {
    // 1 day
    86_400
}

fn default_retry_cooldown() -> i64 {
    // 1 hour
    3_600
}

fn default_retention_period() -> i64 {
    // 1 week
    604_800
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_cron_time: default_max_cron_time(),
            max_urls: default_max_urls(),
            max_url_size: default_max_url_size(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            recrawl_interval: default_recrawl_interval(),
            retry_cooldown: default_retry_cooldown(),
            retention_period: default_retention_period(),
        }
    }
}
