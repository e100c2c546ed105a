//! Crawler module for link checking and crawl-cycle management
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with size and time limits
//! - HTML parsing and link extraction
//! - Queue pulls with the per-invocation ceiling
//! - Cycle orchestration across repeated bounded invocations
//! - Retention cleanup of aged-out records

mod cleanup;
mod coordinator;
mod fetcher;
mod parser;
mod queue;

pub use cleanup::run_cleanup;
pub use coordinator::{run_tick, Crawler};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use parser::{parse_html, ParsedPage};
pub use queue::QueueManager;
