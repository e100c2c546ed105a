//! State module for tracking crawl progress
//!
//! This module provides the cycle-level state machine and status
//! classification used throughout the engine.
//!
//! # Components
//!
//! - `CrawlState`: The persisted crawl-cycle timestamps (start, end, tick heartbeat)
//! - `StatusClass`: Status-code buckets (0/2/3/4/5) used for reporting

mod crawl_state;
mod status_class;

// Re-export main types
pub use crawl_state::CrawlState;
pub use status_class::StatusClass;
