//! Output module for link-health reports
//!
//! This module handles:
//! - Generating the link-health summary (status classes, broken, oversize)
//! - Printing crawl-cycle status and recent history

mod summary;

pub use summary::{load_summary, print_status, print_summary, Summary};
