//! URL handling module for linkrot
//!
//! This module provides URL normalization, link resolution, and the
//! internal/external classification that decides which links get crawled.

mod normalize;

use url::Url;

// Re-export main functions
pub use normalize::{normalize_url, resolve_link};

/// Classifies a URL as external to the configured site
///
/// A URL is internal when it shares an origin (scheme, host, and port) with
/// the seed URL. Internal URLs are eligible for recursive crawling; external
/// URLs are recorded and health-checked in the graph but never fetched.
///
/// The comparison is strict: `http://site/` and `https://site/` are different
/// origins, as are `site` and `www.site`.
///
/// # Arguments
///
/// * `url` - The candidate URL (already normalized)
/// * `site_root` - The configured seed URL
///
/// # Examples
///
/// ```
/// use linkrot::url::{is_external, normalize_url};
///
/// let root = normalize_url("https://example.com/").unwrap();
/// let course = normalize_url("https://example.com/course/view?id=1").unwrap();
/// let elsewhere = normalize_url("https://other.com/").unwrap();
///
/// assert!(!is_external(&course, &root));
/// assert!(is_external(&elsewhere, &root));
/// ```
pub fn is_external(url: &Url, site_root: &Url) -> bool {
    url.origin() != site_root.origin()
}
