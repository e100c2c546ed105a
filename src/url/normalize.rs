use crate::UrlError;
use url::Url;

/// Puts a URL into the canonical form used as record identity in storage
///
/// Two references to the same page must come out as the same string, so
/// normalization lowercases the host, resolves `.` and `..` path segments,
/// collapses duplicate slashes (an empty path becomes `/`), and strips the
/// fragment. Malformed input and schemes other than http/https are errors.
///
/// Query strings are kept verbatim: on the kinds of sites this engine targets,
/// `?id=1` and `?id=2` are different pages. Scheme and port are kept too, so
/// the http and https renditions of a site stay distinct records.
///
/// # Examples
///
/// ```
/// use linkrot::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.COM/a/../b/page?id=7#section").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b/page?id=7");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                other
            )))
        }
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    url.set_path(&normalize_path(url.path()));
    url.set_fragment(None);

    Ok(url)
}

/// Resolves a raw href against the URL of the page it appeared on, then
/// normalizes the result. Handles absolute, root-relative, and
/// directory-relative hrefs alike.
pub fn resolve_link(base: &Url, href: &str) -> Result<Url, UrlError> {
    let joined = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;
    normalize_url(joined.as_str())
}

/// Normalizes a URL path by removing dot segments and duplicate slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            // "" covers both the leading slash and runs of duplicate slashes
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut result = format!("/{}", segments.join("/"));

    // A trailing slash is significant (directory index vs page); keep it
    if path.ends_with('/') && result.len() > 1 {
        result.push('/');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_is_preserved() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");

        let result = normalize_url("https://example.com/page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_lowercase_host() {
        let result = normalize_url("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_fragment_only_difference_collapses() {
        let a = normalize_url("https://example.com/page#one").unwrap();
        let b = normalize_url("https://example.com/page#two").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_query_is_kept_verbatim() {
        let result = normalize_url("https://example.com/view?id=42&sort=desc").unwrap();
        assert_eq!(result.as_str(), "https://example.com/view?id=42&sort=desc");
    }

    #[test]
    fn test_distinct_queries_stay_distinct() {
        let a = normalize_url("https://example.com/view?id=1").unwrap();
        let b = normalize_url("https://example.com/view?id=2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_normalize_path_with_dots() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_multiple_slashes() {
        let result = normalize_url("https://example.com///path//to///page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/path/to/page");
    }

    #[test]
    fn test_trailing_slash_is_kept() {
        let result = normalize_url("https://example.com/dir/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/dir/");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_parent_directory_at_root() {
        let result = normalize_url("https://example.com/../page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_invalid_scheme() {
        let err = normalize_url("ftp://example.com/file").unwrap_err();
        assert!(matches!(err, UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        let err = normalize_url("definitely not a url").unwrap_err();
        assert!(matches!(err, UrlError::Parse(_)));
    }

    #[test]
    fn test_resolve_relative_link() {
        let base = Url::parse("https://example.com/course/view").unwrap();
        let result = resolve_link(&base, "lesson?id=3").unwrap();
        assert_eq!(result.as_str(), "https://example.com/course/lesson?id=3");
    }

    #[test]
    fn test_resolve_absolute_link() {
        let base = Url::parse("https://example.com/course/view").unwrap();
        let result = resolve_link(&base, "https://other.com/page").unwrap();
        assert_eq!(result.as_str(), "https://other.com/page");
    }

    #[test]
    fn test_resolve_root_relative_link() {
        let base = Url::parse("https://example.com/a/b/c").unwrap();
        let result = resolve_link(&base, "/top").unwrap();
        assert_eq!(result.as_str(), "https://example.com/top");
    }

    #[test]
    fn test_resolve_parent_relative_link() {
        let base = Url::parse("https://example.com/a/b/c").unwrap();
        let result = resolve_link(&base, "../d").unwrap();
        assert_eq!(result.as_str(), "https://example.com/a/d");
    }

    #[test]
    fn test_resolve_rejects_unsupported_scheme() {
        let base = Url::parse("https://example.com/").unwrap();
        assert!(resolve_link(&base, "mailto:admin@example.com").is_err());
        assert!(resolve_link(&base, "javascript:void(0)").is_err());
    }
}
