//! HTML parsing: page titles and outbound links
//!
//! Parsing is error tolerant. Malformed markup yields whatever the parser
//! can recover, never a failure.

use scraper::{Html, Selector};
use url::Url;

/// What the parser pulled out of one HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag), whitespace collapsed
    pub title: Option<String>,

    /// All links found on the page, resolved and normalized
    pub links: Vec<Url>,
}

/// Parses one page of HTML into its title and outbound links
///
/// Every `<a href>` in the document is a candidate, including links with
/// `download` or `rel="nofollow"` attributes; nofollow is advice for
/// indexers, not for link checking. Hrefs that cannot be a page are dropped:
/// `javascript:`, `mailto:`, `tel:`, data URIs, and same-page `#` anchors.
/// `base_url` resolves relative hrefs.
///
/// # Example
///
/// ```no_run
/// use linkrot::crawler::parse_html;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let page = parse_html("<title>Home</title><a href=\"/next\">go</a>", &base);
/// assert_eq!(page.title.as_deref(), Some("Home"));
/// assert_eq!(page.links[0].as_str(), "https://example.com/next");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let links = extract_links(&document, base_url);

    ParsedPage { title, links }
}

/// First `<title>` element's text, whitespace collapsed; None when absent or blank
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| {
            let text: String = element.text().collect();
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|s| !s.is_empty())
}

/// Extracts all checkable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_href(href, base_url) {
                    links.push(url);
                }
            }
        }
    }

    links
}

/// Turns a raw href into a normalized absolute URL, or None when the href
/// is not something a crawler can fetch (non-navigable schemes, bare
/// anchors, text that fails to resolve to HTTP or HTTPS).
fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    const SKIP_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

    let href = href.trim();

    // Empty hrefs and same-page anchors point nowhere
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if SKIP_SCHEMES.iter().any(|scheme| href.starts_with(scheme)) {
        return None;
    }

    // Resolution also normalizes and rejects non-HTTP(S) schemes
    crate::url::resolve_link(base_url, href).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/dir/page").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>Test Page</title></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let html = "<html><head><title>  Test\n   Page  </title></head><body></body></html>";
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_empty_title() {
        let html = r#"<html><head><title>   </title></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0].as_str(), "https://other.com/page");
    }

    #[test]
    fn test_extract_root_relative_link() {
        let html = r#"<html><body><a href="/other">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0].as_str(), "https://example.com/other");
    }

    #[test]
    fn test_extract_relative_path_link() {
        let html = r#"<html><body><a href="other">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0].as_str(), "https://example.com/dir/other");
    }

    #[test]
    fn test_extract_parent_relative_link() {
        let html = r#"<html><body><a href="../up">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links[0].as_str(), "https://example.com/up");
    }

    #[test]
    fn test_protocol_relative_link_inherits_scheme() {
        let html = r#"<html><body><a href="//cdn.example.com/lib">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links[0].as_str(), "https://cdn.example.com/lib");
    }

    #[test]
    fn test_skip_javascript_link() {
        let html = r#"<html><body><a href="javascript:void(0)">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_skip_mailto_link() {
        let html = r#"<html><body><a href="mailto:test@example.com">Email</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_skip_tel_link() {
        let html = r#"<html><body><a href="tel:+1234567890">Call</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_skip_data_uri() {
        let html = r#"<html><body><a href="data:text/html,<h1>Test</h1>">Data</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_skip_fragment_only() {
        let html = r##"<html><body><a href="#section">Jump</a></body></html>"##;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_skip_empty_href() {
        let html = r#"<html><body><a href="">A</a><a href="   ">B</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 0);
    }

    #[test]
    fn test_fragment_stripped_from_real_link() {
        let html = r##"<html><body><a href="/page#middle">Link</a></body></html>"##;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
    }

    #[test]
    fn test_query_string_preserved() {
        let html = r#"<html><body><a href="/search?q=rust&page=2">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(
            parsed.links[0].as_str(),
            "https://example.com/search?q=rust&page=2"
        );
    }

    #[test]
    fn test_follow_nofollow_links() {
        let html = r#"<html><body><a href="/page" rel="nofollow">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
    }

    #[test]
    fn test_download_links_included() {
        let html = r#"<html><body><a href="/file.pdf" download>Download</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0].as_str(), "https://example.com/file.pdf");
    }

    #[test]
    fn test_multiple_links_in_document_order() {
        let html = r#"
            <html><body>
                <p>See <a href="/page1">one</a> and <a href="/page2">two</a>,
                or leave via <a href="https://other.com/page3">three</a>.</p>
            </body></html>
        "#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 3);
        assert_eq!(parsed.links[0].as_str(), "https://example.com/page1");
        assert_eq!(parsed.links[2].as_str(), "https://other.com/page3");
    }

    #[test]
    fn test_mixed_valid_and_invalid_links() {
        let html = r#"
            <html><body>
                <a href="/valid">keep</a>
                <a href="javascript:alert(1)">drop</a>
                <a href="mailto:someone@example.com">drop</a>
                <a href="/another-valid">keep</a>
            </body></html>
        "#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 2);
    }

    #[test]
    fn test_duplicate_links_kept() {
        let html = r#"<html><body><a href="/same">A</a><a href="/same">B</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 2);
    }

    #[test]
    fn test_garbage_input_yields_nothing() {
        let html = "<<<%%% not even close to html &&&";
        let parsed = parse_html(html, &base_url());
        assert!(parsed.links.is_empty());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_nested_markup_inside_anchor() {
        let html = r#"<html><body><a href="/deep"><span><b>click</b> me</span></a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links[0].as_str(), "https://example.com/deep");
    }
}
