//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests with a streaming byte ceiling
//! - Capturing (but never following) redirects
//! - Error classification into synthetic code-0 outcomes

use crate::config::Config;
use reqwest::{header, redirect::Policy, Client};
use std::time::{Duration, Instant};
use url::Url;

/// Outcome of a single fetch attempt
///
/// Fetch failures are data, not errors: anything that stops an HTTP response
/// from arriving (timeout, DNS, connection refused) is recorded as code 0
/// with a synthetic message, so the caller can persist it like any other
/// outcome.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code; 0 when no response arrived
    pub http_code: u16,

    /// Status reason phrase, or a synthetic failure description for code 0
    pub http_message: Option<String>,

    /// Content-Type with parameters stripped (e.g. "text/html")
    pub mime_type: Option<String>,

    /// The response body; absent for redirects, errors, and oversize pages
    pub body: Option<String>,

    /// Observed size in bytes (header value when it already proves an
    /// overage, otherwise bytes actually read)
    pub file_size: Option<i64>,

    /// Wall-clock time of the whole request, in seconds
    pub download_duration: f64,

    /// Resolved Location target of a 3xx response
    pub redirect: Option<String>,

    /// True when the body exceeded the byte ceiling
    pub oversize: bool,
}

impl FetchResult {
    fn failure(message: String, download_duration: f64) -> Self {
        Self {
            http_code: 0,
            http_message: Some(message),
            mime_type: None,
            body: None,
            file_size: None,
            download_duration,
            redirect: None,
            oversize: false,
        }
    }

    /// True for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.http_code)
    }

    /// True when the content type is parseable HTML
    pub fn is_html(&self) -> bool {
        matches!(
            self.mime_type.as_deref(),
            Some("text/html") | Some("application/xhtml+xml")
        )
    }
}

/// Builds the HTTP client used for every fetch
///
/// Redirects are handled manually so a 3xx can be recorded as the fetched
/// page's outcome; the per-request timeout comes from the limits config.
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.site.user_agent.clone())
        .timeout(Duration::from_secs(config.limits.fetch_timeout))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL once, enforcing the byte ceiling while streaming
///
/// # Request Flow
///
/// 1. Send GET; any transport failure becomes a code-0 result
/// 2. 3xx: resolve the Location header against the request URL, keep it as
///    `redirect`, read no body
/// 3. Non-2xx: record code and reason verbatim, read no body
/// 4. 2xx: if Content-Length already exceeds `max_bytes`, flag oversize
///    without downloading; otherwise stream chunks and abort as soon as the
///    running total passes the ceiling
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `max_bytes` - Byte ceiling for the response body
pub async fn fetch_url(client: &Client, url: &Url, max_bytes: u64) -> FetchResult {
    let started = Instant::now();

    let mut response = match client.get(url.clone()).send().await {
        Ok(r) => r,
        Err(e) => {
            return FetchResult::failure(describe_error(&e), started.elapsed().as_secs_f64())
        }
    };

    let status = response.status();
    let http_code = status.as_u16();
    let http_message = status.canonical_reason().map(str::to_string);
    let mime_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

    if status.is_redirection() {
        let redirect = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|location| url.join(location).ok())
            .map(|target| target.to_string());

        return FetchResult {
            http_code,
            http_message,
            mime_type,
            body: None,
            file_size: None,
            download_duration: started.elapsed().as_secs_f64(),
            redirect,
            oversize: false,
        };
    }

    if !status.is_success() {
        // 4xx/5xx are recorded verbatim; the body is of no interest
        return FetchResult {
            http_code,
            http_message,
            mime_type,
            body: None,
            file_size: None,
            download_duration: started.elapsed().as_secs_f64(),
            redirect: None,
            oversize: false,
        };
    }

    // The header can prove an overage before any bytes move
    if let Some(length) = response.content_length() {
        if length > max_bytes {
            return FetchResult {
                http_code,
                http_message,
                mime_type,
                body: None,
                file_size: Some(length as i64),
                download_duration: started.elapsed().as_secs_f64(),
                redirect: None,
                oversize: true,
            };
        }
    }

    let mut bytes: Vec<u8> = Vec::new();
    let mut total: u64 = 0;
    let mut oversize = false;

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                total += chunk.len() as u64;
                if total > max_bytes {
                    oversize = true;
                    break;
                }
                bytes.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => {
                return FetchResult::failure(describe_error(&e), started.elapsed().as_secs_f64())
            }
        }
    }

    let download_duration = started.elapsed().as_secs_f64();

    if oversize {
        return FetchResult {
            http_code,
            http_message,
            mime_type,
            body: None,
            file_size: Some(total as i64),
            download_duration,
            redirect: None,
            oversize: true,
        };
    }

    FetchResult {
        http_code,
        http_message,
        mime_type,
        body: Some(String::from_utf8_lossy(&bytes).into_owned()),
        file_size: Some(total as i64),
        download_duration,
        redirect: None,
        oversize: false,
    }
}

/// Maps transport errors to the message stored in `http_message`
fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection failed".to_string()
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LimitsConfig, OutputConfig, ScheduleConfig, SiteConfig};

    fn create_test_config() -> Config {
        Config {
            site: SiteConfig {
                seed_url: "https://example.com/".to_string(),
                user_agent: "linkrot-test/1.0".to_string(),
            },
            limits: LimitsConfig::default(),
            schedule: ScheduleConfig::default(),
            output: OutputConfig {
                database_path: "./test.db".to_string(),
            },
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&create_test_config()).is_ok());
    }

    #[test]
    fn test_failure_result_shape() {
        let result = FetchResult::failure("Request timeout".to_string(), 30.0);
        assert_eq!(result.http_code, 0);
        assert_eq!(result.http_message, Some("Request timeout".to_string()));
        assert!(result.body.is_none());
        assert!(!result.is_success());
        assert!(!result.is_html());
    }

    #[test]
    fn test_is_html_requires_html_mime() {
        let mut result = FetchResult::failure("x".to_string(), 0.0);
        result.http_code = 200;

        result.mime_type = Some("text/html".to_string());
        assert!(result.is_html());

        result.mime_type = Some("application/xhtml+xml".to_string());
        assert!(result.is_html());

        result.mime_type = Some("application/pdf".to_string());
        assert!(!result.is_html());

        result.mime_type = None;
        assert!(!result.is_html());
    }

    // Live request/response behavior (redirect capture, byte ceiling,
    // timeouts) is covered with mock servers in the integration tests.
}
