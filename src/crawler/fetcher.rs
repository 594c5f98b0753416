//! HTTP fetching
//!
//! One shared client, fixed browser-like headers, hard deadlines. A page
//! fetch succeeds only on status 200 with an HTML content type; everything
//! else is classified so the caller can decide what feeds origin error
//! statistics.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const ACCEPT_CHAIN: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANG: &str = "en-US,en;q=0.5";

/// Whole-request deadline
const TOTAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection-establishment deadline
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one page fetch
#[derive(Debug)]
pub enum PageFetch {
    /// 200 + HTML; body decoded as UTF-8 (lossy on invalid sequences)
    Success {
        body: String,
        /// Length of the decoded body, what byte accounting records
        byte_count: usize,
    },

    /// Non-200 response; feeds origin error stats
    Status(u16),

    /// 200 but not HTML; skipped without counting an error
    ContentType(String),

    /// DNS / connect / read / timeout failure; feeds origin error stats
    Transport(String),
}

/// Outcome of one image fetch
#[derive(Debug)]
pub enum ImageFetch {
    Success(Vec<u8>),
    Status(u16),
    Transport(String),
}

/// Builds the shared HTTP client
///
/// Redirects follow reqwest's default policy; no cookies are kept.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_CHAIN));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANG));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(TOTAL_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one page
pub async fn fetch_page(client: &Client, url: &str) -> PageFetch {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return PageFetch::Transport(describe_error(&e)),
    };

    let status = response.status();
    if status != StatusCode::OK {
        return PageFetch::Status(status.as_u16());
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    if !content_type.starts_with("text/html") {
        return PageFetch::ContentType(content_type);
    }

    match response.bytes().await {
        Ok(bytes) => {
            let body = match String::from_utf8(bytes.to_vec()) {
                Ok(body) => body,
                Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
            };
            let byte_count = body.len();
            PageFetch::Success { body, byte_count }
        }
        Err(e) => PageFetch::Transport(describe_error(&e)),
    }
}

/// Fetches one image payload; callers gate on decodability, not content type
pub async fn fetch_image(client: &Client, url: &str) -> ImageFetch {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return ImageFetch::Transport(describe_error(&e)),
    };

    let status = response.status();
    if status != StatusCode::OK {
        return ImageFetch::Status(status.as_u16());
    }

    match response.bytes().await {
        Ok(bytes) => ImageFetch::Success(bytes.to_vec()),
        Err(e) => ImageFetch::Transport(describe_error(&e)),
    }
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client().is_ok());
    }

    #[tokio::test]
    async fn test_transport_error_on_unreachable_host() {
        let client = build_http_client().unwrap();
        // Reserved TLD, guaranteed not to resolve
        let result = fetch_page(&client, "http://unreachable.invalid/").await;
        assert!(matches!(result, PageFetch::Transport(_)));
    }

    // Status and content-type gating are exercised against a mock server in
    // the integration suite.
}
