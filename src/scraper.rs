use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use reqwest::header::USER_AGENT;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

use crate::providers::http_errors::http_request_error;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const MAX_SCRAPED_CHARS: usize = 1500;

// Wide enough that html2text never wraps inside a paragraph.
const RENDER_WIDTH: usize = 10_000;

pub type ScrapeFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a>>;

pub trait WebScraper {
    /// Fetches `url` and returns at most [`MAX_SCRAPED_CHARS`] characters of
    /// visible text.
    fn scrape<'a>(&'a self, url: &'a str) -> ScrapeFuture<'a>;
}

pub struct HttpScraper<'a> {
    client: &'a Client,
}

impl<'a> HttpScraper<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl WebScraper for HttpScraper<'_> {
    fn scrape<'a>(&'a self, url: &'a str) -> ScrapeFuture<'a> {
        Box::pin(fetch_visible_text(self.client, url))
    }
}

async fn fetch_visible_text(client: &Client, url: &str) -> Result<String> {
    debug!(url = %url, "fetching page");
    let response = client
        .get(url)
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .await
        .map_err(|err| {
            warn!(url = %url, error = %err, "page request failed");
            http_request_error(err, url, "website")
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!(url = %url, status = %status, "page returned non-success status");
        return Err(anyhow!("{} returned status {}", url, status));
    }

    let html = response
        .text()
        .await
        .with_context(|| format!("Failed to read body of {url}"))?;
    let text = visible_text(&html)?;
    debug!(url = %url, html_len = html.len(), text_len = text.len(), "extracted page text");
    Ok(text)
}

/// Renders HTML to plain text, collapses whitespace, and truncates the result
/// on a character boundary.
pub fn visible_text(html: &str) -> Result<String> {
    let rendered = html2text::from_read(html.as_bytes(), RENDER_WIDTH)
        .map_err(|err| anyhow!("Failed to extract text from HTML: {err}"))?;
    let collapsed = rendered.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(truncate_chars(&collapsed, MAX_SCRAPED_CHARS))
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
