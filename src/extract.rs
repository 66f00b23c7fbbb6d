//! Article content extraction and page metadata mining.
//!
//! Candidate pages are fetched with a fixed browser-like header set and
//! parsed into plain paragraph text: the text of every `<p>` element longer
//! than 40 characters, newline-joined. The 40-character floor drops
//! navigation links, bylines, and cookie-banner fragments. The raw HTML is
//! kept alongside the text for company-name mining and image harvesting.
//!
//! Any network or parse failure is logged and yields `None`; callers skip
//! the URL and continue the batch.

use once_cell::sync::Lazy;
use reqwest::Client;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::utils::upcase;

/// Browser-like user agent sent on every outbound page fetch.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Timeout for article page fetches.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum paragraph length, in characters, to count as article content.
const MIN_PARAGRAPH_CHARS: usize = 40;

static P_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static OG_SITE_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:site_name"]"#).unwrap());
static META_AUTHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="author"]"#).unwrap());

/// Build the HTTP client used for all outbound fetches.
///
/// Carries the fixed user agent plus `Accept-Language` and `Referer`
/// headers on every request. Timeouts are set per request, since page
/// fetches and image downloads use different budgets.
pub fn build_client() -> anyhow::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Fetch a page and return its HTML body.
///
/// Non-2xx responses count as failures. Any failure is logged and returns
/// `None` so the caller can skip the URL.
#[instrument(level = "debug", skip_all, fields(%url))]
pub async fn fetch_page(client: &Client, url: &str, timeout: Duration) -> Option<String> {
    let result = async {
        client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
    .await;

    match result {
        Ok(body) => Some(body),
        Err(e) => {
            warn!(%url, error = %e, "Page fetch failed");
            None
        }
    }
}

/// Fetch a candidate URL and extract its paragraph text.
///
/// # Returns
///
/// `Some((text, raw_html))` on a successful fetch (`text` may still be
/// empty when the page has no qualifying paragraphs), or `None` when the
/// fetch failed.
pub async fn extract_article(client: &Client, url: &str) -> Option<(String, String)> {
    let html = fetch_page(client, url, PAGE_TIMEOUT).await?;
    let text = paragraph_text(&html);
    debug!(%url, chars = text.chars().count(), "Extracted paragraph text");
    Some((text, html))
}

/// Concatenate the text of every paragraph longer than 40 characters.
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&P_SELECTOR)
        .filter_map(|p| {
            let text: String = p.text().collect();
            let text = text.trim();
            (text.chars().count() > MIN_PARAGRAPH_CHARS).then(|| text.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Mine the publishing company or site name from page metadata.
///
/// Tried in order: `og:site_name` meta content, `author` meta content, the
/// `<title>` text (taking the segment after the last `-` or `|` separator),
/// and finally the URL's host with any `www.` prefix dropped and the first
/// label capitalized. Returns `"General"` when nothing usable is found.
pub fn company_name(html: &str, url: &str) -> String {
    if html.is_empty() {
        return "General".to_string();
    }
    let document = Html::parse_document(html);

    for selector in [&*OG_SITE_NAME, &*META_AUTHOR] {
        if let Some(meta) = document.select(selector).next() {
            if let Some(content) = meta.value().attr("content") {
                let content = content.trim();
                if !content.is_empty() {
                    return content.to_string();
                }
            }
        }
    }

    if let Some(title) = document.select(&TITLE_SELECTOR).next() {
        let title: String = title.text().collect();
        let title = title.trim();
        if !title.is_empty() {
            if title.contains('-') {
                if let Some(tail) = title.split('-').next_back() {
                    return tail.trim().to_string();
                }
            }
            if title.contains('|') {
                if let Some(tail) = title.split('|').next_back() {
                    return tail.trim().to_string();
                }
            }
            return title.to_string();
        }
    }

    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .and_then(|host| {
            let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
            host.split('.').next().map(upcase)
        })
        .unwrap_or_else(|| "General".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_text_filters_short_paragraphs() {
        let html = r#"
            <html><body>
            <p>Short nav link</p>
            <p>This paragraph is comfortably longer than forty characters and stays.</p>
            <p>Menu</p>
            <p>Another qualifying paragraph that also clears the forty character bar.</p>
            </body></html>
        "#;
        let text = paragraph_text(html);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("This paragraph"));
        assert!(lines[1].starts_with("Another qualifying"));
    }

    #[test]
    fn test_paragraph_text_boundary_is_exclusive() {
        let exactly_forty = "a".repeat(40);
        let forty_one = "b".repeat(41);
        let html = format!("<p>{exactly_forty}</p><p>{forty_one}</p>");
        let text = paragraph_text(&html);
        assert_eq!(text, forty_one);
    }

    #[test]
    fn test_paragraph_text_concatenates_nested_markup() {
        let html =
            "<p>Sensor networks <b>measure</b> fine particulate matter in real time.</p>";
        assert_eq!(
            paragraph_text(html),
            "Sensor networks measure fine particulate matter in real time."
        );
    }

    #[test]
    fn test_paragraph_text_empty_document() {
        assert_eq!(paragraph_text("<html><body></body></html>"), "");
    }

    #[test]
    fn test_company_name_prefers_og_site_name() {
        let html = r#"
            <html><head>
            <meta property="og:site_name" content="CleanTechnica">
            <meta name="author" content="Jane Writer">
            <title>Story - Other Site</title>
            </head></html>
        "#;
        assert_eq!(company_name(html, "https://example.com/x"), "CleanTechnica");
    }

    #[test]
    fn test_company_name_falls_back_to_author() {
        let html = r#"
            <html><head>
            <meta name="author" content="ESG Today">
            <title>Story - Other Site</title>
            </head></html>
        "#;
        assert_eq!(company_name(html, "https://example.com/x"), "ESG Today");
    }

    #[test]
    fn test_company_name_title_takes_segment_after_last_dash() {
        let html = "<html><head><title>Air sensors roll out - City desk - Acme News</title></head></html>";
        assert_eq!(company_name(html, "https://example.com/x"), "Acme News");
    }

    #[test]
    fn test_company_name_title_pipe_separator() {
        let html = "<html><head><title>Air sensors roll out | Acme News</title></head></html>";
        assert_eq!(company_name(html, "https://example.com/x"), "Acme News");
    }

    #[test]
    fn test_company_name_plain_title() {
        let html = "<html><head><title>Acme News</title></head></html>";
        assert_eq!(company_name(html, "https://example.com/x"), "Acme News");
    }

    #[test]
    fn test_company_name_host_fallback() {
        let html = "<html><head></head><body></body></html>";
        assert_eq!(
            company_name(html, "https://www.cleantechnica.com/2025/08/story"),
            "Cleantechnica"
        );
    }

    #[test]
    fn test_company_name_empty_html() {
        assert_eq!(company_name("", "https://example.com/x"), "General");
    }
}
