//! Image harvesting from ingested article pages.
//!
//! After an article is stored, its page is fetched once more and every
//! raster `<img>` is downloaded and persisted alongside the report. The
//! whole pass is best-effort: a page or image that fails to download is
//! skipped and the batch moves on.

use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration as StdDuration;
use tracing::{debug, instrument, warn};

use crate::db::Store;
use crate::models::NewImage;

const PAGE_TIMEOUT: StdDuration = StdDuration::from_secs(20);
const IMAGE_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Extensions accepted for download, checked against the lowercased raw
/// `src` value.
const RASTER_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".webp"];

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// A downloadable image found on an article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImageCandidate {
    /// 1-based position among all `<img>` elements on the page, including
    /// the ones that were filtered out.
    pub page_number: i64,
    pub url: String,
}

/// Download and store every raster image found on the page.
///
/// Returns the number of images stored. Fetch failures are logged and
/// skipped; only a store failure surfaces as an error.
#[instrument(level = "debug", skip_all, fields(%page_url))]
pub async fn harvest_images(
    client: &Client,
    store: &Store,
    page_url: &str,
    keyword: &str,
) -> anyhow::Result<usize> {
    let html = match fetch_page(client, page_url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "Image page fetch failed");
            return Ok(0);
        }
    };

    let mut images = Vec::new();
    for candidate in image_candidates(&html, page_url) {
        match download_image(client, &candidate.url).await {
            Some((image_data, content_type)) => images.push(NewImage {
                report_url: page_url.to_string(),
                page_number: candidate.page_number,
                keyword: keyword.to_string(),
                image_data,
                content_type,
            }),
            None => continue,
        }
    }
    if images.is_empty() {
        return Ok(0);
    }

    let stored = store.insert_images(&images)?;
    debug!(count = stored, "Stored page images");
    Ok(stored)
}

async fn fetch_page(client: &Client, page_url: &str) -> anyhow::Result<String> {
    // the page served with an error status still gets scanned for images
    let html = client
        .get(page_url)
        .timeout(PAGE_TIMEOUT)
        .send()
        .await?
        .text()
        .await?;
    Ok(html)
}

/// Download one image, returning its bytes and MIME label.
async fn download_image(client: &Client, src: &str) -> Option<(Vec<u8>, String)> {
    let resp = match client.get(src).timeout(IMAGE_TIMEOUT).send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(%src, error = %e, "Image download failed");
            return None;
        }
    };
    if resp.status() != reqwest::StatusCode::OK {
        debug!(%src, status = %resp.status(), "Image download skipped");
        return None;
    }
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/png")
        .to_string();
    match resp.bytes().await {
        Ok(bytes) => Some((bytes.to_vec(), content_type)),
        Err(e) => {
            warn!(%src, error = %e, "Image body read failed");
            None
        }
    }
}

/// Scan page markup for downloadable raster images.
///
/// Every `<img>` element counts toward `page_number`, but only sources
/// ending in a raster extension become candidates. Protocol-relative and
/// root-relative sources are resolved against the page; anything else is
/// returned as written.
pub(crate) fn image_candidates(html: &str, page_url: &str) -> Vec<ImageCandidate> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();
    for (i, element) in document.select(&IMG).enumerate() {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        let lower = src.to_lowercase();
        if !RASTER_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            continue;
        }
        candidates.push(ImageCandidate {
            page_number: (i + 1) as i64,
            url: resolve_src(src, page_url),
        });
    }
    candidates
}

fn resolve_src(src: &str, page_url: &str) -> String {
    if src.starts_with("//") {
        return format!("https:{src}");
    }
    if src.starts_with('/') {
        if let Ok(page) = url::Url::parse(page_url) {
            return format!("{}{}", page.origin().ascii_serialization(), src);
        }
    }
    src.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://news.example.com/story/42";

    #[test]
    fn test_page_numbers_count_skipped_images() {
        let html = r#"
            <html><body>
                <img src="/logo.svg">
                <img src="/photo.png">
                <img>
                <img src="//cdn.example.org/chart.JPG">
            </body></html>
        "#;
        let candidates = image_candidates(html, PAGE_URL);
        assert_eq!(
            candidates,
            vec![
                ImageCandidate {
                    page_number: 2,
                    url: "https://news.example.com/photo.png".to_string(),
                },
                ImageCandidate {
                    page_number: 4,
                    url: "https://cdn.example.org/chart.JPG".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_extension_filter_uses_raw_source() {
        let html = r#"<img src="/a.gif"><img src="/b.png?w=200"><img src=""><img src="/c.webp">"#;
        let candidates = image_candidates(html, PAGE_URL);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].page_number, 4);
        assert_eq!(candidates[0].url, "https://news.example.com/c.webp");
    }

    #[test]
    fn test_absolute_source_passes_through() {
        let html = r#"<img src="https://other.example.net/pic.jpeg">"#;
        let candidates = image_candidates(html, PAGE_URL);
        assert_eq!(candidates[0].url, "https://other.example.net/pic.jpeg");
    }

    #[test]
    fn test_relative_source_left_as_written() {
        let html = r#"<img src="images/pic.png">"#;
        let candidates = image_candidates(html, PAGE_URL);
        assert_eq!(candidates[0].url, "images/pic.png");
    }

    #[test]
    fn test_root_relative_resolution_keeps_port() {
        let html = r#"<img src="/pic.png">"#;
        let candidates = image_candidates(html, "http://example.com:8080/a/b");
        assert_eq!(candidates[0].url, "http://example.com:8080/pic.png");
    }
}
