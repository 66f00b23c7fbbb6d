//! Keyword web search over the Google News RSS search endpoint.
//!
//! Each keyword becomes one query; result links are collected per keyword
//! with a per-tier cap. Primary keywords are always queried; secondary
//! keywords only when the primary pass produced too few candidates. The
//! merged list is deduplicated exact-string, preserving first-seen order.

use itertools::Itertools;
use reqwest::Client;
use tracing::{info, instrument, warn};

use super::rss;
use crate::config::RadarConfig;

const SEARCH_BASE: &str = "https://news.google.com/rss/search";

/// Discover candidate article URLs from the configured keyword tiers.
#[instrument(level = "info", skip_all)]
pub async fn discover_urls(client: &Client, config: &RadarConfig) -> Vec<String> {
    let mut discovered: Vec<String> = Vec::new();

    for keyword in &config.first_priority_keywords {
        let links = search_keyword(client, keyword, config.search_results_per_primary).await;
        discovered.extend(links);
    }

    if discovered.len() < config.min_search_candidates {
        info!(
            count = discovered.len(),
            min = config.min_search_candidates,
            "Primary keywords yielded few candidates; querying secondary tier"
        );
        for keyword in &config.second_priority_keywords {
            let links = search_keyword(client, keyword, config.search_results_per_secondary).await;
            discovered.extend(links);
        }
    }

    let urls: Vec<String> = discovered.into_iter().unique().collect();
    info!(count = urls.len(), "Discovered web candidates");
    urls
}

/// Run one keyword query and return up to `limit` result links.
///
/// A failed query logs a warning and contributes zero results.
async fn search_keyword(client: &Client, keyword: &str, limit: usize) -> Vec<String> {
    let url = search_url(keyword);
    let xml = match fetch_results(client, &url).await {
        Ok(xml) => xml,
        Err(e) => {
            warn!(%keyword, error = %e, "Search query failed");
            return Vec::new();
        }
    };
    match rss::parse_channel(&xml) {
        Ok(items) => items.into_iter().map(|item| item.link).take(limit).collect(),
        Err(e) => {
            warn!(%keyword, error = %e, "Search results failed to parse");
            Vec::new()
        }
    }
}

async fn fetch_results(client: &Client, url: &str) -> anyhow::Result<String> {
    let body = client
        .get(url)
        .timeout(rss::FEED_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

fn search_url(keyword: &str) -> String {
    format!(
        "{SEARCH_BASE}?q={}&hl=en&gl=US&ceid=US:en",
        urlencoding::encode(keyword)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_keyword() {
        let url = search_url("indoor air quality");
        assert_eq!(
            url,
            "https://news.google.com/rss/search?q=indoor%20air%20quality&hl=en&gl=US&ceid=US:en"
        );
    }

    #[test]
    fn test_search_url_escapes_reserved_characters() {
        let url = search_url("ESG & air");
        assert!(url.contains("ESG%20%26%20air"));
        assert!(!url.contains("ESG & air"));
    }
}
