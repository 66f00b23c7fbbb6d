//! The scrape batch: discovery, gating, summarization, and persistence.
//!
//! One [`run`] call executes both discovery passes in order:
//!
//! 1. **Web search**: keyword queries against the news search endpoint,
//!    each candidate ingested with today's date as its publication date.
//! 2. **RSS**: the configured feed list, each feed skipped wholesale while
//!    on cool-down, surviving entries ingested with the feed's publish date.
//!
//! Both passes share one per-article path: dedup by exact URL, extract
//! paragraph text, mine the company name, gate on the keyword tiers,
//! summarize, and insert. Articles from RSS feeds only get a summary when
//! their extracted text is long enough to be worth the model call.

use chrono::{Duration, Utc};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::RadarConfig;
use crate::db::Store;
use crate::models::{NewReport, SourceKind};
use crate::sources::{rss, web_search};
use crate::summarizer::Summarize;
use crate::utils::truncate_for_log;
use crate::{extract, format, images, keywords};

/// RSS articles at or below this many characters of extracted text are
/// stored without attempting summarization.
const RSS_SUMMARY_MIN_CHARS: usize = 1000;

/// Counters reported at the end of a scrape batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchStats {
    pub web_added: usize,
    pub rss_added: usize,
}

/// One discovered article URL with its source attribution.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    url: &'a str,
    source: SourceKind,
    /// Publication date stored with the report, `YYYY-MM-DD`.
    published: &'a str,
}

/// Why an article candidate did or did not become a stored report.
#[derive(Debug, PartialEq, Eq)]
enum IngestOutcome {
    /// Stored. Carries the comma-joined keyword string for image harvesting.
    Added { keyword: String },
    /// The exact URL is already in the store.
    Duplicate,
    /// Extraction failed or produced no paragraph text.
    NoContent,
    /// No keyword from either tier occurs in the text.
    NoKeywordMatch,
}

/// Run one full scrape batch over both discovery passes.
#[instrument(level = "info", skip_all)]
pub async fn run<S: Summarize>(
    store: &Store,
    config: &RadarConfig,
    summarizer: &S,
) -> anyhow::Result<BatchStats> {
    let client = extract::build_client()?;
    let mut stats = BatchStats::default();

    info!("Discovering web articles");
    let today = Utc::now().format("%Y-%m-%d").to_string();
    for url in web_search::discover_urls(&client, config).await {
        let candidate = Candidate {
            url: &url,
            source: SourceKind::Web,
            published: &today,
        };
        match ingest_article(&client, store, summarizer, config, candidate).await? {
            IngestOutcome::Added { .. } => {
                stats.web_added += 1;
                info!(%url, "Web article saved");
            }
            outcome => debug!(%url, ?outcome, "Web candidate skipped"),
        }
    }

    info!("Fetching RSS feeds");
    for feed_url in &config.rss_feeds {
        if config.feed_cooldown_days > 0 {
            let domain = rss::feed_domain(feed_url);
            let cutoff = Utc::now() - Duration::days(config.feed_cooldown_days);
            if store.recent_feed_activity(&domain, cutoff)? {
                info!(
                    %feed_url,
                    days = config.feed_cooldown_days,
                    "Feed used recently; skipping"
                );
                continue;
            }
        }
        for entry in rss::fetch_feed_entries(&client, feed_url, config.lookback_days).await {
            debug!(url = %entry.url, title = %entry.title, "Feed entry candidate");
            let candidate = Candidate {
                url: &entry.url,
                source: SourceKind::Rss,
                published: &entry.published,
            };
            match ingest_article(&client, store, summarizer, config, candidate).await? {
                IngestOutcome::Added { .. } => {
                    stats.rss_added += 1;
                    info!(url = %entry.url, "RSS article saved");
                }
                outcome => debug!(url = %entry.url, ?outcome, "RSS entry skipped"),
            }
        }
    }

    info!(
        web_added = stats.web_added,
        rss_added = stats.rss_added,
        "Scrape batch complete"
    );
    Ok(stats)
}

/// Fetch one candidate URL and run it through the ingest path, harvesting
/// page images when it is stored.
#[instrument(level = "debug", skip_all, fields(url = %candidate.url))]
async fn ingest_article<S: Summarize>(
    client: &Client,
    store: &Store,
    summarizer: &S,
    config: &RadarConfig,
    candidate: Candidate<'_>,
) -> anyhow::Result<IngestOutcome> {
    if store.url_exists(candidate.url)? {
        return Ok(IngestOutcome::Duplicate);
    }
    let Some((content, html)) = extract::extract_article(client, candidate.url).await else {
        return Ok(IngestOutcome::NoContent);
    };
    debug!(preview = %truncate_for_log(&content, 160), "Extracted content");
    let outcome = process_content(store, summarizer, config, candidate, &content, &html).await?;
    if let IngestOutcome::Added { keyword } = &outcome {
        match images::harvest_images(client, store, candidate.url, keyword).await {
            Ok(count) => debug!(count, "Harvested article images"),
            Err(e) => warn!(error = %e, "Image harvest failed"),
        }
    }
    Ok(outcome)
}

/// Gate, summarize, and store one extracted article.
async fn process_content<S: Summarize>(
    store: &Store,
    summarizer: &S,
    config: &RadarConfig,
    candidate: Candidate<'_>,
    content: &str,
    html: &str,
) -> anyhow::Result<IngestOutcome> {
    if store.url_exists(candidate.url)? {
        return Ok(IngestOutcome::Duplicate);
    }
    if content.is_empty() {
        return Ok(IngestOutcome::NoContent);
    }

    let company = extract::company_name(html, candidate.url);
    let Some((matched, tier)) = keywords::match_keywords(
        content,
        &config.first_priority_keywords,
        &config.second_priority_keywords,
    ) else {
        return Ok(IngestOutcome::NoKeywordMatch);
    };
    let keyword = matched.join(", ");
    debug!(%keyword, tier = tier.as_str(), "Keywords matched");

    let raw_summary = match candidate.source {
        SourceKind::Web => summarizer.summarize(content).await,
        SourceKind::Rss => {
            if content.chars().count() > RSS_SUMMARY_MIN_CHARS {
                summarizer.summarize(content).await
            } else {
                debug!("Content too short for RSS summarization");
                None
            }
        }
    };
    let summary = raw_summary
        .map(|raw| format::format_summary(&raw))
        .filter(|s| !s.is_empty());
    let title = match &summary {
        Some(summary) => summarizer.title(summary).await,
        None => None,
    };

    let report = NewReport {
        source: candidate.source,
        date_of_retrieval: Utc::now(),
        date_of_publication: candidate.published.to_string(),
        url: candidate.url.to_string(),
        company,
        content: content.to_string(),
        keyword: keyword.clone(),
        content_type: "Web Article".to_string(),
        summary,
        title,
    };
    store.insert_report(&report)?;
    Ok(IngestOutcome::Added { keyword })
}
