//! Data models for ingested reports and harvested images.
//!
//! This module defines the core data structures shared by the pipeline,
//! the store, and the read API:
//! - [`NewReport`] / [`Report`]: an article before and after persistence
//! - [`NewImage`] / [`ReportImage`]: a harvested image blob before and after persistence
//! - [`SourceKind`]: which discovery path produced an article
//! - [`MatchTier`]: which keyword tier gated an article in
//!
//! Retrieval timestamps are stored as RFC 3339 UTC text with whole seconds,
//! which keeps them fixed-width and lexicographically comparable in SQL.
//! Publication dates stay as the free-text strings feeds and pages supply.

use chrono::{DateTime, Utc};

/// Which discovery path produced an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Discovered through keyword web search.
    Web,
    /// Discovered through the configured RSS feed list.
    Rss,
}

impl SourceKind {
    /// The label stored in the `source` column and returned by the API.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Web => "Web Article",
            SourceKind::Rss => "RSS Feed",
        }
    }
}

/// Which keyword tier matched an article's content.
///
/// Primary-tier hits win even when secondary terms are also present;
/// the secondary tier is only consulted when no primary keyword matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    First,
    Second,
}

impl MatchTier {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchTier::First => "first",
            MatchTier::Second => "second",
        }
    }
}

/// A fully processed article ready for insertion.
///
/// Produced by the pipeline after extraction, gating, and summarization.
/// `summary` and `title` are `None` when generation failed or was skipped;
/// the record is still written.
#[derive(Debug, Clone)]
pub struct NewReport {
    /// Discovery path of the article.
    pub source: SourceKind,
    /// Moment the article was ingested, UTC.
    pub date_of_retrieval: DateTime<Utc>,
    /// Publication date as supplied by the feed, or today's date for
    /// web-search articles, `YYYY-MM-DD`.
    pub date_of_publication: String,
    /// Canonical article URL. Natural key; exact string, no normalization.
    pub url: String,
    /// Publishing company or site name mined from page metadata.
    pub company: String,
    /// Extracted paragraph text.
    pub content: String,
    /// Matched keywords, comma-joined in configured order.
    pub keyword: String,
    /// Content type label.
    pub content_type: String,
    /// Structured-markup summary, when generation succeeded.
    pub summary: Option<String>,
    /// Generated title, when summarization succeeded.
    pub title: Option<String>,
}

/// A persisted report row as read back from the store.
#[derive(Debug, Clone)]
pub struct Report {
    pub id: i64,
    pub source: String,
    /// RFC 3339 UTC text, e.g. `2025-08-23T09:15:02Z`.
    pub date_of_retrieval: String,
    pub date_of_publication: Option<String>,
    pub url: String,
    pub company: Option<String>,
    pub content: Option<String>,
    pub keyword: Option<String>,
    pub content_type: Option<String>,
    pub summary: Option<String>,
    pub title: Option<String>,
}

impl Report {
    /// Render the retrieval timestamp as `YYYY-MM-DD HH:MM:SS` for API
    /// responses. Falls back to the stored text if it is not valid RFC 3339.
    pub fn display_retrieval(&self) -> String {
        match DateTime::parse_from_rfc3339(&self.date_of_retrieval) {
            Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Err(_) => self.date_of_retrieval.clone(),
        }
    }

    /// True when a non-empty summary is stored.
    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// A harvested image ready for insertion.
#[derive(Debug, Clone)]
pub struct NewImage {
    /// URL of the article page the image was found on. Weak reference,
    /// not a foreign key.
    pub report_url: String,
    /// 1-based position among all `<img>` elements on the page, counting
    /// elements that were filtered out or failed to download.
    pub page_number: i64,
    /// The article's matched keywords.
    pub keyword: String,
    /// Raw image bytes.
    pub image_data: Vec<u8>,
    /// MIME label from the download's `Content-Type` header.
    pub content_type: String,
}

/// A persisted image row as read back from the store.
#[derive(Debug, Clone)]
pub struct ReportImage {
    pub id: i64,
    pub report_url: String,
    pub page_number: i64,
    pub keyword: Option<String>,
    pub image_data: Vec<u8>,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> Report {
        Report {
            id: 1,
            source: "Web Article".to_string(),
            date_of_retrieval: "2025-08-23T09:15:02Z".to_string(),
            date_of_publication: Some("2025-08-23".to_string()),
            url: "https://example.com/story".to_string(),
            company: Some("Example".to_string()),
            content: Some("content".to_string()),
            keyword: Some("ESG".to_string()),
            content_type: Some("Web Article".to_string()),
            summary: None,
            title: None,
        }
    }

    #[test]
    fn test_source_kind_labels() {
        assert_eq!(SourceKind::Web.as_str(), "Web Article");
        assert_eq!(SourceKind::Rss.as_str(), "RSS Feed");
    }

    #[test]
    fn test_match_tier_labels() {
        assert_eq!(MatchTier::First.as_str(), "first");
        assert_eq!(MatchTier::Second.as_str(), "second");
    }

    #[test]
    fn test_display_retrieval_formats_rfc3339() {
        let report = sample_report();
        assert_eq!(report.display_retrieval(), "2025-08-23 09:15:02");
    }

    #[test]
    fn test_display_retrieval_falls_back_on_garbage() {
        let mut report = sample_report();
        report.date_of_retrieval = "not a timestamp".to_string();
        assert_eq!(report.display_retrieval(), "not a timestamp");
    }

    #[test]
    fn test_has_summary() {
        let mut report = sample_report();
        assert!(!report.has_summary());
        report.summary = Some(String::new());
        assert!(!report.has_summary());
        report.summary = Some("<p>text</p>".to_string());
        assert!(report.has_summary());
    }
}
