//! RSS feed polling and channel parsing.
//!
//! Feeds are plain RSS 2.0. Each `<item>`'s `title`, `link`, and `pubDate`
//! are read with a streaming parser (CDATA-aware); entries are then filtered
//! against the lookback window. Entries without a parseable `pubDate` are
//! skipped. The channel parser is shared with the web-search path, whose
//! provider also returns RSS.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use quick_xml::events::{BytesRef, Event};
use reqwest::Client;
use std::time::Duration as StdDuration;
use tracing::{debug, warn};
use url::Url;

/// Timeout for feed and search-result fetches.
pub(crate) const FEED_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// One ingestible feed entry.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: String,
    pub url: String,
    /// Publish date rendered `YYYY-MM-DD`, stored as the report's
    /// publication date.
    pub published: String,
}

/// A raw `<item>` as parsed off the wire, before date filtering.
#[derive(Debug, Default, Clone)]
pub(crate) struct ChannelItem {
    pub title: String,
    pub link: String,
    pub pub_date: String,
}

/// Fetch one feed and return its entries within the lookback window.
///
/// Any fetch or parse failure logs a warning and yields an empty list; the
/// batch moves on to the next feed.
pub async fn fetch_feed_entries(
    client: &Client,
    feed_url: &str,
    lookback_days: i64,
) -> Vec<FeedEntry> {
    let xml = match fetch_feed(client, feed_url).await {
        Ok(xml) => xml,
        Err(e) => {
            warn!(%feed_url, error = %e, "Feed fetch failed");
            return Vec::new();
        }
    };
    match parse_channel(&xml) {
        Ok(items) => {
            let entries = filter_entries(items, lookback_days, Utc::now());
            debug!(%feed_url, count = entries.len(), "Feed entries within lookback");
            entries
        }
        Err(e) => {
            warn!(%feed_url, error = %e, "Feed parse failed");
            Vec::new()
        }
    }
}

async fn fetch_feed(client: &Client, feed_url: &str) -> Result<String> {
    let body = client
        .get(feed_url)
        .timeout(FEED_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

/// Parse an RSS channel and return its items.
pub(crate) fn parse_channel(xml: &str) -> Result<Vec<ChannelItem>> {
    #[derive(Clone, Copy)]
    enum Field {
        Title,
        Link,
        PubDate,
    }

    let mut reader = quick_xml::Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut items = Vec::new();
    let mut current = ChannelItem::default();
    let mut in_item = false;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => {
                    in_item = true;
                    current = ChannelItem::default();
                }
                b"title" if in_item => field = Some(Field::Title),
                b"link" if in_item => field = Some(Field::Link),
                b"pubDate" if in_item => field = Some(Field::PubDate),
                _ => {}
            },
            Ok(Event::Text(e)) if in_item => {
                if let Some(field) = field {
                    let text = e.decode()?;
                    append_field(&mut current, field, &text);
                }
            }
            Ok(Event::CData(e)) if in_item => {
                if let Some(field) = field {
                    let text = String::from_utf8_lossy(&e);
                    append_field(&mut current, field, &text);
                }
            }
            // entity references arrive as their own events, not inside Text
            Ok(Event::GeneralRef(e)) if in_item => {
                if let Some(field) = field {
                    let text = resolve_reference(&e)?;
                    append_field(&mut current, field, &text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" => {
                    in_item = false;
                    field = None;
                    trim_fields(&mut current);
                    if !current.link.is_empty() {
                        items.push(std::mem::take(&mut current));
                    }
                }
                b"title" | b"link" | b"pubDate" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    fn append_field(item: &mut ChannelItem, field: Field, text: &str) {
        let target = match field {
            Field::Title => &mut item.title,
            Field::Link => &mut item.link,
            Field::PubDate => &mut item.pub_date,
        };
        target.push_str(text);
    }

    fn trim_fields(item: &mut ChannelItem) {
        item.title = item.title.trim().to_string();
        item.link = item.link.trim().to_string();
        item.pub_date = item.pub_date.trim().to_string();
    }

    Ok(items)
}

/// Decode a character or predefined entity reference; unknown named
/// entities are kept in their raw `&name;` form.
fn resolve_reference(reference: &BytesRef) -> Result<String> {
    if let Some(ch) = reference.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = String::from_utf8_lossy(reference);
    Ok(match name.as_ref() {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "apos" => "'".to_string(),
        "quot" => "\"".to_string(),
        _ => format!("&{name};"),
    })
}

/// Keep items whose publish date (UTC) falls on or after
/// `today - lookback_days`, so a lookback of 0 keeps entries published today.
pub(crate) fn filter_entries(
    items: Vec<ChannelItem>,
    lookback_days: i64,
    now: DateTime<Utc>,
) -> Vec<FeedEntry> {
    let cutoff = now.date_naive() - Duration::days(lookback_days);
    items
        .into_iter()
        .filter_map(|item| {
            let published = parse_pub_date(&item.pub_date)?;
            (published.date_naive() >= cutoff).then(|| FeedEntry {
                title: item.title,
                url: item.link,
                published: published.format("%Y-%m-%d").to_string(),
            })
        })
        .collect()
}

/// Parse a feed timestamp: RFC 2822 (the RSS norm) with an RFC 3339 fallback.
pub(crate) fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

/// The feed's host with any `www.` prefix dropped, used as the cool-down
/// lookup key against stored article URLs. Falls back to the raw string if
/// the feed URL does not parse.
pub fn feed_domain(feed_url: &str) -> String {
    Url::parse(feed_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").unwrap_or(&host).to_string())
        .unwrap_or_else(|| feed_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Channel title, not an item</title>
    <link>https://example.com</link>
    <item>
      <title><![CDATA[Sensors &amp; cities]]></title>
      <link>https://example.com/sensors</link>
      <pubDate>Sat, 23 Aug 2025 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Plain &amp; simple</title>
      <link>https://example.com/plain</link>
      <pubDate>Fri, 22 Aug 2025 10:30:00 +0000</pubDate>
    </item>
    <item>
      <title>No date entry</title>
      <link>https://example.com/undated</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_channel_reads_items() {
        let items = parse_channel(SAMPLE_FEED).unwrap();
        assert_eq!(items.len(), 3);
        // CDATA content is taken literally, entities in plain text are unescaped
        assert_eq!(items[0].title, "Sensors &amp; cities");
        assert_eq!(items[0].link, "https://example.com/sensors");
        assert_eq!(items[0].pub_date, "Sat, 23 Aug 2025 08:00:00 GMT");
        assert_eq!(items[1].title, "Plain & simple");
        assert_eq!(items[2].pub_date, "");
    }

    #[test]
    fn test_parse_channel_ignores_channel_level_fields() {
        let items = parse_channel(SAMPLE_FEED).unwrap();
        assert!(items.iter().all(|i| i.title != "Channel title, not an item"));
    }

    #[test]
    fn test_parse_pub_date_formats() {
        assert!(parse_pub_date("Sat, 23 Aug 2025 08:00:00 GMT").is_some());
        assert!(parse_pub_date("Fri, 22 Aug 2025 10:30:00 +0000").is_some());
        assert!(parse_pub_date("2025-08-23T08:00:00Z").is_some());
        assert!(parse_pub_date("not a date").is_none());
        assert!(parse_pub_date("").is_none());
    }

    #[test]
    fn test_filter_entries_lookback_zero_keeps_today_only() {
        let now = Utc.with_ymd_and_hms(2025, 8, 23, 12, 0, 0).unwrap();
        let items = parse_channel(SAMPLE_FEED).unwrap();
        let entries = filter_entries(items, 0, now);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://example.com/sensors");
        assert_eq!(entries[0].published, "2025-08-23");
    }

    #[test]
    fn test_filter_entries_wider_lookback() {
        let now = Utc.with_ymd_and_hms(2025, 8, 23, 12, 0, 0).unwrap();
        let items = parse_channel(SAMPLE_FEED).unwrap();
        let entries = filter_entries(items, 1, now);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_filter_entries_drops_undated() {
        let now = Utc.with_ymd_and_hms(2025, 8, 23, 12, 0, 0).unwrap();
        let items = parse_channel(SAMPLE_FEED).unwrap();
        let entries = filter_entries(items, 365, now);
        assert!(entries.iter().all(|e| e.url != "https://example.com/undated"));
    }

    #[test]
    fn test_feed_domain_strips_www() {
        assert_eq!(
            feed_domain("https://www.environmentalleader.com/feed/"),
            "environmentalleader.com"
        );
        assert_eq!(
            feed_domain("https://news.google.com/rss/search?q=ESG+air+quality"),
            "news.google.com"
        );
        assert_eq!(feed_domain("not a url"), "not a url");
    }
}
