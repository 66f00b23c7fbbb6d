//! Candidate discovery from keyword web search and RSS feeds.
//!
//! Both discovery paths produce article URLs for the pipeline to vet; both
//! speak RSS on the wire and share a channel parser:
//!
//! | Path | Module | Input | Output |
//! |------|--------|-------|--------|
//! | Web search | [`web_search`] | keyword tiers | deduplicated candidate URLs |
//! | Feed polling | [`rss`] | fixed feed list | (title, URL, publish date) entries |
//!
//! Discovery failures are soft: a keyword query or feed that errors logs a
//! warning and contributes nothing, and the batch continues.

pub mod rss;
pub mod web_search;
