//! Summary post-processing: raw generation output to structured markup.
//!
//! Generation output is markdown-ish prose: `**…**` emphasis spans used as
//! section headers, `- `/`• ` bullet lines, and free paragraphs. This module
//! converts it to the markup stored in the `summary` column: `<h3>` headings,
//! `<ul>`/`<li>` lists, and `<p>` paragraphs wrapped at a fixed width.
//!
//! The conversion is a line-oriented state machine with two states, default
//! and inside-list:
//! - a pre-pass rewrites each `**…**` span to its own heading line
//! - a line starting with `- ` or `• ` emits a list item, opening a list
//!   when none is open; the bullet marker wins even when the line ends
//!   with `:`
//! - any other line ending in `:` emits a heading (all trailing colons
//!   stripped), closing any open list first
//! - other lines accumulate into a paragraph, flushed on blank lines and
//!   wrapped at 600 characters
//! - end of input flushes the paragraph and closes any open list, so the
//!   output never contains an unterminated `<ul>`

use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::wrap_text;

/// Paragraph wrap width in characters.
const PARAGRAPH_WIDTH: usize = 600;

static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Default,
    InList,
}

/// Convert a raw generation response to structured markup.
///
/// Empty or whitespace-only input formats to the empty string.
///
/// # Examples
///
/// ```ignore
/// let markup = format_summary("**Energy:**\n- Cut emissions\n- Added solar");
/// assert_eq!(
///     markup,
///     "<h3>Energy</h3>\n<ul>\n<li>Cut emissions</li>\n<li>Added solar</li>\n</ul>"
/// );
/// ```
pub fn format_summary(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let normalized = EMPHASIS.replace_all(raw, "\n\n$1:\n");

    let mut blocks: Vec<String> = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut state = State::Default;

    for raw_line in normalized.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            // a blank line ends a paragraph; an open list stays open
            flush_paragraph(&mut blocks, &mut paragraph, &mut state);
        } else if let Some(item) = list_item(line) {
            flush_paragraph(&mut blocks, &mut paragraph, &mut state);
            if state == State::Default {
                blocks.push("<ul>".to_string());
                state = State::InList;
            }
            blocks.push(format!("<li>{}</li>", item.trim()));
        } else if line.ends_with(':') {
            flush_paragraph(&mut blocks, &mut paragraph, &mut state);
            close_list(&mut blocks, &mut state);
            blocks.push(format!("<h3>{}</h3>", line.trim_end_matches(':').trim()));
        } else {
            paragraph.push(line);
        }
    }

    flush_paragraph(&mut blocks, &mut paragraph, &mut state);
    close_list(&mut blocks, &mut state);

    blocks.join("\n")
}

fn list_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ").or_else(|| line.strip_prefix("• "))
}

fn flush_paragraph(blocks: &mut Vec<String>, paragraph: &mut Vec<&str>, state: &mut State) {
    if paragraph.is_empty() {
        return;
    }
    close_list(blocks, state);
    let text = paragraph.join(" ");
    paragraph.clear();
    for chunk in wrap_text(&text, PARAGRAPH_WIDTH) {
        blocks.push(format!("<p>{chunk}</p>"));
    }
}

fn close_list(blocks: &mut Vec<String>, state: &mut State) {
    if *state == State::InList {
        blocks.push("</ul>".to_string());
        *state = State::Default;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emphasis_header_with_bullets() {
        let markup = format_summary("**Energy:**\n- Cut emissions\n- Added solar");
        assert_eq!(
            markup,
            "<h3>Energy</h3>\n<ul>\n<li>Cut emissions</li>\n<li>Added solar</li>\n</ul>"
        );
    }

    #[test]
    fn test_list_closed_before_heading() {
        let markup = format_summary("- one\n- two\nNext steps:");
        let ul_close = markup.find("</ul>").unwrap();
        let heading = markup.find("<h3>").unwrap();
        assert!(ul_close < heading);
        assert_eq!(markup.matches("<ul>").count(), markup.matches("</ul>").count());
    }

    #[test]
    fn test_list_closed_before_paragraph() {
        let markup = format_summary("- one\nplain text follows");
        assert_eq!(
            markup,
            "<ul>\n<li>one</li>\n</ul>\n<p>plain text follows</p>"
        );
    }

    #[test]
    fn test_list_closed_at_end_of_input() {
        let markup = format_summary("- only item");
        assert!(markup.ends_with("</ul>"));
        assert_eq!(markup.matches("<ul>").count(), 1);
        assert_eq!(markup.matches("</ul>").count(), 1);
    }

    #[test]
    fn test_list_stays_open_across_blank_lines() {
        let markup = format_summary("- one\n\n- two");
        assert_eq!(markup, "<ul>\n<li>one</li>\n<li>two</li>\n</ul>");
    }

    #[test]
    fn test_bullet_line_with_trailing_colon_stays_list_item() {
        // the bullet marker wins over colon-based heading detection
        let markup = format_summary("- Reduced NOx:\n- Added solar");
        assert_eq!(
            markup,
            "<ul>\n<li>Reduced NOx:</li>\n<li>Added solar</li>\n</ul>"
        );
    }

    #[test]
    fn test_bullet_marker_variants() {
        let markup = format_summary("- dash item\n• dot item");
        assert_eq!(
            markup,
            "<ul>\n<li>dash item</li>\n<li>dot item</li>\n</ul>"
        );
    }

    #[test]
    fn test_blank_line_splits_paragraphs() {
        let markup = format_summary("first paragraph\n\nsecond paragraph");
        assert_eq!(markup, "<p>first paragraph</p>\n<p>second paragraph</p>");
    }

    #[test]
    fn test_adjacent_lines_join_into_one_paragraph() {
        let markup = format_summary("line one\nline two");
        assert_eq!(markup, "<p>line one line two</p>");
    }

    #[test]
    fn test_long_paragraph_wraps() {
        let word = "sustainability ";
        let text = word.repeat(100); // ~1500 chars
        let markup = format_summary(&text);
        let paragraphs = markup.matches("<p>").count();
        assert!(paragraphs >= 2);
        for chunk in markup.lines() {
            let inner = chunk
                .trim_start_matches("<p>")
                .trim_end_matches("</p>");
            assert!(inner.chars().count() <= 600);
        }
    }

    #[test]
    fn test_emphasis_inside_prose_becomes_heading() {
        let markup = format_summary("intro text **Key Points:** more details");
        assert_eq!(
            markup,
            "<p>intro text</p>\n<h3>Key Points</h3>\n<p>more details</p>"
        );
    }

    #[test]
    fn test_trailing_colons_fully_stripped() {
        let markup = format_summary("**Summary:**");
        assert_eq!(markup, "<h3>Summary</h3>");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(format_summary(""), "");
        assert_eq!(format_summary("   \n  "), "");
    }
}
