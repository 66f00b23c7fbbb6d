//! Utility functions for string clipping, wrapping, and log formatting.
//!
//! This module provides small pure helpers used throughout the pipeline:
//! - Character-safe prefix clipping for prompt and API payload budgets
//! - Greedy word wrapping for paragraph formatting
//! - String truncation for logging
//! - First-letter capitalization for derived company names

/// Return the first `max_chars` characters of a string.
///
/// Unlike byte slicing, this never splits a UTF-8 code point. Used to budget
/// generation prompts (first 5000 characters of article content) and API
/// content previews (first 2000 characters).
///
/// # Arguments
///
/// * `s` - The string to clip
/// * `max_chars` - Maximum number of characters to keep
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clip_chars("hello", 3), "hel");
/// assert_eq!(clip_chars("héllo", 2), "hé");
/// assert_eq!(clip_chars("short", 100), "short");
/// ```
pub fn clip_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Greedily wrap text into lines of at most `width` characters.
///
/// Whitespace runs are collapsed to single spaces. A single word longer than
/// `width` is emitted on its own line rather than split.
///
/// # Arguments
///
/// * `text` - The text to wrap
/// * `width` - Maximum characters per line
///
/// # Returns
///
/// The wrapped lines, in order. Empty input yields no lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_chars = word_chars;
        } else if current_chars + 1 + word_chars <= width {
            current.push(' ');
            current.push_str(word);
            current_chars += 1 + word_chars;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_chars = word_chars;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of characters to keep
///
/// # Returns
///
/// The original string if within `max` characters, otherwise a truncated
/// version with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let head = clip_chars(s, max);
    if head.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}

/// Capitalize the first character of a string.
///
/// Used for company names derived from lowercase host names
/// (e.g., "cleantechnica" -> "Cleantechnica").
///
/// # Examples
///
/// ```ignore
/// assert_eq!(upcase("hello"), "Hello");
/// assert_eq!(upcase(""), "");
/// ```
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_chars_short_string() {
        assert_eq!(clip_chars("short", 100), "short");
    }

    #[test]
    fn test_clip_chars_exact_boundary() {
        assert_eq!(clip_chars("abcdef", 6), "abcdef");
        assert_eq!(clip_chars("abcdef", 3), "abc");
    }

    #[test]
    fn test_clip_chars_multibyte() {
        // é is two bytes; clipping must not split it
        assert_eq!(clip_chars("héllo", 2), "hé");
        assert_eq!(clip_chars("日本語テキスト", 3), "日本語");
    }

    #[test]
    fn test_wrap_text_fits_on_one_line() {
        assert_eq!(wrap_text("hello world", 80), vec!["hello world"]);
    }

    #[test]
    fn test_wrap_text_splits_at_width() {
        let lines = wrap_text("aaa bbb ccc ddd", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn test_wrap_text_long_word_kept_whole() {
        let lines = wrap_text("tiny supercalifragilistic tiny", 10);
        assert_eq!(lines, vec!["tiny", "supercalifragilistic", "tiny"]);
    }

    #[test]
    fn test_wrap_text_collapses_whitespace() {
        let lines = wrap_text("a  b\n\tc", 80);
        assert_eq!(lines, vec!["a b c"]);
    }

    #[test]
    fn test_wrap_text_empty() {
        assert!(wrap_text("", 80).is_empty());
        assert!(wrap_text("   ", 80).is_empty());
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_upcase() {
        assert_eq!(upcase("hello"), "Hello");
        assert_eq!(upcase("world"), "World");
        assert_eq!(upcase(""), "");
        assert_eq!(upcase("a"), "A");
    }
}
