// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply formatting for HTML parse mode.
//!
//! The model writes light markdown. Only `**bold**` is carried over; every
//! other character is sent as escaped text.

use std::sync::LazyLock;

use regex::Regex;

/// `**text**`, non-greedy, within a single line.
static BOLD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").ok());

/// Escapes `&`, `<` and `>` for HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes the reply, then turns `**text**` into `<b>text</b>`.
pub fn to_html(text: &str) -> String {
    let escaped = escape_html(text);
    match BOLD.as_ref() {
        Some(re) => re.replace_all(&escaped, "<b>$1</b>").into_owned(),
        None => escaped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(to_html("Hello there"), "Hello there");
        assert_eq!(to_html(""), "");
    }

    #[test]
    fn bold_is_converted_after_escaping() {
        assert_eq!(to_html("**<hi>**"), "<b>&lt;hi&gt;</b>");
    }

    #[test]
    fn bold_is_non_greedy() {
        assert_eq!(
            to_html("**one** and **two**"),
            "<b>one</b> and <b>two</b>"
        );
    }

    #[test]
    fn unmatched_markers_stay_literal() {
        assert_eq!(to_html("**open only"), "**open only");
    }

    #[test]
    fn bold_does_not_span_lines() {
        assert_eq!(to_html("**a\nb**"), "**a\nb**");
    }
}
