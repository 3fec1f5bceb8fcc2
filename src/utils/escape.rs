//! Output escaping and markup stripping helpers.
//!
//! These back [`crate::core::AppKernel::clean`] and the inline asset markup
//! generated by [`crate::templating::AssetQueue`].

use regex::Regex;
use std::sync::OnceLock;
use std::fmt::Write as _;

use crate::core::CleanMode;

/// Comments come first so a `>` inside a comment does not end the match early.
const TAG_PATTERN: &str = r"(?s)<!--.*?-->|</?[a-zA-Z!?][^>]*>";

/// Escape `& < > " '` for HTML text and attribute contexts.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a string for embedding inside a JavaScript string literal.
///
/// Markup-significant characters are emitted as `\uXXXX` so the result is
/// also safe inside an inline `<script>` element.
pub fn escape_js(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' | '>' | '&' | '\u{2028}' | '\u{2029}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode everything except RFC 3986 unreserved characters.
pub fn escape_url(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

/// Escape a single string according to `mode`.
pub fn escape(input: &str, mode: CleanMode) -> String {
    match mode {
        CleanMode::Html | CleanMode::Attr => escape_html(input),
        CleanMode::Js => escape_js(input),
        CleanMode::Url => escape_url(input),
        CleanMode::Raw => input.to_string(),
    }
}

fn tag_regex() -> Option<&'static Regex> {
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(TAG_PATTERN).ok()).as_ref()
}

/// Remove HTML/XML tags and comments, keeping the text between them.
pub fn strip_tags(input: &str) -> String {
    match tag_regex() {
        Some(re) => re.replace_all(input, "").into_owned(),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;");
        assert_eq!(escape_html("https://example.com/a/b"), "https://example.com/a/b");
    }

    #[test]
    fn test_escape_js() {
        assert_eq!(escape_js("it's \"x\"\n</script>"), "it\\'s \\\"x\\\"\\n\\u003c/script\\u003e");
    }

    #[test]
    fn test_escape_url() {
        assert_eq!(escape_url("a b/c?d=é"), "a%20b%2Fc%3Fd%3D%C3%A9");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("body{color:red}"), "body{color:red}");
        assert_eq!(strip_tags("</style><script>alert(1)</script>p{}"), "alert(1)p{}");
        assert_eq!(strip_tags("a<!-- x > y -->b"), "ab");
        assert_eq!(strip_tags("if (a < b && c > d) {}"), "if (a < b && c > d) {}");
        assert!(tag_regex().is_some());
        assert_eq!(strip_tags("<b>x</b>"), strip_tags("<i>x</i>"));
    }
}
