//! Label text cleanup shared by both dialects (§4.2): strip one layer of wrapping quotes,
//! turn `<br/>` into a newline, drop other angle-bracket tags, decode `\uNNNN` and `\n`
//! escapes, and collapse whitespace that collects around newlines.

use regex::Regex;
use std::sync::LazyLock;

static BR_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static UNICODE_ESCAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").unwrap());
static BLANK_AROUND_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());

pub fn unquote_once(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"' {
        return &s[1..s.len() - 1];
    }
    if bytes.len() >= 2 && bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'' {
        return &s[1..s.len() - 1];
    }
    s
}

pub fn clean_label(raw: &str) -> String {
    let unquoted = unquote_once(raw.trim());
    let with_breaks = BR_TAG.replace_all(unquoted, "\n");
    let without_tags = ANY_TAG.replace_all(&with_breaks, "");
    let decoded = UNICODE_ESCAPE.replace_all(&without_tags, |caps: &regex::Captures| {
        let code = u32::from_str_radix(&caps[1], 16).unwrap_or(0);
        char::from_u32(code).map(String::from).unwrap_or_default()
    });
    let decoded = decoded.replace("\\n", "\n");
    BLANK_AROUND_NEWLINE.replace_all(&decoded, "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_one_layer_of_quotes() {
        assert_eq!(clean_label("\"hello\""), "hello");
        assert_eq!(clean_label("'hello'"), "hello");
        assert_eq!(clean_label("hello"), "hello");
    }

    #[test]
    fn turns_br_into_newline_and_drops_other_tags() {
        assert_eq!(clean_label("line1<br/>line2"), "line1\nline2");
        assert_eq!(clean_label("line1<br>line2"), "line1\nline2");
        assert_eq!(clean_label("a<b>bold</b>c"), "aboldc");
    }

    #[test]
    fn decodes_unicode_and_n_escapes() {
        assert_eq!(clean_label("caf\\u00e9"), "café");
        assert_eq!(clean_label("a\\nb"), "a\nb");
    }

    #[test]
    fn collapses_whitespace_around_newlines() {
        assert_eq!(clean_label("a   \n   b"), "a\nb");
    }
}
