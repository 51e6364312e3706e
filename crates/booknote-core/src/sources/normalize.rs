//! Field-level helpers shared by the provider normalizers
//!
//! Every helper is total: malformed input degrades to an empty value.

use chrono::{DateTime, Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>?").unwrap();
    static ref ISBN_PREFIX: Regex = Regex::new(r"(?i)^\s*isbn:").unwrap();
    static ref LEADING_YEAR: Regex = Regex::new(r"^\s*(\d{4})(?:\D|$)").unwrap();
}

/// Strip anything that looks like an HTML tag
pub fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").trim().to_string()
}

/// Scalar projection of a list: the single element, or a trimmed `", "` join
pub fn format_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        many => many
            .iter()
            .map(|s| s.trim())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Remove an `isbn:` scheme prefix and any separators, keeping digits and `X`
pub fn strip_isbn_prefix(raw: &str) -> String {
    let bare = ISBN_PREFIX.replace(raw, "");
    bare.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Drop duplicates while keeping first-seen order; blank entries are removed
pub fn dedupe(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Year-only date policy.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD`, `YYYY-MM`, `YYYY` and anything
/// else starting with a four-digit year. Returns an empty string otherwise.
pub fn year_only(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    let year = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        Some(dt.year())
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Some(date.year())
    } else {
        LEADING_YEAR
            .captures(raw)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok())
    };
    // Calibre stores "no date" as 0101-01-01
    match year {
        Some(y) if y > UNDEFINED_YEAR => y.to_string(),
        _ => String::new(),
    }
}

const UNDEFINED_YEAR: i32 = 101;

/// `YYYY/MM/DD` date policy from epoch milliseconds (UTC)
pub fn slash_date_from_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y/%m/%d").to_string())
        .unwrap_or_default()
}

/// Non-empty string or empty default
pub fn text(value: Option<&str>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>A <b>bold</b> move.</p>"), "A bold move.");
        assert_eq!(strip_html("no tags"), "no tags");
    }

    #[test]
    fn test_format_list() {
        assert_eq!(format_list(&[]), "");
        assert_eq!(format_list(&["Solo".to_string()]), "Solo");
        assert_eq!(
            format_list(&[" A ".to_string(), "B".to_string()]),
            "A, B"
        );
    }

    #[test]
    fn test_strip_isbn_prefix() {
        assert_eq!(strip_isbn_prefix("isbn:9781101535455"), "9781101535455");
        assert_eq!(strip_isbn_prefix("ISBN:978-1-101-53545-5"), "9781101535455");
        assert_eq!(strip_isbn_prefix("080442957X"), "080442957X");
    }

    #[test]
    fn test_dedupe_keeps_first_seen_order() {
        let items = vec!["b".to_string(), "a".to_string(), "b".to_string(), " ".to_string()];
        assert_eq!(dedupe(items), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_year_only() {
        assert_eq!(year_only("2019-03-05T00:00:00+00:00"), "2019");
        assert_eq!(year_only("1965-08-01"), "1965");
        assert_eq!(year_only("2005"), "2005");
        assert_eq!(year_only("2005-08"), "2005");
        assert_eq!(year_only("sometime"), "");
        assert_eq!(year_only(""), "");
        assert_eq!(year_only("0101-01-01T00:00:00+00:00"), "");
    }

    #[test]
    fn test_slash_date_from_millis() {
        assert_eq!(slash_date_from_millis(0), "1970/01/01");
        assert_eq!(slash_date_from_millis(1_136_073_600_000), "2006/01/01");
    }
}
