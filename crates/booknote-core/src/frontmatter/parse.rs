//! Override block parser

use booknote_domain::{FieldValue, FrontMatter};

/// Parse a `key: value` block into an ordered mapping of trimmed strings.
///
/// Each line splits at its first colon; a line without one becomes a key with
/// an empty value. A quoted empty scalar (`""` or `''`) is an empty value.
/// Blank keys are skipped and later duplicates win.
pub fn parse_front_matter(text: &str) -> FrontMatter {
    let mut out = FrontMatter::new();
    for line in text.split('\n') {
        let (key, value) = match line.find(':') {
            Some(index) => (line[..index].trim(), line[index + 1..].trim()),
            None => (line.trim(), ""),
        };
        let value = if value == "\"\"" || value == "''" { "" } else { value };
        if !key.is_empty() {
            out.insert(key, FieldValue::text(value));
        }
    }
    out
}
