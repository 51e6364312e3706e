//! Header emitter

use super::alternate_quotes;
use booknote_domain::{FieldValue, FrontMatter};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NEEDS_QUOTING: Regex = Regex::new(r#":\s|""#).unwrap();
}

/// Serialize a header mapping, without the `---` delimiters.
///
/// Lists become `key:` plus `  - item` lines and are dropped when empty.
/// Multi-line scalars are dropped. Scalars containing `": "` or a double quote
/// are wrapped in quotes with inner quotes turned into `«`/`»`.
pub fn to_string_front_matter(front_matter: &FrontMatter) -> String {
    let mut out = String::new();
    for (key, value) in front_matter.iter() {
        out.push_str(&emit_entry(key, value));
    }
    out.trim().to_string()
}

fn emit_entry(key: &str, value: &FieldValue) -> String {
    if let FieldValue::List(items) = value {
        if items.is_empty() {
            return String::new();
        }
        let lines: Vec<String> = items.iter().map(|item| format!("  - {}", item)).collect();
        return format!("{}:\n{}\n", key, lines.join("\n"));
    }

    let scalar = value.to_display_string();
    let scalar = scalar.trim();
    if scalar.contains('\r') || scalar.contains('\n') {
        return String::new();
    }
    if NEEDS_QUOTING.is_match(scalar) {
        return format!("{}: \"{}\"\n", key, alternate_quotes(scalar));
    }
    format!("{}: {}\n", key, scalar)
}
