//! `{{field}}` placeholder substitution

pub mod dates;

pub use dates::*;

use crate::frontmatter::alternate_quotes;
use booknote_domain::{Book, FieldValue};
use lazy_static::lazy_static;
use regex::{NoExpand, Regex};

lazy_static! {
    static ref LEFTOVER_PLACEHOLDER: Regex = Regex::new(r"\{\{\w+\}\}").unwrap();
}

/// Substitute the record's fields into `text`.
///
/// Placeholders match field names case-insensitively. List fields render as
/// `\n  - item` lines. When the text holds a quoted list placeholder
/// (`"{{key}}"` or `'{{key}}'`), only the quoted occurrences are replaced,
/// quotes included; otherwise the bare ones are. Unknown and leftover
/// placeholders are removed and the result is trimmed.
pub fn replace_variable_syntax(book: &Book, text: &str) -> String {
    substitute_fields(&book.fields(), text)
}

/// [`replace_variable_syntax`] over an explicit field list
pub fn substitute_fields<K: AsRef<str>>(fields: &[(K, FieldValue)], text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let mut result = text.to_string();
    for (key, value) in fields {
        let key = regex::escape(key.as_ref());
        let Ok(bare) = Regex::new(&format!(r"(?i)\{{\{{{}\}}\}}", key)) else {
            continue;
        };

        match value {
            FieldValue::List(items) => {
                let list_text: String = items.iter().map(|item| format!("\n  - {}", item)).collect();
                let quoted = Regex::new(&format!(
                    r#"(?i)"\{{\{{{key}\}}\}}"|'\{{\{{{key}\}}\}}'"#
                ))
                .ok()
                .filter(|quoted| quoted.is_match(&result));
                let pattern = quoted.as_ref().unwrap_or(&bare);
                result = pattern.replace_all(&result, NoExpand(&list_text)).into_owned();
            }
            scalar => {
                let mut rendered = scalar.to_display_string();
                if rendered.contains('"') {
                    rendered = alternate_quotes(&rendered);
                }
                result = bare.replace_all(&result, NoExpand(&rendered)).into_owned();
            }
        }
    }

    LEFTOVER_PLACEHOLDER.replace_all(&result, "").trim().to_string()
}
