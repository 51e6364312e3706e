//! Merge of the canonical record with a user override block

use super::parse::parse_front_matter;
use booknote_domain::{Book, FieldValue, FrontMatter, KeyStyle};

/// The record's defined fields as a header mapping with keys in `style`
pub fn keyed_record(book: &Book, style: KeyStyle) -> FrontMatter {
    book.fields()
        .into_iter()
        .map(|(key, value)| (style.apply(key), value))
        .collect()
}

/// Merge `overrides` on top of the record.
///
/// Per override key, with the override value trimmed:
/// - empty override, canonical value present and not an empty string: keep canonical
/// - canonical truthy and different: `"<canonical>, <override>"`; a list is
///   first flattened to its comma-joined form
/// - otherwise the override value is stored
///
/// Numbers compare by their string form. Override keys unknown to the record
/// are appended in override order.
pub fn apply_default_front_matter(book: &Book, overrides: &FrontMatter, style: KeyStyle) -> FrontMatter {
    let mut merged = keyed_record(book, style);

    for (key, raw) in overrides.iter() {
        let value = raw.to_display_string().trim().to_string();
        let canonical = merged.get(key).cloned();

        if value.is_empty() && canonical.as_ref().is_some_and(|c| !c.is_empty_text()) {
            continue;
        }

        match canonical {
            Some(existing) if existing.is_truthy() && differs(&existing, &value) => {
                let combined = format!("{}, {}", existing.to_display_string(), value);
                merged.insert(key, FieldValue::Text(combined));
            }
            _ => {
                merged.insert(key, FieldValue::Text(value));
            }
        }
    }

    merged
}

/// [`apply_default_front_matter`] with a raw `key: value` override block
pub fn apply_default_front_matter_text(book: &Book, overrides: &str, style: KeyStyle) -> FrontMatter {
    apply_default_front_matter(book, &parse_front_matter(overrides), style)
}

fn differs(existing: &FieldValue, value: &str) -> bool {
    match existing {
        FieldValue::List(_) | FieldValue::Map(_) => true,
        scalar => scalar.to_display_string() != value,
    }
}
