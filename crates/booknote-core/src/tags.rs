//! Tag derivation from author and title

use booknote_domain::Book;
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref NON_TAG_CHARS: Regex = Regex::new(r"[^\p{L}\p{N}_]").unwrap();
}

/// Lower-case, underscore-joined, punctuation-free form of `text`.
///
/// Input is NFC-composed first so a decomposed "é" survives as one letter
/// instead of losing its combining accent.
pub fn sanitize_tag(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let lowered = composed.to_lowercase();
    let joined = WHITESPACE.replace_all(&lowered, "_");
    NON_TAG_CHARS.replace_all(&joined, "").into_owned()
}

/// Tags for a record: author first, then title. Empty sources are skipped.
pub fn create_book_tags(book: &Book) -> Vec<String> {
    [&book.author, &book.title]
        .into_iter()
        .filter(|source| !source.is_empty())
        .map(|source| sanitize_tag(source))
        .collect()
}
