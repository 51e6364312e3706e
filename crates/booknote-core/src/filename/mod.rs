//! Note and cover image file names

use crate::template::{replace_date_in_string, replace_variable_syntax};
use booknote_domain::Book;
use chrono::{Local, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

/// Extension appended to every note file name
pub const NOTE_EXTENSION: &str = "md";

lazy_static! {
    static ref ILLEGAL_FILE_NAME_CHARS: Regex = Regex::new(r#"[\\,#%&{}/*<>$":@.?|]"#).unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref ILLEGAL_IMAGE_NAME_CHARS: Regex = Regex::new(r#"[:/\\?%*|"<>]"#).unwrap();
}

/// Strip characters that are unsafe in note names and collapse whitespace runs
pub fn replace_illegal_file_name_characters(text: &str) -> String {
    let stripped = ILLEGAL_FILE_NAME_CHARS.replace_all(text, "");
    WHITESPACE.replace_all(&stripped, " ").into_owned()
}

/// Build the note file name for `book`.
///
/// With a format, `{{DATE...}}` placeholders are resolved against `now` and
/// then record fields are substituted. Without one the name is
/// `"<title> - <author>"`, or just the title when there is no author.
pub fn make_file_name(book: &Book, format: Option<&str>, now: NaiveDateTime) -> String {
    let name = match format.filter(|f| !f.trim().is_empty()) {
        Some(format) => replace_variable_syntax(book, &replace_date_in_string(format, now)),
        None if book.author.is_empty() => book.title.clone(),
        None => format!("{} - {}", book.title, book.author),
    };
    format!("{}.{}", replace_illegal_file_name_characters(&name), NOTE_EXTENSION)
}

/// [`make_file_name`] against the local clock
pub fn make_file_name_now(book: &Book, format: Option<&str>) -> String {
    make_file_name(book, format, Local::now().naive_local())
}

/// File name for a downloaded cover: `"<title> — <author>.jpg"`
pub fn cover_image_file_name(book: &Book) -> String {
    let name = format!("{} \u{2014} {}.jpg", book.title, book.author);
    ILLEGAL_IMAGE_NAME_CHARS.replace_all(&name, "").into_owned()
}
