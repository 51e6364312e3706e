//! Canonical book record

use crate::value::{CustomValue, FieldValue, Numeric};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A book as produced by any provider normalizer.
///
/// `title` and `author` are always present. Every other field is optional:
/// `None` means the provider never set the key (it is absent from templates
/// and headers), `Some("")` means the provider declares the field but had no
/// data for it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_page: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_small_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_medium_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_large_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_read_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_read_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_rate: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn10: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn13: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_number: Option<Numeric>,
    /// Series name formatted as an internal link, e.g. `[[Dune Chronicles]]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<Numeric>,
    /// Percentage 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_progress: Option<Numeric>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_columns: Option<BTreeMap<String, CustomValue>>,

    /// Originating provider id ("calibre", "google", ...); traceability only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl Book {
    /// Create a record with just a title and a single author
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        let author = author.into();
        let authors = if author.is_empty() {
            Vec::new()
        } else {
            vec![author.clone()]
        };
        Self {
            title: title.into(),
            author,
            authors,
            ..Default::default()
        }
    }

    /// All defined fields in canonical order, keyed by their camelCase name.
    ///
    /// This is the iteration order used by template substitution and by the
    /// default header.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        let mut out: Vec<(&'static str, FieldValue)> = Vec::with_capacity(40);

        fn text(out: &mut Vec<(&'static str, FieldValue)>, key: &'static str, v: &Option<String>) {
            if let Some(v) = v {
                out.push((key, FieldValue::Text(v.clone())));
            }
        }
        fn list(
            out: &mut Vec<(&'static str, FieldValue)>,
            key: &'static str,
            v: &Option<Vec<String>>,
        ) {
            if let Some(v) = v {
                out.push((key, FieldValue::List(v.clone())));
            }
        }
        fn numeric(out: &mut Vec<(&'static str, FieldValue)>, key: &'static str, v: &Option<Numeric>) {
            if let Some(v) = v {
                out.push((key, FieldValue::from(v.clone())));
            }
        }

        out.push(("title", FieldValue::Text(self.title.clone())));
        text(&mut out, "subtitle", &self.subtitle);
        out.push(("author", FieldValue::Text(self.author.clone())));
        out.push(("authors", FieldValue::List(self.authors.clone())));
        text(&mut out, "category", &self.category);
        list(&mut out, "categories", &self.categories);
        text(&mut out, "publisher", &self.publisher);
        text(&mut out, "publishDate", &self.publish_date);
        numeric(&mut out, "totalPage", &self.total_page);
        text(&mut out, "coverUrl", &self.cover_url);
        text(&mut out, "coverSmallUrl", &self.cover_small_url);
        text(&mut out, "coverMediumUrl", &self.cover_medium_url);
        text(&mut out, "coverLargeUrl", &self.cover_large_url);
        text(&mut out, "localCoverImage", &self.local_cover_image);
        text(&mut out, "status", &self.status);
        text(&mut out, "startReadDate", &self.start_read_date);
        text(&mut out, "finishReadDate", &self.finish_read_date);
        numeric(&mut out, "myRate", &self.my_rate);
        text(&mut out, "bookNote", &self.book_note);
        text(&mut out, "isbn10", &self.isbn10);
        text(&mut out, "isbn13", &self.isbn13);
        text(&mut out, "isbn", &self.isbn);
        text(&mut out, "link", &self.link);
        text(&mut out, "description", &self.description);
        text(&mut out, "previewLink", &self.preview_link);
        text(&mut out, "originalTitle", &self.original_title);
        text(&mut out, "translator", &self.translator);
        text(&mut out, "narrator", &self.narrator);
        text(&mut out, "asin", &self.asin);
        list(&mut out, "tags", &self.tags);
        text(&mut out, "ids", &self.ids);
        text(&mut out, "series", &self.series);
        numeric(&mut out, "seriesNumber", &self.series_number);
        text(&mut out, "seriesLink", &self.series_link);
        numeric(&mut out, "currentPage", &self.current_page);
        numeric(&mut out, "readingProgress", &self.reading_progress);
        if let Some(columns) = &self.custom_columns {
            out.push(("customColumns", FieldValue::Map(columns.clone())));
        }
        text(&mut out, "sourceProvider", &self.source_provider);
        text(&mut out, "sourceId", &self.source_id);

        out
    }

    /// The identifier used for duplicate lookups: isbn13, then isbn10, then ids
    pub fn primary_isbn(&self) -> Option<&str> {
        [&self.isbn13, &self.isbn10, &self.ids]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
    }

    /// Best available cover URL, largest first
    pub fn best_cover_url(&self) -> Option<&str> {
        [
            &self.cover_large_url,
            &self.cover_medium_url,
            &self.cover_small_url,
            &self.cover_url,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|s| !s.is_empty())
    }
}
