//! Calibre content server source
//!
//! Endpoints: `/ajax/search?query=` for ids, `/ajax/book/{id}` for metadata.
//! Search results are upgraded to full records immediately, so `get_book`
//! has nothing left to add.

use super::normalize::{dedupe, format_list, strip_html, strip_isbn_prefix, text, year_only};
use super::traits::{require_query, BookProvider, QueryOptions, SearchOutcome, SourceError, SourceMetadata};
use crate::http::{Fetcher, HttpError, JSON_HEADERS};
use async_trait::async_trait;
use booknote_domain::{Book, CustomValue, Numeric, ServiceProvider};
use futures::future::join_all;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Detail requests issued per search
pub const MAX_DETAIL_FETCHES: usize = 5;

pub const DEFAULT_LIBRARY_ID: &str = "calibre";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    book_ids: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct CalibreBook {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    comments: Option<String>,
    publisher: Option<String>,
    pubdate: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    identifiers: HashMap<String, String>,
    isbn: Option<String>,
    cover: Option<String>,
    series: Option<String>,
    series_index: Option<f64>,
    rating: Option<f64>,
    #[serde(default)]
    user_metadata: BTreeMap<String, UserColumn>,
}

#[derive(Debug, Deserialize)]
struct UserColumn {
    #[serde(rename = "#value#", default)]
    value: serde_json::Value,
}

pub struct CalibreSource {
    server_url: String,
    library_id: String,
}

impl CalibreSource {
    pub fn new(server_url: &str, library_id: &str) -> Self {
        let library_id = library_id.trim();
        Self {
            server_url: server_url.trim().trim_end_matches('/').to_string(),
            library_id: if library_id.is_empty() {
                DEFAULT_LIBRARY_ID.to_string()
            } else {
                library_id.to_string()
            },
        }
    }

    pub fn search_url(&self, query: &str) -> String {
        format!("{}/ajax/search?query={}", self.server_url, urlencoding::encode(query))
    }

    pub fn book_url(&self, id: &str) -> String {
        format!("{}/ajax/book/{}", self.server_url, id)
    }

    /// Book ids from an `/ajax/search` response, in server order
    pub fn parse_search_ids(json: &str) -> Result<Vec<String>, SourceError> {
        let response: SearchResponse = serde_json::from_str(json)
            .map_err(|e| SourceError::Parse(format!("Invalid Calibre search JSON: {}", e)))?;
        Ok(response
            .book_ids
            .into_iter()
            .filter_map(|id| match id {
                serde_json::Value::Number(n) => Some(n.to_string()),
                serde_json::Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect())
    }

    /// Normalize an `/ajax/book/{id}` response
    pub fn parse_book_detail(&self, json: &str, id: &str) -> Result<Book, SourceError> {
        let data: CalibreBook = serde_json::from_str(json)
            .map_err(|e| SourceError::Parse(format!("Invalid Calibre book JSON: {}", e)))?;
        Ok(self.create_book(data, id))
    }

    fn create_book(&self, data: CalibreBook, id: &str) -> Book {
        let book_url = self.book_url(id);
        let authors = dedupe(data.authors);
        let categories = dedupe(data.tags);

        let isbn = data
            .identifiers
            .get("isbn")
            .or(data.isbn.as_ref())
            .map(|raw| strip_isbn_prefix(raw))
            .unwrap_or_default();

        let cover_url = match data.cover.as_deref().map(str::trim) {
            Some(cover) if cover.starts_with('/') => format!("{}{}", self.server_url, cover),
            Some(cover) if !cover.is_empty() => cover.to_string(),
            _ => format!("{}/get/cover/{}/{}", self.server_url, id, self.library_id),
        };

        let series = data.series.as_deref().map(str::trim).filter(|s| !s.is_empty());

        Book {
            title: text(data.title.as_deref()),
            subtitle: Some(String::new()),
            author: format_list(&authors),
            authors,
            category: Some(format_list(&categories)),
            categories: Some(categories),
            publisher: Some(text(data.publisher.as_deref())),
            publish_date: Some(year_only(data.pubdate.as_deref().unwrap_or(""))),
            total_page: Some(Numeric::default()),
            cover_small_url: Some(cover_url.clone()),
            cover_url: Some(cover_url),
            description: Some(strip_html(data.comments.as_deref().unwrap_or(""))),
            link: Some(book_url.clone()),
            preview_link: Some(book_url),
            isbn10: Some(String::new()),
            isbn13: Some(isbn.clone()),
            ids: Some(isbn),
            original_title: Some(String::new()),
            translator: Some(String::new()),
            narrator: Some(String::new()),
            series: series.map(str::to_string),
            series_number: series.and(data.series_index).map(series_number),
            series_link: series.map(|s| format!("[[{}]]", s)),
            my_rate: data.rating.filter(|r| *r > 0.0).map(|r| Numeric::from_float(r / 2.0)),
            custom_columns: custom_columns(data.user_metadata),
            source_provider: Some(ServiceProvider::Calibre.as_str().to_string()),
            source_id: Some(id.to_string()),
            ..Default::default()
        }
    }

    /// Search and fetch details for the first few hits concurrently.
    ///
    /// A failed detail fetch is recorded in `failures`; the other books are kept.
    pub async fn search_details(&self, fetcher: &dyn Fetcher, query: &str) -> Result<SearchOutcome, SourceError> {
        let query = require_query(query)?;
        let url = self.search_url(query);
        let response = fetcher.get(&url, JSON_HEADERS).await?;
        if !response.is_success() {
            return Err(SourceError::Http(HttpError::Status {
                status: response.status,
                url,
            }));
        }

        let ids = Self::parse_search_ids(&response.body)?;
        let ids: Vec<String> = ids.into_iter().take(MAX_DETAIL_FETCHES).collect();
        tracing::debug!("Calibre search matched, fetching {} book(s)", ids.len());

        let fetches = ids.iter().map(|id| self.fetch_book(fetcher, id));
        let outcomes = join_all(fetches).await;

        let mut result = SearchOutcome::default();
        for (id, outcome) in ids.into_iter().zip(outcomes) {
            match outcome {
                Ok(book) => result.books.push(book),
                Err(e) => result.failures.push((id, e)),
            }
        }
        Ok(result)
    }

    async fn fetch_book(&self, fetcher: &dyn Fetcher, id: &str) -> Result<Book, SourceError> {
        let url = self.book_url(id);
        let response = fetcher.get(&url, JSON_HEADERS).await?;
        if !response.is_success() {
            return Err(SourceError::Http(HttpError::Status {
                status: response.status,
                url,
            }));
        }
        self.parse_book_detail(&response.body, id)
    }
}

fn series_number(index: f64) -> Numeric {
    if index.fract() == 0.0 && index.abs() < i64::MAX as f64 {
        Numeric::from_int(index as i64)
    } else {
        Numeric::from_float(index)
    }
}

fn custom_columns(metadata: BTreeMap<String, UserColumn>) -> Option<BTreeMap<String, CustomValue>> {
    let columns: BTreeMap<String, CustomValue> = metadata
        .into_iter()
        .filter(|(_, column)| !column.value.is_null())
        .filter_map(|(key, column)| {
            let value = serde_json::from_value::<CustomValue>(column.value).ok()?;
            Some((key.trim_start_matches('#').to_string(), value))
        })
        .collect();
    if columns.is_empty() {
        None
    } else {
        Some(columns)
    }
}

#[async_trait]
impl BookProvider for CalibreSource {
    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            id: ServiceProvider::Calibre,
            name: "Calibre",
            description: "Self-hosted Calibre content server",
            base_url: "http://localhost:8080",
            supports_details: false,
            requires_api_key: false,
        }
    }

    /// Books that loaded; failed ids are logged. Use [`BookProvider::search`]
    /// to receive them.
    async fn get_by_query(
        &self,
        fetcher: &dyn Fetcher,
        query: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Book>, SourceError> {
        let result = BookProvider::search(self, fetcher, query, options).await?;
        for (id, error) in &result.failures {
            tracing::warn!("Calibre book {} could not be loaded: {}", id, error);
        }
        Ok(result.books)
    }

    /// Fails only when every detail fetch failed
    async fn search(
        &self,
        fetcher: &dyn Fetcher,
        query: &str,
        _options: &QueryOptions,
    ) -> Result<SearchOutcome, SourceError> {
        let mut result = self.search_details(fetcher, query).await?;
        if result.books.is_empty() && !result.failures.is_empty() {
            let (_, error) = result.failures.remove(0);
            return Err(error);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r##"{
        "title": "The Fifth Season",
        "authors": ["N. K. Jemisin"],
        "comments": "<div><p>This is the way the world ends.</p></div>",
        "publisher": "Orbit",
        "pubdate": "2015-08-04T04:00:00+00:00",
        "tags": ["Fantasy", "Science Fiction"],
        "identifiers": {"isbn": "isbn:9780316229296"},
        "cover": "/get/cover/42/calibre",
        "series": "The Broken Earth",
        "series_index": 1.0,
        "rating": 9,
        "user_metadata": {
            "#read": {"#value#": true, "name": "Read"},
            "#shelf": {"#value#": null, "name": "Shelf"},
            "#moods": {"#value#": ["dark", "epic"], "name": "Moods"}
        }
    }"##;

    fn source() -> CalibreSource {
        CalibreSource::new("http://localhost:8080/", "")
    }

    #[test]
    fn test_parse_book_detail() {
        let book = source().parse_book_detail(DETAIL, "42").unwrap();
        assert_eq!(book.title, "The Fifth Season");
        assert_eq!(book.author, "N. K. Jemisin");
        assert_eq!(book.description.as_deref(), Some("This is the way the world ends."));
        assert_eq!(book.publish_date.as_deref(), Some("2015"));
        assert_eq!(book.isbn13.as_deref(), Some("9780316229296"));
        assert_eq!(book.ids.as_deref(), Some("9780316229296"));
        assert_eq!(book.isbn10.as_deref(), Some(""));
        assert_eq!(
            book.cover_url.as_deref(),
            Some("http://localhost:8080/get/cover/42/calibre")
        );
        assert_eq!(book.link.as_deref(), Some("http://localhost:8080/ajax/book/42"));
        assert_eq!(
            book.categories,
            Some(vec!["Fantasy".to_string(), "Science Fiction".to_string()])
        );
        assert_eq!(book.category.as_deref(), Some("Fantasy, Science Fiction"));
    }

    #[test]
    fn test_series_and_rating() {
        let book = source().parse_book_detail(DETAIL, "42").unwrap();
        assert_eq!(book.series.as_deref(), Some("The Broken Earth"));
        assert_eq!(book.series_number, Some(Numeric::from_int(1)));
        assert_eq!(book.series_link.as_deref(), Some("[[The Broken Earth]]"));
        assert_eq!(book.my_rate, Some(Numeric::from_float(4.5)));
    }

    #[test]
    fn test_custom_columns_skip_null_values() {
        let book = source().parse_book_detail(DETAIL, "42").unwrap();
        let columns = book.custom_columns.unwrap();
        assert_eq!(columns.get("read"), Some(&CustomValue::Bool(true)));
        assert_eq!(
            columns.get("moods"),
            Some(&CustomValue::List(vec!["dark".to_string(), "epic".to_string()]))
        );
        assert!(!columns.contains_key("shelf"));
    }

    #[test]
    fn test_default_cover_and_undefined_date() {
        let json = r#"{"title": "Bare", "authors": ["A", "B"], "pubdate": "0101-01-01T00:00:00+00:00"}"#;
        let book = CalibreSource::new("http://nas:8081", "books")
            .parse_book_detail(json, "7")
            .unwrap();
        assert_eq!(book.cover_url.as_deref(), Some("http://nas:8081/get/cover/7/books"));
        assert_eq!(book.publish_date.as_deref(), Some(""));
        assert_eq!(book.author, "A, B");
        assert_eq!(book.category.as_deref(), Some(""));
        assert_eq!(book.series, None);
        assert_eq!(book.custom_columns, None);
    }

    #[test]
    fn test_parse_search_ids() {
        let ids = CalibreSource::parse_search_ids(r#"{"book_ids": [3, 9, "12"], "total_num": 3}"#).unwrap();
        assert_eq!(ids, vec!["3", "9", "12"]);
        let empty = CalibreSource::parse_search_ids(r#"{"total_num": 0}"#).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_search_url_trims_trailing_slash() {
        assert_eq!(
            source().search_url("jemisin"),
            "http://localhost:8080/ajax/search?query=jemisin"
        );
    }
}
