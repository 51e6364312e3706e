//! Open Library source
//!
//! API docs: https://openlibrary.org/dev/docs/api/search
//! Search docs already carry everything a note needs, so there is no detail call.

use super::normalize::{dedupe, format_list, strip_isbn_prefix, text, year_only};
use super::traits::{require_query, BookProvider, QueryOptions, SourceError, SourceMetadata};
use crate::http::{Fetcher, JSON_HEADERS};
use async_trait::async_trait;
use booknote_domain::{Book, Numeric, ServiceProvider};
use serde::Deserialize;

const SEARCH_URL: &str = "https://openlibrary.org/search.json";
const SITE_URL: &str = "https://openlibrary.org";
const COVERS_URL: &str = "https://covers.openlibrary.org/b";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenLibraryDoc {
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    cover_i: Option<i64>,
    #[serde(default)]
    isbn: Vec<String>,
    first_publish_year: Option<i64>,
    #[serde(default)]
    publish_date: Vec<String>,
    #[serde(default)]
    publisher: Vec<String>,
    number_of_pages_median: Option<i64>,
    number_of_pages: Option<i64>,
    key: Option<String>,
    #[serde(default)]
    subject: Vec<String>,
    original_title: Option<String>,
}

#[derive(Default)]
pub struct OpenLibrarySource;

impl OpenLibrarySource {
    pub fn new() -> Self {
        Self
    }

    pub fn search_url(query: &str) -> String {
        format!("{}?q={}", SEARCH_URL, urlencoding::encode(query))
    }

    /// Parse a `search.json` response
    pub fn parse_search_response(json: &str) -> Result<Vec<Book>, SourceError> {
        let response: SearchResponse = serde_json::from_str(json)
            .map_err(|e| SourceError::Parse(format!("Invalid Open Library JSON: {}", e)))?;

        Ok(response
            .docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<OpenLibraryDoc>(doc) {
                Ok(doc) => Some(Self::create_book(doc)),
                Err(e) => {
                    tracing::warn!("Skipping malformed Open Library doc: {}", e);
                    None
                }
            })
            .collect())
    }

    fn create_book(doc: OpenLibraryDoc) -> Book {
        let authors = dedupe(doc.author_name);
        let categories = dedupe(doc.subject);
        let isbns: Vec<String> = doc.isbn.iter().map(|i| strip_isbn_prefix(i)).collect();

        let cover_url = match (doc.cover_i, isbns.first()) {
            (Some(id), _) if id > 0 => format!("{}/id/{}-L.jpg", COVERS_URL, id),
            (_, Some(isbn)) if !isbn.is_empty() => format!("{}/isbn/{}-L.jpg", COVERS_URL, isbn),
            _ => String::new(),
        };

        let publish_date = match doc.first_publish_year {
            Some(year) if year > 0 => year.to_string(),
            _ => year_only(doc.publish_date.first().map(String::as_str).unwrap_or("")),
        };

        let total_page = doc
            .number_of_pages_median
            .or(doc.number_of_pages)
            .filter(|p| *p > 0)
            .map(Numeric::from_int)
            .unwrap_or_default();

        let link = doc
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(|k| format!("{}{}", SITE_URL, k))
            .unwrap_or_default();

        let source_id = doc
            .key
            .as_deref()
            .map(|k| k.trim_start_matches("/works/").to_string());

        Book {
            title: text(doc.title.as_deref()),
            author: format_list(&authors),
            authors,
            category: Some(format_list(&categories)),
            categories: Some(categories),
            publisher: Some(doc.publisher.first().cloned().unwrap_or_default()),
            publish_date: Some(publish_date),
            total_page: Some(total_page),
            cover_small_url: Some(cover_url.clone()),
            cover_url: Some(cover_url),
            isbn10: Some(find_by_length(&isbns, 10)),
            isbn13: Some(find_by_length(&isbns, 13)),
            preview_link: Some(link.clone()),
            link: Some(link),
            description: Some(String::new()),
            asin: Some(String::new()),
            original_title: Some(text(doc.original_title.as_deref())),
            source_provider: Some(ServiceProvider::OpenLibrary.as_str().to_string()),
            source_id,
            ..Default::default()
        }
    }
}

fn find_by_length(isbns: &[String], len: usize) -> String {
    isbns
        .iter()
        .find(|i| i.len() == len)
        .cloned()
        .unwrap_or_default()
}

#[async_trait]
impl BookProvider for OpenLibrarySource {
    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            id: ServiceProvider::OpenLibrary,
            name: "Open Library",
            description: "Open, editable library catalog from the Internet Archive",
            base_url: SITE_URL,
            supports_details: false,
            requires_api_key: false,
        }
    }

    async fn get_by_query(
        &self,
        fetcher: &dyn Fetcher,
        query: &str,
        _options: &QueryOptions,
    ) -> Result<Vec<Book>, SourceError> {
        let query = require_query(query)?;
        let url = Self::search_url(query);
        let response = fetcher.get(&url, JSON_HEADERS).await?;
        if response.status != 200 {
            tracing::debug!("Open Library returned {} for {}", response.status, url);
            return Ok(Vec::new());
        }
        Self::parse_search_response(&response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "numFound": 2,
        "docs": [
            {
                "key": "/works/OL893415W",
                "title": "Dune",
                "author_name": ["Frank Herbert"],
                "cover_i": 11481354,
                "isbn": ["0441013597", "9780441013593"],
                "first_publish_year": 1965,
                "publisher": ["Chilton Books", "Ace"],
                "number_of_pages_median": 604,
                "subject": ["Science fiction", "Dune (Imaginary place)"]
            },
            {
                "key": "/works/OL1W",
                "title": "No Cover",
                "isbn": ["9781234567897"],
                "publish_date": ["March 2001", "2001"]
            }
        ]
    }"#;

    #[test]
    fn test_parse_search_response() {
        let books = OpenLibrarySource::parse_search_response(SAMPLE).unwrap();
        assert_eq!(books.len(), 2);

        let dune = &books[0];
        assert_eq!(dune.title, "Dune");
        assert_eq!(dune.author, "Frank Herbert");
        assert_eq!(
            dune.cover_url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/11481354-L.jpg")
        );
        assert_eq!(dune.isbn10.as_deref(), Some("0441013597"));
        assert_eq!(dune.isbn13.as_deref(), Some("9780441013593"));
        assert_eq!(dune.publish_date.as_deref(), Some("1965"));
        assert_eq!(dune.publisher.as_deref(), Some("Chilton Books"));
        assert_eq!(dune.total_page, Some(Numeric::from_int(604)));
        assert_eq!(dune.category.as_deref(), Some("Science fiction, Dune (Imaginary place)"));
        assert_eq!(dune.link.as_deref(), Some("https://openlibrary.org/works/OL893415W"));
        assert_eq!(dune.source_id.as_deref(), Some("OL893415W"));
    }

    #[test]
    fn test_cover_falls_back_to_isbn() {
        let books = OpenLibrarySource::parse_search_response(SAMPLE).unwrap();
        let book = &books[1];
        assert_eq!(
            book.cover_url.as_deref(),
            Some("https://covers.openlibrary.org/b/isbn/9781234567897-L.jpg")
        );
        assert_eq!(book.author, "");
        assert!(book.authors.is_empty());
        assert_eq!(book.isbn10.as_deref(), Some(""));
        assert_eq!(book.total_page, Some(Numeric::default()));
    }

    #[test]
    fn test_several_authors_and_subjects_are_joined() {
        let json = r#"{"docs": [{
            "title": "Good Omens",
            "author_name": ["Terry Pratchett", "Neil Gaiman"],
            "subject": ["Fantasy", "Humor"]
        }]}"#;
        let books = OpenLibrarySource::parse_search_response(json).unwrap();
        assert_eq!(books[0].author, "Terry Pratchett, Neil Gaiman");
        assert_eq!(books[0].category.as_deref(), Some("Fantasy, Humor"));
        assert_eq!(books[0].authors.len(), 2);
    }

    #[test]
    fn test_publish_date_falls_back_to_first_listed_date() {
        let json = r#"{"docs": [{"title": "X", "publish_date": ["2001-04-01"]}]}"#;
        let books = OpenLibrarySource::parse_search_response(json).unwrap();
        assert_eq!(books[0].publish_date.as_deref(), Some("2001"));
    }

    #[test]
    fn test_missing_docs_is_empty() {
        let books = OpenLibrarySource::parse_search_response(r#"{"numFound": 0}"#).unwrap();
        assert!(books.is_empty());
    }

    #[test]
    fn test_search_url_encodes_query() {
        assert_eq!(
            OpenLibrarySource::search_url("dune messiah"),
            "https://openlibrary.org/search.json?q=dune%20messiah"
        );
    }
}
