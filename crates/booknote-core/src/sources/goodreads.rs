//! Goodreads source (HTML scraping)
//!
//! DOM traversal lives behind [`GoodreadsExtractor`]; this module only turns
//! the extracted fragments into a [`Book`]. Structured data is read from the
//! page's `__NEXT_DATA__` blob and from its JSON-LD `Book` object.

use super::normalize::{dedupe, format_list, slash_date_from_millis, strip_isbn_prefix, text};
use super::traits::{require_query, BookProvider, QueryOptions, SourceError, SourceMetadata};
use crate::http::{Fetcher, HttpError, BROWSER_USER_AGENT};
use async_trait::async_trait;
use booknote_domain::{Book, Numeric, ServiceProvider};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

const SITE_URL: &str = "https://www.goodreads.com";
const HTML_HEADERS: &[(&str, &str)] = &[("User-Agent", BROWSER_USER_AGENT)];

lazy_static! {
    static ref ORIGINAL_TITLE: Regex =
        Regex::new(r#".*"Work:.*?"details":.*?"originalTitle":"(.*?)""#).unwrap();
    static ref PUBLISHER: Regex = Regex::new(r#""publisher":"(.*?)""#).unwrap();
    static ref ISBN: Regex = Regex::new(r#""isbn":"(.*?)""#).unwrap();
    static ref PUBLICATION_TIME: Regex = Regex::new(r#""publicationTime":(-?\d+)"#).unwrap();
    static ref COVER_HEIGHT: Regex = Regex::new(r"_SY\d+_").unwrap();
    static ref COVER_WIDTH: Regex = Regex::new(r"_SX\d+_").unwrap();
}

/// One row of the search results table
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoodreadsSearchRow {
    pub title: String,
    pub href: String,
    pub author: String,
    pub cover_src: Option<String>,
}

/// Raw fragments pulled from a book page
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoodreadsPage {
    pub title: String,
    pub authors: Vec<String>,
    pub description: String,
    pub genres: Vec<String>,
    pub asin: String,
    /// Text of the `#__NEXT_DATA__` script
    pub next_data: Option<String>,
    /// Bodies of every `application/ld+json` script
    pub ld_json: Vec<String>,
    /// Text of the "pages, format" line
    pub pages_format: Option<String>,
    pub image_src: Option<String>,
    pub canonical_url: Option<String>,
}

/// What a search URL resolved to
#[derive(Clone, Debug, PartialEq)]
pub enum GoodreadsSearchPage {
    /// Goodreads redirected straight to a single book
    Book(GoodreadsPage),
    Results(Vec<GoodreadsSearchRow>),
}

/// DOM extraction for Goodreads pages
pub trait GoodreadsExtractor: Send + Sync {
    fn search_page(&self, html: &str) -> Result<GoodreadsSearchPage, SourceError>;
    fn book_page(&self, html: &str) -> Result<GoodreadsPage, SourceError>;
}

pub struct GoodreadsSource {
    extractor: Option<Arc<dyn GoodreadsExtractor>>,
}

impl GoodreadsSource {
    pub fn new(extractor: Option<Arc<dyn GoodreadsExtractor>>) -> Self {
        Self { extractor }
    }

    pub fn search_url(query: &str) -> String {
        format!("{}/search?q={}", SITE_URL, urlencoding::encode(query))
    }

    fn extractor(&self) -> Result<&dyn GoodreadsExtractor, SourceError> {
        self.extractor
            .as_deref()
            .ok_or(SourceError::MissingExtractor("Goodreads"))
    }

    /// Normalize one search-table row into a partial record
    pub fn normalize_row(row: &GoodreadsSearchRow) -> Option<Book> {
        let title = row.title.trim().replace('"', "'");
        let href = row.href.trim();
        if title.is_empty() || href.is_empty() {
            return None;
        }
        let link = absolute_link(href);
        let author = row.author.trim().to_string();
        let small_cover = text(row.cover_src.as_deref());

        Some(Book {
            title,
            authors: if author.is_empty() { Vec::new() } else { vec![author.clone()] },
            author,
            subtitle: Some(String::new()),
            category: Some(String::new()),
            categories: Some(Vec::new()),
            publisher: Some(String::new()),
            publish_date: Some(String::new()),
            total_page: Some(Numeric::default()),
            cover_url: Some(high_res_cover(&small_cover)),
            cover_small_url: Some(small_cover),
            description: Some(String::new()),
            link: Some(link.clone()),
            preview_link: Some(link),
            isbn10: Some(String::new()),
            isbn13: Some(String::new()),
            original_title: Some(String::new()),
            translator: Some(String::new()),
            narrator: Some(String::new()),
            asin: Some(String::new()),
            source_provider: Some(ServiceProvider::Goodreads.as_str().to_string()),
            ..Default::default()
        })
    }

    /// Normalize a full book page
    pub fn normalize_page(page: &GoodreadsPage, link: &str) -> Book {
        let authors = dedupe(page.authors.iter().cloned());
        let categories = dedupe(page.genres.iter().cloned());

        let mut original_title = String::new();
        let mut publisher = String::new();
        let mut isbn10 = String::new();
        let mut publish_date = String::new();
        if let Some(next_data) = page.next_data.as_deref() {
            original_title = capture(&ORIGINAL_TITLE, next_data);
            publisher = capture(&PUBLISHER, next_data);
            isbn10 = strip_isbn_prefix(&capture(&ISBN, next_data));
            publish_date = PUBLICATION_TIME
                .captures(next_data)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .map(slash_date_from_millis)
                .unwrap_or_default();
        }

        let schema = SchemaBook::from_scripts(&page.ld_json);
        let total_page = schema
            .number_of_pages
            .or_else(|| pages_from_format(page.pages_format.as_deref()))
            .unwrap_or_default();
        let cover = schema
            .image
            .or_else(|| page.image_src.clone().filter(|s| !s.trim().is_empty()))
            .map(|src| high_res_cover(src.trim()))
            .unwrap_or_default();
        let isbn13 = schema
            .isbn
            .map(|i| strip_isbn_prefix(&i))
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| isbn10.clone());

        Book {
            title: page.title.trim().replace('"', "'"),
            subtitle: Some(String::new()),
            author: format_list(&authors),
            authors,
            category: Some(format_list(&categories)),
            categories: Some(categories),
            publisher: Some(publisher),
            publish_date: Some(publish_date),
            total_page: Some(total_page),
            cover_small_url: Some(cover.clone()),
            cover_url: Some(cover),
            description: Some(page.description.trim().replace('"', "'")),
            link: Some(link.to_string()),
            preview_link: Some(link.to_string()),
            isbn10: Some(isbn10),
            isbn13: Some(isbn13),
            original_title: Some(original_title),
            translator: Some(String::new()),
            narrator: Some(String::new()),
            asin: Some(page.asin.trim().to_string()),
            source_provider: Some(ServiceProvider::Goodreads.as_str().to_string()),
            source_id: goodreads_id(link),
            ..Default::default()
        }
    }

    async fn fetch_html(fetcher: &dyn Fetcher, url: &str) -> Result<String, SourceError> {
        let response = fetcher.get(url, HTML_HEADERS).await?;
        if !response.is_success() {
            return Err(SourceError::Http(HttpError::Status {
                status: response.status,
                url: url.to_string(),
            }));
        }
        Ok(response.body)
    }

    async fn load_book(&self, fetcher: &dyn Fetcher, book: &Book) -> Result<Book, SourceError> {
        let link = book
            .link
            .as_deref()
            .filter(|l| !l.is_empty())
            .ok_or(SourceError::NotFound)?;
        let extractor = self.extractor()?;
        let html = Self::fetch_html(fetcher, link).await?;
        let page = extractor.book_page(&html)?;
        Ok(Self::normalize_page(&page, link))
    }
}

#[async_trait]
impl BookProvider for GoodreadsSource {
    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            id: ServiceProvider::Goodreads,
            name: "Goodreads",
            description: "Goodreads book pages (scraped)",
            base_url: SITE_URL,
            supports_details: true,
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
        let extractor = self.extractor()?;
        let url = Self::search_url(query);
        let html = Self::fetch_html(fetcher, &url).await?;

        match extractor.search_page(&html)? {
            GoodreadsSearchPage::Book(page) => {
                let link = page
                    .canonical_url
                    .clone()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or(url);
                Ok(vec![Self::normalize_page(&page, &link)])
            }
            GoodreadsSearchPage::Results(rows) => {
                Ok(rows.iter().filter_map(Self::normalize_row).collect())
            }
        }
    }

    /// Scrape the book page; on any failure the partial record is returned as is
    async fn get_book(&self, fetcher: &dyn Fetcher, book: &Book) -> Result<Book, SourceError> {
        match self.load_book(fetcher, book).await {
            Ok(full) => Ok(full),
            Err(e) => {
                tracing::warn!("Goodreads details for '{}' unavailable: {}", book.title, e);
                Ok(book.clone())
            }
        }
    }
}

/// Fields read from a JSON-LD `Book` object
#[derive(Debug, Default)]
struct SchemaBook {
    isbn: Option<String>,
    number_of_pages: Option<Numeric>,
    image: Option<String>,
}

impl SchemaBook {
    fn from_scripts(scripts: &[String]) -> Self {
        let mut out = SchemaBook::default();
        for script in scripts {
            let Ok(value) = serde_json::from_str::<serde_json::Value>(script) else {
                continue;
            };
            if value.get("@type").and_then(|t| t.as_str()) != Some("Book") {
                continue;
            }
            if let Some(isbn) = value.get("isbn").and_then(|v| v.as_str()).filter(|s| !s.is_empty()) {
                out.isbn = Some(isbn.to_string());
            }
            match value.get("numberOfPages") {
                Some(serde_json::Value::Number(n)) => out.number_of_pages = Some(Numeric::Number(n.clone())),
                Some(serde_json::Value::String(s)) if !s.is_empty() => {
                    out.number_of_pages = Some(Numeric::Text(s.clone()))
                }
                _ => {}
            }
            if out.image.is_none() {
                out.image = value
                    .get("image")
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
            }
        }
        out
    }
}

fn capture(re: &Regex, haystack: &str) -> String {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// "320 pages, Paperback" -> 320
fn pages_from_format(text: Option<&str>) -> Option<Numeric> {
    let first = text?.split_whitespace().next()?;
    Some(
        first
            .parse::<i64>()
            .map(Numeric::from_int)
            .unwrap_or_else(|_| Numeric::Text(first.to_string())),
    )
}

fn absolute_link(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", SITE_URL, href)
    }
}

/// Rewrite the size tokens of a Goodreads cover URL to 475px
pub fn high_res_cover(url: &str) -> String {
    let url = COVER_HEIGHT.replace(url, "_SY475_");
    COVER_WIDTH.replace(&url, "_SX475_").into_owned()
}

fn goodreads_id(link: &str) -> Option<String> {
    let path = url::Url::parse(link).ok()?;
    let segment = path.path_segments()?.last()?.to_string();
    let id: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXT_DATA: &str = r#"{"props":{"pageProps":{"apolloState":{"Book:kca://book/1":{"details":{"publisher":"Ace Books","publicationTime":-142214400000,"isbn":"0441013597"}},"Work:kca://work/1":{"details":{"originalTitle":"Dune","publicationTime":-142214400000}}}}}}"#;

    const LD_JSON: &str = r#"{"@context":"https://schema.org","@type":"Book","name":"Dune","image":"https://images.gr-assets.com/books/1555447414i/44767458._SY160_.jpg","isbn":"9780441013593","numberOfPages":658}"#;

    fn page() -> GoodreadsPage {
        GoodreadsPage {
            title: "Dune".to_string(),
            authors: vec!["Frank Herbert".to_string()],
            description: "Set on the desert planet \"Arrakis\".".to_string(),
            genres: vec!["Science Fiction".to_string(), "Classics".to_string()],
            asin: " B00B7NPRY8 ".to_string(),
            next_data: Some(NEXT_DATA.to_string()),
            ld_json: vec!["not json".to_string(), LD_JSON.to_string()],
            pages_format: Some("896 pages, Paperback".to_string()),
            image_src: None,
            canonical_url: None,
        }
    }

    #[test]
    fn test_normalize_page() {
        let book = GoodreadsSource::normalize_page(&page(), "https://www.goodreads.com/book/show/44767458-dune");
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.original_title.as_deref(), Some("Dune"));
        assert_eq!(book.publisher.as_deref(), Some("Ace Books"));
        assert_eq!(book.isbn10.as_deref(), Some("0441013597"));
        assert_eq!(book.isbn13.as_deref(), Some("9780441013593"));
        assert_eq!(book.publish_date.as_deref(), Some("1965/06/30"));
        assert_eq!(book.total_page, Some(Numeric::from_int(658)));
        assert_eq!(book.category.as_deref(), Some("Science Fiction, Classics"));
        assert_eq!(book.asin.as_deref(), Some("B00B7NPRY8"));
        assert_eq!(book.description.as_deref(), Some("Set on the desert planet 'Arrakis'."));
        assert!(book.cover_url.as_deref().unwrap().contains("._SY475_.jpg"));
        assert_eq!(book.source_id.as_deref(), Some("44767458"));
    }

    #[test]
    fn test_several_authors_are_joined() {
        let mut p = page();
        p.title = "Good Omens".to_string();
        p.authors = vec!["Terry Pratchett".to_string(), "Neil Gaiman".to_string()];
        p.genres = vec!["Fantasy".to_string()];
        let book = GoodreadsSource::normalize_page(&p, "https://www.goodreads.com/book/show/12067");
        assert_eq!(book.author, "Terry Pratchett, Neil Gaiman");
        assert_eq!(book.category.as_deref(), Some("Fantasy"));
    }

    #[test]
    fn test_pages_fall_back_to_format_line() {
        let mut p = page();
        p.ld_json.clear();
        p.next_data = None;
        let book = GoodreadsSource::normalize_page(&p, "https://www.goodreads.com/book/show/1");
        assert_eq!(book.total_page, Some(Numeric::from_int(896)));
        assert_eq!(book.isbn13.as_deref(), Some(""));
        assert_eq!(book.publish_date.as_deref(), Some(""));
    }

    #[test]
    fn test_normalize_row() {
        let row = GoodreadsSearchRow {
            title: " The \"Hobbit\" ".to_string(),
            href: "/book/show/5907.The_Hobbit".to_string(),
            author: "J.R.R. Tolkien".to_string(),
            cover_src: Some("https://i.gr-assets.com/5907._SX50_.jpg".to_string()),
        };
        let book = GoodreadsSource::normalize_row(&row).unwrap();
        assert_eq!(book.title, "The 'Hobbit'");
        assert_eq!(book.link.as_deref(), Some("https://www.goodreads.com/book/show/5907.The_Hobbit"));
        assert_eq!(book.cover_url.as_deref(), Some("https://i.gr-assets.com/5907._SX475_.jpg"));
        assert_eq!(book.cover_small_url.as_deref(), Some("https://i.gr-assets.com/5907._SX50_.jpg"));

        let untitled = GoodreadsSearchRow {
            href: "/book/show/1".to_string(),
            ..Default::default()
        };
        assert!(GoodreadsSource::normalize_row(&untitled).is_none());
    }

    #[test]
    fn test_high_res_cover() {
        assert_eq!(high_res_cover("a._SY75_.jpg"), "a._SY475_.jpg");
        assert_eq!(high_res_cover("a.jpg"), "a.jpg");
    }
}
