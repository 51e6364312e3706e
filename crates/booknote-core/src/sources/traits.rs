//! Common traits for provider normalizers

use crate::http::{Fetcher, HttpError};
use async_trait::async_trait;
use booknote_domain::{Book, ServiceProvider};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(HttpError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Rate limited")]
    RateLimit,
    #[error("Not found")]
    NotFound,
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Unsupported service provider: {0}")]
    Unsupported(String),
    #[error("No HTML extractor configured for {0}")]
    MissingExtractor(&'static str),
}

impl From<HttpError> for SourceError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::RateLimited => SourceError::RateLimit,
            other => SourceError::Http(other),
        }
    }
}

/// Metadata about a provider
pub struct SourceMetadata {
    pub id: ServiceProvider,
    pub name: &'static str,
    pub description: &'static str,
    pub base_url: &'static str,
    pub supports_details: bool,
    pub requires_api_key: bool,
}

/// Per-query options supplied by the caller
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    /// Target language, e.g. "en" or "fr-CA"; overrides the configured locale
    pub locale: Option<String>,
}

impl QueryOptions {
    pub fn with_locale(locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
        }
    }
}

/// Books found by a search plus the items that failed to load, keyed by the
/// provider's item id
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub books: Vec<Book>,
    pub failures: Vec<(String, SourceError)>,
}

/// One external bibliographic source.
///
/// `get_by_query` returns partial records; `get_book` upgrades one of them to
/// a full record for providers that expose a detail endpoint. `search` is the
/// reporting form of `get_by_query` for providers that load several items
/// per query.
#[async_trait]
pub trait BookProvider: Send + Sync {
    fn metadata(&self) -> SourceMetadata;

    async fn get_by_query(
        &self,
        fetcher: &dyn Fetcher,
        query: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Book>, SourceError>;

    /// Search and report per-item failures alongside the books that loaded
    async fn search(
        &self,
        fetcher: &dyn Fetcher,
        query: &str,
        options: &QueryOptions,
    ) -> Result<SearchOutcome, SourceError> {
        Ok(SearchOutcome {
            books: self.get_by_query(fetcher, query, options).await?,
            failures: Vec::new(),
        })
    }

    async fn get_book(&self, _fetcher: &dyn Fetcher, book: &Book) -> Result<Book, SourceError> {
        Ok(book.clone())
    }

    fn supports_details(&self) -> bool {
        self.metadata().supports_details
    }
}

/// Reject blank queries before any request is built
pub(crate) fn require_query(query: &str) -> Result<&str, SourceError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(SourceError::InvalidQuery("query is empty".to_string()))
    } else {
        Ok(trimmed)
    }
}
