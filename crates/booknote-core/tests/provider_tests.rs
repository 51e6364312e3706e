//! Provider integration tests against canned responses

mod common;

use booknote_core::config::BooknoteConfig;
use booknote_core::sources::{
    provider_for, BookProvider, CalibreSource, GoodreadsSource, GoogleBooksSource, OpenLibrarySource,
    QueryOptions, SourceError,
};
use booknote_core::{enrich_books, Book, ServiceProvider};
use booknote_domain::{CustomValue, Numeric};
use common::fixtures::load_response_fixture;
use common::mocks::MockFetcher;

// === Google Books ===

fn google_fetcher(source: &GoogleBooksSource, options: &QueryOptions) -> MockFetcher {
    let url = source.search_url("dune", options).unwrap();
    MockFetcher::new().route(&url, 200, load_response_fixture("google_volumes.json"))
}

#[tokio::test]
async fn test_google_keeps_matching_language_only() {
    let source = GoogleBooksSource::new("en-GB", true, None);
    let options = QueryOptions::default();
    let fetcher = google_fetcher(&source, &options);

    let books = source.get_by_query(&fetcher, "dune", &options).await.unwrap();

    assert_eq!(books.len(), 1);
    let dune = &books[0];
    assert_eq!(dune.title, "Dune");
    assert_eq!(dune.isbn13.as_deref(), Some("9780441013593"));
    assert_eq!(dune.publish_date.as_deref(), Some("2005"));
    assert_eq!(dune.description.as_deref(), Some("Set on the desert planet Arrakis."));
    assert_eq!(dune.source_provider.as_deref(), Some("google"));
}

#[tokio::test]
async fn test_google_locale_option_switches_filter() {
    let source = GoogleBooksSource::new("en", true, None);
    let options = QueryOptions::with_locale("fr");
    let fetcher = google_fetcher(&source, &options);

    let books = source.get_by_query(&fetcher, "dune", &options).await.unwrap();

    assert_eq!(books.len(), 1);
    assert_eq!(books[0].author, "Frank Herbert, Michel Demuth");
    assert_eq!(books[0].authors.len(), 2);
}

#[tokio::test]
async fn test_google_edge_curl_policy() {
    let options = QueryOptions::default();

    let keep = GoogleBooksSource::new("en", true, None);
    let books = keep.get_by_query(&google_fetcher(&keep, &options), "dune", &options).await.unwrap();
    assert!(books[0].cover_url.as_deref().unwrap().contains("edge=curl"));

    let strip = GoogleBooksSource::new("en", false, None);
    let books = strip.get_by_query(&google_fetcher(&strip, &options), "dune", &options).await.unwrap();
    assert!(!books[0].cover_url.as_deref().unwrap().contains("edge=curl"));
    assert!(books[0].cover_large_url.as_deref().unwrap().contains("zoom=3"));
}

#[tokio::test]
async fn test_google_error_status_is_surfaced() {
    let source = GoogleBooksSource::new("en", true, None);
    let options = QueryOptions::default();
    let url = source.search_url("dune", &options).unwrap();
    let fetcher = MockFetcher::new().route(&url, 503, "");

    let result = source.get_by_query(&fetcher, "dune", &options).await;
    assert!(matches!(result, Err(SourceError::Http(_))));
}

#[tokio::test]
async fn test_blank_query_is_rejected_before_fetching() {
    let source = GoogleBooksSource::new("en", true, None);
    let fetcher = MockFetcher::new();

    let result = source.get_by_query(&fetcher, "   ", &QueryOptions::default()).await;
    assert!(matches!(result, Err(SourceError::InvalidQuery(_))));
    assert!(fetcher.requests().is_empty());
}

// === Open Library ===

#[tokio::test]
async fn test_open_library_search() {
    let fetcher = MockFetcher::new().route(
        &OpenLibrarySource::search_url("dune"),
        200,
        load_response_fixture("open_library_search.json"),
    );

    let books = OpenLibrarySource::new()
        .get_by_query(&fetcher, "dune", &QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(books.len(), 2);
    assert_eq!(books[0].publish_date.as_deref(), Some("1965"));
    assert_eq!(books[0].isbn10.as_deref(), Some("0441013597"));
    assert_eq!(books[0].total_page, Some(Numeric::from_int(612)));
    assert_eq!(
        books[0].cover_url.as_deref(),
        Some("https://covers.openlibrary.org/b/id/11481354-L.jpg")
    );
    assert_eq!(books[1].publish_date.as_deref(), Some("1988"));
    assert_eq!(
        books[1].cover_url.as_deref(),
        Some("https://covers.openlibrary.org/b/isbn/0140328726-L.jpg")
    );
}

#[tokio::test]
async fn test_open_library_error_status_is_empty() {
    let fetcher = MockFetcher::new();
    let books = OpenLibrarySource::new()
        .get_by_query(&fetcher, "dune", &QueryOptions::default())
        .await
        .unwrap();
    assert!(books.is_empty());
}

// === Calibre ===

fn calibre_fetcher(source: &CalibreSource) -> MockFetcher {
    MockFetcher::new()
        .route(&source.search_url("dune"), 200, load_response_fixture("calibre_search.json"))
        .route(&source.book_url("1"), 200, load_response_fixture("calibre_book_1.json"))
        .route(&source.book_url("2"), 500, "")
        .route(&source.book_url("3"), 200, load_response_fixture("calibre_book_3.json"))
}

#[tokio::test]
async fn test_calibre_reports_failed_detail_fetch() {
    let source = CalibreSource::new("http://calibre.local:8080/", "library");
    let fetcher = calibre_fetcher(&source);

    let result = source.search_details(&fetcher, "dune").await.unwrap();

    let titles: Vec<&str> = result.books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune", "Children of Dune"]);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].0, "2");
}

#[tokio::test]
async fn test_calibre_failed_ids_reach_provider_callers() {
    let config = BooknoteConfig {
        service_provider: ServiceProvider::Calibre,
        calibre_server_url: "http://calibre.local:8080".to_string(),
        calibre_library_id: "library".to_string(),
        ..Default::default()
    };
    let provider = provider_for(&config, None, None).unwrap();
    let fetcher = calibre_fetcher(&CalibreSource::new("http://calibre.local:8080", "library"));

    let outcome = provider
        .search(&fetcher, "dune", &QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.books.len(), 2);
    let failed: Vec<&str> = outcome.failures.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(failed, vec!["2"]);
    assert!(matches!(outcome.failures[0].1, SourceError::Http(_)));

    let books = provider
        .get_by_query(&fetcher, "dune", &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(books.len(), 2);
}

#[tokio::test]
async fn test_search_without_item_failures() {
    let fetcher = MockFetcher::new().route(
        &OpenLibrarySource::search_url("dune"),
        200,
        load_response_fixture("open_library_search.json"),
    );
    let outcome = OpenLibrarySource::new()
        .search(&fetcher, "dune", &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.books.len(), 2);
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn test_calibre_detail_normalization() {
    let source = CalibreSource::new("http://calibre.local:8080", "library");
    let fetcher = calibre_fetcher(&source);

    let books = source.get_by_query(&fetcher, "dune", &QueryOptions::default()).await.unwrap();
    let dune = &books[0];

    assert_eq!(dune.description.as_deref(), Some("Desert planet."));
    assert_eq!(dune.isbn13.as_deref(), Some("9780441013593"));
    assert_eq!(dune.ids.as_deref(), Some("9780441013593"));
    assert_eq!(dune.publish_date.as_deref(), Some("1990"));
    assert_eq!(dune.cover_url.as_deref(), Some("http://calibre.local:8080/get/cover/1/calibre"));
    assert_eq!(dune.series_link.as_deref(), Some("[[Dune Chronicles]]"));
    assert_eq!(dune.series_number, Some(Numeric::from_int(1)));
    assert_eq!(dune.my_rate, Some(Numeric::from_float(4.0)));
    let columns = dune.custom_columns.as_ref().unwrap();
    assert_eq!(columns.get("read"), Some(&CustomValue::Bool(true)));
    assert!(!columns.contains_key("shelf"));

    let children = &books[1];
    assert_eq!(
        children.cover_url.as_deref(),
        Some("http://calibre.local:8080/get/cover/3/library")
    );
    assert_eq!(children.source_id.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_calibre_all_details_failing_is_an_error() {
    let source = CalibreSource::new("http://calibre.local:8080", "calibre");
    let fetcher = MockFetcher::new().route(
        &source.search_url("dune"),
        200,
        load_response_fixture("calibre_search.json"),
    );

    let result = source.get_by_query(&fetcher, "dune", &QueryOptions::default()).await;
    assert!(matches!(result, Err(SourceError::Http(_))));
}

// === Goodreads ===

#[tokio::test]
async fn test_goodreads_without_extractor() {
    let source = GoodreadsSource::new(None);
    let result = source
        .get_by_query(&MockFetcher::new(), "dune", &QueryOptions::default())
        .await;
    assert!(matches!(result, Err(SourceError::MissingExtractor(_))));
}

#[tokio::test]
async fn test_goodreads_details_fall_back_to_partial_record() {
    let source = GoodreadsSource::new(None);
    let partial = Book {
        link: Some("https://www.goodreads.com/book/show/44767458-dune".to_string()),
        ..Book::new("Dune", "Frank Herbert")
    };

    let enriched = enrich_books(&source, &MockFetcher::new(), vec![partial.clone()]).await;

    assert_eq!(enriched.books, vec![partial]);
    assert!(enriched.failures.is_empty());
}

// === Factory ===

#[test]
fn test_provider_for_honors_override() {
    let config = BooknoteConfig::default();
    let provider = provider_for(&config, Some(ServiceProvider::OpenLibrary), None).unwrap();
    assert_eq!(provider.metadata().id, ServiceProvider::OpenLibrary);

    let default = provider_for(&config, None, None).unwrap();
    assert_eq!(default.metadata().id, ServiceProvider::Google);
}

#[test]
fn test_provider_for_calibre_needs_server() {
    let config = BooknoteConfig {
        service_provider: ServiceProvider::Calibre,
        calibre_server_url: "  ".to_string(),
        ..Default::default()
    };
    assert!(matches!(provider_for(&config, None, None), Err(SourceError::Unsupported(_))));
}
