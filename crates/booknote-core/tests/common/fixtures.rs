//! Test fixture loading utilities

use booknote_core::Book;
use std::path::PathBuf;

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Load a mock API response fixture
#[allow(dead_code)]
pub fn load_response_fixture(name: &str) -> String {
    load_fixture(&format!("responses/{}", name))
}

/// The record most tests render
#[allow(dead_code)]
pub fn dune() -> Book {
    Book {
        isbn13: Some("9780441013593".to_string()),
        categories: Some(vec!["Science Fiction".to_string()]),
        ..Book::new("Dune", "Frank Herbert")
    }
}
