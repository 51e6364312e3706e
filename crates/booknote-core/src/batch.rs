//! Multi-book enrichment and note creation
//!
//! Detail fetches for a selection run concurrently and every one is awaited;
//! a failed fetch keeps the partial record and is reported. Note creation
//! is sequential so each book fails on its own.

use crate::config::{BooknoteConfig, TemplateConfig};
use crate::error::PipelineError;
use crate::filename::make_file_name_now;
use crate::http::Fetcher;
use crate::render::{render_note, ImageStore};
use crate::sources::{BookProvider, SourceError};
use async_trait::async_trait;
use booknote_domain::{Book, FieldValue, FrontMatter};
use futures::future::join_all;
use std::path::Path;
use tracing::{debug, info, warn};

/// Creates note files
#[async_trait]
pub trait NoteSink: Send + Sync {
    /// Create a new note at `path` and return a handle (usually the path)
    async fn create_note(&self, path: &str, contents: &str) -> Result<String, PipelineError>;
}

/// Result of [`enrich_books`]
#[derive(Debug, Default)]
pub struct EnrichResult {
    /// One record per input, in input order
    pub books: Vec<Book>,
    /// Titles whose detail fetch failed, with the error
    pub failures: Vec<(String, SourceError)>,
}

/// Upgrade every selected record to a full record
pub async fn enrich_books(provider: &dyn BookProvider, fetcher: &dyn Fetcher, books: Vec<Book>) -> EnrichResult {
    if !provider.supports_details() {
        return EnrichResult {
            books,
            failures: Vec::new(),
        };
    }

    debug!(count = books.len(), "Fetching book details");
    let results = join_all(books.iter().map(|book| provider.get_book(fetcher, book))).await;

    let mut enriched = EnrichResult::default();
    for (book, result) in books.into_iter().zip(results) {
        match result {
            Ok(full) => enriched.books.push(full),
            Err(e) => {
                warn!(title = %book.title, error = %e, "Detail fetch failed, keeping search result");
                enriched.failures.push((book.title.clone(), e));
                enriched.books.push(book);
            }
        }
    }
    enriched
}

/// An existing note known to the host
#[derive(Debug, Clone, Default)]
pub struct IndexedNote {
    pub path: String,
    pub front_matter: FrontMatter,
}

impl IndexedNote {
    pub fn new(path: impl Into<String>, front_matter: FrontMatter) -> Self {
        Self {
            path: path.into(),
            front_matter,
        }
    }

    /// File name without directory or extension
    pub fn basename(&self) -> &str {
        Path::new(&self.path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.path)
    }

    fn has_identifier(&self, isbn: &str) -> bool {
        ["isbn", "isbn10", "isbn13", "ids"].iter().any(|key| {
            self.front_matter
                .get(key)
                .is_some_and(|value| !matches!(value, FieldValue::List(_)) && value.to_display_string() == isbn)
        })
    }
}

/// Snapshot of the notes a duplicate check runs against
#[derive(Debug, Clone, Default)]
pub struct NoteIndex {
    pub notes: Vec<IndexedNote>,
}

impl NoteIndex {
    pub fn new(notes: Vec<IndexedNote>) -> Self {
        Self { notes }
    }

    /// Existing note for `book` inside `folder`, matched by title or identifier
    pub fn find_existing(&self, folder: &str, book: &Book) -> Option<&IndexedNote> {
        find_existing_note(&self.notes, folder, &book.title, book.primary_isbn())
    }
}

/// First note in `folder` whose lower-cased name contains the lower-cased
/// title, or whose header `isbn`/`isbn10`/`isbn13`/`ids` equals `isbn`.
///
/// An empty title never matches by name.
pub fn find_existing_note<'a>(
    notes: &'a [IndexedNote],
    folder: &str,
    title: &str,
    isbn: Option<&str>,
) -> Option<&'a IndexedNote> {
    let title = title.trim().to_lowercase();
    let isbn = isbn.filter(|i| !i.is_empty());

    notes
        .iter()
        .filter(|note| folder.is_empty() || note.path.starts_with(folder))
        .find(|note| {
            (!title.is_empty() && note.basename().to_lowercase().contains(&title))
                || isbn.is_some_and(|isbn| note.has_identifier(isbn))
        })
}

/// Full path of the note for `book`
pub fn note_path(book: &Book, config: &BooknoteConfig) -> String {
    let file_name = make_file_name_now(book, Some(config.file_name_format.as_str()));
    let folder = config.folder.trim_end_matches('/');
    if folder.is_empty() {
        file_name
    } else {
        format!("{}/{}", folder, file_name)
    }
}

/// Render one book and hand it to `sink`
pub async fn create_note_for_book(
    book: &Book,
    config: &BooknoteConfig,
    template: &TemplateConfig,
    sink: &dyn NoteSink,
    images: Option<&dyn ImageStore>,
) -> Result<String, PipelineError> {
    let contents = render_note(book, template, images).await;
    let path = note_path(book, config);
    debug!(path = %path, "Creating note");
    sink.create_note(&path, &contents).await
}

/// Counts reported after a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Handles returned by the sink
    pub created: Vec<String>,
    /// Titles skipped as duplicates
    pub skipped: Vec<String>,
    /// Titles whose note could not be created
    pub failed: Vec<String>,
    /// The user aborted; remaining books were not processed
    pub cancelled: bool,
}

impl BatchSummary {
    /// "Created 2 book notes, skipped 1 duplicate. Failed: Dune"
    pub fn message(&self) -> String {
        let mut message = format!("Created {} book note{}", self.created.len(), plural(self.created.len()));
        if !self.skipped.is_empty() {
            message.push_str(&format!(
                ", skipped {} duplicate{}",
                self.skipped.len(),
                plural(self.skipped.len())
            ));
        }
        if !self.failed.is_empty() {
            message.push_str(&format!(". Failed: {}", self.failed.join(", ")));
        }
        message
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Create one note per book, in order.
///
/// With `warn_on_duplicate` set, books that already have a note in `index`
/// are skipped. Failures are collected by title; a cancellation stops the
/// batch without being logged.
pub async fn create_notes(
    books: &[Book],
    config: &BooknoteConfig,
    template: &TemplateConfig,
    index: &NoteIndex,
    sink: &dyn NoteSink,
    images: Option<&dyn ImageStore>,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for book in books {
        if config.warn_on_duplicate && index.find_existing(&config.folder, book).is_some() {
            debug!(title = %book.title, "Skipping duplicate");
            summary.skipped.push(book.title.clone());
            continue;
        }

        match create_note_for_book(book, config, template, sink, images).await {
            Ok(handle) => summary.created.push(handle),
            Err(e) if e.is_cancelled() => {
                summary.cancelled = true;
                break;
            }
            Err(e) => {
                warn!(title = %book.title, error = %e, "Failed to create note");
                summary.failed.push(book.title.clone());
            }
        }
    }

    info!("{}", summary.message());
    summary
}
