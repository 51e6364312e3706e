//! booknote-core: metadata normalization and note rendering
//!
//! This library provides:
//! - Provider normalizers (Google Books, Open Library, Calibre, Goodreads)
//! - Header merge, emission and parsing
//! - `{{field}}` substitution with date placeholders
//! - Sandboxed `<%= %>` inline expressions
//! - Tag derivation and file naming
//! - The render pipeline and batch note creation
//!
//! Network access goes through the [`http::Fetcher`] trait; the `native`
//! feature provides a reqwest implementation.

pub mod batch;
pub mod config;
pub mod error;
pub mod filename;
pub mod frontmatter;
pub mod http;
pub mod render;
pub mod script;
pub mod sources;
pub mod tags;
pub mod template;

pub use batch::{
    create_note_for_book, create_notes, enrich_books, find_existing_note, BatchSummary, EnrichResult,
    IndexedNote, NoteIndex, NoteSink,
};
pub use config::{BooknoteConfig, ConfigError, TemplateConfig};
pub use error::PipelineError;
pub use filename::{cover_image_file_name, make_file_name, make_file_name_now};
pub use frontmatter::{
    apply_default_front_matter, apply_default_front_matter_text, parse_front_matter, to_string_front_matter,
};
pub use http::{Fetcher, HttpError, HttpResponse};
pub use render::{render, render_document, render_note, ImageStore};
pub use script::{execute_inline_scripts, ScriptError};
pub use sources::{provider_for, BookProvider, QueryOptions, SearchOutcome, SourceError};
pub use tags::create_book_tags;
pub use template::{apply_template_transformations, replace_date_in_string, replace_variable_syntax};

pub use booknote_domain::{Book, FieldValue, FrontMatter, KeyStyle, ServiceProvider};
