//! Note rendering: record + template configuration -> document text
//!
//! Two paths exist. A full template note (when configured) goes through date
//! placeholders, field substitution and inline expressions. Otherwise the
//! header template and body template are substituted separately, the header
//! is optionally merged with the generated default header, and the two are
//! joined as `---\n<header>\n---\n<body>`.

use crate::config::TemplateConfig;
use crate::error::PipelineError;
use crate::filename::cover_image_file_name;
use crate::frontmatter::{apply_default_front_matter_text, to_string_front_matter};
use crate::script::execute_inline_scripts;
use crate::tags::create_book_tags;
use crate::template::{apply_template_transformations, replace_variable_syntax};
use async_trait::async_trait;
use booknote_domain::Book;
use chrono::{Local, NaiveDateTime};
use tracing::{debug, warn};

/// Persists downloaded cover images
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Download `url` into `directory/file_name` and return the stored path
    async fn save_image(&self, url: &str, directory: &str, file_name: &str) -> Result<String, PipelineError>;
}

/// Tag the record and, when enabled, save its cover through `images`.
///
/// A failed download leaves `localCoverImage` empty and is logged.
pub async fn prepare_book(book: &Book, config: &TemplateConfig, images: Option<&dyn ImageStore>) -> Book {
    let mut book = book.clone();
    book.tags = Some(create_book_tags(&book));

    if !config.enable_cover_image_save {
        return book;
    }
    let (Some(images), Some(url)) = (images, book.best_cover_url()) else {
        return book;
    };

    let url = url.to_string();
    let file_name = cover_image_file_name(&book);
    book.local_cover_image = Some(match images.save_image(&url, &config.cover_image_path, &file_name).await {
        Ok(path) => format!("[[{}]]", path),
        Err(e) => {
            warn!(url = %url, error = %e, "Cover image download failed");
            String::new()
        }
    });
    book
}

/// Render an already prepared record at `now`
pub fn render_prepared(book: &Book, config: &TemplateConfig, now: NaiveDateTime) -> String {
    if let Some(template) = config.template.as_deref() {
        debug!(title = %book.title, "Rendering from template note");
        let substituted = replace_variable_syntax(book, &apply_template_transformations(template, now));
        return execute_inline_scripts(book, &substituted);
    }

    let mut header = replace_variable_syntax(book, &config.frontmatter);
    if config.use_default_frontmatter {
        header = to_string_front_matter(&apply_default_front_matter_text(book, &header, config.key_style));
    }
    let body = execute_inline_scripts(book, &replace_variable_syntax(book, &config.content));

    if header.is_empty() {
        body
    } else {
        format!("---\n{}\n---\n{}", header, body)
    }
}

/// Derive tags and render at `now`, without touching cover images
pub fn render_document(book: &Book, config: &TemplateConfig, now: NaiveDateTime) -> String {
    let mut book = book.clone();
    book.tags = Some(create_book_tags(&book));
    render_prepared(&book, config, now)
}

/// [`render_document`] against the local clock
pub fn render(book: &Book, config: &TemplateConfig) -> String {
    render_document(book, config, Local::now().naive_local())
}

/// Full render including the optional cover download
pub async fn render_note(book: &Book, config: &TemplateConfig, images: Option<&dyn ImageStore>) -> String {
    let prepared = prepare_book(book, config, images).await;
    render_prepared(&prepared, config, Local::now().naive_local())
}
