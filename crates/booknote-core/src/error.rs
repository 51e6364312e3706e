//! Pipeline-level error type

use crate::config::ConfigError;
use crate::sources::SourceError;
use thiserror::Error;

/// Message carried by a user-aborted interactive step
pub const CANCELLED_MESSAGE: &str = "Cancelled request";

/// Errors surfaced by note creation and enrichment.
///
/// `Cancelled` marks an intentional abort by the user. Callers should check
/// [`PipelineError::is_cancelled`] and stay quiet instead of reporting it.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to create note {path}: {message}")]
    Note { path: String, message: String },

    #[error("Failed to download image {url}: {message}")]
    Image { url: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cancelled request")]
    Cancelled,
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
