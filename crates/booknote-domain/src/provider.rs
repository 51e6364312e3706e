//! Provider and header-key configuration enums

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// External bibliographic source a record can come from
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceProvider {
    #[default]
    Google,
    Goodreads,
    Calibre,
    OpenLibrary,
}

impl ServiceProvider {
    pub const ALL: [ServiceProvider; 4] = [
        ServiceProvider::Google,
        ServiceProvider::Goodreads,
        ServiceProvider::Calibre,
        ServiceProvider::OpenLibrary,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceProvider::Google => "google",
            ServiceProvider::Goodreads => "goodreads",
            ServiceProvider::Calibre => "calibre",
            ServiceProvider::OpenLibrary => "openlibrary",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceProvider::Google => "Google Books",
            ServiceProvider::Goodreads => "Goodreads",
            ServiceProvider::Calibre => "Calibre",
            ServiceProvider::OpenLibrary => "Open Library",
        }
    }
}

impl fmt::Display for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unsupported service provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ServiceProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" | "googlebooks" => Ok(ServiceProvider::Google),
            "goodreads" => Ok(ServiceProvider::Goodreads),
            "calibre" => Ok(ServiceProvider::Calibre),
            "openlibrary" | "open_library" => Ok(ServiceProvider::OpenLibrary),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Casing applied to record keys in the generated default header
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum KeyStyle {
    #[serde(rename = "snakeCase", alias = "Snake Case")]
    SnakeCase,
    #[default]
    #[serde(rename = "camelCase", alias = "Camel Case")]
    CamelCase,
}

impl KeyStyle {
    /// Apply this style to a camelCase record key
    pub fn apply(&self, key: &str) -> String {
        match self {
            KeyStyle::CamelCase => key.to_string(),
            KeyStyle::SnakeCase => camel_to_snake_case(key),
        }
    }
}

/// Transliterate camelCase to snake_case: every ASCII uppercase letter becomes
/// `_` followed by its lowercase form (`coverSmallUrl` -> `cover_small_url`).
pub fn camel_to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
