//! Configuration for booknote-core
//!
//! Mirrors the settings a note-taking host persists for the book search
//! workflow. Keys are camelCase in both TOML and JSON.

use booknote_domain::{KeyStyle, ServiceProvider};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Locale preference meaning "use the system locale"
pub const DEFAULT_LOCALE: &str = "default";

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BooknoteConfig {
    /// Folder new notes are created in
    pub folder: String,
    /// File name format; empty means "<title> - <author>"
    pub file_name_format: String,
    /// Raw header template (override block)
    pub frontmatter: String,
    /// Raw body template
    pub content: String,
    pub use_default_frontmatter: bool,
    pub default_frontmatter_key_type: KeyStyle,
    /// Path of a template note; when set it replaces `frontmatter`/`content`
    pub template_file: String,
    pub service_provider: ServiceProvider,
    pub locale_preference: String,
    pub api_key: String,
    pub open_page_on_completion: bool,
    pub show_cover_image_in_search: bool,
    pub enable_cover_image_save: bool,
    pub enable_cover_image_edge_curl: bool,
    /// Folder downloaded covers are stored in
    pub cover_image_path: String,
    pub ask_for_locale: bool,
    pub calibre_server_url: String,
    pub calibre_library_id: String,
    pub warn_on_duplicate: bool,
}

impl Default for BooknoteConfig {
    fn default() -> Self {
        Self {
            folder: String::new(),
            file_name_format: String::new(),
            frontmatter: String::new(),
            content: String::new(),
            use_default_frontmatter: true,
            default_frontmatter_key_type: KeyStyle::CamelCase,
            template_file: String::new(),
            service_provider: ServiceProvider::Google,
            locale_preference: DEFAULT_LOCALE.to_string(),
            api_key: String::new(),
            open_page_on_completion: true,
            show_cover_image_in_search: false,
            enable_cover_image_save: false,
            enable_cover_image_edge_curl: true,
            cover_image_path: String::new(),
            ask_for_locale: true,
            calibre_server_url: "http://localhost:8080".to_string(),
            calibre_library_id: "calibre".to_string(),
            warn_on_duplicate: true,
        }
    }
}

impl BooknoteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_provider == ServiceProvider::Calibre {
            let server = self.calibre_server_url.trim();
            if server.is_empty() {
                return Err(ConfigError::MissingField("calibreServerUrl".to_string()));
            }
            url::Url::parse(server).map_err(|e| ConfigError::InvalidValue {
                field: "calibreServerUrl".to_string(),
                message: e.to_string(),
            })?;
        }

        if self.enable_cover_image_save && self.cover_image_path.contains("..") {
            return Err(ConfigError::InvalidValue {
                field: "coverImagePath".to_string(),
                message: "must not leave the vault".to_string(),
            });
        }

        Ok(())
    }

    /// Locale used for queries; "default" resolves to `system_locale`
    pub fn resolved_locale(&self, system_locale: &str) -> String {
        let preference = self.locale_preference.trim();
        if preference.is_empty() || preference == DEFAULT_LOCALE {
            system_locale.to_string()
        } else {
            preference.to_string()
        }
    }

    /// Google-only settings (locale, API key, edge curl) are relevant
    pub fn shows_google_settings(&self) -> bool {
        self.service_provider == ServiceProvider::Google
    }

    /// Calibre server settings are relevant
    pub fn shows_calibre_settings(&self) -> bool {
        self.service_provider == ServiceProvider::Calibre
    }

    /// Cover folder setting is relevant
    pub fn shows_cover_image_path(&self) -> bool {
        self.enable_cover_image_save
    }

    /// Render-time projection. `template_text` is the contents of
    /// `template_file` when one is configured and readable.
    pub fn template_config(&self, template_text: Option<String>) -> TemplateConfig {
        TemplateConfig {
            frontmatter: self.frontmatter.clone(),
            content: self.content.clone(),
            use_default_frontmatter: self.use_default_frontmatter,
            key_style: self.default_frontmatter_key_type,
            template: template_text.filter(|t| !self.template_file.trim().is_empty() && !t.is_empty()),
            enable_cover_image_save: self.enable_cover_image_save,
            cover_image_path: self.cover_image_path.clone(),
        }
    }
}

/// Everything `render` needs from the configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateConfig {
    pub frontmatter: String,
    pub content: String,
    pub use_default_frontmatter: bool,
    pub key_style: KeyStyle,
    /// Full template note; takes precedence over `frontmatter` + `content`
    pub template: Option<String>,
    pub enable_cover_image_save: bool,
    pub cover_image_path: String,
}

/// Best-effort system locale from the POSIX environment ("en_US.UTF-8" -> "en-US")
pub fn system_locale() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|value| value.split('.').next().unwrap_or_default().replace('_', "-"))
        .find(|locale| !locale.is_empty() && locale != "C" && locale != "POSIX")
        .unwrap_or_else(|| "en".to_string())
}

/// Configuration loading or validation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
