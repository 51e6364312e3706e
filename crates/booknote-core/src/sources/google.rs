//! Google Books source
//!
//! API docs: https://developers.google.com/books/docs/v1/using
//! The `langRestrict` parameter is advisory only, so results are post-filtered
//! on the reported volume language.

use super::normalize::{dedupe, format_list, strip_html, strip_isbn_prefix, text, year_only};
use super::traits::{require_query, BookProvider, QueryOptions, SourceError, SourceMetadata};
use crate::http::{Fetcher, JSON_HEADERS};
use async_trait::async_trait;
use booknote_domain::{Book, Numeric, ServiceProvider};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

const VOLUMES_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const MAX_RESULTS: u32 = 40;
const PRINT_TYPE: &str = "books";

/// Zoom level written into `coverLargeUrl`
pub const PREFERRED_COVER_ZOOM: u8 = 3;

lazy_static! {
    static ref ZOOM_PARAM: Regex = Regex::new(r"(&zoom)=\d").unwrap();
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    total_items: u32,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    #[serde(default)]
    id: Option<String>,
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
    page_count: Option<Numeric>,
    #[serde(default)]
    categories: Vec<String>,
    image_links: Option<ImageLinks>,
    language: Option<String>,
    preview_link: Option<String>,
    info_link: Option<String>,
    canonical_volume_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
}

pub struct GoogleBooksSource {
    locale: String,
    enable_edge_curl: bool,
    api_key: Option<String>,
}

impl GoogleBooksSource {
    pub fn new(locale: impl Into<String>, enable_edge_curl: bool, api_key: Option<String>) -> Self {
        Self {
            locale: locale.into(),
            enable_edge_curl,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Build the volumes search URL
    pub fn search_url(&self, query: &str, options: &QueryOptions) -> Result<String, SourceError> {
        let lang = self.target_language(options);
        let max_results = MAX_RESULTS.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("q", query),
            ("maxResults", &max_results),
            ("printType", PRINT_TYPE),
            ("langRestrict", &lang),
        ];
        if let Some(key) = &self.api_key {
            params.push(("key", key));
        }
        url::Url::parse_with_params(VOLUMES_URL, &params)
            .map(|u| u.to_string())
            .map_err(|e| SourceError::InvalidQuery(e.to_string()))
    }

    /// Two-letter language code the results are filtered on
    pub fn target_language(&self, options: &QueryOptions) -> String {
        let locale = options
            .locale
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.locale);
        language_restriction(locale)
    }

    /// Parse a volumes response, keeping only items in the target language
    pub fn parse_search_response(&self, json: &str, target_language: &str) -> Result<Vec<Book>, SourceError> {
        let response: VolumesResponse = serde_json::from_str(json)
            .map_err(|e| SourceError::Parse(format!("Invalid Google Books JSON: {}", e)))?;

        if response.total_items == 0 {
            return Ok(Vec::new());
        }

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Volume>(item) {
                Ok(volume) => Some(volume),
                Err(e) => {
                    tracing::warn!("Skipping malformed Google Books item: {}", e);
                    None
                }
            })
            .filter(|volume| matches_language(volume.volume_info.language.as_deref(), target_language))
            .map(|volume| self.create_book(volume))
            .collect())
    }

    fn create_book(&self, volume: Volume) -> Book {
        let info = volume.volume_info;
        let authors = dedupe(info.authors);
        let categories = dedupe(info.categories);
        let links = info.image_links.unwrap_or_default();

        let cover_url = self.apply_edge_curl(&text(links.thumbnail.as_deref()));
        let cover_small_url = self.apply_edge_curl(&text(links.small_thumbnail.as_deref()));
        let cover_large_url = if cover_url.is_empty() {
            String::new()
        } else {
            convert_image_url_size(&cover_url, PREFERRED_COVER_ZOOM)
        };

        let (isbn10, isbn13) = extract_isbns(&info.industry_identifiers);

        Book {
            title: text(info.title.as_deref()),
            subtitle: Some(text(info.subtitle.as_deref())),
            author: format_list(&authors),
            authors,
            category: Some(format_list(&categories)),
            categories: Some(categories),
            publisher: Some(text(info.publisher.as_deref())),
            publish_date: Some(year_only(info.published_date.as_deref().unwrap_or(""))),
            total_page: Some(info.page_count.unwrap_or_default()),
            cover_url: Some(cover_url),
            cover_small_url: Some(cover_small_url),
            cover_large_url: Some(cover_large_url),
            description: Some(strip_html(info.description.as_deref().unwrap_or(""))),
            link: Some(text(
                info.canonical_volume_link
                    .as_deref()
                    .or(info.info_link.as_deref()),
            )),
            preview_link: Some(text(info.preview_link.as_deref())),
            isbn10: Some(isbn10),
            isbn13: Some(isbn13),
            source_provider: Some(ServiceProvider::Google.as_str().to_string()),
            source_id: volume.id,
            ..Default::default()
        }
    }

    fn apply_edge_curl(&self, url: &str) -> String {
        set_cover_image_edge_curl(url, self.enable_edge_curl)
    }
}

#[async_trait]
impl BookProvider for GoogleBooksSource {
    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            id: ServiceProvider::Google,
            name: "Google Books",
            description: "Google Books volumes API",
            base_url: VOLUMES_URL,
            supports_details: false,
            requires_api_key: false,
        }
    }

    async fn get_by_query(
        &self,
        fetcher: &dyn Fetcher,
        query: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Book>, SourceError> {
        let query = require_query(query)?;
        let url = self.search_url(query, options)?;
        let response = fetcher.get(&url, JSON_HEADERS).await?;
        if !response.is_success() {
            return Err(SourceError::Http(crate::http::HttpError::Status {
                status: response.status,
                url,
            }));
        }
        self.parse_search_response(&response.body, &self.target_language(options))
    }
}

/// First two characters of a locale ("en-US" -> "en")
pub fn language_restriction(locale: &str) -> String {
    locale.trim().chars().take(2).collect::<String>().to_lowercase()
}

/// Strict language post-filter: case-insensitive prefix match on the
/// reported language. Items without a language never match a non-empty target.
pub fn matches_language(reported: Option<&str>, target: &str) -> bool {
    match reported {
        Some(lang) => lang.to_lowercase().starts_with(&target.to_lowercase()),
        None => target.is_empty(),
    }
}

/// Google marks thumbnails with `&edge=curl`; strip it unless enabled
pub fn set_cover_image_edge_curl(url: &str, enabled: bool) -> String {
    if enabled {
        url.to_string()
    } else {
        url.replace("&edge=curl", "")
    }
}

/// Rewrite the `zoom` parameter of a Google cover URL
pub fn convert_image_url_size(url: &str, zoom: u8) -> String {
    ZOOM_PARAM
        .replace(url, format!("${{1}}={}", zoom).as_str())
        .into_owned()
}

fn extract_isbns(identifiers: &[IndustryIdentifier]) -> (String, String) {
    let mut isbn10 = String::new();
    let mut isbn13 = String::new();
    for id in identifiers {
        match id.kind.as_str() {
            "ISBN_10" => isbn10 = strip_isbn_prefix(&id.identifier),
            "ISBN_13" => isbn13 = strip_isbn_prefix(&id.identifier),
            _ => {}
        }
    }
    (isbn10, isbn13)
}
