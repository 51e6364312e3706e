//! Provider normalizers for online book catalogs

pub mod calibre;
pub mod goodreads;
pub mod google;
pub mod normalize;
pub mod open_library;
pub mod traits;

pub use calibre::*;
pub use goodreads::*;
pub use google::*;
pub use open_library::*;
pub use traits::*;

use crate::config::{system_locale, BooknoteConfig};
use booknote_domain::ServiceProvider;
use std::sync::Arc;

/// Build the provider selected by `provider_override`, falling back to the configured one
pub fn provider_for(
    config: &BooknoteConfig,
    provider_override: Option<ServiceProvider>,
    extractor: Option<Arc<dyn GoodreadsExtractor>>,
) -> Result<Box<dyn BookProvider>, SourceError> {
    let provider = provider_override.unwrap_or(config.service_provider);
    tracing::debug!("Using {} provider", provider.display_name());

    Ok(match provider {
        ServiceProvider::Google => Box::new(GoogleBooksSource::new(
            config.resolved_locale(&system_locale()),
            config.enable_cover_image_edge_curl,
            Some(config.api_key.clone()),
        )),
        ServiceProvider::Goodreads => Box::new(GoodreadsSource::new(extractor)),
        ServiceProvider::Calibre => {
            if config.calibre_server_url.trim().is_empty() {
                return Err(SourceError::Unsupported(
                    "calibre requires a server URL".to_string(),
                ));
            }
            Box::new(CalibreSource::new(
                &config.calibre_server_url,
                &config.calibre_library_id,
            ))
        }
        ServiceProvider::OpenLibrary => Box::new(OpenLibrarySource::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_for_uses_override() {
        let config = BooknoteConfig::default();
        let provider = provider_for(&config, Some(ServiceProvider::OpenLibrary), None).unwrap();
        assert_eq!(provider.metadata().id, ServiceProvider::OpenLibrary);

        let provider = provider_for(&config, None, None).unwrap();
        assert_eq!(provider.metadata().id, ServiceProvider::Google);
    }

    #[test]
    fn test_goodreads_supports_details() {
        let config = BooknoteConfig::default();
        let provider = provider_for(&config, Some(ServiceProvider::Goodreads), None).unwrap();
        assert!(provider.supports_details());
    }

    #[test]
    fn test_calibre_requires_server_url() {
        let config = BooknoteConfig {
            calibre_server_url: " ".to_string(),
            ..Default::default()
        };
        let result = provider_for(&config, Some(ServiceProvider::Calibre), None);
        assert!(matches!(result, Err(SourceError::Unsupported(_))));
    }
}
