//! Native HTTP client using reqwest

use super::{Fetcher, HttpError, HttpResponse};
use crate::error::PipelineError;
use crate::render::ImageStore;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HttpError::RequestFailed {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    /// Fetch raw bytes (cover images)
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "image/*")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(HttpError::Status {
                status,
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| HttpError::ParseError {
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, HttpError> {
        let parsed = reqwest::Url::parse(url).map_err(|_| HttpError::InvalidUrl {
            url: url.to_string(),
        })?;

        let mut request = self.client.get(parsed);
        if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("User-Agent")) {
            request = request.header("User-Agent", &self.user_agent);
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        tracing::debug!("GET {}", url);
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(HttpError::RateLimited);
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body = response.text().await.map_err(|e| HttpError::ParseError {
            message: e.to_string(),
        })?;

        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }
}

/// Saves cover images below a local root directory
pub struct DirectoryImageStore {
    client: HttpClient,
    root: PathBuf,
}

impl DirectoryImageStore {
    pub fn new(client: HttpClient, root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            root: root.into(),
        }
    }
}

#[async_trait]
impl ImageStore for DirectoryImageStore {
    async fn save_image(&self, url: &str, directory: &str, file_name: &str) -> Result<String, PipelineError> {
        let image_error = |message: String| PipelineError::Image {
            url: url.to_string(),
            message,
        };

        let bytes = self
            .client
            .get_bytes(url)
            .await
            .map_err(|e| image_error(e.to_string()))?;

        write_image(&self.root, directory, file_name, &bytes)
            .await
            .map_err(|e| image_error(e.to_string()))
    }
}

/// Write `bytes` to `root/directory/file_name` and return the vault-relative path
async fn write_image(root: &Path, directory: &str, file_name: &str, bytes: &[u8]) -> std::io::Result<String> {
    let target_dir = root.join(directory);
    tokio::fs::create_dir_all(&target_dir).await?;
    tokio::fs::write(target_dir.join(file_name), bytes).await?;

    let directory = directory.trim_end_matches('/');
    Ok(if directory.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", directory, file_name)
    })
}

fn map_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::RequestFailed {
            message: e.to_string(),
        }
    }
}
