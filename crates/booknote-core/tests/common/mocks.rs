//! In-memory collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use booknote_core::http::{Fetcher, HttpError, HttpResponse};
use booknote_core::{NoteSink, PipelineError};
use std::collections::HashSet;
use std::sync::Mutex;

/// Serves canned bodies by exact URL; unknown URLs answer 404
#[derive(Default)]
pub struct MockFetcher {
    routes: Vec<(String, u16, String)>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.push((url.to_string(), status, body.into()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(match self.routes.iter().find(|(route, _, _)| route == url) {
            Some((_, status, body)) => HttpResponse {
                status: *status,
                body: body.clone(),
                ..Default::default()
            },
            None => HttpResponse {
                status: 404,
                ..Default::default()
            },
        })
    }
}

/// Records created notes; paths in `failing` error, `cancel_on` cancels
#[derive(Default)]
pub struct MemorySink {
    pub created: Mutex<Vec<(String, String)>>,
    pub failing: HashSet<String>,
    pub cancel_on: Option<String>,
}

#[async_trait]
impl NoteSink for MemorySink {
    async fn create_note(&self, path: &str, contents: &str) -> Result<String, PipelineError> {
        if self.cancel_on.as_deref() == Some(path) {
            return Err(PipelineError::Cancelled);
        }
        if self.failing.contains(path) {
            return Err(PipelineError::Note {
                path: path.to_string(),
                message: "file already exists".to_string(),
            });
        }
        self.created
            .lock()
            .unwrap()
            .push((path.to_string(), contents.to_string()));
        Ok(path.to_string())
    }
}
