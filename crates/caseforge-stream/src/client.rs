use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Serialize;

use crate::stream::{parse_event_stream, EventStream};

/// Parameters for one generation run, as the backend expects them.
///
/// `file_path` is the opaque reference returned by the upload step and
/// `url` the alternative remote source; exactly one of the two is normally
/// set. The limit caps how many cases the server generates.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub file_path: String,
    pub feature_name: String,
    pub test_case_limit: Option<u32>,
    pub url: Option<String>,
}

impl GenerateRequest {
    pub fn new(file_path: impl Into<String>, feature_name: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            feature_name: feature_name.into(),
            test_case_limit: None,
            url: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.test_case_limit = Some(limit);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Seam for opening a generation stream.
///
/// The session orchestrator only depends on this trait, so tests drive it
/// with scripted event streams instead of a live backend.
#[async_trait]
pub trait StreamingGenerator: Send + Sync {
    async fn generate_stream(&self, request: GenerateRequest) -> Result<EventStream>;
}

/// Client for the generation backend (HTTP direct, no SDK).
pub struct GeneratorClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GeneratorClient {
    /// Create a new client pointed at the backend base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl StreamingGenerator for GeneratorClient {
    async fn generate_stream(&self, request: GenerateRequest) -> Result<EventStream> {
        let response = self
            .http_client
            .post(format!("{}/generate-stream", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Failed to send generation request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Generation API error ({}): {}", status, error_text);
        }

        Ok(parse_event_stream(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_like_the_backend_expects() {
        let request = GenerateRequest::new("uploads/abc.pdf", "Login").with_limit(5);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["file_path"], "uploads/abc.pdf");
        assert_eq!(json["feature_name"], "Login");
        assert_eq!(json["test_case_limit"], 5);
        assert_eq!(json["url"], serde_json::Value::Null);
    }

    #[test]
    fn test_request_with_url_source() {
        let request = GenerateRequest::new("", "Checkout").with_url("https://example.com/spec");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["file_path"], "");
        assert_eq!(json["url"], "https://example.com/spec");
    }
}
