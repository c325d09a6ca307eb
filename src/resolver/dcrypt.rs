//! HTTP client for the dcrypt.it container decryption service.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::response::parse_response;
use super::LinkResolver;
use crate::error::{Error, ResolutionError, Result};

/// Endpoints relative to the service base URL
const UPLOAD_PATH: &str = "decrypt/upload";
const CONTAINER_PATH: &str = "decrypt/container";
const PASTE_PATH: &str = "decrypt/paste";

/// Client for the three decryption ingestion modes
pub struct DcryptClient {
    client: reqwest::Client,
    base_url: String,
}

impl DcryptClient {
    /// Create a new decryption client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the service (e.g., "http://dcrypt.it/")
    /// * `timeout` - Request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Upload a container file and decrypt it.
    pub async fn upload(&self, container: &Path) -> Result<Vec<String>> {
        let bytes = match tokio::fs::read(container).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ResolutionError::ContainerMissing(container.to_path_buf()).into());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let file_name = container
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "container.dlc".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| ResolutionError::Transport(e.to_string()))?;
        let form = Form::new().part("dlcfile", part);

        self.post_form(UPLOAD_PATH, form).await
    }

    /// Decrypt a container hosted at `link`.
    pub async fn container(&self, link: &str) -> Result<Vec<String>> {
        let form = Form::new().text("link", link.to_string());
        self.post_form(CONTAINER_PATH, form).await
    }

    /// Decrypt raw pasted container content.
    pub async fn paste(&self, content: &str) -> Result<Vec<String>> {
        let form = Form::new().text("content", content.to_string());
        self.post_form(PASTE_PATH, form).await
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<Vec<String>> {
        let url = self.endpoint(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ResolutionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ResolutionError::Transport(e.to_string()))?;

        // Validation errors arrive with non-2xx codes too, so parse first
        match parse_response(&body) {
            Ok(links) => Ok(links),
            Err(ResolutionError::Malformed(_)) if !status.is_success() => {
                Err(ResolutionError::Transport(format!("{} returned {}", url, status)).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl LinkResolver for DcryptClient {
    async fn resolve(&self, container: &Path) -> Result<Vec<String>> {
        self.upload(container).await
    }
}
