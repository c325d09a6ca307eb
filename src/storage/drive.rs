//! Google Drive v3 backend.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{ByteStream, CredentialProvider, ObjectMetadata, ObjectStorage};
use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/drive/v3";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Drive answers sizes as decimal strings
#[derive(Debug, Deserialize)]
struct DriveFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<String>,
}

impl DriveFile {
    fn into_metadata(self) -> ObjectMetadata {
        ObjectMetadata {
            name: self.name.filter(|n| !n.is_empty()),
            size: self.size.and_then(|s| s.trim().parse().ok()),
        }
    }
}

pub struct DriveClient {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
    credentials: Arc<dyn CredentialProvider>,
}

impl DriveClient {
    pub fn new(credentials: Arc<dyn CredentialProvider>, request_timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL, credentials, request_timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| Error::Config(format!("invalid storage URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("invalid storage URL {}", base_url)));
        }

        // No overall timeout on the client: content streams can run for hours
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            request_timeout,
            credentials,
        })
    }

    fn file_url(&self, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("files").push(id);
        }
        url
    }
}

#[async_trait]
impl ObjectStorage for DriveClient {
    async fn metadata(&self, id: &str) -> Result<ObjectMetadata> {
        let token = self.credentials.access_token().await?;
        let url = self.file_url(id);
        debug!("GET {} (metadata)", url);

        let metadata_err = |message: String| Error::Metadata {
            id: id.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .query(&[("fields", "name,size"), ("supportsAllDrives", "true")])
            .bearer_auth(token)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| metadata_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(metadata_err(format!("status {}", response.status())));
        }

        let file: DriveFile = response
            .json()
            .await
            .map_err(|e| metadata_err(format!("invalid metadata: {}", e)))?;

        Ok(file.into_metadata())
    }

    async fn open_stream(&self, id: &str) -> Result<ByteStream> {
        let token = self.credentials.access_token().await?;
        let url = self.file_url(id);
        debug!("GET {} (content)", url);

        let response = self
            .client
            .get(url)
            .query(&[("alt", "media"), ("supportsAllDrives", "true")])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Stream {
                id: id.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::Stream {
                id: id.to_string(),
                message: format!("status {}", response.status()),
            });
        }

        let id = id.to_string();
        let stream = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| Error::Stream {
                id: id.clone(),
                message: e.to_string(),
            })
        });

        Ok(stream.boxed())
    }
}
