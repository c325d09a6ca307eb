//! Access tokens for the storage API.
//!
//! Tokens come from a persisted `authorized_user` file (the format written by
//! the usual installed-app OAuth flow) and are refreshed on demand. Running
//! that interactive flow is outside this crate; a missing file is reported as
//! a credential error.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Google OAuth2 token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the server-side expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Supplies bearer tokens to storage clients
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A fixed token, e.g. from `DRIVE_ACCESS_TOKEN`
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AuthorizedUser {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Refresh-token credentials persisted as JSON
pub struct AuthorizedUserFile {
    path: PathBuf,
    token_url: String,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl AuthorizedUserFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_token_url(path, DEFAULT_TOKEN_URL)
    }

    pub fn with_token_url(path: impl Into<PathBuf>, token_url: &str) -> Self {
        Self {
            path: path.into(),
            token_url: token_url.to_string(),
            client: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }

    async fn load(&self) -> Result<AuthorizedUser> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Credential(format!(
                "no saved token at {} ({}); authorize this machine first",
                self.path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            Error::Credential(format!("invalid token file {}: {}", self.path.display(), e))
        })
    }

    async fn refresh(&self, user: &AuthorizedUser) -> Result<CachedToken> {
        debug!("Refreshing access token via {}", self.token_url);

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", user.client_id.as_str()),
            ("client_secret", user.client_secret.as_str()),
            ("refresh_token", user.refresh_token.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Credential(format!(
                "token refresh failed with status {}",
                response.status()
            )));
        }

        let body: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(body.expires_in.unwrap_or(3600));

        Ok(CachedToken {
            token: body.access_token,
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}

#[async_trait]
impl CredentialProvider for AuthorizedUserFile {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        let user = self.load().await?;
        let fresh = self.refresh(&user).await?;
        info!("Obtained storage access token from {}", self.path.display());

        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticToken::new("abc");
        assert_eq!(provider.access_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_missing_token_file() {
        let tmp = TempDir::new().unwrap();
        let provider = AuthorizedUserFile::new(tmp.path().join("token.json"));

        let err = provider.access_token().await.unwrap_err();
        match err {
            Error::Credential(msg) => assert!(msg.contains("token.json")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_token_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("token.json");
        std::fs::write(&path, r#"{"type": "authorized_user"}"#).unwrap();

        let err = AuthorizedUserFile::new(&path).access_token().await.unwrap_err();
        assert!(matches!(err, Error::Credential(_)));
    }

    #[tokio::test]
    async fn test_load_authorized_user() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("token.json");
        std::fs::write(
            &path,
            r#"{"type": "authorized_user", "client_id": "id", "client_secret": "secret", "refresh_token": "r"}"#,
        )
        .unwrap();

        let user = AuthorizedUserFile::new(&path).load().await.unwrap();
        assert_eq!(user.client_id, "id");
        assert_eq!(user.refresh_token, "r");
    }

    #[tokio::test]
    async fn test_cached_token_is_reused() {
        // No token file exists, so any refresh attempt would fail
        let tmp = TempDir::new().unwrap();
        let provider = AuthorizedUserFile::new(tmp.path().join("token.json"));
        *provider.cached.lock().await = Some(CachedToken {
            token: "cached".to_string(),
            expires_at: Instant::now() + Duration::from_secs(600),
        });

        assert_eq!(provider.access_token().await.unwrap(), "cached");
    }
}
