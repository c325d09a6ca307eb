//! Runtime configuration.
//!
//! Layers, lowest first: built-in defaults, an optional TOML file, then
//! environment variables and command-line flags (see [`crate::cli`]).
//!
//! ```toml
//! root_dir = "/mnt/games"
//! scan_interval_ms = 60000
//! failure_log = "failed_downloads.txt"
//! decrypt_url = "http://dcrypt.it/"
//! token_path = "~/.config/dlcsync/token.json"
//! max_retries = 3
//! retry_delay_secs = 3
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::fetch::RetryPolicy;

pub const DEFAULT_ROOT_DIR: &str = "/mnt/games";
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_FAILURE_LOG: &str = "failed_downloads.txt";
pub const DEFAULT_DECRYPT_URL: &str = "http://dcrypt.it/";
pub const DEFAULT_TOKEN_PATH: &str = "token.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the watched tree
    pub root_dir: PathBuf,
    /// Pause between scans
    pub scan_interval_ms: u64,
    /// Append-only log of links that failed
    pub failure_log: PathBuf,
    /// Base URL of the decryption service
    pub decrypt_url: String,
    /// Persisted OAuth refresh-token credentials
    pub token_path: PathBuf,
    /// Fixed bearer token; bypasses `token_path` when set
    pub access_token: Option<String>,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    /// Timeout for metadata and decryption requests (not content streams)
    pub request_timeout_secs: u64,
    pub follow_symlinks: bool,
    /// Show progress bars when attached to a terminal
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            scan_interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            failure_log: PathBuf::from(DEFAULT_FAILURE_LOG),
            decrypt_url: DEFAULT_DECRYPT_URL.to_string(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            access_token: None,
            max_retries: crate::fetch::DEFAULT_MAX_RETRIES,
            retry_delay_secs: crate::fetch::DEFAULT_RETRY_DELAY.as_secs(),
            request_timeout_secs: 300,
            follow_symlinks: false,
            progress: true,
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Expand `~` in path settings and reject unusable values.
    pub fn finalize(mut self) -> Result<Self> {
        self.root_dir = expand_tilde(&self.root_dir);
        self.failure_log = expand_tilde(&self.failure_log);
        self.token_path = expand_tilde(&self.token_path);
        self.access_token = self.access_token.filter(|t| !t.trim().is_empty());

        if self.root_dir.as_os_str().is_empty() {
            return Err(Error::Config("root directory must not be empty".to_string()));
        }
        if self.failure_log.as_os_str().is_empty() {
            return Err(Error::Config("failure log path must not be empty".to_string()));
        }
        if self.scan_interval_ms == 0 {
            return Err(Error::Config(
                "scan interval must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(self)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay_secs))
    }
}

/// Expand tilde (~) in paths to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if path_str == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    } else if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            home.join(rest)
        } else {
            path.to_path_buf()
        }
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default().finalize().unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/mnt/games"));
        assert_eq!(config.scan_interval(), Duration::from_secs(60));
        assert_eq!(config.failure_log, PathBuf::from("failed_downloads.txt"));
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            root_dir = "/srv/dlc"
            scan_interval_ms = 5000
            max_retries = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.root_dir, PathBuf::from("/srv/dlc"));
        assert_eq!(config.scan_interval_ms, 5000);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.decrypt_url, DEFAULT_DECRYPT_URL);
        assert_eq!(config.retry_delay_secs, 3);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml_str("scan_interval = 5").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = Config {
            scan_interval_ms: 0,
            ..Config::default()
        };
        assert!(matches!(config.finalize(), Err(Error::Config(_))));
    }

    #[test]
    fn test_blank_access_token_ignored() {
        let config = Config {
            access_token: Some("  ".to_string()),
            ..Config::default()
        };
        assert!(config.finalize().unwrap().access_token.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = Config::load(&tmp.path().join("dlcsync.toml")).unwrap_err();
        assert!(err.to_string().contains("dlcsync.toml"));
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~")), home);
            assert_eq!(expand_tilde(Path::new("~/games")), home.join("games"));
        }
        assert_eq!(
            expand_tilde(Path::new("/mnt/games")),
            PathBuf::from("/mnt/games")
        );
        assert_eq!(expand_tilde(Path::new("a~/b")), PathBuf::from("a~/b"));
    }
}
