//! Resumable, retrying fetch of a single link.
//!
//! "Resumable" here means restart-safe: a partial local copy is detected by
//! its size and the whole object is transferred again. Byte-range
//! continuation is not attempted.

use futures::StreamExt;
use std::path::{Component, Path};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use super::link::extract_object_id;
use super::progress::{ProgressSink, TransferProgress};
use super::retry::RetryPolicy;
use crate::error::Result;
use crate::storage::{ByteStream, ObjectStorage};
use crate::temp_file::TempFileGuard;

/// Result of fetching one link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    pub success: bool,
    /// Local file name; `None` when metadata could never be read
    pub file_name: Option<String>,
    /// Declared size, 0 when unknown
    pub expected_size: u64,
    /// Size of the local file after this fetch
    pub actual_size: u64,
    /// Bytes streamed by this fetch (0 for a skip)
    pub transferred: u64,
    /// A complete local copy already existed
    pub skipped: bool,
}

impl FetchOutcome {
    /// Outcome after every attempt failed
    pub fn failed() -> Self {
        Self::default()
    }

    /// Whether the link belongs in the failure log
    pub fn is_failure(&self) -> bool {
        !self.success || (self.expected_size > 0 && self.actual_size < self.expected_size)
    }
}

/// Reduce a remote display name to a single safe path component.
///
/// Falls back to `file_<id>` for names that could escape the destination.
pub fn local_file_name(name: Option<&str>, id: &str) -> String {
    if let Some(name) = name.map(str::trim) {
        let mut components = Path::new(name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if single_normal && !name.contains(['/', '\\', '\0']) {
            return name.to_string();
        }
    }

    let safe_id: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("file_{}", safe_id)
}

pub struct ResumableFetcher {
    storage: Arc<dyn ObjectStorage>,
    progress: Arc<dyn ProgressSink>,
    retry: RetryPolicy,
}

impl ResumableFetcher {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        progress: Arc<dyn ProgressSink>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            storage,
            progress,
            retry,
        }
    }

    /// Fetch `link` into `dest_dir` with the configured retry budget.
    pub async fn fetch(&self, link: &str, dest_dir: &Path) -> FetchOutcome {
        self.fetch_with_retries(link, dest_dir, self.retry.max_retries)
            .await
    }

    /// Fetch `link` into `dest_dir`, making at most `1 + max_retries` attempts.
    ///
    /// Every error of an attempt uses up one attempt, token refresh failures
    /// during the metadata lookup included. Transfer problems never escape as
    /// errors; they end up in the outcome.
    pub async fn fetch_with_retries(
        &self,
        link: &str,
        dest_dir: &Path,
        max_retries: u32,
    ) -> FetchOutcome {
        let id = extract_object_id(link);
        let policy = RetryPolicy::new(max_retries, self.retry.delay);
        let attempts = policy.total_attempts();

        for attempt in 1..=attempts {
            match self.attempt(&id, dest_dir).await {
                Ok(outcome) => return outcome,
                Err(e) => {
                    error!("Error processing {}: {}", id, e);
                    if attempt == attempts {
                        break;
                    }
                    info!(
                        "Retrying {}... ({} retries left)",
                        id,
                        attempts - attempt
                    );
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }

        FetchOutcome::failed()
    }

    async fn attempt(&self, id: &str, dest_dir: &Path) -> Result<FetchOutcome> {
        let metadata = self.storage.metadata(id).await?;
        let file_name = local_file_name(metadata.name.as_deref(), id);
        let expected_size = metadata.expected_size();
        let path = dest_dir.join(&file_name);

        if let Ok(existing) = tokio::fs::metadata(&path).await {
            if existing.is_file() && existing.len() >= expected_size {
                info!("Skipping {} (already complete)", file_name);
                return Ok(FetchOutcome {
                    success: true,
                    file_name: Some(file_name),
                    expected_size,
                    actual_size: existing.len(),
                    transferred: 0,
                    skipped: true,
                });
            }
        }

        info!("Downloading {}...", path.display());
        let stream = self.storage.open_stream(id).await?;

        let mut progress = self.progress.start(&file_name, expected_size);
        let transferred = match stream_to_file(stream, &path, progress.as_mut()).await {
            Ok(n) => {
                progress.finish();
                n
            }
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };

        let actual_size = tokio::fs::metadata(&path).await?.len();
        if expected_size > 0 && actual_size < expected_size {
            // Kept on disk: the next pass sees it as short and starts over
            warn!(
                "Incomplete download of {} ({}/{})",
                file_name, actual_size, expected_size
            );
            return Ok(FetchOutcome {
                success: false,
                file_name: Some(file_name),
                expected_size,
                actual_size,
                transferred,
                skipped: false,
            });
        }

        info!("Downloaded {} ({} bytes)", file_name, actual_size);
        Ok(FetchOutcome {
            success: true,
            file_name: Some(file_name),
            expected_size,
            actual_size,
            transferred,
            skipped: false,
        })
    }
}

/// Write the whole stream to `path`, truncating whatever was there.
///
/// The file is removed again if the stream or a write fails.
async fn stream_to_file(
    mut stream: ByteStream,
    path: &Path,
    progress: &mut dyn TransferProgress,
) -> Result<u64> {
    let guard = TempFileGuard::new(path);
    let mut file = File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        progress.update(written);
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    guard.defuse();
    Ok(written)
}
