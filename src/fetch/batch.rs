//! Sequential download of a link list into one directory.

use std::path::Path;
use tracing::{info, warn};

use super::fetcher::ResumableFetcher;
use super::link::extract_object_id;
use crate::error::Result;
use crate::manifest::ManifestStore;

/// Totals for one list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub downloaded: usize,
    pub bytes_transferred: u64,
    /// Links whose final outcome was a failure, in list order
    pub failed: Vec<String>,
}

impl BatchSummary {
    /// Append this batch's failed links to the failure log.
    pub fn record_failures(&self, store: &ManifestStore) -> Result<()> {
        if self.failed.is_empty() {
            return Ok(());
        }
        store.append_failures(&self.failed)?;
        warn!(
            "{} files failed. Logged to '{}'",
            self.failed.len(),
            store.failure_log().display()
        );
        Ok(())
    }
}

/// Fetch every link in order, one at a time.
pub async fn fetch_links(
    fetcher: &ResumableFetcher,
    links: &[String],
    dest_dir: &Path,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for (i, link) in links.iter().enumerate() {
        info!(
            "[{}/{}] Downloading file ID: {}",
            i + 1,
            links.len(),
            extract_object_id(link)
        );

        let outcome = fetcher.fetch(link, dest_dir).await;
        summary.processed += 1;
        summary.bytes_transferred += outcome.transferred;

        if outcome.is_failure() {
            warn!(
                "Logged failed file: {}",
                outcome
                    .file_name
                    .unwrap_or_else(|| extract_object_id(link))
            );
            summary.failed.push(link.clone());
        } else if outcome.skipped {
            summary.skipped += 1;
        } else {
            summary.downloaded += 1;
        }
    }

    if summary.failed.is_empty() {
        info!("All files in {} are complete", dest_dir.display());
    }

    summary
}
