use std::fmt;

use crate::fetch::BatchSummary;

/// Counters for one pass over a directory tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub dirs_visited: usize,
    pub dirs_unreadable: usize,
    pub containers_resolved: usize,
    pub resolution_failures: usize,
    pub links_processed: usize,
    pub links_skipped: usize,
    pub links_downloaded: usize,
    pub links_failed: usize,
    pub bytes_transferred: u64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, batch: &BatchSummary) {
        self.links_processed += batch.processed;
        self.links_skipped += batch.skipped;
        self.links_downloaded += batch.downloaded;
        self.links_failed += batch.failed.len();
        self.bytes_transferred += batch.bytes_transferred;
    }

    /// Nothing went wrong during the pass
    pub fn is_clean(&self) -> bool {
        self.dirs_unreadable == 0 && self.resolution_failures == 0 && self.links_failed == 0
    }
}

impl fmt::Display for ScanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dirs ({} unreadable), {} containers resolved ({} failed), \
             {} links: {} downloaded, {} skipped, {} failed, {} bytes transferred",
            self.dirs_visited,
            self.dirs_unreadable,
            self.containers_resolved,
            self.resolution_failures,
            self.links_processed,
            self.links_downloaded,
            self.links_skipped,
            self.links_failed,
            self.bytes_transferred
        )
    }
}
