//! Outer polling loop.
//!
//! Runs one walk per interval, forever. A missing root or a panicking walk
//! costs one cycle, never the process.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use crate::walker::{DirectoryWalker, ScanStats};

pub struct Scheduler {
    walker: DirectoryWalker,
    root: PathBuf,
    interval: Duration,
}

impl Scheduler {
    pub fn new(walker: DirectoryWalker, root: PathBuf, interval: Duration) -> Self {
        Self {
            walker,
            root,
            interval,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// One cycle: walk the root if it exists.
    ///
    /// Returns `None` when the cycle was skipped or aborted.
    pub async fn run_once(&self) -> Option<ScanStats> {
        if !tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            error!("Directory {} not found.", self.root.display());
            return None;
        }

        match AssertUnwindSafe(self.walker.walk(&self.root))
            .catch_unwind()
            .await
        {
            Ok(stats) => {
                info!("Scan of {} finished: {}", self.root.display(), stats);
                Some(stats)
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Scan of {} aborted: {}", self.root.display(), message);
                None
            }
        }
    }

    /// Run cycles forever. Only process termination stops the loop.
    pub async fn run(&self) {
        info!(
            "Watching {} every {} ms",
            self.root.display(),
            self.interval.as_millis()
        );

        loop {
            self.run_once().await;
            info!(
                "Waiting {} seconds before next scan...",
                self.interval.as_secs_f64()
            );
            tokio::time::sleep(self.interval).await;
        }
    }
}
