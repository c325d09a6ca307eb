//! Cleanup guard for files that are written in place.

use std::path::{Path, PathBuf};

/// Removes the guarded file on drop unless defused.
///
/// A transfer that is interrupted midway leaves a short file behind; holding
/// the guard across the write means every early return or `?` cleans it up.
#[derive(Debug)]
pub struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    /// Keep the file on disk.
    pub fn defuse(mut self) {
        self.armed = false;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            match std::fs::remove_file(&self.path) {
                Ok(()) => {
                    tracing::debug!("Removed partial file {}", self.path.display());
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        "Failed to remove partial file {}: {}",
                        self.path.display(),
                        e
                    );
                }
            }
        }
    }
}
