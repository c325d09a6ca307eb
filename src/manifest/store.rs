// Per-directory link manifests and the global failure log
//
// A manifest is `links.txt` inside a watched directory: one link per line, no
// header. Its presence means the directory's container was already resolved.
// The failure log is a single append-only text file shared by every scan.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Fixed manifest file name inside each directory
pub const MANIFEST_FILE: &str = "links.txt";

/// Split manifest text into links: trimmed, blank lines dropped, order kept
pub fn parse_links(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Owns all manifest and failure-log file I/O
#[derive(Debug, Clone)]
pub struct ManifestStore {
    failure_log: PathBuf,
}

impl ManifestStore {
    pub fn new(failure_log: impl Into<PathBuf>) -> Self {
        Self {
            failure_log: failure_log.into(),
        }
    }

    /// Location of the manifest for `directory`
    pub fn manifest_path(directory: &Path) -> PathBuf {
        directory.join(MANIFEST_FILE)
    }

    pub fn failure_log(&self) -> &Path {
        &self.failure_log
    }

    /// Whether a manifest file exists in `directory`
    pub fn has_manifest(&self, directory: &Path) -> bool {
        Self::manifest_path(directory).is_file()
    }

    /// Read the links of `directory`, `None` when it has no manifest
    ///
    /// Invalid UTF-8 is replaced rather than rejected, so one bad byte costs
    /// at most the line it sits on.
    pub fn read_links(&self, directory: &Path) -> Result<Option<Vec<String>>> {
        let path = Self::manifest_path(directory);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(parse_links(&String::from_utf8_lossy(&bytes)))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Persist `links` as the manifest of `directory` (atomic write)
    ///
    /// The content goes to a temp file in the same directory which is then
    /// renamed over the manifest, so readers see either nothing or all links.
    pub fn write_links(&self, directory: &Path, links: &[String]) -> Result<()> {
        let path = Self::manifest_path(directory);
        let write_err = |source| Error::ManifestWrite {
            path: path.clone(),
            source,
        };

        let mut temp = tempfile::NamedTempFile::new_in(directory).map_err(write_err)?;
        let mut content = links.join("\n");
        content.push('\n');
        temp.write_all(content.as_bytes()).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&path).map_err(|e| write_err(e.error))?;

        Ok(())
    }

    /// Append failed links to the failure log, one per line
    ///
    /// Holds an exclusive lock for the duration of the write so that
    /// overlapping writers never interleave lines.
    pub fn append_failures(&self, links: &[String]) -> Result<()> {
        if links.is_empty() {
            return Ok(());
        }

        let log_err = |source| Error::LogWrite {
            path: self.failure_log.clone(),
            source,
        };

        if let Some(parent) = self.failure_log.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(log_err)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.failure_log)
            .map_err(log_err)?;

        file.lock_exclusive().map_err(log_err)?;

        let mut payload = links.join("\n");
        payload.push('\n');
        let written = file
            .write_all(payload.as_bytes())
            .and_then(|_| file.flush());

        // Unlock even if the write failed; the lock also drops with the handle
        let _ = FileExt::unlock(&file);
        written.map_err(log_err)?;

        Ok(())
    }
}
