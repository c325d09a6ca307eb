//! Recursive pass over the watched tree.
//!
//! Per directory, in order:
//! 1. list entries (an unreadable directory is logged and not descended)
//! 2. resolve the first `*.dlc` into `links.txt` unless a manifest exists
//! 3. fetch every link of the manifest into the directory
//! 4. descend into subdirectories, depth-first
//!
//! Every step is idempotent, so the same tree can be walked any number of
//! times.

mod stats;

pub use stats::ScanStats;

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::fetch::{fetch_links, ResumableFetcher};
use crate::manifest::ManifestStore;
use crate::resolver::{is_container, LinkResolver};

#[derive(Debug)]
struct Entry {
    name: String,
    path: PathBuf,
    is_file: bool,
    is_dir: bool,
}

pub struct DirectoryWalker {
    resolver: Arc<dyn LinkResolver>,
    store: ManifestStore,
    fetcher: ResumableFetcher,
    follow_symlinks: bool,
}

impl DirectoryWalker {
    pub fn new(
        resolver: Arc<dyn LinkResolver>,
        store: ManifestStore,
        fetcher: ResumableFetcher,
    ) -> Self {
        Self {
            resolver,
            store,
            fetcher,
            follow_symlinks: false,
        }
    }

    /// Descend into symlinked directories, guarding against cycles
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Walk the tree under `root`. Never fails; problems are logged and counted.
    pub async fn walk(&self, root: &Path) -> ScanStats {
        let mut stats = ScanStats::new();
        let mut visited = HashSet::new();
        self.visit(root.to_path_buf(), &mut visited, &mut stats)
            .await;
        stats
    }

    fn visit<'a>(
        &'a self,
        dir: PathBuf,
        visited: &'a mut HashSet<PathBuf>,
        stats: &'a mut ScanStats,
    ) -> BoxFuture<'a, ()> {
        async move {
            if self.follow_symlinks {
                match tokio::fs::canonicalize(&dir).await {
                    Ok(real) => {
                        if !visited.insert(real.clone()) {
                            warn!(
                                "Skipping {}: already visited as {}",
                                dir.display(),
                                real.display()
                            );
                            return;
                        }
                    }
                    Err(e) => {
                        error!("Failed to resolve directory {}: {}", dir.display(), e);
                        stats.dirs_unreadable += 1;
                        return;
                    }
                }
            }

            info!("Scanning {}...", dir.display());
            stats.dirs_visited += 1;

            let entries = match self.list(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    error!("{}", e);
                    stats.dirs_unreadable += 1;
                    return;
                }
            };

            self.process_directory(&dir, &entries, stats).await;

            for entry in entries.into_iter().filter(|e| e.is_dir) {
                self.visit(entry.path, &mut *visited, &mut *stats).await;
            }
        }
        .boxed()
    }

    /// Resolution and fetch phases for one directory
    async fn process_directory(&self, dir: &Path, entries: &[Entry], stats: &mut ScanStats) {
        let container = entries
            .iter()
            .find(|e| e.is_file && is_container(&e.name));

        if let Some(container) = container {
            info!("Found DLC: {}", container.path.display());

            if self.store.has_manifest(dir) {
                info!(
                    "links.txt already exists in {}, skipping decryption.",
                    dir.display()
                );
            } else if !self.resolve_into_manifest(dir, container, stats).await {
                // Manifest state for this directory is unknown; fetch next pass
                return;
            }
        }

        let links = match self.store.read_links(dir) {
            Ok(Some(links)) => links,
            Ok(None) => return,
            Err(e) => {
                error!(
                    "Failed to read {}: {}",
                    ManifestStore::manifest_path(dir).display(),
                    e
                );
                return;
            }
        };

        if links.is_empty() {
            debug!("links.txt in {} has no links", dir.display());
            return;
        }

        info!("Processing links.txt in {}", dir.display());
        let summary = fetch_links(&self.fetcher, &links, dir).await;
        stats.absorb(&summary);

        if let Err(e) = summary.record_failures(&self.store) {
            error!("{}", e);
        }
    }

    /// Returns false only when links were obtained but could not be persisted
    async fn resolve_into_manifest(
        &self,
        dir: &Path,
        container: &Entry,
        stats: &mut ScanStats,
    ) -> bool {
        info!("Decrypting {}...", container.name);

        match self.resolver.resolve(&container.path).await {
            Ok(links) if links.is_empty() => {
                // No manifest: the next scan asks the resolver again
                warn!("No links found in {}", container.name);
                true
            }
            Ok(links) => match self.store.write_links(dir, &links) {
                Ok(()) => {
                    info!(
                        "Saved {} links to {}",
                        links.len(),
                        ManifestStore::manifest_path(dir).display()
                    );
                    stats.containers_resolved += 1;
                    true
                }
                Err(e) => {
                    error!("{}", e);
                    false
                }
            },
            Err(e) => {
                error!("Failed to decrypt {}: {}", container.name, e);
                stats.resolution_failures += 1;
                true
            }
        }
    }

    async fn list(&self, dir: &Path) -> Result<Vec<Entry>, Error> {
        let read_err = |source| Error::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        };

        let mut reader = tokio::fs::read_dir(dir).await.map_err(read_err)?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await.map_err(read_err)? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    warn!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };

            let (is_file, is_dir) = if file_type.is_symlink() {
                if !self.follow_symlinks {
                    continue;
                }
                match tokio::fs::metadata(&path).await {
                    Ok(target) => (target.is_file(), target.is_dir()),
                    Err(e) => {
                        warn!("Dangling symlink {}: {}", path.display(), e);
                        continue;
                    }
                }
            } else {
                (file_type.is_file(), file_type.is_dir())
            };

            entries.push(Entry {
                name,
                path,
                is_file,
                is_dir,
            });
        }

        // Stable order makes repeated passes behave identically
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
