//! In-memory collaborators for driving the engine without a network.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dlcsync::error::{Error, ResolutionError, Result};
use dlcsync::fetch::{ResumableFetcher, RetryPolicy, SilentProgress};
use dlcsync::storage::{ByteStream, ObjectMetadata, ObjectStorage};
use dlcsync::{DirectoryWalker, LinkResolver, ManifestStore};

/// What the fake resolver answers for a container file name
#[derive(Debug, Clone)]
pub enum Resolution {
    Links(Vec<String>),
    Fail,
}

#[derive(Default)]
pub struct FakeResolver {
    answers: Mutex<HashMap<String, Resolution>>,
    calls: Mutex<Vec<PathBuf>>,
}

impl FakeResolver {
    pub fn answer(&self, container_name: &str, resolution: Resolution) {
        self.answers
            .lock()
            .unwrap()
            .insert(container_name.to_string(), resolution);
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkResolver for FakeResolver {
    async fn resolve(&self, container: &Path) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(container.to_path_buf());

        let name = container
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let answer = self.answers.lock().unwrap().get(&name).cloned();

        match answer {
            Some(Resolution::Links(links)) => Ok(links),
            Some(Resolution::Fail) => Err(ResolutionError::Malformed("scripted".to_string()).into()),
            None => Ok(vec![]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeObject {
    pub name: Option<String>,
    pub size: Option<u64>,
    pub content: Vec<u8>,
    /// Content requests that fail before the first byte
    pub failing_streams: usize,
}

impl FakeObject {
    pub fn new(name: &str, content: &[u8]) -> Self {
        Self {
            name: Some(name.to_string()),
            size: Some(content.len() as u64),
            content: content.to_vec(),
            failing_streams: 0,
        }
    }

    pub fn always_failing(mut self) -> Self {
        self.failing_streams = usize::MAX;
        self
    }
}

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, FakeObject>>,
    metadata_calls: Mutex<Vec<String>>,
    stream_calls: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn insert(&self, id: &str, object: FakeObject) {
        self.objects.lock().unwrap().insert(id.to_string(), object);
    }

    pub fn metadata_calls(&self) -> Vec<String> {
        self.metadata_calls.lock().unwrap().clone()
    }

    pub fn stream_calls(&self) -> Vec<String> {
        self.stream_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn metadata(&self, id: &str) -> Result<ObjectMetadata> {
        self.metadata_calls.lock().unwrap().push(id.to_string());
        match self.objects.lock().unwrap().get(id) {
            Some(object) => Ok(ObjectMetadata {
                name: object.name.clone(),
                size: object.size,
            }),
            None => Err(Error::Metadata {
                id: id.to_string(),
                message: "status 404 Not Found".to_string(),
            }),
        }
    }

    async fn open_stream(&self, id: &str) -> Result<ByteStream> {
        let attempt = {
            let mut calls = self.stream_calls.lock().unwrap();
            let attempt = calls.iter().filter(|c| c.as_str() == id).count();
            calls.push(id.to_string());
            attempt
        };

        let object = self
            .objects
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::Stream {
                id: id.to_string(),
                message: "status 404 Not Found".to_string(),
            })?;

        let chunks: Vec<Result<Bytes>> = if attempt < object.failing_streams {
            vec![Err(Error::Stream {
                id: id.to_string(),
                message: "connection reset".to_string(),
            })]
        } else {
            object
                .content
                .chunks(4)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect()
        };

        Ok(futures::stream::iter(chunks).boxed())
    }
}

pub struct Harness {
    pub resolver: Arc<FakeResolver>,
    pub storage: Arc<FakeStorage>,
    pub walker: DirectoryWalker,
    pub failure_log: PathBuf,
}

impl Harness {
    pub fn new(log_dir: &Path, retry: RetryPolicy) -> Self {
        let resolver = Arc::new(FakeResolver::default());
        let storage = Arc::new(FakeStorage::default());
        let failure_log = log_dir.join("failed_downloads.txt");

        let fetcher = ResumableFetcher::new(storage.clone(), Arc::new(SilentProgress), retry);
        let walker = DirectoryWalker::new(
            resolver.clone(),
            ManifestStore::new(&failure_log),
            fetcher,
        );

        Self {
            resolver,
            storage,
            walker,
            failure_log,
        }
    }

    /// No retries, no delay
    pub fn quick(log_dir: &Path) -> Self {
        Self::new(log_dir, RetryPolicy::new(0, Duration::ZERO))
    }

    pub fn following_symlinks(mut self) -> Self {
        self.walker = self.walker.follow_symlinks(true);
        self
    }

    pub fn failure_log_lines(&self) -> Vec<String> {
        std::fs::read_to_string(&self.failure_log)
            .map(|c| c.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
