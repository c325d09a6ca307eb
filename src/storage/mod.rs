//! Remote object storage.
//!
//! The fetcher only needs two things from a storage backend: an object's
//! display name and size, and a byte stream of its content. Authentication is
//! the backend's concern, supplied through a [`CredentialProvider`].

pub mod credentials;
pub mod drive;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::Result;

pub use credentials::{AuthorizedUserFile, CredentialProvider, StaticToken};
pub use drive::DriveClient;

/// Stream of object content chunks
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Metadata of a stored object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Display name, used as the local file name
    pub name: Option<String>,
    /// Declared size in bytes; `None` when the backend does not know it
    pub size: Option<u64>,
}

impl ObjectMetadata {
    /// Expected size, with absent or zero meaning "unknown" (0)
    pub fn expected_size(&self) -> u64 {
        self.size.unwrap_or(0)
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn metadata(&self, id: &str) -> Result<ObjectMetadata>;

    /// Open the full content of an object from its first byte
    async fn open_stream(&self, id: &str) -> Result<ByteStream>;
}
