//! Resolution of container files into download links.
//!
//! The resolver is deliberately single-shot: it never retries. A failed or
//! empty resolution leaves the directory without a manifest, and the next
//! scan tries again from scratch.

pub mod dcrypt;
pub mod response;

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

pub use dcrypt::DcryptClient;
pub use response::parse_response;

/// Fixed suffix of container files
pub const CONTAINER_SUFFIX: &str = ".dlc";

/// Turns a container file into an ordered list of links
#[async_trait]
pub trait LinkResolver: Send + Sync {
    async fn resolve(&self, container: &Path) -> Result<Vec<String>>;
}

/// Whether a file name marks a container
pub fn is_container(file_name: &str) -> bool {
    file_name.ends_with(CONTAINER_SUFFIX)
}
