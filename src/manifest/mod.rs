//! Filesystem state of the engine: manifests and the failure log.

pub mod store;

pub use store::{parse_links, ManifestStore, MANIFEST_FILE};
