//! dlcsync - watch a directory tree for DLC containers and download what
//! they link to.
//!
//! # Architecture
//!
//! ```text
//! Scheduler --> DirectoryWalker --+--> LinkResolver --> ManifestStore (links.txt)
//!  (forever)     (per directory)  |
//!                                 +--> ManifestStore --> ResumableFetcher --> ObjectStorage
//!                                 |                           |
//!                                 |                           +--> ManifestStore (failure log)
//!                                 +--> subdirectories
//! ```
//!
//! Everything runs sequentially: at most one resolution or one transfer is in
//! flight at any time.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod resolver;
pub mod scheduler;
pub mod storage;
pub mod temp_file;
pub mod walker;

pub use config::Config;
pub use error::{Error, ResolutionError, Result};
pub use fetch::{FetchOutcome, ResumableFetcher, RetryPolicy};
pub use manifest::ManifestStore;
pub use resolver::{DcryptClient, LinkResolver};
pub use scheduler::Scheduler;
pub use storage::{CredentialProvider, DriveClient, ObjectMetadata, ObjectStorage};
pub use walker::{DirectoryWalker, ScanStats};
