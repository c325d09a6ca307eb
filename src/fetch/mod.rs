//! Fetching linked objects into local directories.
//!
//! ```text
//! link --extract_object_id--> id --metadata--> name, size
//!                                    |
//!            local copy >= size? ----+---- yes: skip
//!                                    |
//!                                    no: stream -> file -> verify size
//! ```

pub mod batch;
pub mod fetcher;
pub mod link;
pub mod progress;
pub mod retry;

pub use batch::{fetch_links, BatchSummary};
pub use fetcher::{local_file_name, FetchOutcome, ResumableFetcher};
pub use link::extract_object_id;
pub use progress::{BarProgress, ProgressSink, SilentProgress, TransferProgress};
pub use retry::{RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
