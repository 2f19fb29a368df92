pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod ingest;
pub mod metrics_constants;
pub mod shutdown;
pub mod status;

pub use error::FetchError;
pub use feed::{FeedClient, FeedSource};
pub use ingest::{CycleOutcome, CycleReport, IngestLoop, SkipReason};
pub use status::{IngestSnapshot, IngestStatus};
