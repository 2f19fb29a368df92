pub mod config;
pub mod error;
pub mod normalize;
pub mod store;
pub mod test_support;
pub mod types;

pub use config::{PoolConfig, Profile, StorageConfig};
pub use error::{ConfigError, NormalizeError, QueryError, StoreError};
pub use normalize::{normalize, normalize_feature};
pub use store::{EventStore, PgEventStore};
pub use types::{
    EarthquakeRecord, EventQuery, NormalizedFeed, RejectedEntry, RejectedRecord, StoreStats,
    UpsertSummary, DEFAULT_QUERY_LIMIT, MAX_QUERY_LIMIT,
};
