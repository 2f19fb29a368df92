use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{EarthquakeRecord, EventQuery, StoreStats, UpsertSummary};

mod postgres;

pub use postgres::PgEventStore;

/// Durable keyed storage of earthquake records.
///
/// Implementations are shared between the ingestion loop and the query
/// handlers as an `Arc<dyn EventStore>`.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Ensure the schema exists. Safe to call on every start.
    async fn init(&self) -> Result<(), StoreError>;

    /// Insert or overwrite each record by id, in batch order, so the last
    /// occurrence of a duplicated id wins.
    ///
    /// A record the backend refuses is reported in the summary and the batch
    /// goes on. Losing the backend aborts the rest of the batch with
    /// `StoreError::Unavailable`.
    async fn upsert(&self, records: &[EarthquakeRecord]) -> Result<UpsertSummary, StoreError>;

    /// Records with `magnitude >= min_magnitude`, most recent first.
    async fn query(&self, query: &EventQuery) -> Result<Vec<EarthquakeRecord>, StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;
}
