//! An in-memory `EventStore`, for tests of the code built on top of the store.
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::EventStore;
use crate::types::{EarthquakeRecord, EventQuery, RejectedRecord, StoreStats, UpsertSummary};

#[derive(Default)]
pub struct MemoryEventStore {
    records: Mutex<HashMap<String, EarthquakeRecord>>,
    rejected_ids: Mutex<HashSet<String>>,
    unavailable: AtomicBool,
    init_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = EarthquakeRecord>) -> Self {
        let store = Self::new();
        store
            .lock_records()
            .extend(records.into_iter().map(|r| (r.id.clone(), r)));
        store
    }

    /// While set, every operation fails with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Refuse records with this id, the way a database refuses a row
    /// breaking a constraint.
    pub fn reject_id(&self, id: &str) {
        self.rejected_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_owned());
    }

    pub fn get(&self, id: &str) -> Option<EarthquakeRecord> {
        self.lock_records().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock_records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    fn lock_records(&self) -> MutexGuard<'_, HashMap<String, EarthquakeRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self, written: u64) -> Result<(), StoreError> {
        match self.unavailable.load(Ordering::SeqCst) {
            true => Err(StoreError::Unavailable {
                written,
                error: sqlx::Error::PoolTimedOut,
            }),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn init(&self) -> Result<(), StoreError> {
        self.check_available(0)?;
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert(&self, records: &[EarthquakeRecord]) -> Result<UpsertSummary, StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available(0)?;

        let rejected_ids = self
            .rejected_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let mut stored = self.lock_records();
        let mut summary = UpsertSummary::default();

        for record in records {
            if rejected_ids.contains(&record.id) {
                summary.rejected.push(RejectedRecord {
                    id: record.id.clone(),
                    reason: "rejected by test store".to_owned(),
                });
                continue;
            }
            stored.insert(record.id.clone(), record.clone());
            summary.written += 1;
        }

        Ok(summary)
    }

    async fn query(&self, query: &EventQuery) -> Result<Vec<EarthquakeRecord>, StoreError> {
        self.check_available(0)?;

        let mut matching: Vec<EarthquakeRecord> = self
            .lock_records()
            .values()
            .filter(|r| r.magnitude >= query.min_magnitude())
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        self.check_available(0)?;

        let records = self.lock_records();
        if records.is_empty() {
            return Ok(StoreStats::default());
        }

        let total: f64 = records.values().map(|r| r.magnitude).sum();
        Ok(StoreStats {
            total_count: records.len() as i64,
            average_magnitude: Some(total / records.len() as f64),
            max_magnitude: records.values().map(|r| r.magnitude).reduce(f64::max),
            latest_occurred_at: records.values().map(|r| r.occurred_at).max(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::*;
    use crate::normalize::normalize;

    fn record(id: &str, magnitude: f64, occurred_at: DateTime<Utc>) -> EarthquakeRecord {
        EarthquakeRecord {
            id: id.to_owned(),
            place: format!("near {id}"),
            magnitude,
            depth: 10.0,
            latitude: 1.0,
            longitude: 2.0,
            tsunami_flag: false,
            occurred_at,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryEventStore::new();
        let now = Utc::now();

        let first = store.upsert(&[record("a", 1.0, now)]).await.unwrap();
        assert_eq!(first.written, 1);

        let mut updated = record("a", 2.5, now);
        updated.place = "elsewhere".to_owned();
        store.upsert(&[updated.clone()]).await.unwrap();
        store.upsert(&[updated.clone()]).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a"), Some(updated));
    }

    #[tokio::test]
    async fn test_last_duplicate_in_batch_wins() {
        let store = MemoryEventStore::new();
        let now = Utc::now();

        let summary = store
            .upsert(&[record("a", 1.0, now), record("a", 2.0, now)])
            .await
            .unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().magnitude, 2.0);
    }

    #[tokio::test]
    async fn test_query_filters_orders_and_pages() {
        let now = Utc::now();
        let store = MemoryEventStore::with_records([
            record("old", 5.0, now - Duration::hours(3)),
            record("small", 2.0, now - Duration::hours(1)),
            record("b", 4.5, now - Duration::hours(2)),
            record("a", 6.1, now - Duration::hours(2)),
            record("new", 4.6, now),
        ]);

        let query = EventQuery::new(10, 0, 4.5).unwrap();
        let ids: Vec<_> = store
            .query(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["new", "a", "b", "old"]);

        let query = EventQuery::new(2, 1, 4.5).unwrap();
        let page = store.query(&query).await.unwrap();
        let ids: Vec<_> = page.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let past_end = store
            .query(&EventQuery::new(10, 50, 0.0).unwrap())
            .await
            .unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let store = MemoryEventStore::new();
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());

        let now = Utc::now();
        store
            .upsert(&[
                record("a", 2.0, now - Duration::minutes(5)),
                record("b", 4.0, now),
            ])
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.average_magnitude, Some(3.0));
        assert_eq!(stats.max_magnitude, Some(4.0));
        assert_eq!(stats.latest_occurred_at, Some(now));
    }

    #[tokio::test]
    async fn test_rejected_record_does_not_abort_batch() {
        let store = MemoryEventStore::new();
        store.reject_id("bad");
        let now = Utc::now();

        let batch = [
            record("a", 1.0, now),
            record("bad", 1.0, now),
            record("c", 1.0, now),
        ];
        let summary = store.upsert(&batch).await.unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(summary.rejected.len(), 1);
        assert_eq!(summary.rejected[0].id, "bad");
        assert!(store.get("c").is_some());
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = MemoryEventStore::new();
        store.set_unavailable(true);

        let batch = [record("a", 1.0, Utc::now())];
        let err = store.upsert(&batch).await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(store.stats().await.unwrap_err().is_unavailable());
        assert!(store.is_empty());

        store.set_unavailable(false);
        assert_eq!(store.stats().await.unwrap().total_count, 0);
    }

    #[tokio::test]
    async fn test_normalized_feed_round_trips_through_store() {
        let document = serde_json::json!({
            "features": [{
                "id": "t1",
                "properties": {"place": "X", "mag": 3.5, "tsunami": 1, "time": 189876532456i64},
                "geometry": {"coordinates": [7, 8, 9]}
            }]
        });
        let feed = normalize(&document);

        let store = MemoryEventStore::new();
        store.init().await.unwrap();
        store.upsert(&feed.records).await.unwrap();

        let query = EventQuery::new(10, 0, 0.0).unwrap();
        let stored = store.query(&query).await.unwrap();
        assert_eq!(stored, feed.records);

        // A second pass over the same feed leaves the store unchanged
        store.upsert(&feed.records).await.unwrap();
        assert_eq!(store.len(), 1);
    }
}
