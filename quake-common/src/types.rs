use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NormalizeError, QueryError};

pub const DEFAULT_QUERY_LIMIT: i64 = 10;
pub const MAX_QUERY_LIMIT: i64 = 500;

/// One earthquake as persisted in the `earthquakes` table.
///
/// The `id` is the feed's natural key: it is never generated locally, and a
/// record with a known `id` overwrites the stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EarthquakeRecord {
    pub id: String,
    pub place: String,
    pub magnitude: f64,
    /// Kilometers. Negative values are above the sea level reference.
    pub depth: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub tsunami_flag: bool,
    pub occurred_at: DateTime<Utc>,
}

/// A feature entry the normalizer could not turn into a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEntry {
    /// Position of the entry in the feed's feature list.
    pub index: usize,
    /// The entry's id, when it had a usable one.
    pub id: Option<String>,
    pub error: NormalizeError,
}

/// Output of normalizing one feed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFeed {
    /// Valid records, in feed order.
    pub records: Vec<EarthquakeRecord>,
    pub rejected: Vec<RejectedEntry>,
}

impl NormalizedFeed {
    pub fn total_entries(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

/// A record the store refused to write, while the rest of the batch went through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub id: String,
    pub reason: String,
}

/// Result of an upsert batch that was not aborted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpsertSummary {
    pub written: u64,
    pub rejected: Vec<RejectedRecord>,
}

/// Aggregates over the whole store. The optional fields are `None` when the
/// store is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct StoreStats {
    pub total_count: i64,
    pub average_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
    pub latest_occurred_at: Option<DateTime<Utc>>,
}

/// A validated page request: records with `magnitude >= min_magnitude`, most
/// recent first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventQuery {
    limit: i64,
    offset: i64,
    min_magnitude: f64,
}

impl EventQuery {
    /// Limits above `MAX_QUERY_LIMIT` are capped rather than rejected.
    pub fn new(limit: i64, offset: i64, min_magnitude: f64) -> Result<Self, QueryError> {
        if limit < 1 {
            return Err(QueryError::InvalidLimit(limit));
        }
        if offset < 0 {
            return Err(QueryError::InvalidOffset(offset));
        }
        if !min_magnitude.is_finite() {
            return Err(QueryError::InvalidMagnitude(min_magnitude));
        }

        Ok(Self {
            limit: limit.min(MAX_QUERY_LIMIT),
            offset,
            min_magnitude,
        })
    }

    /// The `limit` most recent records, with the default magnitude floor.
    pub fn most_recent(limit: i64) -> Result<Self, QueryError> {
        Self::new(limit, 0, 0.0)
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn min_magnitude(&self) -> f64 {
        self.min_magnitude
    }
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_QUERY_LIMIT,
            offset: 0,
            min_magnitude: 0.0,
        }
    }
}
