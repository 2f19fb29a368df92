use async_trait::async_trait;
use sqlx::error::Error as SqlxError;
use sqlx::PgPool;
use tracing::{debug, warn};

use super::EventStore;
use crate::config::PoolConfig;
use crate::error::StoreError;
use crate::types::{EarthquakeRecord, EventQuery, RejectedRecord, StoreStats, UpsertSummary};

const UPSERT_EARTHQUAKE: &str = r#"
INSERT INTO earthquakes (id, place, magnitude, depth, latitude, longitude, tsunami_flag, occurred_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (id) DO UPDATE SET
    place = EXCLUDED.place,
    magnitude = EXCLUDED.magnitude,
    depth = EXCLUDED.depth,
    latitude = EXCLUDED.latitude,
    longitude = EXCLUDED.longitude,
    tsunami_flag = EXCLUDED.tsunami_flag,
    occurred_at = EXCLUDED.occurred_at
"#;

const QUERY_EARTHQUAKES: &str = r#"
SELECT id, place, magnitude, depth, latitude, longitude, tsunami_flag, occurred_at
FROM earthquakes
WHERE magnitude >= $1
ORDER BY occurred_at DESC, id ASC
LIMIT $2 OFFSET $3
"#;

const EARTHQUAKE_STATS: &str = r#"
SELECT
    COUNT(*) AS total_count,
    AVG(magnitude) AS average_magnitude,
    MAX(magnitude) AS max_magnitude,
    MAX(occurred_at) AS latest_occurred_at
FROM earthquakes
"#;

/// An `EventStore` backed by the `earthquakes` table.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub async fn new(config: &PoolConfig) -> Result<Self, StoreError> {
        let pool = config
            .connect()
            .await
            .map_err(|error| StoreError::PoolCreationError { error })?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn init(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn upsert(&self, records: &[EarthquakeRecord]) -> Result<UpsertSummary, StoreError> {
        let mut summary = UpsertSummary::default();

        for record in records {
            let result = sqlx::query(UPSERT_EARTHQUAKE)
                .bind(&record.id)
                .bind(&record.place)
                .bind(record.magnitude)
                .bind(record.depth)
                .bind(record.latitude)
                .bind(record.longitude)
                .bind(record.tsunami_flag)
                .bind(record.occurred_at)
                .execute(&self.pool)
                .await;

            match result {
                Ok(_) => summary.written += 1,
                Err(error) if is_record_error(&error) => {
                    warn!(id = %record.id, "earthquake record rejected: {}", error);
                    summary.rejected.push(RejectedRecord {
                        id: record.id.clone(),
                        reason: error.to_string(),
                    });
                }
                Err(error) => {
                    return Err(StoreError::Unavailable {
                        written: summary.written,
                        error,
                    })
                }
            }
        }

        debug!(
            written = summary.written,
            rejected = summary.rejected.len(),
            "upserted earthquake batch"
        );
        Ok(summary)
    }

    async fn query(&self, query: &EventQuery) -> Result<Vec<EarthquakeRecord>, StoreError> {
        sqlx::query_as::<_, EarthquakeRecord>(QUERY_EARTHQUAKES)
            .bind(query.min_magnitude())
            .bind(query.limit())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| read_error("SELECT", error))
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        sqlx::query_as::<_, StoreStats>(EARTHQUAKE_STATS)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| read_error("SELECT", error))
    }
}

fn read_error(command: &str, error: SqlxError) -> StoreError {
    if is_connection_error(&error) {
        StoreError::Unavailable { written: 0, error }
    } else {
        StoreError::QueryError {
            command: command.to_owned(),
            error,
        }
    }
}

/// The database refused this one record: class 22 (data exception) or
/// class 23 (integrity constraint violation).
fn is_record_error(error: &SqlxError) -> bool {
    match error {
        SqlxError::Database(db_error) => db_error
            .code()
            .is_some_and(|code| code.starts_with("22") || code.starts_with("23")),
        _ => false,
    }
}

fn is_connection_error(error: &SqlxError) -> bool {
    match error {
        SqlxError::Io(_)
        | SqlxError::Tls(_)
        | SqlxError::Protocol(_)
        | SqlxError::PoolTimedOut
        | SqlxError::PoolClosed
        | SqlxError::WorkerCrashed => true,
        // 08: connection exception, 57: operator intervention (e.g. shutdown)
        SqlxError::Database(db_error) => db_error
            .code()
            .is_some_and(|code| code.starts_with("08") || code.starts_with("57")),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors() {
        assert!(is_connection_error(&SqlxError::PoolTimedOut));
        assert!(is_connection_error(&SqlxError::PoolClosed));
        assert!(is_connection_error(&SqlxError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused"
        ))));
        assert!(!is_connection_error(&SqlxError::RowNotFound));

        assert!(!is_record_error(&SqlxError::PoolTimedOut));
    }

    #[test]
    fn test_read_errors_are_classified() {
        assert!(read_error("SELECT", SqlxError::PoolTimedOut).is_unavailable());
        assert!(matches!(
            read_error("SELECT", SqlxError::RowNotFound),
            StoreError::QueryError { .. }
        ));
    }
}
