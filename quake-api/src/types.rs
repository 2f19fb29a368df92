use chrono::{DateTime, Utc};
use quake_common::{EarthquakeRecord, StoreStats};
use serde::{Deserialize, Serialize};

/// An earthquake as served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeResponse {
    pub id: String,
    pub place: String,
    pub magnitude: f64,
    pub depth: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub tsunami: bool,
    pub occurred_at: DateTime<Utc>,
}

impl From<EarthquakeRecord> for EarthquakeResponse {
    fn from(record: EarthquakeRecord) -> Self {
        Self {
            id: record.id,
            place: record.place,
            magnitude: record.magnitude,
            depth: record.depth,
            latitude: record.latitude,
            longitude: record.longitude,
            tsunami: record.tsunami_flag,
            occurred_at: record.occurred_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LatestResponse {
    pub retrieved_at: DateTime<Utc>,
    pub earthquakes: Vec<EarthquakeResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub system_health: String,
    pub database_stats: DatabaseStats,
    pub api_version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub total_earthquakes: i64,
    /// Rounded to two decimals, 0 when nothing is stored
    pub average_magnitude: f64,
    pub max_magnitude: f64,
    pub latest_earthquake: Option<DateTime<Utc>>,
}

impl From<StoreStats> for DatabaseStats {
    fn from(stats: StoreStats) -> Self {
        Self {
            total_earthquakes: stats.total_count,
            average_magnitude: stats
                .average_magnitude
                .map(|avg| (avg * 100.0).round() / 100.0)
                .unwrap_or(0.0),
            max_magnitude: stats.max_magnitude.unwrap_or(0.0),
            latest_earthquake: stats.latest_occurred_at,
        }
    }
}
