use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use quake_common::{EventQuery, DEFAULT_QUERY_LIMIT};
use serde::Deserialize;
use tracing::debug;

use super::AppState;
use crate::error::ApiError;
use crate::types::{EarthquakeResponse, LatestResponse};

pub const LATEST_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct AlertParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub min_magnitude: Option<f64>,
}

/// Stored earthquakes at or above `min_magnitude`, most recent first.
pub async fn alerts(
    State(state): State<AppState>,
    params: Result<Query<AlertParams>, QueryRejection>,
) -> Result<Json<Vec<EarthquakeResponse>>, ApiError> {
    let Query(params) = params?;
    let query = EventQuery::new(
        params.limit.unwrap_or(DEFAULT_QUERY_LIMIT),
        params.offset.unwrap_or(0),
        params.min_magnitude.unwrap_or(0.0),
    )?;
    debug!(?query, "querying alerts");

    let records = state.store.query(&query).await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

pub async fn latest(State(state): State<AppState>) -> Result<Json<LatestResponse>, ApiError> {
    let query = EventQuery::most_recent(LATEST_LIMIT)?;
    let earthquakes: Vec<EarthquakeResponse> = state
        .store
        .query(&query)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(LatestResponse {
        retrieved_at: Utc::now(),
        count: earthquakes.len(),
        earthquakes,
    }))
}
