use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::AppState;
use crate::error::ApiError;
use crate::types::StatsResponse;

pub const API_VERSION: &str = "1.0.0";

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.store.stats().await?;

    Ok(Json(StatsResponse {
        system_health: "operational".to_owned(),
        database_stats: stats.into(),
        api_version: API_VERSION.to_owned(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}
