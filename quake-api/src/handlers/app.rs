use axum::{
    response::{IntoResponse, Response},
    routing, Router,
};
use common_metrics::setup_metrics_routes;
use health::HealthRegistry;

use super::{earthquakes, stats, AppState};

/// Builds the API router. `liveness` is only set when this process runs the
/// ingest loop; without it, liveness just checks that axum answers.
pub fn app(state: AppState, liveness: Option<HealthRegistry>, metrics_enabled: bool) -> Router {
    let router = Router::new()
        .route("/", routing::get(index))
        .route("/_readiness", routing::get(index))
        .route(
            "/_liveness",
            routing::get(move || liveness_check(liveness.clone())),
        )
        .route("/health", routing::get(stats::health))
        .route("/alerts", routing::get(earthquakes::alerts))
        .route("/latest", routing::get(earthquakes::latest))
        .route("/stats", routing::get(stats::stats))
        .with_state(state);

    // setup_metrics_routes touches global objects, so we need to be able to selectively
    // disable it e.g. for tests
    if metrics_enabled {
        setup_metrics_routes(router)
    } else {
        router
    }
}

pub async fn index() -> &'static str {
    "quakewatch api"
}

async fn liveness_check(liveness: Option<HealthRegistry>) -> Response {
    match liveness {
        Some(registry) => registry.get_status().into_response(),
        None => index().await.into_response(),
    }
}
