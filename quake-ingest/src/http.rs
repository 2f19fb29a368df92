use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common_metrics::setup_metrics_routes;
use health::HealthRegistry;

use crate::status::{IngestSnapshot, IngestStatus};

pub struct AppContext {
    pub health: HealthRegistry,
    pub status: Arc<IngestStatus>,
    pub metrics: bool,
}

async fn index() -> &'static str {
    "quakewatch ingest"
}

async fn liveness(State(context): State<Arc<AppContext>>) -> Response {
    context.health.get_status().into_response()
}

async fn status(State(context): State<Arc<AppContext>>) -> Json<IngestSnapshot> {
    Json(context.status.snapshot().await)
}

pub fn app(context: Arc<AppContext>) -> Router {
    let metrics_enabled = context.metrics;

    let router = Router::new()
        .route("/", get(index))
        .route("/_readiness", get(index))
        .route("/_liveness", get(liveness))
        .route("/_status", get(status))
        .with_state(context);

    // setup_metrics_routes touches global objects, so we need to be able to selectively
    // disable it e.g. for tests
    if metrics_enabled {
        setup_metrics_routes(router)
    } else {
        router
    }
}
