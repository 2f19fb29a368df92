use std::sync::Arc;
use std::time::Instant;

use quake_common::EventStore;

pub mod app;
pub mod earthquakes;
pub mod stats;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            started_at: Instant::now(),
        }
    }
}
