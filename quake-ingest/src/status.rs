use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::ingest::{CycleOutcome, CycleReport};

// Transient state, displayed on the worker's status route
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct IngestSnapshot {
    pub cycles_completed: u64,
    pub cycles_skipped: u64,
    pub last_report: Option<CycleReport>,
    pub last_error: Option<String>,
    pub last_error_time: Option<DateTime<Utc>>,
    pub last_successful_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}

/// Shared between the ingest loop, which records every cycle, and the HTTP
/// server, which reads snapshots.
#[derive(Debug, Default)]
pub struct IngestStatus {
    snapshot: Mutex<IngestSnapshot>,
}

impl IngestStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> IngestSnapshot {
        self.snapshot.lock().await.clone()
    }

    pub async fn record(&self, outcome: &CycleOutcome, next_run: Option<DateTime<Utc>>) {
        let now = Utc::now();
        let mut snapshot = self.snapshot.lock().await;

        match outcome {
            CycleOutcome::Completed(report) => {
                snapshot.cycles_completed += 1;
                snapshot.last_report = Some(report.clone());
                snapshot.last_successful_run = Some(now);
            }
            CycleOutcome::Skipped(reason) => {
                snapshot.cycles_skipped += 1;
                snapshot.last_error = Some(reason.to_string());
                snapshot.last_error_time = Some(now);
            }
        }
        snapshot.next_run = next_run;
    }
}
