use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use health::HealthHandle;
use quake_common::{normalize, EventStore, StoreError};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::IngestSettings;
use crate::error::FetchError;
use crate::feed::FeedSource;
use crate::metrics_constants::*;
use crate::status::IngestStatus;

/// Counts for one cycle that made it through to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Feature entries in the fetched document
    pub fetched: usize,
    /// Records written to the store
    pub stored: u64,
    /// Records the store refused
    pub rejected: usize,
    /// Entries dropped by the normalizer
    pub skipped: usize,
}

#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    Fetch(#[source] FetchError),
    #[error("store failed: {0}")]
    Store(#[source] StoreError),
}

#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Skipped(SkipReason),
}

impl CycleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CycleOutcome::Completed(_))
    }
}

/// Polls the feed and upserts what it finds, until cancelled.
pub struct IngestLoop {
    feed: Arc<dyn FeedSource>,
    store: Arc<dyn EventStore>,
    poll_interval: Duration,
    liveness: HealthHandle,
    status: Arc<IngestStatus>,
}

impl IngestLoop {
    pub fn new(
        feed: Arc<dyn FeedSource>,
        store: Arc<dyn EventStore>,
        settings: &IngestSettings,
        liveness: HealthHandle,
    ) -> Self {
        Self {
            feed,
            store,
            poll_interval: settings.poll_interval,
            liveness,
            status: Arc::new(IngestStatus::new()),
        }
    }

    pub fn status(&self) -> Arc<IngestStatus> {
        self.status.clone()
    }

    /// One fetch, normalize and upsert pass. Failures are folded into the
    /// outcome so the caller keeps looping.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let _cycle_time = common_metrics::timing_guard(CYCLE_TIME, &[]);
        common_metrics::inc(CYCLE_STARTS, &[], 1);

        let document = {
            let _time = common_metrics::timing_guard(FETCH_TIME, &[]);
            match self.feed.fetch().await {
                Ok(document) => document,
                Err(e) => return CycleOutcome::Skipped(SkipReason::Fetch(e)),
            }
        };

        let feed = normalize(&document);
        common_metrics::inc(ENTRIES_SKIPPED, &[], feed.rejected.len() as u64);

        let summary = {
            let _time = common_metrics::timing_guard(UPSERT_TIME, &[]);
            match self.store.upsert(&feed.records).await {
                Ok(summary) => summary,
                Err(e) => {
                    if let StoreError::Unavailable { written, .. } = &e {
                        common_metrics::inc(RECORDS_STORED, &[], *written);
                    }
                    return CycleOutcome::Skipped(SkipReason::Store(e));
                }
            }
        };
        common_metrics::inc(RECORDS_STORED, &[], summary.written);
        common_metrics::inc(RECORDS_REJECTED, &[], summary.rejected.len() as u64);

        CycleOutcome::Completed(CycleReport {
            fetched: feed.total_entries(),
            stored: summary.written,
            rejected: summary.rejected.len(),
            skipped: feed.rejected.len(),
        })
    }

    /// Runs cycles back to back with `poll_interval` of sleep in between.
    /// Cancellation is honoured before a cycle and during the sleep, never
    /// in the middle of a cycle.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "starting ingest loop"
        );

        while !cancel.is_cancelled() {
            let outcome = self.run_cycle().await;

            let next_run = chrono::Duration::from_std(self.poll_interval)
                .ok()
                .map(|interval| Utc::now() + interval);
            self.observe(&outcome, next_run).await;

            // A skipped cycle still proves the loop is alive
            self.liveness.report_healthy().await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!("ingest loop stopped");
    }

    async fn observe(&self, outcome: &CycleOutcome, next_run: Option<chrono::DateTime<Utc>>) {
        match outcome {
            CycleOutcome::Completed(report) => {
                common_metrics::inc(CYCLES_COMPLETED, &[], 1);
                let now = common_metrics::get_current_timestamp_seconds();
                common_metrics::gauge(LAST_SUCCESS_TIMESTAMP, &[], now);
                if report.rejected > 0 || report.skipped > 0 {
                    warn!(
                        rejected = report.rejected,
                        skipped = report.skipped,
                        "ingest cycle dropped some entries"
                    );
                }
                info!(
                    fetched = report.fetched,
                    stored = report.stored,
                    "ingest cycle complete"
                );
            }
            CycleOutcome::Skipped(reason) => {
                common_metrics::inc(CYCLES_SKIPPED, &[], 1);
                error!("ingest cycle skipped: {}", reason);
            }
        }

        self.status.record(outcome, next_run).await;
    }
}
