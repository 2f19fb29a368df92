pub const CYCLE_STARTS: &str = "quake_ingest_cycle_starts";
pub const CYCLE_TIME: &str = "quake_ingest_cycle_ms";
pub const CYCLES_COMPLETED: &str = "quake_ingest_cycles_completed";
pub const CYCLES_SKIPPED: &str = "quake_ingest_cycles_skipped";

pub const FETCH_TIME: &str = "quake_ingest_fetch_ms";
pub const UPSERT_TIME: &str = "quake_ingest_upsert_ms";

pub const RECORDS_STORED: &str = "quake_ingest_records_stored";
pub const RECORDS_REJECTED: &str = "quake_ingest_records_rejected";
pub const ENTRIES_SKIPPED: &str = "quake_ingest_entries_skipped";

// Unix seconds, alert on it going stale
pub const LAST_SUCCESS_TIMESTAMP: &str = "quake_ingest_last_success_timestamp";
