use thiserror::Error;

/// Errors extracting one feature entry from a feed document.
/// Each one rejects a single entry, never the whole document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("feature entry is not a JSON object")]
    NotAnObject,
    #[error("missing required field {0}")]
    MissingField(&'static str),
    #[error("field {field} is invalid: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

/// Enumeration of errors for operations with an EventStore.
/// Errors can originate from sqlx and are wrapped by us to provide additional context.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("pool creation failed with: {error}")]
    PoolCreationError { error: sqlx::Error },
    /// The backing medium could not be reached. Any batch in progress was
    /// aborted after `written` records.
    #[error("storage unavailable after writing {written} records: {error}")]
    Unavailable { written: u64, error: sqlx::Error },
    #[error("{command} query failed with: {error}")]
    QueryError { command: String, error: sqlx::Error },
    #[error("migration failed with: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::PoolCreationError { .. }
        )
    }
}

/// Invalid pagination or filter parameters for a store query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("limit must be a positive integer, got {0}")]
    InvalidLimit(i64),
    #[error("offset must not be negative, got {0}")]
    InvalidOffset(i64),
    #[error("min_magnitude must be a finite number, got {0}")]
    InvalidMagnitude(f64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown APP_ENV profile {0:?}, expected development, testing or production")]
    UnknownProfile(String),
    #[error("invalid database url: {0}")]
    InvalidDatabaseUrl(#[from] url::ParseError),
}
