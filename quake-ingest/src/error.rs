use thiserror::Error;

/// Errors retrieving one feed document. Any of them skips the current cycle.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(reqwest::Error),
    #[error("feed request failed: {0}")]
    Transport(reqwest::Error),
    #[error("feed {url} responded with status {status}")]
    Status { status: u16, url: String },
    #[error("feed body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}
