use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("quakewatch/", env!("CARGO_PKG_VERSION"));

/// Where the ingest loop gets its feed documents from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<Value, FetchError>;
}

/// Retrieves the feed document over HTTP. One GET per call, no retries: a
/// failed fetch is retried by the next cycle.
pub struct FeedClient {
    client: Client,
    url: String,
}

impl FeedClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            url: url.to_owned(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch(&self) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.bytes().await.map_err(FetchError::Transport)?;
        debug!(bytes = body.len(), "fetched feed document");

        Ok(serde_json::from_slice(&body)?)
    }
}
