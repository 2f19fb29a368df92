use std::time::Duration;

use envconfig::Envconfig;
use quake_common::{Profile, StorageConfig};

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "::")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "3310")]
    pub port: u16,

    #[envconfig(from = "METRICS_ENABLED", default = "true")]
    pub metrics_enabled: bool,

    #[envconfig(nested = true)]
    pub storage: StorageConfig,

    #[envconfig(nested = true)]
    pub ingest: IngestConfig,
}

impl Config {
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn ingest_settings(&self) -> IngestSettings {
        self.ingest.settings(self.storage.profile)
    }
}

/// Feed polling settings. Unset values fall back to the `APP_ENV` profile.
#[derive(Envconfig, Clone, Debug)]
pub struct IngestConfig {
    #[envconfig(from = "FEED_URL")]
    pub feed_url: Option<String>,

    #[envconfig(from = "POLL_INTERVAL_SECS")]
    pub poll_interval_secs: Option<u64>,

    #[envconfig(from = "REQUEST_TIMEOUT_SECS", default = "30")]
    pub request_timeout_secs: u64,
}

impl IngestConfig {
    pub fn settings(&self, profile: Profile) -> IngestSettings {
        let feed_url = match &self.feed_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => profile.feed_url().to_owned(),
        };
        let poll_interval = self
            .poll_interval_secs
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or_else(|| profile.poll_interval());

        IngestSettings {
            feed_url,
            poll_interval,
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IngestSettings {
    pub feed_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl IngestSettings {
    /// A loop that misses this many polls is reported as stalled.
    pub fn liveness_deadline(&self) -> Duration {
        self.poll_interval * 4
    }
}
