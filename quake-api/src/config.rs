use envconfig::Envconfig;
use quake_common::StorageConfig;
use quake_ingest::config::{IngestConfig, IngestSettings};

#[derive(Envconfig)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "::")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "8000")]
    pub port: u16,

    #[envconfig(from = "METRICS_ENABLED", default = "true")]
    pub metrics_enabled: bool,

    // Run the ingest loop in this process, over the API's own pool
    #[envconfig(from = "INGEST_ENABLED", default = "false")]
    pub ingest_enabled: bool,

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
