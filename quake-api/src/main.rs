use std::sync::Arc;

use axum::Router;
use envconfig::Envconfig;
use eyre::Result;
use health::HealthRegistry;
use quake_api::config::Config;
use quake_api::handlers::{app::app, AppState};
use quake_common::{EventStore, PgEventStore};
use quake_ingest::{feed::FeedClient, ingest::IngestLoop, shutdown::cancel_on_shutdown_signal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn setup_tracing() {
    let log_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(log_layer).init();
}

async fn listen(router: Router, bind: String, cancel: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    info!("Starting up...");

    let config = Config::init_from_env().expect("failed to load configuration from env");
    let pool_config = config
        .storage
        .pool_config()
        .expect("invalid database configuration");

    // Lazy, so the API comes up and answers 503 while the database is down
    let store = PgEventStore::from_pool(pool_config.connect_lazy()?);
    match store.init().await {
        Ok(()) => {}
        // The loop can't write without a schema
        Err(e) if config.ingest_enabled => return Err(e.into()),
        Err(e) => error!("failed to initialize earthquake storage: {}", e),
    }
    let store: Arc<dyn EventStore> = Arc::new(store);

    let cancel = cancel_on_shutdown_signal();

    let (liveness, ingest_loop): (Option<HealthRegistry>, Option<JoinHandle<()>>) =
        if config.ingest_enabled {
            let settings = config.ingest_settings();
            info!(
                profile = %config.storage.profile,
                feed_url = %settings.feed_url,
                "running embedded ingest loop"
            );

            let client = FeedClient::new(&settings.feed_url, settings.request_timeout)?;
            let feed = Arc::new(client);
            let registry = HealthRegistry::new("liveness");
            let handle = registry
                .register("ingest", settings.liveness_deadline())
                .await;
            let ingest = IngestLoop::new(feed, store.clone(), &settings, handle);

            let ingest_loop = tokio::spawn(ingest.run(cancel.clone()));
            (Some(registry), Some(ingest_loop))
        } else {
            (None, None)
        };

    let router = app(AppState::new(store), liveness, config.metrics_enabled);
    let bind = config.bind();
    info!("listening on {}", bind);

    if let Err(e) = listen(router, bind, cancel.clone()).await {
        error!("http server failed with: {}", e);
    }

    // Let an in-flight cycle finish
    cancel.cancel();
    if let Some(ingest_loop) = ingest_loop {
        if let Err(e) = ingest_loop.await {
            error!("ingest loop failed with: {}", e);
        }
    }

    info!("exiting");
    Ok(())
}
