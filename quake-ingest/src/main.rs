use std::sync::Arc;

use axum::Router;
use envconfig::Envconfig;
use eyre::Result;
use health::HealthRegistry;
use quake_common::{EventStore, PgEventStore};
use quake_ingest::{
    config::Config,
    feed::FeedClient,
    http::{app, AppContext},
    ingest::IngestLoop,
    shutdown::cancel_on_shutdown_signal,
};
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
    let settings = config.ingest_settings();
    let pool_config = config
        .storage
        .pool_config()
        .expect("invalid database configuration");

    info!(
        profile = %config.storage.profile,
        feed_url = %settings.feed_url,
        "starting quakewatch ingest"
    );

    let store = PgEventStore::new(&pool_config).await?;
    store.init().await?;
    let store: Arc<dyn EventStore> = Arc::new(store);

    let client = FeedClient::new(&settings.feed_url, settings.request_timeout)?;
    let feed = Arc::new(client);

    let liveness = HealthRegistry::new("liveness");
    let ingest_liveness = liveness
        .register("ingest", settings.liveness_deadline())
        .await;

    let ingest = IngestLoop::new(feed, store, &settings, ingest_liveness);
    let context = Arc::new(AppContext {
        health: liveness,
        status: ingest.status(),
        metrics: config.metrics_enabled,
    });

    let cancel = cancel_on_shutdown_signal();
    let mut ingest_loop = tokio::spawn(ingest.run(cancel.clone()));
    let mut http_server = tokio::spawn(listen(app(context), config.bind(), cancel.clone()));

    tokio::select! {
        res = &mut ingest_loop => {
            if let Err(e) = res {
                error!("ingest loop failed with: {}", e)
            }
            cancel.cancel();
            if let Ok(Err(e)) = http_server.await {
                error!("server failed with: {}", e)
            }
        }
        res = &mut http_server => {
            error!("http server exited");
            if let Ok(Err(e)) = res {
                error!("server failed with: {}", e)
            }
            // Let an in-flight cycle finish
            cancel.cancel();
            if let Err(e) = ingest_loop.await {
                error!("ingest loop failed with: {}", e)
            }
        }
    }

    info!("exiting");
    Ok(())
}
