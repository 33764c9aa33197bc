use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cinepick_api::{
    config::Config,
    db::{Database, PgStore},
    routes::{create_router, AppState},
    services::{
        catalog::tmdb::TmdbClient, EnrichmentPipeline, IdentityService, PreferenceWriter,
        SessionRecorder,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinepick_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let database = Arc::new(Database::new(config.database_url.clone()));
    if let Err(e) = database.ensure_connected().await {
        tracing::warn!(error = %e, "Database unavailable at startup, will retry on first use");
    }
    let store = Arc::new(PgStore::new(database));

    let catalog = Arc::new(TmdbClient::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    ));

    let (preferences, writer_handle) = PreferenceWriter::spawn(store.clone());

    let state = Arc::new(AppState {
        identity: IdentityService::new(store.clone(), &config.jwt_secret, config.token_ttl_days),
        pipeline: EnrichmentPipeline::new(catalog, config.tmdb_image_url.clone()),
        recorder: SessionRecorder::new(store, preferences),
    });

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    writer_handle.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
