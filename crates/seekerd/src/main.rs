use anyhow::{Context, Result};
use seeker_core::OnnxFaceEncoder;
use seeker_store::{schema, Uploads};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod engine;
mod error;
mod forms;
mod routes;
mod views;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "seekerd starting");

    let config = config::Config::load()?;
    tracing::info!(
        bind = %config.bind,
        db = %config.db_path.display(),
        uploads = %config.upload_dir.display(),
        models = %config.model_dir.display(),
        metric = ?config.verify_metric,
        "configuration loaded"
    );

    // Models are loaded up front so a missing file stops startup.
    let encoder = OnnxFaceEncoder::from_model_dir(&config.model_dir)
        .with_context(|| format!("loading face models from {}", config.model_dir.display()))?;
    let engine = engine::spawn_engine(encoder, config.verifier())?;

    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory {}", parent.display()))?;
    }
    let db = tokio_rusqlite::Connection::open(&config.db_path)
        .await
        .with_context(|| format!("opening database {}", config.db_path.display()))?;
    db.call(|conn| Ok(schema::init(conn)?)).await?;

    let uploads = Uploads::new(&config.upload_dir)?;
    let bind = config.bind;
    let state = routes::AppState {
        config: Arc::new(config),
        db,
        uploads,
        engine,
    };

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(addr = %bind, "seekerd ready");

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("seekerd shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}
