use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use foodgram_core::{MediaStore, RecipeLimits};
use foodgram_db::{Database, DatabaseConfig};
use foodgram_server::config::ServerConfig;
use foodgram_server::routes;
use foodgram_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("foodgram=info".parse()?))
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    let limits = RecipeLimits::from_env()?;
    let addr = format!("0.0.0.0:{}", config.port);

    let db = Database::connect(&DatabaseConfig::from_env()?).await?;
    db.migrate().await?;

    tokio::fs::create_dir_all(&config.media_root).await?;

    let state = Arc::new(AppState {
        db,
        media: MediaStore::new(config.media_root.clone(), config.media_url.clone()),
        limits,
        max_body_bytes: config.max_body_bytes,
    });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");
}
