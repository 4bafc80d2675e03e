//! leafling - plant-care tracking backend service

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use leafling::config::Config;
use leafling::services::{GeminiClient, PlantIdClient};
use leafling::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting leafling backend");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Database: {}", config.database_path.display());

    let db_pool = leafling::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    // Provider API keys are injected here; adapters never read the
    // environment themselves
    let identifier = Arc::new(PlantIdClient::new(config.plant_id_api_key.clone()));
    let tip_generator = Arc::new(GeminiClient::new(config.gemini_api_key.clone()));

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(db_pool, config, identifier, tip_generator);
    let app = leafling::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
