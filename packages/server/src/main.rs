use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{Level, info};

use stashbot::config::AppConfig;
use stashbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config)
        .await
        .context("Failed to initialize storage")?;
    let app = stashbot::build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
