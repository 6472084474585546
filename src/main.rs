use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use video_review::config::Config;
use video_review::session::SessionStore;
use video_review::{AppState, build_router};


#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data directory {}", config.data_dir.display()))?;
    info!("Data directory: {}", config.data_dir.display());

    let state = AppState::new(SessionStore::new(&config.data_dir))
        .with_rows(config.rows)
        .with_seed(config.seed);

    let static_dir = config.static_dir.is_dir().then_some(config.static_dir.as_path());
    if static_dir.is_none() {
        info!("Static directory {} not found, serving API only", config.static_dir.display());
    }
    let app = build_router(state, static_dir);

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Video review API listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
