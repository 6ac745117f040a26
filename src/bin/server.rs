//! The murmur server binary.

use murmur::{AppConfig, JournalServer};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var_os("MURMUR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::default_config_path);

    let config = if config_path.exists() {
        tracing::info!(path = %config_path.display(), "loading config");
        AppConfig::from_file(&config_path)?
    } else {
        tracing::info!("no config file found, using defaults");
        AppConfig::default()
    };

    let server = JournalServer::start(&config).await.map_err(|e| {
        tracing::error!(error = %e, "murmur failed to start");
        anyhow::anyhow!("startup failed: {e}")
    })?;

    tracing::info!("murmur ready on http://{}", server.addr());

    tokio::signal::ctrl_c().await?;
    tracing::info!("murmur shutting down");
    server.shutdown();
    Ok(())
}
