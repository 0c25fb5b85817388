use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use countdown_core::config::CountdownConfig;
use countdown_timers::SqliteTimerStore;
use tracing::{info, warn};

mod app;
mod http;

/// HTTP server for countdown timers.
#[derive(Debug, Parser)]
#[command(name = "countdown-gateway", version, about)]
struct Cli {
    /// Path to countdown.toml (default: ~/.countdown/countdown.toml).
    #[arg(short, long, env = "COUNTDOWN_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "countdown_gateway=info,countdown_timers=info,tower_http=debug".into()
            }),
        )
        .init();

    // load config: --config / COUNTDOWN_CONFIG > ~/.countdown/countdown.toml
    let cli = Cli::parse();
    let config = CountdownConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        CountdownConfig::default()
    });
    info!(environment = %config.environment, "configuration loaded");

    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path)?;
    let store = Arc::new(SqliteTimerStore::open(&db_path)?);

    let addr: SocketAddr = config.listen_addr().parse()?;
    let state = Arc::new(app::AppState::new(config, Arc::clone(&store)));
    let router = app::build_router(state);

    info!("Countdown gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close()?;
    info!("Countdown gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) -> countdown_core::Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
