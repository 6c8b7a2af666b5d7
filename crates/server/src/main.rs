//! sqldepot server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use sqldepot_core::config::AppConfig;
use sqldepot_server::{AppState, SqliteCli, create_router};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// sqldepot - upload SQLite databases or build them from SQL scripts
#[derive(Parser, Debug)]
#[command(name = "sqldepotd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SQLDEPOT_CONFIG",
        default_value = "config/sqldepot.toml"
    )]
    config: String,
}

/// Load configuration from an optional TOML file and `SQLDEPOT_` variables.
///
/// Every setting has a default, so a missing file is not an error.
fn load_config(config_path: &Path) -> Result<AppConfig> {
    let mut figment = Figment::new();

    if config_path.exists() {
        tracing::info!(config_path = %config_path.display(), "Loading configuration from file");
        figment = figment.merge(Toml::file(config_path));
    } else {
        tracing::debug!(
            "No config file found at {}, using defaults",
            config_path.display()
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("SQLDEPOT_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("sqldepot v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(Path::new(&args.config))?;

    sqldepot_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    let storage = sqldepot_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(
        database_root = %config.storage.database_root.display(),
        sql_root = %config.storage.sql_root.display(),
        "Storage roots ready"
    );

    let converter = Arc::new(SqliteCli::from_config(&config.conversion));
    tracing::info!(
        program = %config.conversion.program,
        timeout_secs = config.conversion.timeout_secs,
        "Conversion tool configured"
    );

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    let state = AppState::new(config, storage, converter);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining in-flight uploads");
}
