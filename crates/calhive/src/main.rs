mod app;
mod config;
mod context;
mod handlers;
mod identity;
mod services;
mod state;
mod storage;
mod stores;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use calhive_core::storage::Table;

use crate::{
    app::create_app,
    config::{Config, LogFormat},
    state::AppState,
};

/// calhive - Shared calendars over a single table
#[derive(Parser, Debug)]
#[command(name = "calhive")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format);

    let table = create_table(&config).await;
    let running_in_lambda = config.running_in_lambda;
    let app = create_app(AppState::new(table, config));

    if running_in_lambda {
        tracing::info!("Starting Lambda runtime");
        return lambda_http::run(app)
            .await
            .map_err(|err| anyhow::anyhow!(err));
    }

    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("listening on {}", listener.local_addr()?);

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "calhive=debug,tower_http=debug".into()),
    );

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_ansi(false))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[cfg(feature = "inmemory")]
async fn create_table(config: &Config) -> Arc<dyn Table> {
    tracing::warn!(
        ignored_table = %config.table_name,
        "Using in-memory storage, data is lost on restart"
    );
    Arc::new(storage::InMemoryTable::new())
}

#[cfg(feature = "dynamodb")]
async fn create_table(config: &Config) -> Arc<dyn Table> {
    let table = storage::DynamoDbTable::from_env(&config.table_name).await;
    tracing::info!(table = %table.table_name(), "Using DynamoDB storage");
    Arc::new(table)
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
