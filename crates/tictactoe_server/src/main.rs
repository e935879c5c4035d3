//! Tic-tac-toe server binary.

use anyhow::{Context, Result};
use clap::Parser;
use tictactoe_engine::{GameSessionService, MinimaxEngine};
use tictactoe_server::cli::{Cli, Command};
use tictactoe_server::{AppState, ServerConfig, SqliteSessionRepository, router, run_migrations};
use tokio::net::TcpListener;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            database_url,
        } => {
            let base = match config {
                Some(path) => ServerConfig::from_file(&path)?,
                None => ServerConfig::default(),
            };
            let config = base.with_env()?.with_overrides(host, port, database_url);
            init_tracing(&config);
            run_server(config).await
        }
        Command::Migrate { database_url } => {
            let config = ServerConfig::default()
                .with_env()?
                .with_overrides(None, None, database_url);
            init_tracing(&config);
            run_migrations(config.database_url())?;
            Ok(())
        }
    }
}

/// Installs the global subscriber; `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &ServerConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(config.log_filter()))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Run the HTTP game server
#[instrument(skip(config), fields(addr = %config.bind_addr()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    info!("Starting tic-tac-toe server");

    run_migrations(config.database_url())?;
    let repository = SqliteSessionRepository::new(config.database_url().clone())?;
    let service = GameSessionService::new(repository, MinimaxEngine::new());
    let app = router(AppState::new(service));

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    info!(addr = %config.bind_addr(), "Server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Completes on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server...");
}
