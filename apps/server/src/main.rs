//! # RxPOS Server
//!
//! HTTP API for the pharmacy point of sale.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Load configuration (defaults → rxpos.toml → RXPOS_*)               │
//! │  2. Initialize tracing (RUST_LOG, else config log_level)               │
//! │  3. Open SQLite pool + run embedded migrations                         │
//! │  4. Serve until Ctrl+C / SIGTERM                                       │
//! │  5. Drain in-flight requests, close the pool                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use rxpos_db::Database;
use rxpos_server::{build_app, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("loading configuration")?;

    init_tracing(&config.log_level);

    info!("Starting RxPOS server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        addr = %config.bind_addr(),
        database = %config.database_path,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config())
        .await
        .with_context(|| format!("opening database {}", config.database_path))?;
    info!("Database ready");

    let addr = config.bind_addr();
    let app = build_app(AppState::new(db.clone(), config));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=rxpos_db=trace` - Show trace for the database crate only
/// - Default: the configured `log_level`, with sqlx kept at warn
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},sqlx=warn,tower_http=debug")));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
