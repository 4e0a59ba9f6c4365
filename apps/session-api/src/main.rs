//! # Receipt Editor Session API
//!
//! HTTP server behind the receipt-editing Mini App.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session API Server                                 │
//! │                                                                         │
//! │  Mini App ───► HTTP (3000) ───► SessionService ───► PostgreSQL         │
//! │                    │                   │                                │
//! │                    ▼                   ▼                                │
//! │               RateLimiter        SessionCache                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use receipt_db::{Database, DbConfig, MemorySessionStore, SessionService, SessionStore};
use receipt_session_api::config::ApiConfig;
use receipt_session_api::rate_limit::PRUNE_INTERVAL;
use receipt_session_api::{build_router, AppState};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting receipt session API...");

    // Load configuration
    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        bind = %config.bind_addr,
        database = config.database_url.is_some(),
        "Configuration loaded"
    );

    // Connect to database, or fall back to memory
    let database = match &config.database_url {
        Some(url) => {
            let db_config = DbConfig::new(url.clone())
                .max_connections(config.db_max_connections)
                .run_migrations(config.run_migrations);
            let db = Database::new(db_config).await?;
            info!("Connected to PostgreSQL");
            Some(db)
        }
        None => {
            warn!("DATABASE_URL not set, sessions are kept in memory and lost on restart");
            None
        }
    };

    let store: Arc<dyn SessionStore> = match &database {
        Some(db) => Arc::new(db.sessions()),
        None => Arc::new(MemorySessionStore::new()),
    };
    let sessions = SessionService::with_cache(store, config.cache_config());

    // Create shared state
    let state = Arc::new(AppState::new(sessions, database, &config));
    let pruner = state.rate_limiter.clone().spawn_pruner(PRUNE_INTERVAL);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, backend = state.sessions.backend(), "HTTP server listening");

    axum::serve(listener, build_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pruner.abort();
    if let Some(db) = &state.database {
        db.close().await;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(?e, "Failed to install Ctrl+C handler");
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
                error!(?e, "Failed to install signal handler");
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
