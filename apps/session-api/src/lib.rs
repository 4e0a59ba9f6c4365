//! # Receipt Editor Session API
//!
//! HTTP surface of the receipt editor: the Mini App loads the bot's receipt
//! from here and posts the edited rows back.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Session API Routes                              │
//! │                                                                         │
//! │  ┌───────────────────────────────────────┐   ┌───────────────────────┐ │
//! │  │  /api/session   (rate limited)        │   │  /api/health          │ │
//! │  │                                       │   │  • GET  liveness + db │ │
//! │  │  • GET    ?session_id=  → {data}      │   │                       │ │
//! │  │  • POST   {session_id, data} → ready  │   │  /api/migrate         │ │
//! │  │  • DELETE ?session_id=  (idempotent)  │   │  • GET  status        │ │
//! │  └───────────────────────────────────────┘   │  • POST run           │ │
//! │                    │                         └───────────────────────┘ │
//! │                    ▼                                                    │
//! │        SessionService (receipt-db) ──► PostgreSQL | in-memory          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - HTTP port (default: 3000)
//! - `BIND_ADDR` - Interface to bind (default: 0.0.0.0)
//! - `DATABASE_URL` / `POSTGRES_URL` - PostgreSQL connection string (unset: in-memory store)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `RUN_MIGRATIONS` - Apply migrations on startup (default: true)
//! - `SESSION_CACHE_TTL_SECS` / `SESSION_CACHE_CAPACITY` - Read cache (default: 300 / 100)
//! - `RATE_LIMIT_WINDOW_SECS` / `RATE_LIMIT_MAX_REQUESTS` - Per-IP limit (default: 900 / 100)

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use receipt_db::{Database, MemorySessionStore, SessionService};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::rate_limit::RateLimiter;

/// Shared application state.
pub struct AppState {
    pub sessions: SessionService,
    /// `None` when running on the in-memory store.
    pub database: Option<Database>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(sessions: SessionService, database: Option<Database>, config: &ApiConfig) -> Self {
        AppState {
            sessions,
            database,
            rate_limiter: Arc::new(RateLimiter::new(
                config.rate_limit_window(),
                config.rate_limit_max_requests,
            )),
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(config: &ApiConfig) -> Self {
        let sessions =
            SessionService::with_cache(Arc::new(MemorySessionStore::new()), config.cache_config());
        AppState::new(sessions, None, config)
    }
}

/// Builds the application router with request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    routes::router(state).layer(TraceLayer::new_for_http())
}
