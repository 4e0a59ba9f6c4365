//! HTTP route table.

pub mod health;
pub mod session;

use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::rate_limit::rate_limit;
use crate::AppState;

/// Routes without the tracing layer.
pub fn router(state: Arc<AppState>) -> Router {
    let sessions = Router::new()
        .route(
            "/api/session",
            get(session::get_session)
                .post(session::save_session)
                .delete(session::delete_session),
        )
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit,
        ));

    Router::new()
        .merge(sessions)
        .route("/api/health", get(health::health))
        .route(
            "/api/migrate",
            get(health::migration_status).post(health::run_migrations),
        )
        .with_state(state)
}
