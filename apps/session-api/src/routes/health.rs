//! Health and migration endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use receipt_db::migrations::{migration_status as read_migration_status, sessions_table_exists};
use receipt_db::{Database, DbError};
use serde_json::json;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult, INTERNAL_ERROR};
use crate::AppState;

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

fn require_database(state: &AppState) -> ApiResult<&Database> {
    state
        .database
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Database is not configured".to_string()))
}

/// Liveness plus a database round trip.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let (status, healthy, database) = match &state.database {
        None => (StatusCode::OK, true, "memory"),
        Some(db) => {
            if db.health_check().await {
                (StatusCode::OK, true, "connected")
            } else {
                (StatusCode::SERVICE_UNAVAILABLE, false, "disconnected")
            }
        }
    };

    let body = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "database": database,
        "backend": state.sessions.backend(),
        "timestamp": timestamp(),
    });
    (status, Json(body)).into_response()
}

/// Reports whether the embedded migrations have been applied.
pub async fn migration_status(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let db = require_database(&state)?;

    let result = async {
        let table_exists = sessions_table_exists(db.pool()).await?;
        let status = read_migration_status(db.pool()).await?;
        Ok::<_, DbError>((table_exists, status))
    }
    .await;

    let response = match result {
        Ok((table_exists, status)) => {
            let completed = table_exists && status.is_up_to_date();
            let message = if completed {
                "Database migration has been completed"
            } else {
                "Database migration is pending. Use POST /api/migrate to run it"
            };
            Json(json!({
                "migration_status": if completed { "completed" } else { "pending" },
                "sessions_table_exists": table_exists,
                "applied": status.applied,
                "total": status.total,
                "message": message,
                "timestamp": timestamp(),
            }))
            .into_response()
        }
        Err(err) => {
            error!(error = %err, "Migration status check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "migration_status": "error",
                    "error": INTERNAL_ERROR,
                    "message": "Cannot check migration status",
                    "timestamp": timestamp(),
                })),
            )
                .into_response()
        }
    };
    Ok(response)
}

/// Applies the embedded migrations.
pub async fn run_migrations(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let db = require_database(&state)?;

    let response = match db.run_migrations().await {
        Ok(()) => {
            info!("Migrations applied on request");
            Json(json!({
                "success": true,
                "message": "Database migration completed successfully",
                "timestamp": timestamp(),
            }))
            .into_response()
        }
        Err(err) => {
            error!(error = %err, "Migration failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": INTERNAL_ERROR,
                    "timestamp": timestamp(),
                })),
            )
                .into_response()
        }
    };
    Ok(response)
}
