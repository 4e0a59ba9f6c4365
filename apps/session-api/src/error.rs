//! Error types for the Session API.
//!
//! Every failure leaves the server as `{"error": "..."}`, plus `retryAfter`
//! when the client is rate limited. Storage failures are logged here and
//! reach the client only as "Internal server error".

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use receipt_core::ValidationError;
use receipt_db::DbError;
use serde_json::json;
use tracing::error;

/// Message returned for every server-side failure.
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Session API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimited { retry_after: u64 },

    /// Detail is logged, never sent.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    /// The 400 for a receipt that failed schema validation.
    pub fn invalid_receipt(err: &ValidationError) -> Self {
        ApiError::BadRequest(format!("Invalid receipt data: {err}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidSessionId { .. } => ApiError::BadRequest(err.to_string()),
            ValidationError::Schema { .. } => ApiError::invalid_receipt(&err),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(inner) => inner.into(),
            DbError::NotFound { .. } => ApiError::NotFound("Session not found or expired".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => {
                (status, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::RateLimited { retry_after } => {
                let mut response = (
                    status,
                    Json(json!({ "error": "Too many requests", "retryAfter": retry_after })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                response
            }
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (status, Json(json!({ "error": INTERNAL_ERROR }))).into_response()
            }
            ApiError::Unavailable(msg) => (status, Json(json!({ "error": msg }))).into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
