//! `/api/session` handlers.
//!
//! ```text
//! GET    ?session_id=<uuid>           200 {data} | 400 | 404 | 500
//! POST   {session_id, data}           200 {success: true} | 400 | 500
//! DELETE ?session_id=<uuid>           200 {success: true, deleted}
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use receipt_core::{validate, validate_session_id, Receipt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

const MISSING_SESSION_ID: &str = "Missing session_id parameter";
const MISSING_FIELDS: &str = "Missing required fields: session_id and data";
const NOT_FOUND: &str = "Session not found or expired";

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

impl SessionQuery {
    fn session_id(&self) -> ApiResult<Uuid> {
        let raw = self
            .session_id
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| ApiError::bad_request(MISSING_SESSION_ID))?;
        Ok(validate_session_id(raw)?)
    }
}

#[derive(Debug, Serialize)]
pub struct SessionData {
    pub data: Receipt,
}

/// Loads the receipt of a session.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<SessionData>> {
    let id = query.session_id()?;

    let session = state
        .sessions
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    debug!(session_id = %id, status = %session.status, items = session.data.len(), "Session fetched");
    Ok(Json(SessionData { data: session.data }))
}

/// Saves the edited receipt and marks the session `ready`.
///
/// The body is parsed by hand so every rejection keeps the `{error}` shape.
pub async fn save_session(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let body: Value =
        serde_json::from_slice(&body).map_err(|_| ApiError::bad_request("Invalid JSON body"))?;

    let session_id = body.get("session_id").filter(|v| is_truthy(v));
    let data = body.get("data").filter(|v| is_truthy(v));
    let (Some(session_id), Some(data)) = (session_id, data) else {
        return Err(ApiError::bad_request(MISSING_FIELDS));
    };

    let id = match session_id.as_str() {
        Some(raw) => validate_session_id(raw)?,
        None => return Err(ApiError::bad_request("Invalid session ID format")),
    };
    let receipt = validate(data).map_err(|err| ApiError::invalid_receipt(&err))?;

    state.sessions.upsert(id, &receipt).await?;
    Ok(Json(json!({ "success": true })))
}

/// Removes a session. Unknown ids succeed too.
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<Value>> {
    let id = query.session_id()?;
    let deleted = state.sessions.delete(id).await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

/// JavaScript truthiness, which decides whether a required field counts as sent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&falsy), "{falsy}");
        }
        for truthy in [json!(true), json!(1), json!("x"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{truthy}");
        }
    }

    #[test]
    fn test_query_session_id() {
        let missing = SessionQuery { session_id: None };
        assert_eq!(missing.session_id().unwrap_err().to_string(), MISSING_SESSION_ID);

        let empty = SessionQuery {
            session_id: Some(String::new()),
        };
        assert_eq!(empty.session_id().unwrap_err().to_string(), MISSING_SESSION_ID);

        let id = Uuid::new_v4();
        let query = SessionQuery {
            session_id: Some(id.to_string()),
        };
        assert_eq!(query.session_id().unwrap(), id);
    }
}
