//! HTTP-level tests for the session API.
//!
//! The router runs on the in-memory store, driven through
//! `tower::ServiceExt::oneshot` without binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use receipt_core::{LineItem, Receipt, SessionStatus};
use receipt_session_api::config::ApiConfig;
use receipt_session_api::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

// ── Test helpers ───────────────────────────────────────────────

fn test_state(max_requests: u32) -> Arc<AppState> {
    let config = ApiConfig {
        rate_limit_max_requests: max_requests,
        ..ApiConfig::default()
    };
    Arc::new(AppState::in_memory(&config))
}

fn bot_receipt() -> Receipt {
    Receipt::from(vec![
        LineItem {
            quantity: 2.0,
            price: 100.0,
            name: "Coffee beans".to_string(),
            net: 200.0,
            vat: 40.0,
            total: 240.0,
            ..LineItem::blank(1)
        },
        LineItem {
            price: 55.5,
            name: "Milk".to_string(),
            net: 55.5,
            total: 55.5,
            ..LineItem::blank(2)
        },
    ])
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(body: &Value) -> Request<Body> {
    post_raw(body.to_string())
}

fn post_raw(body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/session")
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

// ── Session flow ───────────────────────────────────────────────

#[tokio::test]
async fn test_bot_edit_save_round_trip() {
    let state = test_state(100);
    let app = build_router(state.clone());
    let id = Uuid::new_v4();

    // The bot side creates the pending session
    state.sessions.create(id, &bot_receipt()).await.unwrap();

    let (status, body) = send(&app, get(&format!("/api/session?session_id={id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["Item"], "Coffee beans");
    assert_eq!(body["data"][1]["Price"], 55.5);

    // The editor changes quantity then VAT and posts the rows back
    let mut edited: Receipt = serde_json::from_value(body["data"].clone()).unwrap();
    edited.edit(0, receipt_core::FieldName::Quantity, 3.0.into());
    edited.edit(0, receipt_core::FieldName::Vat, 60.0.into());

    let (status, body) = send(&app, post_json(&json!({ "session_id": id, "data": edited }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let session = state.sessions.get(id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Ready);

    let (status, body) = send(&app, get(&format!("/api/session?session_id={id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["Net"], 280.0);
    assert_eq!(body["data"][0]["VAT"], 60.0);
    assert_eq!(body["data"][0]["Total"], 340.0);
    assert_eq!(body["data"][0]["Price"], 93.33);
}

#[tokio::test]
async fn test_add_row_then_save_renumbers() {
    let app = build_router(test_state(100));
    let id = Uuid::new_v4();
    let uri = format!("/api/session?session_id={id}");

    let (status, _) = send(&app, post_json(&json!({ "session_id": id, "data": bot_receipt() }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::to_value(bot_receipt()).unwrap());

    let mut edited: Receipt = serde_json::from_value(body["data"].clone()).unwrap();
    assert!(edited.push_blank());

    let (status, _) = send(&app, post_json(&json!({ "session_id": id, "data": edited }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    let numbers: Vec<u64> = rows.iter().map(|row| row["#"].as_u64().unwrap()).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(rows[0]["Item"], "Coffee beans");
    assert_eq!(rows[2]["Item"], "New Item");
}

#[tokio::test]
async fn test_post_creates_unknown_session() {
    let state = test_state(100);
    let app = build_router(state.clone());
    let id = Uuid::new_v4();

    let (status, _) = send(&app, post_json(&json!({ "session_id": id, "data": bot_receipt() }))).await;
    assert_eq!(status, StatusCode::OK);

    let session = state.sessions.get(id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Ready);
    assert_eq!(session.data, bot_receipt());
}

// ── GET errors ─────────────────────────────────────────────────

#[tokio::test]
async fn test_get_errors() {
    let app = build_router(test_state(100));

    let (status, body) = send(&app, get("/api/session")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing session_id parameter" }));

    let (status, body) = send(&app, get("/api/session?session_id=not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid session ID format" }));

    let (status, body) = send(&app, get(&format!("/api/session?session_id={}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Session not found or expired" }));
}

#[tokio::test]
async fn test_corrupted_session_is_internal_error() {
    let store = Arc::new(receipt_db::MemorySessionStore::new());
    let sessions = receipt_db::SessionService::new(store.clone());
    let state = Arc::new(AppState::new(sessions, None, &ApiConfig::default()));
    let app = build_router(state);

    let id = Uuid::new_v4();
    store
        .insert_raw(id, json!([{ "#": 1, "Qty": "two" }]), SessionStatus::Pending)
        .await;

    let (status, body) = send(&app, get(&format!("/api/session?session_id={id}"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // No internal detail leaks to the client
    assert_eq!(body, json!({ "error": "Internal server error" }));
}

// ── POST errors ────────────────────────────────────────────────

#[tokio::test]
async fn test_post_errors() {
    let app = build_router(test_state(100));
    let id = Uuid::new_v4();

    let (status, body) = send(&app, post_raw("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid JSON body" }));

    for missing in [
        json!({ "data": bot_receipt() }),
        json!({ "session_id": id }),
        json!({ "session_id": "", "data": bot_receipt() }),
        json!({ "session_id": id, "data": null }),
        json!([]),
    ] {
        let (status, body) = send(&app, post_json(&missing)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{missing}");
        assert_eq!(
            body,
            json!({ "error": "Missing required fields: session_id and data" })
        );
    }

    let (status, body) = send(&app, post_json(&json!({ "session_id": "abc", "data": bot_receipt() }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid session ID format" }));

    let (status, body) = send(&app, post_json(&json!({ "session_id": id, "data": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "Invalid receipt data: Receipt must contain at least one item" })
    );
}

#[tokio::test]
async fn test_post_reports_field_issues() {
    let state = test_state(100);
    let app = build_router(state.clone());
    let id = Uuid::new_v4();

    let mut rows = serde_json::to_value(bot_receipt()).unwrap();
    rows[0]["Qty"] = json!(0);
    rows[1]["Unit"] = json!("");

    let (status, body) = send(&app, post_json(&json!({ "session_id": id, "data": rows }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid receipt data: 0.Qty: Quantity must be positive number, 1.Unit: Unit cannot be empty"
    );

    // Nothing was written
    assert!(state.sessions.get(id).await.unwrap().is_none());
}

// ── DELETE ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_is_idempotent() {
    let state = test_state(100);
    let app = build_router(state.clone());
    let id = Uuid::new_v4();
    state.sessions.create(id, &bot_receipt()).await.unwrap();

    let delete = || {
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/session?session_id={id}"))
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "deleted": true }));

    let (status, body) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "deleted": false }));

    let (status, _) = send(&app, get(&format!("/api/session?session_id={id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Rate limiting ──────────────────────────────────────────────

#[tokio::test]
async fn test_rate_limit_per_client() {
    let app = build_router(test_state(2));
    let id = Uuid::new_v4();

    let from = |ip: &str| {
        Request::builder()
            .uri(format!("/api/session?session_id={id}"))
            .header("x-forwarded-for", format!("{ip}, 10.0.0.1"))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(from("203.0.113.7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-ratelimit-limit"], "2");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "1");
    assert!(response.headers().contains_key("x-ratelimit-reset"));

    let response = app.clone().oneshot(from("203.0.113.7")).await.unwrap();
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");

    let response = app.clone().oneshot(from("203.0.113.7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "900");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "Too many requests", "retryAfter": 900 }));

    // A different client still gets through
    let response = app.clone().oneshot(from("198.51.100.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_is_not_rate_limited() {
    let app = build_router(test_state(1));

    for _ in 0..3 {
        let response = app.clone().oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key("x-ratelimit-limit"));
    }
}

// ── Health and migrations ──────────────────────────────────────

#[tokio::test]
async fn test_health_on_memory_store() {
    let app = build_router(test_state(100));

    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "memory");
    assert_eq!(body["backend"], "memory");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_migrate_without_database() {
    let app = build_router(test_state(100));

    let (status, body) = send(&app, get("/api/migrate")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/migrate")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
