//! # Repository Module
//!
//! Session store abstraction and its implementations.
//!
//! ## Store Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SessionStore                                       │
//! │                                                                         │
//! │  SessionService                                                        │
//! │       │                                                                 │
//! │       │  store.fetch(id)                                               │
//! │       ▼                                                                 │
//! │  dyn SessionStore                                                      │
//! │  ├── fetch(id)          → raw row (data not yet trusted)               │
//! │  ├── insert(id, data)   → new row, status 'pending'                    │
//! │  ├── upsert(id, data)   → insert or overwrite, status 'ready'          │
//! │  ├── update(id, data)   → overwrite existing, status 'ready'           │
//! │  └── delete(id)         → idempotent                                   │
//! │       │                                                                 │
//! │       ├──► SessionRepository   (PostgreSQL, production)                │
//! │       └──► MemorySessionStore  (HashMap, dev + tests)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stores do not validate. They hand back the `data` column as raw JSON and
//! [`crate::SessionService`] decides whether it can be trusted.

pub mod memory;
pub mod session;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use receipt_core::{Receipt, SessionStatus};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DbResult;

/// One row of the `sessions` table.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    /// The receipt as stored, not yet validated.
    pub data: Value,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence for editing sessions.
///
/// Writes take already validated receipts; validation lives in the service.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Short name of the backend, reported by the health endpoint.
    fn backend(&self) -> &'static str;

    /// Reads a session row.
    async fn fetch(&self, id: Uuid) -> DbResult<Option<SessionRecord>>;

    /// Creates a `pending` session. Fails with `AlreadyExists` on a taken id.
    async fn insert(&self, id: Uuid, data: &Receipt) -> DbResult<()>;

    /// Creates or overwrites a session, marking it `ready`.
    async fn upsert(&self, id: Uuid, data: &Receipt) -> DbResult<()>;

    /// Overwrites an existing session, marking it `ready`.
    /// Fails with `NotFound` when the id is unknown.
    async fn update(&self, id: Uuid, data: &Receipt) -> DbResult<()>;

    /// Removes a session. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> DbResult<bool>;
}
