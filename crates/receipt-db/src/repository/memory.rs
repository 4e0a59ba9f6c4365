//! # In-Memory Session Store
//!
//! A [`SessionStore`] backed by a `HashMap`, used by tests and by the server
//! when no database URL is configured. Contents are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use receipt_core::{Receipt, SessionStatus};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{SessionRecord, SessionStore};
use crate::error::{DbError, DbResult};

/// Session store that keeps rows in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    rows: RwLock<HashMap<Uuid, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a row verbatim, bypassing the typed write path.
    ///
    /// Seeds fixtures, including payloads that would fail validation.
    pub async fn insert_raw(&self, id: Uuid, data: Value, status: SessionStatus) {
        let now = Utc::now();
        self.rows.write().await.insert(
            id,
            SessionRecord {
                id,
                data,
                status,
                created_at: now,
                updated_at: now,
            },
        );
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

fn to_json(data: &Receipt) -> DbResult<Value> {
    serde_json::to_value(data).map_err(|e| DbError::Internal(e.to_string()))
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn fetch(&self, id: Uuid) -> DbResult<Option<SessionRecord>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn insert(&self, id: Uuid, data: &Receipt) -> DbResult<()> {
        let data = to_json(data)?;
        let mut rows = self.rows.write().await;
        if rows.contains_key(&id) {
            return Err(DbError::session_exists(id));
        }

        let now = Utc::now();
        rows.insert(
            id,
            SessionRecord {
                id,
                data,
                status: SessionStatus::Pending,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn upsert(&self, id: Uuid, data: &Receipt) -> DbResult<()> {
        let data = to_json(data)?;
        let now = Utc::now();
        let mut rows = self.rows.write().await;

        rows.entry(id)
            .and_modify(|row| {
                row.data = data.clone();
                row.status = SessionStatus::Ready;
                row.updated_at = now;
            })
            .or_insert_with(|| SessionRecord {
                id,
                data: data.clone(),
                status: SessionStatus::Ready,
                created_at: now,
                updated_at: now,
            });
        Ok(())
    }

    async fn update(&self, id: Uuid, data: &Receipt) -> DbResult<()> {
        let data = to_json(data)?;
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| DbError::session_not_found(id))?;

        row.data = data;
        row.status = SessionStatus::Ready;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
