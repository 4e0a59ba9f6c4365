//! # Session Repository
//!
//! PostgreSQL implementation of [`SessionStore`].
//!
//! ## Table
//! ```text
//! sessions
//! ├── id          UUID PRIMARY KEY
//! ├── data        JSONB NOT NULL          ← receipt rows, wire format
//! ├── status      TEXT  'pending'|'ready'
//! ├── created_at  TIMESTAMPTZ
//! └── updated_at  TIMESTAMPTZ             ← maintained by trigger
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use receipt_core::{Receipt, SessionStatus};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{SessionRecord, SessionStore};
use crate::error::{DbError, DbResult};

/// Repository for session database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = SessionRepository::new(pool);
///
/// repo.insert(id, &receipt).await?;
/// let row = repo.fetch(id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

/// Raw row as read from PostgreSQL.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    data: Json<serde_json::Value>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_record(self) -> DbResult<SessionRecord> {
        let status =
            SessionStatus::from_str(&self.status).map_err(|err| DbError::CorruptedData {
                session_id: self.id,
                reason: err.to_string(),
            })?;

        Ok(SessionRecord {
            id: self.id,
            data: self.data.0,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: PgPool) -> Self {
        SessionRepository { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn fetch(&self, id: Uuid) -> DbResult<Option<SessionRecord>> {
        debug!(session_id = %id, "Fetching session");

        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, data, status, created_at, updated_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRow::into_record).transpose()
    }

    async fn insert(&self, id: Uuid, data: &Receipt) -> DbResult<()> {
        debug!(session_id = %id, items = data.len(), "Inserting session");

        let result = sqlx::query(
            r#"
            INSERT INTO sessions (id, data, status)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(Json(data))
        .bind(SessionStatus::Pending.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => match DbError::from(err) {
                DbError::AlreadyExists { .. } => Err(DbError::session_exists(id)),
                other => Err(other),
            },
        }
    }

    async fn upsert(&self, id: Uuid, data: &Receipt) -> DbResult<()> {
        debug!(session_id = %id, items = data.len(), "Upserting session");

        sqlx::query(
            r#"
            INSERT INTO sessions (id, data, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                data = EXCLUDED.data,
                status = EXCLUDED.status
            "#,
        )
        .bind(id)
        .bind(Json(data))
        .bind(SessionStatus::Ready.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, id: Uuid, data: &Receipt) -> DbResult<()> {
        debug!(session_id = %id, items = data.len(), "Updating session");

        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET data = $2, status = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(data))
        .bind(SessionStatus::Ready.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::session_not_found(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        debug!(session_id = %id, "Deleting session");

        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
