//! # Database Error Types
//!
//! Error types for session storage.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL Error (sqlx::Error)      ValidationError (receipt-core)     │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (session-api) ← 400 for validation, generic 500 otherwise    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use receipt_core::ValidationError;
use thiserror::Error;
use uuid::Uuid;

/// PostgreSQL SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Session storage errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Session id doesn't exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Insert with an id that is already taken.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: String, id: String },

    /// A stored row no longer passes validation.
    ///
    /// ## When This Occurs
    /// - Someone wrote to the table directly with a bad payload
    /// - Rules were tightened after the row was written
    #[error("Corrupted data for session {session_id}: {reason}")]
    CorruptedData { session_id: Uuid, reason: String },

    /// Data rejected before it reached the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Wrong `DATABASE_URL`
    /// - Server unreachable or refusing connections
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a session.
    pub fn session_not_found(id: Uuid) -> Self {
        DbError::NotFound {
            entity: "Session".to_string(),
            id: id.to_string(),
        }
    }

    /// Creates an AlreadyExists error for a session.
    pub fn session_exists(id: Uuid) -> Self {
        DbError::AlreadyExists {
            entity: "Session".to_string(),
            id: id.to_string(),
        }
    }

    /// Whether the caller sent bad data (as opposed to the store failing).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DbError::Validation(_) | DbError::NotFound { .. } | DbError::AlreadyExists { .. }
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound           → DbError::NotFound
/// sqlx::Error::Database (23505)      → DbError::AlreadyExists
/// sqlx::Error::Database (other)      → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut          → DbError::PoolExhausted
/// Other                              → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                    DbError::AlreadyExists {
                        entity: db_err.table().unwrap_or("Record").to_string(),
                        id: db_err.constraint().unwrap_or("unknown").to_string(),
                    }
                } else {
                    DbError::QueryFailed(db_err.message().to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
