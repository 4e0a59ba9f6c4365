//! # Session Service
//!
//! The storage entry point used by the HTTP layer: validation, caching and
//! logging around a [`SessionStore`].
//!
//! ## Read Path
//! ```text
//! get(id)
//!   │
//!   ├─► SessionCache hit? ──yes──► return
//!   │
//!   ├─► store.fetch(id) ──None──► Ok(None)
//!   │
//!   ├─► validate(data) ──fail──► CorruptedData (logged, not cached)
//!   │
//!   └─► cache (unless a write landed during the fetch) + return Session
//! ```
//!
//! ## Write Path
//! Every write validates the receipt first, so a bad payload never reaches
//! the store, then drops the cached copy.
//!
//! ## Concurrency
//! There is no version check: two saves for the same session race and the
//! last one wins.

use std::sync::Arc;

use receipt_core::{validate, validate_receipt, Receipt, Session};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::{CacheConfig, SessionCache};
use crate::error::{DbError, DbResult};
use crate::repository::SessionStore;

const TABLE: &str = "sessions";

/// Validated, cached access to sessions.
///
/// ## Usage
/// ```rust,ignore
/// let service = SessionService::new(Arc::new(MemorySessionStore::new()));
///
/// service.create(id, &receipt).await?;
/// let session = service.get(id).await?;
/// ```
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    cache: SessionCache,
}

impl SessionService {
    /// Creates a service with the default cache (100 entries, 5 minutes).
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::with_cache(store, CacheConfig::default())
    }

    pub fn with_cache(store: Arc<dyn SessionStore>, cache: CacheConfig) -> Self {
        SessionService {
            store,
            cache: SessionCache::new(cache),
        }
    }

    /// Name of the underlying store ("postgres" or "memory").
    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Loads a session.
    ///
    /// ## Returns
    /// * `Ok(Some(session))` - found and valid
    /// * `Ok(None)` - no such session
    /// * `Err(DbError::CorruptedData)` - stored data fails validation
    pub async fn get(&self, id: Uuid) -> DbResult<Option<Session>> {
        if let Some(session) = self.cache.get(id).await {
            debug!(session_id = %id, "Session served from cache");
            return Ok(Some(session));
        }

        let generation = self.cache.generation().await;
        let record = match self.store.fetch(id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(err) => return Err(log_failure("read", id, err)),
        };

        let data = validate(&record.data).map_err(|err| {
            log_failure(
                "read",
                id,
                DbError::CorruptedData {
                    session_id: id,
                    reason: err.to_string(),
                },
            )
        })?;

        let session = Session {
            id: record.id,
            data,
            status: record.status,
        };
        self.cache.insert_if_current(session.clone(), generation).await;

        debug!(session_id = %id, status = %session.status, "Session loaded");
        Ok(Some(session))
    }

    /// Creates a `pending` session (the bot's side).
    pub async fn create(&self, id: Uuid, data: &Receipt) -> DbResult<()> {
        validate_receipt(data)?;

        self.store
            .insert(id, data)
            .await
            .map_err(|err| log_failure("create", id, err))?;

        info!(session_id = %id, items = data.len(), operation = "create", "Session created");
        Ok(())
    }

    /// Saves edited data, creating the session if needed, and marks it `ready`.
    pub async fn upsert(&self, id: Uuid, data: &Receipt) -> DbResult<()> {
        validate_receipt(data)?;

        let result = self.store.upsert(id, data).await;
        self.cache.invalidate(id).await;
        result.map_err(|err| log_failure("upsert", id, err))?;

        info!(session_id = %id, items = data.len(), operation = "upsert", "Session saved");
        Ok(())
    }

    /// Saves edited data for an existing session and marks it `ready`.
    pub async fn update(&self, id: Uuid, data: &Receipt) -> DbResult<()> {
        validate_receipt(data)?;

        let result = self.store.update(id, data).await;
        self.cache.invalidate(id).await;
        result.map_err(|err| log_failure("update", id, err))?;

        info!(session_id = %id, items = data.len(), operation = "update", "Session updated");
        Ok(())
    }

    /// Deletes a session. Deleting an unknown id is not an error.
    pub async fn delete(&self, id: Uuid) -> DbResult<bool> {
        let result = self.store.delete(id).await;
        self.cache.invalidate(id).await;
        let removed = result.map_err(|err| log_failure("delete", id, err))?;

        info!(session_id = %id, removed, operation = "delete", "Session deleted");
        Ok(removed)
    }

    /// Drops the cached copy of a session.
    pub async fn invalidate(&self, id: Uuid) {
        self.cache.invalidate(id).await;
    }
}

/// Logs a failed store operation and hands the error back.
fn log_failure(operation: &'static str, id: Uuid, err: DbError) -> DbError {
    if err.is_client_error() {
        warn!(operation, table = TABLE, session_id = %id, error = %err, "Session operation rejected");
    } else {
        error!(operation, table = TABLE, session_id = %id, error = %err, "Database operation failed");
    }
    err
}

// =============================================================================
// Unit Tests
// =============================================================================
