//! # Database Migrations
//!
//! Embedded SQL migrations for the sessions table.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Startup (RUN_MIGRATIONS=true) or POST /api/migrate                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table                                          │
//! │       │                                                                 │
//! │       ├── Table doesn't exist? Create it                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                │
//! │       │                                                                 │
//! │       └── 0001_create_sessions.sql                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record in _sqlx_migrations           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/postgres/` with the next sequence number
//! 2. Name format: `NNNN_description.sql`
//! 3. **NEVER** modify existing migrations - always add new ones

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::DbResult;

/// Embedded migrations from the `migrations/postgres` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/postgres");

/// Applied vs. embedded migration counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub total: usize,
    pub applied: usize,
}

impl MigrationStatus {
    /// Whether every embedded migration has been applied.
    pub fn is_up_to_date(&self) -> bool {
        self.applied >= self.total
    }
}

/// Runs all pending database migrations.
///
/// Each migration runs in its own transaction; re-running is a no-op.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns information about migrations.
///
/// A database that has never been migrated reports zero applied.
pub async fn migration_status(pool: &PgPool) -> DbResult<MigrationStatus> {
    let total = MIGRATOR.migrations.len();

    let applied = match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
    {
        Ok(count) => count.max(0) as usize,
        Err(err) => {
            warn!(error = %err, "Could not read _sqlx_migrations");
            0
        }
    };

    Ok(MigrationStatus { total, applied })
}

/// Checks whether the `sessions` table exists in the public schema.
pub async fn sessions_table_exists(pool: &PgPool) -> DbResult<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_name = 'sessions'
            AND table_schema = 'public'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_migration_is_embedded() {
        assert!(!MIGRATOR.migrations.is_empty());
        assert!(MIGRATOR
            .migrations
            .iter()
            .any(|m| m.sql.contains("CREATE TABLE IF NOT EXISTS sessions")));
    }

    #[test]
    fn test_status_up_to_date() {
        assert!(MigrationStatus { total: 1, applied: 1 }.is_up_to_date());
        assert!(!MigrationStatus { total: 1, applied: 0 }.is_up_to_date());
    }
}
