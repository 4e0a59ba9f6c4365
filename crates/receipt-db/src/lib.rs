//! # receipt-db: Session Storage for the Receipt Editor
//!
//! This crate persists editing sessions: the bot's receipt goes in as
//! `pending`, the user's edited receipt comes back as `ready`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Receipt Editor Data Flow                           │
//! │                                                                         │
//! │  HTTP handler (GET / POST /api/session)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    receipt-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │SessionService │    │ SessionStore  │    │  Migrations  │  │   │
//! │  │   │ (service.rs)  │    │  (trait)      │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ validate      │───►│ Postgres repo │    │ 0001_create_ │  │   │
//! │  │   │ SessionCache  │    │ Memory store  │    │   sessions   │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            PostgreSQL: sessions (id, data JSONB, status)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - `SessionStore` trait, Postgres and in-memory stores
//! - [`cache`] - TTL + LRU cache of validated sessions
//! - [`service`] - `SessionService`, the entry point for the HTTP layer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use receipt_db::{Database, DbConfig, SessionService};
//!
//! let db = Database::new(DbConfig::new(database_url)).await?;
//! let service = SessionService::new(Arc::new(db.sessions()));
//!
//! let session = service.get(session_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{CacheConfig, SessionCache};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::SessionService;

// Repository re-exports for convenience
pub use repository::memory::MemorySessionStore;
pub use repository::session::SessionRepository;
pub use repository::{SessionRecord, SessionStore};
