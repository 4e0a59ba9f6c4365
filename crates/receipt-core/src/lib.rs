//! # receipt-core: Pure Business Logic for the Receipt Editor
//!
//! This crate holds everything about a receipt that does not touch I/O:
//! the line item type and its wire mapping, the rounding rule, the row
//! recalculation engine, row mutations and validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Receipt Editor Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Mini App (TypeScript, in Telegram)              │   │
//! │  │        Load ──► Edit cells ──► Add/Move/Delete rows ──► Save     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP /api/session                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    session-api (axum)                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ receipt-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────┐ │   │
//! │  │   │  types  │  │  money  │  │ recalc  │  │ receipt │  │valid.│ │   │
//! │  │   │LineItem │  │ round2  │  │ per-    │  │ add/del │  │schema│ │   │
//! │  │   │FieldName│  │         │  │ field   │  │ move    │  │ uuid │ │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └─────────┘  └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              receipt-db (sessions table + read cache)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `LineItem`, `FieldName`, `Session`, `SessionStatus`
//! - [`money`] - `round2` and input coercion
//! - [`recalc`] - Row recalculation engine
//! - [`receipt`] - `Receipt` and its row operations
//! - [`validation`] - Schema validation and session id checks
//! - [`error`] - Validation error types
//!
//! ## Example Usage
//!
//! ```rust
//! use receipt_core::recalc::recalculate_row;
//! use receipt_core::types::{LineItem, RecalcField};
//!
//! let mut row = LineItem::blank(1);
//! row.price = 100.0;
//! row.net = 100.0;
//! row.total = 100.0;
//!
//! let updated = recalculate_row(&row, RecalcField::Quantity, 3.0);
//! assert_eq!(updated.net, 300.0);
//! assert_eq!(updated.total, 300.0);
//! ```

pub mod error;
pub mod money;
pub mod recalc;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{FieldIssue, ValidationError};
pub use money::round2;
pub use recalc::{apply_edit, recalculate_row, FieldEdit};
pub use receipt::{Receipt, ReceiptSummary, Selection, SortDirection};
pub use types::*;
pub use validation::{
    try_validate, validate, validate_receipt, validate_session_id, ValidationOutcome,
};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of rows a receipt may hold.
///
/// ## Business Reason
/// Real receipts top out at a few hundred lines; anything above this is a
/// broken OCR payload or abuse of the save endpoint.
pub const MAX_RECEIPT_ITEMS: usize = 1000;

/// Maximum length of the unit label (`Unit`).
pub const MAX_UNIT_LEN: usize = 20;

/// Maximum length of the article code (`Art`).
pub const MAX_ARTICLE_CODE_LEN: usize = 50;

/// Maximum length of the item name (`Item`).
pub const MAX_ITEM_NAME_LEN: usize = 200;

/// Tolerance used when checking that stored amounts agree with each other.
pub const AMOUNT_TOLERANCE: f64 = 0.01;
