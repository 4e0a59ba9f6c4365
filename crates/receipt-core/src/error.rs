//! # Error Types
//!
//! Validation error types for receipt-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  receipt-core errors (this file)                                       │
//! │  └── ValidationError  - Schema / session id failures                   │
//! │        └── FieldIssue - One violated rule, with its path               │
//! │                                                                         │
//! │  receipt-db errors (separate crate)                                    │
//! │  └── DbError          - Store failures, corrupted rows                 │
//! │                                                                         │
//! │  session-api errors (in app)                                           │
//! │  └── ApiError         - What the Mini App sees ({ "error": ... })      │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → ApiError → HTTP response            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The recalculation engine has no error type: it never fails.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Field Issue
// =============================================================================

/// A single violated rule.
///
/// `path` follows the JSON structure of the payload: `"2.Qty"` is the
/// `Qty` key of the third row. Issues about the receipt as a whole have an
/// empty path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    /// Creates an issue for a path.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        FieldIssue {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an issue about the receipt as a whole.
    pub fn root(message: impl Into<String>) -> Self {
        FieldIssue::new(String::new(), message)
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Returned at the API boundary and by the session store before every
/// write. These are expected failures, surfaced to the client as 400s.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The receipt payload violates one or more schema rules.
    ///
    /// Displays as `path: message, path: message, ...`.
    #[error("{}", join_issues(.issues))]
    Schema { issues: Vec<FieldIssue> },

    /// The session id is not a canonical hyphenated UUID.
    #[error("Invalid session ID format")]
    InvalidSessionId { raw: String },
}

impl ValidationError {
    /// Returns the individual issues (empty for session id errors).
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            ValidationError::Schema { issues } => issues,
            ValidationError::InvalidSessionId { .. } => &[],
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display() {
        let issue = FieldIssue::new("0.Qty", "Quantity must be positive number");
        assert_eq!(issue.to_string(), "0.Qty: Quantity must be positive number");

        let root = FieldIssue::root("Receipt must contain at least one item");
        assert_eq!(root.to_string(), "Receipt must contain at least one item");
    }

    #[test]
    fn test_schema_error_joins_issues() {
        let err = ValidationError::Schema {
            issues: vec![
                FieldIssue::new("0.Qty", "Quantity must be positive number"),
                FieldIssue::new("1.Item", "Item name cannot be empty"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "0.Qty: Quantity must be positive number, 1.Item: Item name cannot be empty"
        );
        assert_eq!(err.issues().len(), 2);
    }

    #[test]
    fn test_session_id_error_message() {
        let err = ValidationError::InvalidSessionId {
            raw: "nope".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid session ID format");
        assert!(err.issues().is_empty());
    }
}
