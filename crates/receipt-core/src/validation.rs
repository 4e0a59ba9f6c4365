//! # Validation Module
//!
//! Schema checks applied at the API boundary and by the session store.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Where Validation Happens                           │
//! │                                                                         │
//! │  POST /api/session                                                      │
//! │    │                                                                    │
//! │    ├─► validate_session_id   "Invalid session ID format"                │
//! │    ├─► validate(&Value)      JSON shape + field rules → Receipt         │
//! │    │                                                                    │
//! │  SessionService                                                         │
//! │    ├─► validate_receipt      before every write                        │
//! │    └─► validate_receipt      after every read (corruption check)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! ```text
//! ┌───────┬──────────────────────┬───────────────────────────────────────┐
//! │ key   │ rule                 │ message                               │
//! ├───────┼──────────────────────┼───────────────────────────────────────┤
//! │ #     │ integer, > 0         │ Item number must be positive integer  │
//! │ Qty   │ > 0                  │ Quantity must be positive number      │
//! │ Unit  │ 1..=20 chars         │ Unit cannot be empty / Unit too long  │
//! │ Price │ >= 0                 │ Price must be non-negative            │
//! │ Art   │ <= 50 chars          │ Article number too long               │
//! │ Item  │ 1..=200 chars        │ Item name cannot be empty / too long  │
//! │ Net   │ >= 0                 │ Net amount must be non-negative       │
//! │ VAT   │ >= 0                 │ VAT must be non-negative              │
//! │ Total │ >= 0                 │ Total must be non-negative            │
//! └───────┴──────────────────────┴───────────────────────────────────────┘
//!   receipt: 1..=1000 rows
//! ```
//!
//! Every violated rule is reported, not just the first one. Issues for a
//! row come in column order. Unknown keys are dropped.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{FieldIssue, ValidationError, ValidationResult};
use crate::receipt::Receipt;
use crate::types::{FieldName, LineItem};
use crate::{MAX_ARTICLE_CODE_LEN, MAX_ITEM_NAME_LEN, MAX_RECEIPT_ITEMS, MAX_UNIT_LEN};

// =============================================================================
// Entry Points
// =============================================================================

/// Validates untyped JSON and converts it into a [`Receipt`].
///
/// ## Example
/// ```rust
/// use receipt_core::validation::validate;
/// use serde_json::json;
///
/// let err = validate(&json!([])).unwrap_err();
/// assert_eq!(err.to_string(), "Receipt must contain at least one item");
///
/// let err = validate(&json!([{
///     "#": 1, "Qty": 0, "Unit": "pcs", "Price": 1, "Art": "",
///     "Item": "Bread", "Net": 0, "VAT": 0, "Total": 0
/// }]))
/// .unwrap_err();
/// assert_eq!(err.to_string(), "0.Qty: Quantity must be positive number");
/// ```
pub fn validate(value: &Value) -> ValidationResult<Receipt> {
    let rows = match value {
        Value::Array(rows) => rows,
        other => {
            return Err(schema_error(vec![FieldIssue::root(format!(
                "Expected array, received {}",
                json_type(other)
            ))]))
        }
    };

    let mut issues = receipt_length_issues(rows.len());
    let mut items = Vec::with_capacity(rows.len());

    for (position, row) in rows.iter().enumerate() {
        match row {
            Value::Object(object) => {
                if let Some(item) = parse_item(position, object, &mut issues) {
                    items.push(item);
                }
            }
            other => issues.push(FieldIssue::new(
                position.to_string(),
                format!("Expected object, received {}", json_type(other)),
            )),
        }
    }

    if issues.is_empty() {
        Ok(Receipt::new(items))
    } else {
        Err(schema_error(issues))
    }
}

/// Checks an already typed receipt against the same rules as [`validate`].
pub fn validate_receipt(receipt: &Receipt) -> ValidationResult<()> {
    let mut issues = receipt_length_issues(receipt.len());

    for (position, item) in receipt.items().iter().enumerate() {
        for field in FieldName::ALL {
            let cell = Cell::of(item, field);
            check_cell(position, field, cell, &mut issues);
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(schema_error(issues))
    }
}

/// Parses a session id, accepting only the hyphenated 8-4-4-4-12 form.
///
/// ## Example
/// ```rust
/// use receipt_core::validation::validate_session_id;
///
/// assert!(validate_session_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_session_id("550e8400e29b41d4a716446655440000").is_err());
/// assert!(validate_session_id("not-a-uuid").is_err());
/// ```
pub fn validate_session_id(raw: &str) -> ValidationResult<Uuid> {
    let invalid = || ValidationError::InvalidSessionId {
        raw: raw.to_string(),
    };

    // Uuid::parse_str also takes simple, braced and urn forms
    if raw.len() != 36 {
        return Err(invalid());
    }
    Uuid::parse_str(raw).map_err(|_| invalid())
}

// =============================================================================
// Outcome
// =============================================================================

/// Non-failing form of [`validate`], for callers that report rather than
/// propagate.
///
/// Serializes as `{"ok": true, "data": [...]}` or
/// `{"ok": false, "error": "path: message, ..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(Receipt),
    Invalid(ValidationError),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    pub fn into_result(self) -> ValidationResult<Receipt> {
        match self {
            ValidationOutcome::Valid(receipt) => Ok(receipt),
            ValidationOutcome::Invalid(err) => Err(err),
        }
    }
}

impl Serialize for ValidationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationOutcome", 2)?;
        match self {
            ValidationOutcome::Valid(receipt) => {
                state.serialize_field("ok", &true)?;
                state.serialize_field("data", receipt)?;
            }
            ValidationOutcome::Invalid(err) => {
                state.serialize_field("ok", &false)?;
                state.serialize_field("error", &err.to_string())?;
            }
        }
        state.end()
    }
}

/// Runs [`validate`] and captures the result.
pub fn try_validate(value: &Value) -> ValidationOutcome {
    match validate(value) {
        Ok(receipt) => ValidationOutcome::Valid(receipt),
        Err(err) => ValidationOutcome::Invalid(err),
    }
}

// =============================================================================
// Rules
// =============================================================================

/// A cell value, borrowed from a typed row or read from JSON.
#[derive(Debug, Clone, Copy)]
enum Cell<'a> {
    Number(f64),
    Text(&'a str),
}

impl<'a> Cell<'a> {
    fn of(item: &'a LineItem, field: FieldName) -> Self {
        match field {
            FieldName::Index => Cell::Number(f64::from(item.index)),
            FieldName::Quantity => Cell::Number(item.quantity),
            FieldName::Unit => Cell::Text(&item.unit),
            FieldName::Price => Cell::Number(item.price),
            FieldName::ArticleCode => Cell::Text(&item.article_code),
            FieldName::Name => Cell::Text(&item.name),
            FieldName::Net => Cell::Number(item.net),
            FieldName::Vat => Cell::Number(item.vat),
            FieldName::Total => Cell::Number(item.total),
        }
    }
}

fn check_cell(position: usize, field: FieldName, cell: Cell<'_>, issues: &mut Vec<FieldIssue>) {
    let path = || format!("{position}.{}", field.wire_name());

    match cell {
        Cell::Number(value) => {
            for message in number_rule_violations(field, value) {
                issues.push(FieldIssue::new(path(), message));
            }
        }
        Cell::Text(text) => {
            if let Some(message) = text_rule_violation(field, text) {
                issues.push(FieldIssue::new(path(), message));
            }
        }
    }
}

fn number_rule_violations(field: FieldName, value: f64) -> Vec<&'static str> {
    let mut violations = Vec::new();

    match field {
        FieldName::Index => {
            if value.fract() != 0.0 || !value.is_finite() {
                violations.push("Expected integer, received float");
            }
            if value <= 0.0 || value > f64::from(u32::MAX) {
                violations.push("Item number must be positive integer");
            }
        }
        FieldName::Quantity if !(value > 0.0) => {
            violations.push("Quantity must be positive number");
        }
        FieldName::Price if !(value >= 0.0) => violations.push("Price must be non-negative"),
        FieldName::Net if !(value >= 0.0) => violations.push("Net amount must be non-negative"),
        FieldName::Vat if !(value >= 0.0) => violations.push("VAT must be non-negative"),
        FieldName::Total if !(value >= 0.0) => violations.push("Total must be non-negative"),
        _ => {}
    }

    violations
}

fn text_rule_violation(field: FieldName, text: &str) -> Option<&'static str> {
    let len = text.chars().count();

    match field {
        FieldName::Unit if len == 0 => Some("Unit cannot be empty"),
        FieldName::Unit if len > MAX_UNIT_LEN => Some("Unit too long"),
        FieldName::ArticleCode if len > MAX_ARTICLE_CODE_LEN => Some("Article number too long"),
        FieldName::Name if len == 0 => Some("Item name cannot be empty"),
        FieldName::Name if len > MAX_ITEM_NAME_LEN => Some("Item name too long"),
        _ => None,
    }
}

fn receipt_length_issues(len: usize) -> Vec<FieldIssue> {
    if len == 0 {
        vec![FieldIssue::root("Receipt must contain at least one item")]
    } else if len > MAX_RECEIPT_ITEMS {
        vec![FieldIssue::root(format!(
            "Receipt cannot contain more than {MAX_RECEIPT_ITEMS} items"
        ))]
    } else {
        Vec::new()
    }
}

// =============================================================================
// JSON Parsing
// =============================================================================

/// Reads one row. Returns `None` when any cell is missing, mistyped or
/// breaks a rule; the reasons are pushed onto `issues`.
fn parse_item(
    position: usize,
    object: &Map<String, Value>,
    issues: &mut Vec<FieldIssue>,
) -> Option<LineItem> {
    let issues_before = issues.len();
    let mut item = LineItem::blank(1);

    for field in FieldName::ALL {
        let path = || format!("{position}.{}", field.wire_name());

        let Some(raw) = object.get(field.wire_name()) else {
            issues.push(FieldIssue::new(path(), "Required"));
            continue;
        };

        let cell = match (field.is_numeric(), raw) {
            (true, Value::Number(number)) => match number.as_f64() {
                Some(value) => Cell::Number(value),
                None => {
                    issues.push(FieldIssue::new(path(), "Expected number, received number"));
                    continue;
                }
            },
            (false, Value::String(text)) => Cell::Text(text),
            (numeric, other) => {
                let expected = if numeric { "number" } else { "string" };
                issues.push(FieldIssue::new(
                    path(),
                    format!("Expected {expected}, received {}", json_type(other)),
                ));
                continue;
            }
        };

        check_cell(position, field, cell, issues);
        assign(&mut item, field, cell);
    }

    (issues.len() == issues_before).then_some(item)
}

fn assign(item: &mut LineItem, field: FieldName, cell: Cell<'_>) {
    match (field, cell) {
        (FieldName::Index, Cell::Number(value)) => item.index = value as u32,
        (FieldName::Unit, Cell::Text(text)) => item.unit = text.to_string(),
        (FieldName::ArticleCode, Cell::Text(text)) => item.article_code = text.to_string(),
        (FieldName::Name, Cell::Text(text)) => item.name = text.to_string(),
        (field, Cell::Number(value)) => {
            if let Some(amount) = field.recalc_field() {
                item.set_amount(amount, value);
            }
        }
        (_, Cell::Text(_)) => {}
    }
}

/// Type name as shown in "Expected X, received Y".
fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn schema_error(issues: Vec<FieldIssue>) -> ValidationError {
    ValidationError::Schema { issues }
}

// =============================================================================
// Unit Tests
// =============================================================================
