//! # Domain Types
//!
//! Core domain types used throughout the receipt editor.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │     Session     │   │  SessionStatus  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  index    "#"   │   │  id (UUID)      │   │  Pending        │       │
//! │  │  quantity "Qty" │   │  data (Receipt) │   │  Ready          │       │
//! │  │  price  "Price" │   │  status         │   └─────────────────┘       │
//! │  │  net/vat/total  │   └─────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   FieldName     │──►│  RecalcField    │  the five fields that       │
//! │  │  all 9 columns  │   │  Qty Price Net  │  trigger recalculation      │
//! │  │  wire ↔ Rust    │   │  VAT Total      │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! The Mini App and the bot exchange rows with the receipt-format keys
//! (`#`, `Qty`, `Unit`, `Price`, `Art`, `Item`, `Net`, `VAT`, `Total`).
//! Rust code uses the semantic names; serde does the mapping and
//! [`FieldName`] is the single table that knows both.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::amounts_match;
use crate::money::round2;
use crate::receipt::Receipt;

// =============================================================================
// Line Item
// =============================================================================

/// One receipt row.
///
/// ## Invariant (at rest)
/// - `net == round2(price * quantity)`
/// - `total == round2(net + vat)`
///
/// During a single edit only one of them may hold transiently; see
/// [`crate::recalc::recalculate_row`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Display order, 1-based and dense within a receipt.
    #[serde(rename = "#")]
    pub index: u32,

    /// Amount purchased; fractional for weighed goods.
    #[serde(rename = "Qty")]
    pub quantity: f64,

    /// Unit label ("pcs", "kg", ...), free text.
    #[serde(rename = "Unit")]
    pub unit: String,

    /// Unit price.
    #[serde(rename = "Price")]
    pub price: f64,

    /// Article code / SKU, may be empty.
    #[serde(rename = "Art")]
    pub article_code: String,

    /// Display name of the item.
    #[serde(rename = "Item")]
    pub name: String,

    /// Pre-tax amount for the line.
    #[serde(rename = "Net")]
    pub net: f64,

    /// Tax amount for the line.
    #[serde(rename = "VAT")]
    pub vat: f64,

    /// Net + VAT, the amount charged.
    #[serde(rename = "Total")]
    pub total: f64,
}

impl LineItem {
    /// The row inserted by "add row".
    ///
    /// ## Example
    /// ```rust
    /// use receipt_core::LineItem;
    ///
    /// let row = LineItem::blank(4);
    /// assert_eq!(row.index, 4);
    /// assert_eq!(row.quantity, 1.0);
    /// assert_eq!(row.name, "New Item");
    /// ```
    pub fn blank(index: u32) -> Self {
        LineItem {
            index,
            quantity: 1.0,
            unit: "pcs".to_string(),
            price: 0.0,
            article_code: String::new(),
            name: "New Item".to_string(),
            net: 0.0,
            vat: 0.0,
            total: 0.0,
        }
    }

    /// Reads one of the five recalculation amounts.
    #[inline]
    pub fn amount(&self, field: RecalcField) -> f64 {
        match field {
            RecalcField::Quantity => self.quantity,
            RecalcField::Price => self.price,
            RecalcField::Net => self.net,
            RecalcField::Vat => self.vat,
            RecalcField::Total => self.total,
        }
    }

    /// Writes one of the five recalculation amounts, no recalculation.
    #[inline]
    pub fn set_amount(&mut self, field: RecalcField, value: f64) {
        match field {
            RecalcField::Quantity => self.quantity = value,
            RecalcField::Price => self.price = value,
            RecalcField::Net => self.net = value,
            RecalcField::Vat => self.vat = value,
            RecalcField::Total => self.total = value,
        }
    }

    /// Checks both at-rest equations within one cent.
    pub fn is_consistent(&self) -> bool {
        amounts_match(self.net, round2(self.price * self.quantity))
            && amounts_match(self.total, round2(self.net + self.vat))
    }
}

// =============================================================================
// Field Names
// =============================================================================

/// Every column of a line item.
///
/// ## Field Table
/// ```text
/// ┌──────────────┬───────┬─────────┬──────────────┐
/// │ FieldName    │ wire  │ numeric │ recalculates │
/// ├──────────────┼───────┼─────────┼──────────────┤
/// │ Index        │ #     │   yes   │      no      │
/// │ Quantity     │ Qty   │   yes   │     yes      │
/// │ Unit         │ Unit  │   no    │      no      │
/// │ Price        │ Price │   yes   │     yes      │
/// │ ArticleCode  │ Art   │   no    │      no      │
/// │ Name         │ Item  │   no    │      no      │
/// │ Net          │ Net   │   yes   │     yes      │
/// │ Vat          │ VAT   │   yes   │     yes      │
/// │ Total        │ Total │   yes   │     yes      │
/// └──────────────┴───────┴─────────┴──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum FieldName {
    #[serde(rename = "#")]
    Index,
    #[serde(rename = "Qty")]
    Quantity,
    #[serde(rename = "Unit")]
    Unit,
    #[serde(rename = "Price")]
    Price,
    #[serde(rename = "Art")]
    ArticleCode,
    #[serde(rename = "Item")]
    Name,
    #[serde(rename = "Net")]
    Net,
    #[serde(rename = "VAT")]
    Vat,
    #[serde(rename = "Total")]
    Total,
}

impl FieldName {
    /// All columns in display order.
    pub const ALL: [FieldName; 9] = [
        FieldName::Index,
        FieldName::Quantity,
        FieldName::Unit,
        FieldName::Price,
        FieldName::ArticleCode,
        FieldName::Name,
        FieldName::Net,
        FieldName::Vat,
        FieldName::Total,
    ];

    /// The JSON key used on the wire.
    pub const fn wire_name(self) -> &'static str {
        match self {
            FieldName::Index => "#",
            FieldName::Quantity => "Qty",
            FieldName::Unit => "Unit",
            FieldName::Price => "Price",
            FieldName::ArticleCode => "Art",
            FieldName::Name => "Item",
            FieldName::Net => "Net",
            FieldName::Vat => "VAT",
            FieldName::Total => "Total",
        }
    }

    /// Looks up a column by its wire key (case-sensitive).
    pub fn from_wire_name(name: &str) -> Option<Self> {
        FieldName::ALL
            .into_iter()
            .find(|field| field.wire_name() == name)
    }

    /// Whether the column holds a number.
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldName::Index
                | FieldName::Quantity
                | FieldName::Price
                | FieldName::Net
                | FieldName::Vat
                | FieldName::Total
        )
    }

    /// The recalculation trigger for this column, if any.
    pub const fn recalc_field(self) -> Option<RecalcField> {
        match self {
            FieldName::Quantity => Some(RecalcField::Quantity),
            FieldName::Price => Some(RecalcField::Price),
            FieldName::Net => Some(RecalcField::Net),
            FieldName::Vat => Some(RecalcField::Vat),
            FieldName::Total => Some(RecalcField::Total),
            FieldName::Index | FieldName::Unit | FieldName::ArticleCode | FieldName::Name => None,
        }
    }

    /// Whether editing this column triggers recalculation.
    #[inline]
    pub const fn triggers_recalculation(self) -> bool {
        self.recalc_field().is_some()
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for FieldName {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::from_wire_name(s).ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// A wire key that is not a line item column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown field: {0}")]
pub struct UnknownField(pub String);

/// The five amounts that are kept consistent by recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RecalcField {
    #[serde(rename = "Qty")]
    Quantity,
    #[serde(rename = "Price")]
    Price,
    #[serde(rename = "Net")]
    Net,
    #[serde(rename = "VAT")]
    Vat,
    #[serde(rename = "Total")]
    Total,
}

impl From<RecalcField> for FieldName {
    fn from(field: RecalcField) -> Self {
        match field {
            RecalcField::Quantity => FieldName::Quantity,
            RecalcField::Price => FieldName::Price,
            RecalcField::Net => FieldName::Net,
            RecalcField::Vat => FieldName::Vat,
            RecalcField::Total => FieldName::Total,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Lifecycle state of a session.
///
/// ```text
/// bot creates ──► Pending ──(user saves)──► Ready
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created by the bot, not yet saved by the user.
    Pending,
    /// Saved by the user; the bot may pick the data up.
    Ready,
}

impl SessionStatus {
    /// Value stored in the `status` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Ready => "ready",
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Pending
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "ready" => Ok(SessionStatus::Ready),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A status value outside `pending | ready`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown session status: {0}")]
pub struct UnknownStatus(pub String);

/// The persisted unit: one receipt being edited.
///
/// `id` never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub data: Receipt,
    pub status: SessionStatus,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_row() -> LineItem {
        LineItem {
            index: 1,
            quantity: 2.0,
            unit: "pcs".to_string(),
            price: 100.0,
            article_code: "TEST-001".to_string(),
            name: "Test Item".to_string(),
            net: 200.0,
            vat: 40.0,
            total: 240.0,
        }
    }

    #[test]
    fn test_line_item_uses_wire_names() {
        let value = serde_json::to_value(sample_row()).unwrap();
        assert_eq!(
            value,
            json!({
                "#": 1, "Qty": 2.0, "Unit": "pcs", "Price": 100.0,
                "Art": "TEST-001", "Item": "Test Item",
                "Net": 200.0, "VAT": 40.0, "Total": 240.0
            })
        );
    }

    #[test]
    fn test_line_item_reads_integer_json_numbers() {
        let row: LineItem = serde_json::from_value(json!({
            "#": 1, "Qty": 2, "Unit": "pcs", "Price": 100,
            "Art": "TEST-001", "Item": "Test Item",
            "Net": 200, "VAT": 40, "Total": 240
        }))
        .unwrap();
        assert_eq!(row, sample_row());
    }

    #[test]
    fn test_blank_row() {
        let row = LineItem::blank(3);
        assert_eq!(row.index, 3);
        assert_eq!(row.unit, "pcs");
        assert_eq!(row.article_code, "");
        assert_eq!(row.total, 0.0);
        assert!(row.is_consistent());
    }

    #[test]
    fn test_is_consistent() {
        assert!(sample_row().is_consistent());

        let mut drifted = sample_row();
        drifted.total = 250.0;
        assert!(!drifted.is_consistent());
    }

    #[test]
    fn test_field_name_mapping_round_trips() {
        for field in FieldName::ALL {
            assert_eq!(FieldName::from_wire_name(field.wire_name()), Some(field));
            assert_eq!(field.wire_name().parse::<FieldName>(), Ok(field));
        }
        assert_eq!(FieldName::from_wire_name("qty"), None);
        assert!("Quantity".parse::<FieldName>().is_err());
    }

    #[test]
    fn test_numeric_and_recalc_classification() {
        let numeric: Vec<_> = FieldName::ALL.into_iter().filter(|f| f.is_numeric()).collect();
        assert_eq!(
            numeric,
            vec![
                FieldName::Index,
                FieldName::Quantity,
                FieldName::Price,
                FieldName::Net,
                FieldName::Vat,
                FieldName::Total
            ]
        );

        assert!(!FieldName::Index.triggers_recalculation());
        assert!(!FieldName::Name.triggers_recalculation());
        assert_eq!(FieldName::Vat.recalc_field(), Some(RecalcField::Vat));
        assert_eq!(FieldName::from(RecalcField::Total), FieldName::Total);
    }

    #[test]
    fn test_amount_accessors() {
        let mut row = sample_row();
        row.set_amount(RecalcField::Vat, 12.5);
        assert_eq!(row.amount(RecalcField::Vat), 12.5);
        assert_eq!(row.amount(RecalcField::Quantity), 2.0);
    }

    #[test]
    fn test_session_status() {
        assert_eq!(SessionStatus::default(), SessionStatus::Pending);
        assert_eq!(SessionStatus::Ready.as_str(), "ready");
        assert_eq!("pending".parse::<SessionStatus>(), Ok(SessionStatus::Pending));
        assert!("done".parse::<SessionStatus>().is_err());
        assert_eq!(serde_json::to_value(SessionStatus::Ready).unwrap(), json!("ready"));
    }
}
