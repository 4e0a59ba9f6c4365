//! # Recalculation Engine
//!
//! Keeps a line item's five amounts consistent when the user edits one of them.
//!
//! ## The Problem
//! Five amounts, two equations:
//! ```text
//!   net   = price × quantity
//!   total = net + vat
//! ```
//! Any single edit leaves three degrees of freedom, so each edit must pick
//! what is recomputed and what is held. The choice is a product decision:
//!
//! ```text
//! ┌──────────────┬─────────────────────────────────────┬──────────────────┐
//! │ edited       │ recomputed                          │ held             │
//! ├──────────────┼─────────────────────────────────────┼──────────────────┤
//! │ Qty / Price  │ net = price×qty, total = net+vat    │ vat              │
//! │ VAT          │ net = total−vat, price = net/qty    │ total, qty       │
//! │ Total        │ net = total−vat, price = net/qty    │ vat, qty         │
//! │ Net          │ price = net/qty, total = net+vat    │ vat, qty         │
//! └──────────────┴─────────────────────────────────────┴──────────────────┘
//! ```
//!
//! Editing VAT or Total never adjusts the quantity; price follows.
//! Editing Net also moves price, since corrected nets come from OCR fixes.
//!
//! ## Zero Quantity
//! When `quantity == 0` a branch that would divide leaves `price` untouched.
//! The engine never fails and never produces NaN or infinity.

use crate::money::{parse_amount_input, round2};
use crate::types::{FieldName, LineItem, RecalcField};

// =============================================================================
// Recalculation
// =============================================================================

/// Returns a copy of `row` with `field` set to `value` and the dependent
/// amounts recomputed.
///
/// `value` is taken as-is: coercion of user input happens before this call
/// (see [`crate::money::parse_amount_input`]).
///
/// ## Example
/// ```rust
/// use receipt_core::recalc::recalculate_row;
/// use receipt_core::types::{LineItem, RecalcField};
///
/// let row = LineItem {
///     quantity: 2.0, price: 100.0, net: 200.0, vat: 40.0, total: 240.0,
///     ..LineItem::blank(1)
/// };
///
/// // VAT edits hold the total and move net and price
/// let row = recalculate_row(&row, RecalcField::Vat, 60.0);
/// assert_eq!(row.total, 240.0);
/// assert_eq!(row.net, 180.0);
/// assert_eq!(row.price, 90.0);
/// ```
pub fn recalculate_row(row: &LineItem, field: RecalcField, value: f64) -> LineItem {
    let mut next = row.clone();
    next.set_amount(field, value);

    match field {
        RecalcField::Quantity | RecalcField::Price => {
            next.net = round2(next.price * next.quantity);
            next.total = round2(next.net + next.vat);
        }
        RecalcField::Vat | RecalcField::Total => {
            next.net = round2(next.total - next.vat);
            derive_price(&mut next);
        }
        RecalcField::Net => {
            derive_price(&mut next);
            next.total = round2(next.net + next.vat);
        }
    }

    next
}

/// Sets `price = net / quantity` unless the quantity is zero.
#[inline]
fn derive_price(row: &mut LineItem) {
    if row.quantity != 0.0 {
        row.price = round2(row.net / row.quantity);
    }
}

// =============================================================================
// Cell Edits
// =============================================================================

/// A raw value typed into a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Number(f64),
    Text(String),
}

impl FieldEdit {
    /// Numeric view of the edit; text goes through input coercion.
    pub fn as_number(&self) -> f64 {
        match self {
            FieldEdit::Number(value) if value.is_finite() => *value,
            FieldEdit::Number(_) => 0.0,
            FieldEdit::Text(text) => parse_amount_input(text),
        }
    }

    /// Text view of the edit; numbers use their shortest decimal form.
    pub fn into_text(self) -> String {
        match self {
            FieldEdit::Number(value) => value.to_string(),
            FieldEdit::Text(text) => text,
        }
    }
}

impl From<f64> for FieldEdit {
    fn from(value: f64) -> Self {
        FieldEdit::Number(value)
    }
}

impl From<&str> for FieldEdit {
    fn from(value: &str) -> Self {
        FieldEdit::Text(value.to_string())
    }
}

impl From<String> for FieldEdit {
    fn from(value: String) -> Self {
        FieldEdit::Text(value)
    }
}

/// Applies one cell edit to a row.
///
/// ## Routing
/// ```text
/// FieldName ──► recalc_field()? ──Some──► recalculate_row
///                     │
///                    None ──► Index       : integer part, clamped at 0
///                             Unit/Art/Item: plain assignment
/// ```
pub fn apply_edit(row: &LineItem, field: FieldName, edit: FieldEdit) -> LineItem {
    if let Some(amount) = field.recalc_field() {
        return recalculate_row(row, amount, edit.as_number());
    }

    let mut next = row.clone();
    match field {
        // `as` saturates, so huge values clamp to u32::MAX
        FieldName::Index => next.index = edit.as_number().max(0.0).trunc() as u32,
        FieldName::Unit => next.unit = edit.into_text(),
        FieldName::ArticleCode => next.article_code = edit.into_text(),
        FieldName::Name => next.name = edit.into_text(),
        // amounts returned above
        _ => {}
    }
    next
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::amounts_match;

    fn row(quantity: f64, price: f64, vat: f64) -> LineItem {
        let net = round2(price * quantity);
        LineItem {
            index: 1,
            quantity,
            unit: "pcs".to_string(),
            price,
            article_code: String::new(),
            name: "Test Item".to_string(),
            net,
            vat,
            total: round2(net + vat),
        }
    }

    #[test]
    fn test_quantity_edit_recomputes_net_and_total() {
        let updated = recalculate_row(&row(2.0, 100.0, 40.0), RecalcField::Quantity, 3.0);
        assert_eq!(updated.quantity, 3.0);
        assert_eq!(updated.price, 100.0);
        assert_eq!(updated.net, 300.0);
        assert_eq!(updated.total, 340.0);
    }

    #[test]
    fn test_price_edit_keeps_quantity() {
        let updated = recalculate_row(&row(2.0, 33.33, 0.0), RecalcField::Price, 33.33);
        assert_eq!(updated.quantity, 2.0);
        assert_eq!(updated.net, 66.66);
        assert_eq!(updated.total, 66.66);
    }

    #[test]
    fn test_net_edit_rounds_price_half_up() {
        let updated = recalculate_row(&row(2.0, 78.0, 10.0), RecalcField::Net, 157.01);
        assert_eq!(updated.net, 157.01);
        assert_eq!(updated.price, 78.51);
        assert_eq!(updated.total, round2(157.01 + 10.0));
    }

    #[test]
    fn test_vat_edit_holds_total() {
        let before = row(2.0, 100.0, 40.0);
        let updated = recalculate_row(&before, RecalcField::Vat, 60.0);
        assert_eq!(updated.total, before.total);
        assert_eq!(updated.vat, 60.0);
        assert_eq!(updated.net, 180.0);
        assert_eq!(updated.price, 90.0);
        assert_eq!(updated.quantity, before.quantity);
    }

    #[test]
    fn test_total_edit_holds_vat() {
        let before = row(4.0, 25.0, 20.0);
        let updated = recalculate_row(&before, RecalcField::Total, 220.0);
        assert_eq!(updated.vat, before.vat);
        assert_eq!(updated.net, 200.0);
        assert_eq!(updated.price, 50.0);
        assert_eq!(updated.quantity, 4.0);
    }

    #[test]
    fn test_zero_quantity_leaves_price_untouched() {
        let mut before = row(1.0, 12.5, 2.5);
        before.quantity = 0.0;

        for field in [RecalcField::Vat, RecalcField::Total, RecalcField::Net] {
            let updated = recalculate_row(&before, field, 5.0);
            assert_eq!(updated.price, 12.5, "{field:?}");
            assert!(updated.net.is_finite() && updated.total.is_finite());
        }

        let updated = recalculate_row(&before, RecalcField::Net, 7.0);
        assert_eq!(updated.total, 9.5);
    }

    #[test]
    fn test_sequential_edits_drift_by_a_cent() {
        let start = row(2.0, 100.0, 40.0);
        assert_eq!(start.total, 240.0);

        let step1 = recalculate_row(&start, RecalcField::Quantity, 3.0);
        assert_eq!((step1.net, step1.total), (300.0, 340.0));

        let step2 = recalculate_row(&step1, RecalcField::Vat, 60.0);
        assert_eq!(step2.total, 340.0);
        assert_eq!(step2.net, 280.0);
        assert_eq!(step2.price, 93.33);

        // Re-deriving net from the rounded price does not give 280 back
        let step3 = recalculate_row(&step2, RecalcField::Quantity, 3.0);
        assert_eq!(step3.net, 279.99);
        assert_eq!(step3.total, 339.99);
    }

    #[test]
    fn test_every_edit_preserves_both_equations() {
        let quantities = [0.5, 1.0, 1.5, 2.0];
        let prices = [0.0, 0.99, 10.0, 33.33, 78.505, 1234.56];
        let vats = [0.0, 1.23, 40.0];
        let values = [0.0, 0.01, 3.0, 17.77, 157.01, 999.99];
        let fields = [
            RecalcField::Quantity,
            RecalcField::Price,
            RecalcField::Net,
            RecalcField::Vat,
            RecalcField::Total,
        ];

        for &q in &quantities {
            for &p in &prices {
                for &v in &vats {
                    let start = row(q, round2(p), v);
                    assert!(start.is_consistent());

                    for field in fields {
                        for &value in &values {
                            let next = recalculate_row(&start, field, value);
                            assert!(
                                next.is_consistent(),
                                "{field:?}={value} on {start:?} gave {next:?}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_large_quantities_stay_within_rounding_of_price() {
        let start = row(12.0, 10.0, 5.0);
        let next = recalculate_row(&start, RecalcField::Vat, 7.77);

        // price is rounded, so price×qty is off by at most half a cent per unit
        assert!((next.price * next.quantity - next.net).abs() <= 0.005 * next.quantity + 1e-9);
        assert!(amounts_match(next.total, round2(next.net + next.vat)));
    }

    #[test]
    fn test_apply_edit_routes_amounts_through_recalculation() {
        let start = row(2.0, 100.0, 40.0);

        let updated = apply_edit(&start, FieldName::Quantity, FieldEdit::Text("3".into()));
        assert_eq!(updated.net, 300.0);

        let updated = apply_edit(&start, FieldName::Price, FieldEdit::Text("abc".into()));
        assert_eq!(updated.price, 0.0);
        assert_eq!(updated.net, 0.0);
        assert_eq!(updated.total, 40.0);
    }

    #[test]
    fn test_apply_edit_assigns_plain_fields() {
        let start = row(2.0, 100.0, 40.0);

        let updated = apply_edit(&start, FieldName::Name, "Milk 3.2%".into());
        assert_eq!(updated.name, "Milk 3.2%");
        assert_eq!(updated.net, start.net);

        let updated = apply_edit(&start, FieldName::ArticleCode, FieldEdit::Number(4607.0));
        assert_eq!(updated.article_code, "4607");

        let updated = apply_edit(&start, FieldName::Unit, "kg".into());
        assert_eq!(updated.unit, "kg");
    }

    #[test]
    fn test_apply_edit_index() {
        let start = row(1.0, 1.0, 0.0);
        assert_eq!(apply_edit(&start, FieldName::Index, 7.9.into()).index, 7);
        assert_eq!(apply_edit(&start, FieldName::Index, (-3.0).into()).index, 0);
        assert_eq!(apply_edit(&start, FieldName::Index, "x".into()).index, 0);
    }

    #[test]
    fn test_non_finite_number_edit_becomes_zero() {
        let start = row(2.0, 100.0, 40.0);
        let updated = apply_edit(&start, FieldName::Vat, FieldEdit::Number(f64::NAN));
        assert_eq!(updated.vat, 0.0);
        assert_eq!(updated.net, 240.0);
    }
}
