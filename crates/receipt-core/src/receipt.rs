//! # Receipt
//!
//! An ordered list of line items plus the row operations the editor offers.
//!
//! ## Numbering Rule
//! ```text
//!  position:  0    1    2    3
//!  "#":       1    2    3    4      ← always position + 1
//! ```
//! Every structural operation (add, delete, move, duplicate) renumbers the
//! rows afterwards so `#` stays dense. Cell edits do not renumber.
//!
//! ## Selections
//! Operations on several rows take a set of 0-based positions. Positions
//! past the end are ignored.
//!
//! ## Column Sort
//! Clicking a header cycles `Asc → Desc → unsorted`. Sorting is a view:
//! [`Receipt::sorted_by`] returns references and leaves row order and `#`
//! untouched.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::round2;
use crate::recalc::{apply_edit, FieldEdit};
use crate::types::{FieldName, LineItem};

/// Row positions chosen by the user.
pub type Selection = BTreeSet<usize>;

// =============================================================================
// Receipt
// =============================================================================

/// An ordered sequence of line items.
///
/// Serializes as a bare JSON array, which is what the `data` column and the
/// HTTP API carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt(Vec<LineItem>);

impl Receipt {
    /// Wraps rows as they are, without renumbering.
    pub fn new(items: Vec<LineItem>) -> Self {
        Receipt(items)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.0
    }

    pub fn into_items(self) -> Vec<LineItem> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&LineItem> {
        self.0.get(position)
    }

    // =========================================================================
    // Numbering
    // =========================================================================

    /// Sets every row's `#` to its position + 1.
    pub fn renumber(&mut self) {
        for (position, item) in self.0.iter_mut().enumerate() {
            item.index = position as u32 + 1;
        }
    }

    /// Whether `#` runs 1..N in array order.
    pub fn is_densely_numbered(&self) -> bool {
        self.0
            .iter()
            .enumerate()
            .all(|(position, item)| item.index as usize == position + 1)
    }

    // =========================================================================
    // Row Operations
    // =========================================================================

    /// Appends a blank row.
    ///
    /// Does nothing on an empty receipt: a receipt always starts from the
    /// bot's data, never from scratch.
    pub fn push_blank(&mut self) -> bool {
        if self.0.is_empty() {
            return false;
        }
        self.0.push(LineItem::blank(self.0.len() as u32 + 1));
        self.renumber();
        true
    }

    /// Removes the selected rows. Returns how many were removed.
    pub fn delete_rows(&mut self, selection: &Selection) -> usize {
        let before = self.0.len();
        let mut position = 0;
        self.0.retain(|_| {
            let keep = !selection.contains(&position);
            position += 1;
            keep
        });
        self.renumber();
        before - self.0.len()
    }

    /// Moves every selected row one position up.
    ///
    /// Returns the selection at its new positions, or the selection
    /// unchanged when the first selected row is already at the top.
    pub fn move_up(&mut self, selection: &Selection) -> Selection {
        let selected = self.in_bounds(selection);
        match selected.first() {
            None | Some(0) => return selection.clone(),
            Some(_) => {}
        }

        for &position in &selected {
            self.0.swap(position, position - 1);
        }
        self.renumber();
        selected.iter().map(|position| position - 1).collect()
    }

    /// Moves every selected row one position down.
    ///
    /// Returns the selection at its new positions, or the selection
    /// unchanged when the last selected row is already at the bottom.
    pub fn move_down(&mut self, selection: &Selection) -> Selection {
        let selected = self.in_bounds(selection);
        match selected.last() {
            None => return selection.clone(),
            Some(&last) if last + 1 == self.0.len() => return selection.clone(),
            Some(_) => {}
        }

        for &position in selected.iter().rev() {
            self.0.swap(position, position + 1);
        }
        self.renumber();
        selected.iter().map(|position| position + 1).collect()
    }

    /// Drag-and-drop: takes the row at `from` and inserts it at `to`.
    ///
    /// Returns `false` (and changes nothing) if either position is out of
    /// range.
    pub fn move_row(&mut self, from: usize, to: usize) -> bool {
        if from >= self.0.len() || to >= self.0.len() {
            return false;
        }
        let item = self.0.remove(from);
        self.0.insert(to, item);
        self.renumber();
        true
    }

    /// Inserts copies of the selected rows right after the last selected row.
    ///
    /// Copies keep the order of their originals. Returns the number of rows
    /// added.
    pub fn duplicate_rows(&mut self, selection: &Selection) -> usize {
        let selected = self.in_bounds(selection);
        let Some(&last) = selected.last() else {
            return 0;
        };

        let copies: Vec<LineItem> = selected.iter().map(|&p| self.0[p].clone()).collect();
        let added = copies.len();
        self.0.splice(last + 1..last + 1, copies);
        self.renumber();
        added
    }

    /// Applies a cell edit to one row. Returns the updated row.
    ///
    /// ## Example
    /// ```rust
    /// use receipt_core::{FieldName, LineItem, Receipt};
    ///
    /// let mut receipt = Receipt::from(vec![LineItem::blank(1)]);
    /// receipt.edit(0, FieldName::Price, "2.50".into());
    /// receipt.edit(0, FieldName::Quantity, 4.0.into());
    ///
    /// assert_eq!(receipt.summary().grand_total, 10.0);
    /// ```
    pub fn edit(&mut self, position: usize, field: FieldName, edit: FieldEdit) -> Option<&LineItem> {
        let item = self.0.get_mut(position)?;
        *item = apply_edit(item, field, edit);
        Some(&*item)
    }

    /// Totals shown under the table.
    pub fn summary(&self) -> ReceiptSummary {
        let (net, vat, total) = self.0.iter().fold((0.0, 0.0, 0.0), |(n, v, t), item| {
            (n + item.net, v + item.vat, t + item.total)
        });

        ReceiptSummary {
            items_count: self.0.len(),
            net_total: round2(net),
            vat_total: round2(vat),
            grand_total: round2(total),
        }
    }

    /// Rows ordered by one column, for display.
    ///
    /// Numeric columns compare by value, text columns case-insensitively.
    /// Equal rows keep their receipt order.
    pub fn sorted_by(&self, field: FieldName, direction: SortDirection) -> Vec<&LineItem> {
        let mut rows: Vec<&LineItem> = self.0.iter().collect();
        rows.sort_by(|a, b| {
            let ordering = sort_key(a, field).compare(&sort_key(b, field));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        rows
    }

    /// Selected positions that exist, ascending.
    fn in_bounds(&self, selection: &Selection) -> Vec<usize> {
        selection
            .iter()
            .copied()
            .filter(|&position| position < self.0.len())
            .collect()
    }
}

impl From<Vec<LineItem>> for Receipt {
    fn from(items: Vec<LineItem>) -> Self {
        Receipt(items)
    }
}

impl<'a> IntoIterator for &'a Receipt {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Direction of a column sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// State after another click on the same header.
    pub fn cycle(current: Option<SortDirection>) -> Option<SortDirection> {
        match current {
            None => Some(SortDirection::Asc),
            Some(SortDirection::Asc) => Some(SortDirection::Desc),
            Some(SortDirection::Desc) => None,
        }
    }
}

enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

fn sort_key(item: &LineItem, field: FieldName) -> SortKey {
    let number = |value: f64| SortKey::Number(if value.is_finite() { value } else { 0.0 });
    match field {
        FieldName::Index => number(f64::from(item.index)),
        FieldName::Quantity => number(item.quantity),
        FieldName::Price => number(item.price),
        FieldName::Net => number(item.net),
        FieldName::Vat => number(item.vat),
        FieldName::Total => number(item.total),
        FieldName::Unit => SortKey::Text(item.unit.to_lowercase()),
        FieldName::ArticleCode => SortKey::Text(item.article_code.to_lowercase()),
        FieldName::Name => SortKey::Text(item.name.to_lowercase()),
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Column totals of a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    #[ts(type = "number")]
    pub items_count: usize,
    pub net_total: f64,
    pub vat_total: f64,
    pub grand_total: f64,
}

// =============================================================================
// Unit Tests
// =============================================================================
