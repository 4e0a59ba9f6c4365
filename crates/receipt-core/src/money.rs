//! # Money Module
//!
//! Rounding and numeric input handling for receipt amounts.
//!
//! ## Why Round After Every Step?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  STORED VALUES ARE ALWAYS ROUNDED                                       │
//! │                                                                         │
//! │  Every amount the user sees (Price, Net, VAT, Total) is rounded to     │
//! │  cents the moment it is computed, and the next edit reads that rounded │
//! │  value back. Rounding is therefore NOT transparent:                    │
//! │                                                                         │
//! │    Net 280.00 / Qty 3 = 93.333…  → Price 93.33                          │
//! │    Price 93.33 × Qty 3 = 279.99  → Net 279.99  (not 280.00)             │
//! │                                                                         │
//! │  The cent of drift is expected behavior and is kept.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Mode
//! Round half UP at the hundredths digit (ties go toward +∞):
//! `10.125 → 10.13`, `78.505 → 78.51`, `-10.125 → -10.12`.
//! This is not bankers rounding, even though older notes on the receipt
//! format call it that.
//!
//! ## Usage
//! ```rust
//! use receipt_core::money::{round2, parse_amount_input};
//!
//! assert_eq!(round2(10.126), 10.13);
//! assert_eq!(parse_amount_input(" 12.5 "), 12.5);
//! assert_eq!(parse_amount_input("abc"), 0.0);
//! ```

use crate::AMOUNT_TOLERANCE;

/// Rounds a value to 2 decimal places, ties toward +∞.
///
/// ## Implementation
/// The value is scaled to cents and floored; the fractional part of the
/// scaled value is exact after the floor subtraction, so the `>= 0.5`
/// comparison decides ties without a second rounding step.
///
/// ## Example
/// ```rust
/// use receipt_core::money::round2;
///
/// assert_eq!(round2(10.123), 10.12);
/// assert_eq!(round2(10.125), 10.13);
/// assert_eq!(round2(-10.126), -10.13);
/// ```
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let scaled = value * 100.0;
    let floor = scaled.floor();
    let cents = if scaled - floor >= 0.5 { floor + 1.0 } else { floor };

    // Avoid handing out -0.0 for tiny negative inputs
    if cents == 0.0 {
        return 0.0;
    }

    cents / 100.0
}

/// Checks whether two amounts agree within one cent.
#[inline]
pub fn amounts_match(a: f64, b: f64) -> bool {
    // The extra 1e-9 absorbs binary representation error of the cent itself
    (a - b).abs() <= AMOUNT_TOLERANCE + 1e-9
}

/// Coerces raw text typed into a numeric cell.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - Empty, unparsable or non-finite input becomes `0.0`
///
/// This is the caller-side coercion the recalculation engine relies on:
/// the engine itself never sees text.
pub fn parse_amount_input(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_basic() {
        assert_eq!(round2(10.123), 10.12);
        assert_eq!(round2(10.126), 10.13);
        assert_eq!(round2(10.0), 10.0);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_round2_ties_go_up() {
        assert_eq!(round2(10.125), 10.13);
        assert_eq!(round2(157.01 / 2.0), 78.51);
        // Half-up, not half-even: 0.125 would be 0.12 under bankers rounding
        assert_eq!(round2(0.125), 0.13);
    }

    #[test]
    fn test_round2_negative() {
        assert_eq!(round2(-10.123), -10.12);
        assert_eq!(round2(-10.126), -10.13);
        // Ties toward +∞
        assert_eq!(round2(-10.125), -10.12);
        assert_eq!(round2(-0.001), 0.0);
        assert!(round2(-0.001).is_sign_positive());
    }

    #[test]
    fn test_round2_products() {
        assert_eq!(round2(33.33 * 2.0), 66.66);
        assert_eq!(round2(93.33 * 3.0), 279.99);
        assert_eq!(round2(280.0 / 3.0), 93.33);
    }

    #[test]
    fn test_amounts_match() {
        assert!(amounts_match(279.99, 280.0));
        assert!(amounts_match(100.0, 100.0));
        assert!(!amounts_match(279.98, 280.0));
    }

    #[test]
    fn test_parse_amount_input() {
        assert_eq!(parse_amount_input("12.5"), 12.5);
        assert_eq!(parse_amount_input("  7 "), 7.0);
        assert_eq!(parse_amount_input(""), 0.0);
        assert_eq!(parse_amount_input("abc"), 0.0);
        assert_eq!(parse_amount_input("inf"), 0.0);
        assert_eq!(parse_amount_input("NaN"), 0.0);
        assert_eq!(parse_amount_input("-3"), -3.0);
    }
}
