//! # Pricing Resolver
//!
//! Derives the per-line unit price at order time.
//!
//! ## The Even-Split Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  unit_price = total / line_count                                │
//! │                                                                 │
//! │  • line_count is the number of DISTINCT cart lines,             │
//! │    not the total quantity                                       │
//! │  • total is caller-supplied: "what the customer pays" is        │
//! │    deliberately decoupled from catalog price                    │
//! │                                                                 │
//! │  Cart: [(product 7, qty 2), (product 9, qty 1)], total $90     │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  even_split($90.00, 2) = $45.00 on EVERY line                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This is a deliberately simplified allocation, not a per-product price
//! lookup. Replacements must preserve the decoupling from catalog prices
//! unless the wider system starts recomputing totals server-side.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Computes the unit price shared by every order line.
///
/// Rounded to the nearest cent; exact whenever `line_count` divides the
/// total evenly. The reconciliation drift between
/// `unit_price * quantity` sums and `total` is bounded by the rounding of
/// a single division (strictly less than `line_count` cents per unit).
///
/// ## Errors
/// Returns [`CoreError::EmptyCart`] when `line_count` is zero: an order
/// with no lines must never be priced (it must never exist at all).
///
/// ## Example
/// ```rust
/// use mercado_core::money::Money;
/// use mercado_core::pricing::even_split;
///
/// let unit = even_split(Money::from_cents(9000), 2, 42).unwrap();
/// assert_eq!(unit.cents(), 4500);
/// ```
pub fn even_split(total: Money, line_count: usize, user_id: i64) -> CoreResult<Money> {
    if line_count == 0 {
        return Err(CoreError::EmptyCart { user_id });
    }

    Ok(total.split_even(line_count as i64))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split_exact() {
        // $90.00 over 2 distinct lines = $45.00 each
        let unit = even_split(Money::from_cents(9000), 2, 1).unwrap();
        assert_eq!(unit.cents(), 4500);
    }

    #[test]
    fn test_even_split_single_line() {
        let unit = even_split(Money::from_cents(12345), 1, 1).unwrap();
        assert_eq!(unit.cents(), 12345);
    }

    #[test]
    fn test_even_split_ignores_quantities() {
        // The divisor is the number of lines, not the sum of quantities:
        // the same total over 3 lines is $30 each no matter the quantities.
        let unit = even_split(Money::from_cents(9000), 3, 1).unwrap();
        assert_eq!(unit.cents(), 3000);
    }

    #[test]
    fn test_even_split_zero_lines_is_empty_cart() {
        let err = even_split(Money::from_cents(5000), 0, 77).unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart { user_id: 77 }));
    }

    #[test]
    fn test_even_split_reconciles_within_tolerance() {
        // $100.00 over 3 lines: 3333 each, 9999 reconstructed, 1 cent drift
        let total = Money::from_cents(10000);
        let unit = even_split(total, 3, 1).unwrap();
        assert_eq!(unit.cents(), 3333);

        let reconstructed = unit * 3;
        assert!((total - reconstructed).abs().cents() < 3);
    }
}
