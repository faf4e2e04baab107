//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                     │
//! │                                                                 │
//! │  In JavaScript/floating point:                                  │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                   │
//! │                                                                 │
//! │  OUR SOLUTION: Integer Cents                                    │
//! │    $90.00 split over 2 order lines = 4500 cents each, exact     │
//! │    $100.00 split over 3 lines = 3333 cents each; we KNOW the    │
//! │    cent of drift exists and bound it explicitly (see pricing)   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mercado_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // $10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;
//! let total = price + Money::from_cents(500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for reconciliation deltas
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **sqlx transparent**: Persists as a plain INTEGER column
///
/// Every monetary value in the engine flows through this type: catalog
/// prices, the live cart estimate, the frozen order total, and the
/// even-split unit price on each order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use mercado_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use mercado_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use mercado_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897); // $8.97
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Divides this amount into `parts` equal shares, rounded to the
    /// nearest cent.
    ///
    /// Every share is identical; the sum of shares can drift from the
    /// original amount by strictly less than `parts` cents. Callers that
    /// need to reconcile (order totals vs. line snapshots) bound the drift
    /// rather than redistribute it.
    ///
    /// ## Example
    /// ```rust
    /// use mercado_core::money::Money;
    ///
    /// let total = Money::from_cents(9000); // $90.00
    /// assert_eq!(total.split_even(2).cents(), 4500); // exact
    ///
    /// let total = Money::from_cents(10000); // $100.00
    /// assert_eq!(total.split_even(3).cents(), 3333); // 1 cent of drift
    /// ```
    ///
    /// ## Panics
    /// Panics if `parts` is zero; guard with [`crate::pricing::even_split`]
    /// which returns an error instead.
    pub fn split_even(&self, parts: i64) -> Money {
        assert!(parts > 0, "cannot split money into zero parts");
        // Round half away from zero using i128 to avoid overflow.
        let parts = parts as i128;
        let half = if self.0 >= 0 { parts } else { -parts };
        let numerator = self.0 as i128 * 2 + half;
        Money((numerator / (parts * 2)) as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. The request layer formats for
/// localization.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summation over cart lines (live total estimate).
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        let money = Money::from_major_minor(10, 99);
        assert_eq!(money.cents(), 1099);

        let negative = Money::from_major_minor(-5, 50);
        assert_eq!(negative.cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 399]
            .iter()
            .map(|c| Money::from_cents(*c))
            .sum();
        assert_eq!(total.cents(), 749);
    }

    #[test]
    fn test_split_even_exact() {
        let total = Money::from_cents(9000);
        assert_eq!(total.split_even(2).cents(), 4500);
        assert_eq!(total.split_even(1).cents(), 9000);
        assert_eq!(total.split_even(3).cents(), 3000);
    }

    #[test]
    fn test_split_even_rounds_to_nearest_cent() {
        // $100.00 / 3 = 3333.33.. → 3333
        assert_eq!(Money::from_cents(10000).split_even(3).cents(), 3333);
        // $0.10 / 4 = 2.5 → rounds away from zero to 3
        assert_eq!(Money::from_cents(10).split_even(4).cents(), 3);
        // $0.11 / 3 = 3.67 → 4
        assert_eq!(Money::from_cents(11).split_even(3).cents(), 4);
    }

    /// The reconciliation drift between N identical shares and the original
    /// amount is strictly less than N cents.
    #[test]
    fn test_split_even_drift_is_bounded() {
        for cents in [1, 7, 99, 10000, 123_457] {
            for parts in 1..=7_i64 {
                let total = Money::from_cents(cents);
                let share = total.split_even(parts);
                let reconstructed = share * parts;
                assert!(
                    (reconstructed - total).abs().cents() < parts,
                    "drift too large for {cents} cents / {parts} parts"
                );
            }
        }
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_cents(100);
        assert!(positive.is_positive());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(299);
        let line_total = unit_price.multiply_quantity(3);
        assert_eq!(line_total.cents(), 897);
    }
}
