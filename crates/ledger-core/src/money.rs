//! # Money Module
//!
//! Provides the `Money` type for prices, subtotals, totals and profit.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every amount in the ledger is a whole number of the smallest currency  │
//! │  unit. Line prices, subtotals, header totals, report totals and profit  │
//! │  estimates are all i64 minor units, never floats.                       │
//! │                                                                         │
//! │    price (12000) × qty (2)        = subtotal (24000)                    │
//! │    Σ subtotal (24000) - discount  = header total                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ledger_core::money::Money;
//!
//! let price = Money::from_minor(1000);
//! let box_price = price.multiply_quantity(12);
//! assert_eq!(box_price.minor(), 12000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Signed so that intermediate results (an opname adjustment, a discount
/// larger than the subtotal) can be represented before clamping.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use ledger_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(12000);
    /// assert_eq!(unit_price.multiply_quantity(2).minor(), 24000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// [`multiply_quantity`](Self::multiply_quantity), or `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Returns `self` or zero, whichever is larger.
    ///
    /// ## Example
    /// ```rust
    /// use ledger_core::money::Money;
    ///
    /// let after_discount = Money::from_minor(500) - Money::from_minor(800);
    /// assert_eq!(after_discount.clamp_non_negative(), Money::zero());
    /// ```
    #[inline]
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain integer display with thousands separators, e.g. `24.000`.
///
/// For logs and error messages only; formatting for people happens in the
/// presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            write!(f, "-{}", grouped)
        } else {
            write!(f, "{}", grouped)
        }
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_quantity() {
        assert_eq!(Money::from_minor(1000).multiply_quantity(12).minor(), 12000);
        assert_eq!(
            Money::from_minor(1000).checked_multiply_quantity(12),
            Some(Money::from_minor(12000))
        );
        assert_eq!(Money::from_minor(i64::MAX / 2).checked_multiply_quantity(3), None);
        assert_eq!(Money::from_minor(1000) * 3, Money::from_minor(3000));
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_minor(-1).clamp_non_negative(), Money::zero());
        assert_eq!(
            Money::from_minor(42).clamp_non_negative(),
            Money::from_minor(42)
        );
    }

    #[test]
    fn test_sum() {
        let lines = [Money::from_minor(100), Money::from_minor(250)];
        let total: Money = lines.iter().sum();
        assert_eq!(total.minor(), 350);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_minor(24000).to_string(), "24.000");
        assert_eq!(Money::from_minor(1234567).to_string(), "1.234.567");
        assert_eq!(Money::from_minor(-500).to_string(), "-500");
        assert_eq!(Money::zero().to_string(), "0");
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&Money::from_minor(5000)).unwrap();
        assert_eq!(json, "5000");
        let back: Money = serde_json::from_str("5000").unwrap();
        assert_eq!(back, Money::from_minor(5000));
    }
}
