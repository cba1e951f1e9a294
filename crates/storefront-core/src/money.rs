//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In the browser (IEEE-754 doubles):                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 10% promotion on 19,999 đ:                                           │
//! │    19999 * 10 / 100 = 1999.9  → which đồng does the customer pay?      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Every amount is an i64 count of the smallest currency unit.          │
//! │    Percentages round half up to the nearest minor unit, explicitly.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let price = Money::from_minor(250_000);
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.minor(), 750_000);
//!
//! let ten_percent = line.percentage(10);
//! assert_eq!(ten_percent.minor(), 75_000);
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
/// ## Design Decisions
/// - **i64 (signed)**: subtraction never wraps silently; negative values are
///   representable so invariants can be asserted rather than assumed
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Newtype serde**: serializes as a bare JSON number
///
/// ## Where Money Flows
/// ```text
/// LineItem.unit_price ──► line_total ──► subtotal ──┬──► product discount
///                                                   │
/// shipping_fee ─────────────────────────────────────┼──► shipping discount
///                                                   ▼
///                                              grand_total
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let fee = Money::from_minor(40_000);
    /// assert_eq!(fee.minor(), 40_000);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
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

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(299);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `pct` percent of this amount, rounded half up to the nearest
    /// minor unit.
    ///
    /// Uses i128 intermediates so large order values cannot overflow.
    ///
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(1_000_000).percentage(10).minor(), 100_000);
    /// // 19,999 × 10% = 1,999.9 → 2,000
    /// assert_eq!(Money::from_minor(19_999).percentage(10).minor(), 2_000);
    /// ```
    pub fn percentage(&self, pct: i64) -> Money {
        let scaled = self.0 as i128 * pct as i128;
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        Money(rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Clamps this amount into `[0, upper]`.
    ///
    /// A negative `upper` is treated as zero.
    ///
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let upper = Money::from_minor(300_000);
    /// assert_eq!(Money::from_minor(500_000).clamp_to(upper), upper);
    /// assert_eq!(Money::from_minor(-5).clamp_to(upper), Money::zero());
    /// ```
    #[inline]
    pub fn clamp_to(self, upper: Money) -> Money {
        let upper = upper.max(Money::zero());
        self.max(Money::zero()).min(upper)
    }

    /// Subtraction that stops at zero instead of going negative.
    #[inline]
    pub fn saturating_sub_to_zero(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display groups minor units by thousands (`18,000,000`).
///
/// ## Note
/// For debugging and log output only. The browser formats amounts for the
/// active locale and currency.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
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

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_minor(18_000_000).to_string(), "18,000,000");
        assert_eq!(Money::from_minor(999).to_string(), "999");
        assert_eq!(Money::from_minor(1_000).to_string(), "1,000");
        assert_eq!(Money::from_minor(-40_000).to_string(), "-40,000");
        assert_eq!(Money::zero().to_string(), "0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_minor(100), Money::from_minor(250)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.minor(), 350);

        let empty: Money = Vec::<Money>::new().into_iter().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(Money::from_minor(1_000_000).percentage(50).minor(), 500_000);
        assert_eq!(Money::from_minor(15).percentage(10).minor(), 2); // 1.5 → 2
        assert_eq!(Money::from_minor(14).percentage(10).minor(), 1); // 1.4 → 1
        assert_eq!(Money::from_minor(40_000).percentage(0).minor(), 0);
    }

    #[test]
    fn test_percentage_large_amount_does_not_overflow() {
        let big = Money::from_minor(i64::MAX / 2);
        assert!(big.percentage(100).is_positive());
    }

    #[test]
    fn test_arithmetic_saturates() {
        let big = Money::from_minor(i64::MAX / 2 + 1);
        assert_eq!((big + big).minor(), i64::MAX);
        assert_eq!([big, big, big].iter().sum::<Money>().minor(), i64::MAX);
        assert_eq!((Money::from_minor(i64::MIN) - big).minor(), i64::MIN);

        let mut total = big;
        total += big;
        assert_eq!(total.minor(), i64::MAX);
    }

    #[test]
    fn test_clamp_to() {
        let upper = Money::from_minor(300);
        assert_eq!(Money::from_minor(500).clamp_to(upper).minor(), 300);
        assert_eq!(Money::from_minor(200).clamp_to(upper).minor(), 200);
        assert_eq!(Money::from_minor(-1).clamp_to(upper).minor(), 0);
        assert_eq!(Money::from_minor(10).clamp_to(Money::from_minor(-3)).minor(), 0);
    }

    #[test]
    fn test_saturating_sub_to_zero() {
        let a = Money::from_minor(100);
        assert_eq!(a.saturating_sub_to_zero(Money::from_minor(30)).minor(), 70);
        assert_eq!(a.saturating_sub_to_zero(Money::from_minor(300)).minor(), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_minor(100).is_positive());
        assert!(Money::from_minor(-100).is_negative());
    }

    #[test]
    fn test_serializes_as_bare_number() {
        let json = serde_json::to_string(&Money::from_minor(40_000)).unwrap();
        assert_eq!(json, "40000");
        let back: Money = serde_json::from_str("40000").unwrap();
        assert_eq!(back, Money::from_minor(40_000));
    }
}
