//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 50% discount on a 33.35 top-up must come out to exactly 16.67 or    │
//! │  16.68 — and the same answer every time, on every machine.             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is an i64 count of the smallest currency unit.          │
//! │    Discounts use basis-point math in i128 with explicit rounding.       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use simflow_core::money::Money;
//!
//! let price = Money::from_cents(2500); // $25.00 top-up
//!
//! // 50% discount in basis points
//! let discount = price.percentage_of(5000);
//! assert_eq!(discount.cents(), 1250);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative intermediates (credit adjustments)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for the API boundary
///
/// Every amount in the system flows through this type: catalog prices,
/// order subtotals, discounts, credit balances, and invoice totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50, not -4.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
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

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity (line totals).
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the given basis-point fraction of this amount, rounded.
    ///
    /// ## Arguments
    /// * `bps` - basis points (1 bps = 0.01%; 5000 = 50%)
    ///
    /// ## Implementation
    /// Integer math in i128: `(amount * bps + 5000) / 10000`.
    /// The +5000 rounds the half-unit up, so the result is stable across
    /// retries and machines.
    ///
    /// ## Example
    /// ```rust
    /// use simflow_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(20000); // 200.00
    /// let half = subtotal.percentage_of(5000); // 50%
    /// assert_eq!(half.cents(), 10000);         // 100.00
    /// ```
    pub fn percentage_of(&self, bps: u32) -> Money {
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(part as i64)
    }

    /// Subtracts `other`, flooring the result at zero.
    ///
    /// Used wherever an amount must never go negative: order totals after
    /// discount, used credit after an invoice payment.
    #[inline]
    pub fn saturating_sub_floor_zero(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// The smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display is for logs and debugging. The frontend owns localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
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
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
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
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 50]
            .into_iter()
            .map(Money::from_cents)
            .sum();
        assert_eq!(total.cents(), 400);
    }

    #[test]
    fn test_percentage_of() {
        // 200.00 at 50% = 100.00
        let subtotal = Money::from_cents(20000);
        assert_eq!(subtotal.percentage_of(5000).cents(), 10000);

        // rounding: 10.01 at 50% = 5.005 → 5.01
        let odd = Money::from_cents(1001);
        assert_eq!(odd.percentage_of(5000).cents(), 501);
    }

    #[test]
    fn test_saturating_sub_floor_zero() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(1500);

        assert_eq!(a.saturating_sub_floor_zero(b).cents(), 0);
        assert_eq!(b.saturating_sub_floor_zero(a).cents(), 500);
    }

    #[test]
    fn test_min() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(1500);
        assert_eq!(a.min(b).cents(), 1000);
        assert_eq!(b.min(a).cents(), 1000);
    }
}
