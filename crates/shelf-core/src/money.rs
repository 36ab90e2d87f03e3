//! # Money Module
//!
//! Provides the `Money` type for handling prices and totals safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (cents, kopecks, ...)                │
//! │    "850.00" is stored as 85000 and every sum is exact                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::money::Money;
//!
//! let price = Money::from_cents(85_000);      // 850.00
//! let line_total = price.multiply_quantity(2); // 1700.00
//! assert_eq!(line_total.to_string(), "1700.00");
//!
//! // Prices arrive from clients as decimal strings
//! let parsed: Money = "600.5".parse().unwrap();
//! assert_eq!(parsed.cents(), 60_050);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  Book.price_cents ──┬──► CartLine.line_total ──► Cart total            │
/// │                     │                                                   │
/// │                     └──► OrderItem.price_cents (frozen at checkout)    │
/// │                                                                         │
/// │  Order.total_cents = Σ line totals at the moment of checkout           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use shelf_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
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
    /// use shelf_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(850, 0).cents(), 85_000);
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in minor units.
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
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// Use [`Money::checked_mul`] where an overflow must be reported.
    ///
    /// ## Example
    /// ```rust
    /// use shelf_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(60_000);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 180_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies by a quantity, `None` on overflow.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a non-negative decimal string with at most two fractional digits.
///
/// Accepted: `"850"`, `"850.5"`, `"850.50"`. Rejected: `"-1"`, `"1.234"`,
/// `"abc"`, `""`.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "price".to_string(),
            });
        }

        let (major_str, minor_str) = match s.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s, ""),
        };

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a non-negative decimal number"));
        }
        if minor_str.len() > 2 || !minor_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("at most two decimal places are allowed"));
        }

        let major: i64 = major_str
            .parse()
            .map_err(|_| invalid("value is too large"))?;
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => minor_str.parse().map_err(|_| invalid("bad fraction"))?,
        };

        major
            .checked_mul(100)
            .and_then(|m| m.checked_add(minor))
            .map(Money)
            .ok_or_else(|| invalid("value is too large"))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as a plain decimal with two fractional digits: `1700.00`.
///
/// The currency symbol is the frontend's concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
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

/// Multiplication by a quantity. Saturates like the other operators.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
