//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A balance of 50 000 ₸ debited a thousand times by 49.90 ₸ drifts      │
//! │  away from the sum of the orders.                                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Tiyn (1/100 tenge)                              │
//! │    4990 tiyn × 1000 = 4 990 000 tiyn, exactly                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lowlow_core::money::Money;
//!
//! // Create from tiyn (preferred)
//! let price = Money::from_tiyn(249_000); // 2 490 ₸
//!
//! // Arithmetic operations
//! let doubled = price * 2;                    // 4 980 ₸
//! let total = price + Money::from_tenge(10);  // 2 500 ₸
//! assert_eq!(total.tiyn(), 250_000);
//! # let _ = doubled;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Tiyn per tenge.
const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in tiyn (1/100 of a tenge).
///
/// ## Design Decisions
/// - **i64 (signed)**: Differences between balances can go negative even
///   though stored balances never do
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Transparent serde**: serialises as a bare integer
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► OrderItem.price × quantity ──► Order.total          │
/// │                                                      │                  │
/// │                              ┌───────────────────────┴──────┐          │
/// │                              ▼                              ▼          │
/// │                     Card.balance -= total        User.balance -= total │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from tiyn (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use lowlow_core::money::Money;
    ///
    /// let price = Money::from_tiyn(1099); // 10.99 ₸
    /// assert_eq!(price.tiyn(), 1099);
    /// ```
    #[inline]
    pub const fn from_tiyn(tiyn: i64) -> Self {
        Money(tiyn)
    }

    /// Creates a Money value from whole tenge.
    ///
    /// Configuration and the seeded demo data speak whole tenge.
    #[inline]
    pub const fn from_tenge(tenge: i64) -> Self {
        Money(tenge * MINOR_PER_MAJOR)
    }

    /// Creates a Money value from tenge and tiyn.
    ///
    /// ## Example
    /// ```rust
    /// use lowlow_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99);
    /// assert_eq!(price.tiyn(), 1099);
    ///
    /// let negative = Money::from_major_minor(-5, 50);
    /// assert_eq!(negative.tiyn(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * MINOR_PER_MAJOR - minor)
        } else {
            Money(major * MINOR_PER_MAJOR + minor)
        }
    }

    /// Converts a decimal amount as found in legacy JSON (`2490`, `49.9`).
    ///
    /// Rounds to the nearest tiyn. Non-finite input yields zero.
    ///
    /// ```rust
    /// use lowlow_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(49.9).tiyn(), 4990);
    /// assert_eq!(Money::from_decimal(f64::NAN).tiyn(), 0);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money((amount * MINOR_PER_MAJOR as f64).round() as i64)
    }

    /// Returns the value in tiyn.
    #[inline]
    pub const fn tiyn(&self) -> i64 {
        self.0
    }

    /// Returns the whole-tenge portion.
    #[inline]
    pub const fn tenge(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the tiyn portion (always 0-99).
    #[inline]
    pub const fn tiyn_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    /// Returns the amount as a decimal number of tenge.
    ///
    /// Only for the legacy JSON export, which stores plain numbers.
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
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
    /// ## Example
    /// ```rust
    /// use lowlow_core::money::Money;
    ///
    /// let unit_price = Money::from_tenge(990);
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.tiyn(), 297_000);
    /// ```
    ///
    /// Saturates at the `i64` bounds; use [`Money::checked_mul`] where an
    /// overflow must be rejected.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_mul(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtraction that refuses to go below zero.
    ///
    /// Returns `None` when `other` exceeds `self`. Used for every balance
    /// debit so a stored balance can never turn negative.
    pub fn checked_debit(&self, other: Money) -> Option<Money> {
        if other.0 > self.0 {
            None
        } else {
            Some(Money(self.0 - other.0))
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows tenge with two decimals and the currency sign after the
/// amount, e.g. `2490.00 ₸`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02} ₸",
            sign,
            self.tenge().abs(),
            self.tiyn_part()
        )
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

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Saturating, so summing untrusted amounts never panics.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| Money(acc.0.saturating_add(m.0)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
