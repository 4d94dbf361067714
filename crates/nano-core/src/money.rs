//! # Money Module
//!
//! Provides the `Money` type for handling cash amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  At the till this shows up as a drawer that is "short" by              │
//! │  0.000000001 pesos and never reconciles as balanced.                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    opening + sales − expenses is exact, always                          │
//! │    variance == 0 means the drawer really balanced                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use nano_core::money::Money;
//!
//! // Create from cents (preferred) or whole pesos
//! let opening = Money::from_major(5000);
//! let sale = Money::from_cents(1_200_50); // $1200.50
//!
//! let drawer = opening + sale;
//! assert_eq!(drawer.cents(), 620_050);
//!
//! // Operator-typed input goes through the parser, never through f64
//! assert_eq!("1200.50".parse::<Money>().unwrap(), sale);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;
use ts_rs::TS;

/// Number of minor units (cents) in one major unit (peso).
pub const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A cash amount in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: variances are negative when the drawer is short
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  Opening balance ──┐                                                    │
/// │                    ├──► expected total ──► variance = declared − total  │
/// │  Sales accrual ────┤                                                    │
/// │                    │                                                    │
/// │  Expenses ─────────┘  (subtracted only at close)                        │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use nano_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole pesos.
    ///
    /// ## Example
    /// ```rust
    /// use nano_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(5000).cents(), 500_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-peso portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
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
    ///
    /// ## Example
    /// ```rust
    /// use nano_core::money::Money;
    ///
    /// let shortage = Money::from_cents(-10_000);
    /// assert_eq!(shortage.abs(), Money::from_major(100));
    /// ```
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Subtracts, returning `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    #[inline]
    pub const fn checked_mul(self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds, clamping at the `i64` bounds. For display figures only.
    #[inline]
    pub const fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Parses an operator-typed amount such as `"5000"`, `"1200.5"` or
    /// `"1200,50"`.
    ///
    /// ## Rules
    /// ```text
    /// "5000"      → 5000.00
    /// "1200.5"    → 1200.50
    /// "1200,50"   → 1200.50   (comma accepted as decimal separator)
    /// "-100"      → -100.00   (sign checks belong to validation)
    /// ""          → Empty
    /// "12.345"    → TooManyDecimals
    /// "1e3", "NaN", "1.200,00" → Invalid
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, AmountParseError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(AmountParseError::Empty);
        }

        let (negative, unsigned) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let mut parts = unsigned.splitn(2, |c: char| c == '.' || c == ',');
        let whole = parts.next().unwrap_or_default();
        let fraction = parts.next().unwrap_or_default();

        if whole.is_empty() && fraction.is_empty() {
            return Err(AmountParseError::Invalid(raw.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(AmountParseError::Invalid(raw.to_string()));
        }
        if fraction.len() > 2 {
            return Err(AmountParseError::TooManyDecimals(raw.to_string()));
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| AmountParseError::Overflow(raw.to_string()))?
        };
        let fraction_value: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().unwrap_or(0) * 10,
            _ => fraction.parse::<i64>().unwrap_or(0),
        };

        let cents = whole_value
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|c| c.checked_add(fraction_value))
            .ok_or_else(|| AmountParseError::Overflow(raw.to_string()))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

/// Reasons an operator-typed amount could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,

    #[error("'{0}' is not a number")]
    Invalid(String),

    #[error("'{0}' has more than two decimal places")]
    TooManyDecimals(String),

    #[error("'{0}' is too large")]
    Overflow(String),
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as `$1200.50` (debugging and log output).
///
/// ## Note
/// The front end does its own localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl FromStr for Money {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse_decimal(s)
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a quantity (cart line totals).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing an iterator of Money (expense ledgers, cart lines).
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
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
