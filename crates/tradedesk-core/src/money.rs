//! # Money Module
//!
//! Provides the `Money` type for monetary values on transaction forms.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    120.00 - 119.99 = 0.010000000000005116  ❌ WRONG!                    │
//! │                                                                         │
//! │  The price-drift check compares against a 0.01 tolerance, so a float   │
//! │  would flag a delta that is exactly one paisa.                          │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal                                          │
//! │    120.00 - 119.99 = 0.01 exactly                                       │
//! │    Rates, percentages and piece counts all stay exact until an         │
//! │    aggregate is rounded on purpose.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tradedesk_core::money::Money;
//! use tradedesk_core::types::Percent;
//! use rust_decimal::Decimal;
//!
//! let rate = Money::from_cents(10_000);             // 100.00
//! let amount = rate.multiply_quantity(Decimal::from(27));
//! assert_eq!(amount, Money::from_cents(270_000));  // 2700.00
//!
//! let discount = amount.percent(Percent::from_whole(10));
//! assert_eq!(discount, Money::from_cents(27_000)); // 270.00
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percent;
use crate::MONEY_DECIMAL_PLACES;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the invoice currency.
///
/// ## Design Decisions
/// - **Decimal (signed)**: negative values appear in balances and refunds
/// - **Exact until rounded**: intermediate row amounts keep full precision;
///   only invoice aggregates are rounded, using the policy of the screen
/// - **Transparent serde**: travels as a plain JSON number
///
/// ## Where Money Flows
/// ```text
/// Item.trade_price / retail_price ──► Row.rate ──► row amount
///                                                    │
///                         discount / tax amounts ◄───┤
///                                                    ▼
///                              gross, discount, tax, net, receivable
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(#[ts(type = "number")] Decimal);

impl Money {
    /// Zero money value.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from hundredths of the currency unit.
    ///
    /// ## Example
    /// ```rust
    /// use tradedesk_core::money::Money;
    ///
    /// let price = Money::from_cents(11_999);
    /// assert_eq!(price.to_string(), "119.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub fn from_whole(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Returns the exact decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money::ZERO
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a per-piece rate by a piece count, saturating at the
    /// `Decimal` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use tradedesk_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let rate = Money::from_cents(250);
    /// assert_eq!(rate.multiply_quantity(Decimal::from(4)), Money::from_whole(10));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: Decimal) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `percent` of this amount (`amount * percent / 100`), unrounded
    /// and saturating.
    ///
    /// ## Example
    /// ```rust
    /// use tradedesk_core::money::Money;
    /// use tradedesk_core::types::Percent;
    ///
    /// let amount = Money::from_whole(900);
    /// assert_eq!(amount.percent(Percent::from_whole(5)), Money::from_whole(45));
    /// ```
    #[inline]
    pub fn percent(&self, percent: Percent) -> Self {
        Money(self.0.saturating_mul(percent.value()) / Decimal::ONE_HUNDRED)
    }

    /// Rounds to two decimal places, half away from zero.
    pub fn round_cents(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Rounds to whole currency units, half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use tradedesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(26_950).round_whole(), Money::from_whole(270));
    /// assert_eq!(Money::from_cents(26_949).round_whole(), Money::from_whole(269));
    /// ```
    pub fn round_whole(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount with two decimals and no currency symbol.
///
/// ## Note
/// Currency symbols and grouping belong to the presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.round_cents().0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
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
