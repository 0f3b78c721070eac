//! # Unit Normalizer
//!
//! Converts a row's mixed-unit quantity (full cartons + loose pieces) into
//! a single piece count using the item's packing factor.
//!
//! ```text
//!   full = 2, pcs = 3, packing = 12
//!        │
//!        ▼
//!   normalized = 2 × 12 + 3 = 27 pieces
//! ```
//!
//! Pure functions of `(row, item)`; a missing item behaves as packing 1.

use rust_decimal::Decimal;

use crate::types::{Item, Row};

/// Pieces per carton for an optional item (1 when absent).
#[inline]
pub fn packing(item: Option<&Item>) -> Decimal {
    item.map(Item::packing).unwrap_or(Decimal::ONE)
}

/// Billable quantity in pieces: `full * packing + pcs`.
///
/// ## Example
/// ```rust
/// use tradedesk_core::quantity::normalized_qty;
/// use tradedesk_core::types::{Row, RowId};
/// use rust_decimal::Decimal;
///
/// let mut row = Row::empty(RowId(1));
/// row.full = Decimal::from(2);
/// row.pcs = Decimal::from(3);
///
/// // No item attached: packing defaults to 1
/// assert_eq!(normalized_qty(&row, None), Decimal::from(5));
/// ```
#[inline]
pub fn normalized_qty(row: &Row, item: Option<&Item>) -> Decimal {
    row.full.saturating_mul(packing(item)).saturating_add(row.pcs)
}

/// Free-goods quantity in pieces: `bonus_full * packing + bonus_pcs`.
#[inline]
pub fn normalized_bonus_qty(row: &Row, item: Option<&Item>) -> Decimal {
    row.bonus_full
        .saturating_mul(packing(item))
        .saturating_add(row.bonus_pcs)
}

/// Total pieces leaving (or entering) stock for a row, bonus included.
#[inline]
pub fn stock_usage(row: &Row, item: Option<&Item>) -> Decimal {
    normalized_qty(row, item).saturating_add(normalized_bonus_qty(row, item))
}
