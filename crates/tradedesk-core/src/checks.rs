//! # Cross-Row Checks
//!
//! Rules that look across rows (or compare a row against master data):
//!
//! ```text
//! ┌──────────────────┬──────────┬─────────────────────────────────────────┐
//! │ Check            │ Kinds    │ Outcome                                 │
//! ├──────────────────┼──────────┼─────────────────────────────────────────┤
//! │ Stock overshoot  │ Sale     │ blocks save until the user overrides    │
//! │ Loss sale        │ Sale     │ advisory row flag                       │
//! │ Credit limit     │ all      │ advisory form flag                      │
//! │ Trade-price drift│ Purchase │ asks whether to update prices on save   │
//! └──────────────────┴──────────┴─────────────────────────────────────────┘
//! ```
//!
//! None of these produce errors. They produce values the view and the save
//! flow act on.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::catalog::ItemIndex;
use crate::money::Money;
use crate::quantity::stock_usage;
use crate::types::{Account, Item, ItemId, Percent, Row, RowId, TransactionKind};

/// Largest trade-price difference that is not worth an update prompt.
///
/// The comparison is strict: a difference of exactly this amount is ignored.
pub const PRICE_DRIFT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

// =============================================================================
// Row Flags
// =============================================================================

/// Per-row advisory flags shown in the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RowFlags {
    /// The row's item is over-demanded across the whole form.
    pub stock_exceeded: bool,
    /// The rate is below every reference price of the item.
    pub is_loss: bool,
    /// Purchase rate is higher than the last purchase of the item.
    pub above_last_rate: bool,
}

// =============================================================================
// Stock Overshoot
// =============================================================================

/// An item whose combined demand exceeds its stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockShortfall {
    pub item_id: ItemId,
    pub title: String,
    /// Pieces requested across all rows, bonus included.
    #[ts(type = "number")]
    pub demand: Decimal,
    /// Pieces on hand.
    #[ts(type = "number")]
    pub stock: Decimal,
    /// Every row referencing the item.
    pub rows: Vec<RowId>,
}

/// Finds every item whose summed demand exceeds stock.
///
/// Demand is `normalized_qty + normalized_bonus_qty` summed over every row
/// that references the item, so splitting a quantity across duplicate rows
/// cannot hide an overshoot. Only sales consume stock; other kinds always
/// return an empty list. Results follow first-appearance order.
pub fn stock_shortfalls(
    kind: TransactionKind,
    rows: &[Row],
    index: &ItemIndex<'_>,
) -> Vec<StockShortfall> {
    if !kind.checks_stock() {
        return Vec::new();
    }

    let mut order: Vec<&Item> = Vec::new();
    let mut demand: HashMap<&ItemId, (Decimal, Vec<RowId>)> = HashMap::new();

    for row in rows {
        let Some(item) = index.get(row.item_id.as_ref()) else {
            continue;
        };
        let entry = demand.entry(&item.id).or_insert_with(|| {
            order.push(item);
            (Decimal::ZERO, Vec::new())
        });
        entry.0 = entry.0.saturating_add(stock_usage(row, Some(item)));
        entry.1.push(row.id);
    }

    order
        .into_iter()
        .filter_map(|item| {
            let (qty, row_ids) = demand.remove(&item.id)?;
            (qty > item.stock).then(|| StockShortfall {
                item_id: item.id.clone(),
                title: item.title.clone(),
                demand: qty,
                stock: item.stock,
                rows: row_ids,
            })
        })
        .collect()
}

// =============================================================================
// Loss Sale
// =============================================================================

/// Returns true when `rate` is strictly below the lowest non-zero reference
/// price of the item. Items without reference prices never flag.
pub fn is_loss(rate: Money, item: &Item) -> bool {
    item.reference_prices()
        .into_iter()
        .min()
        .is_some_and(|floor| rate < floor)
}

/// Returns true when a purchase row pays more than the item's last
/// purchase. Rows without history (or with a zero last rate) never flag.
pub fn above_last_rate(row: &Row) -> bool {
    row.history
        .as_ref()
        .map(|h| h.previous_trade_price)
        .is_some_and(|last| last.is_positive() && row.rate > last)
}

/// Computes the advisory flags for every row, in row order.
pub fn row_flags(kind: TransactionKind, rows: &[Row], index: &ItemIndex<'_>) -> Vec<RowFlags> {
    let short: Vec<RowId> = stock_shortfalls(kind, rows, index)
        .into_iter()
        .flat_map(|s| s.rows)
        .collect();

    rows.iter()
        .map(|row| {
            let item = index.get(row.item_id.as_ref());
            RowFlags {
                stock_exceeded: short.contains(&row.id),
                is_loss: kind.checks_loss() && item.is_some_and(|i| is_loss(row.rate, i)),
                above_last_rate: kind.checks_price_drift() && above_last_rate(row),
            }
        })
        .collect()
}

// =============================================================================
// Credit Limit
// =============================================================================

/// Returns true when the account has a positive credit limit and the
/// document's net exceeds it.
pub fn credit_limit_exceeded(account: Option<&Account>, net: Money) -> bool {
    account.is_some_and(|a| a.credit_limit.is_positive() && net > a.credit_limit)
}

// =============================================================================
// Trade-Price Drift
// =============================================================================

/// A proposed trade-price change for one item.
///
/// `new_price = rate + rate × markup% / 100`, proposed when it differs from
/// the current trade price by more than [`PRICE_DRIFT_TOLERANCE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdateCandidate {
    pub item_id: ItemId,
    pub title: String,
    /// Current trade price.
    pub old_price: Money,
    /// Purchase rate plus markup.
    pub new_price: Money,
    pub markup_percent: Percent,
    /// `new_price − rate`.
    pub markup_amount: Money,
    pub retail_price: Money,
}

/// Collects trade-price update candidates for a purchase.
///
/// Every row with a known item is checked, a zero rate included. One
/// candidate per item: the first row referencing it decides and later rows
/// of the same item are not compared.
pub fn price_update_candidates(
    rows: &[Row],
    index: &ItemIndex<'_>,
    markup: Percent,
) -> Vec<PriceUpdateCandidate> {
    let mut seen: Vec<&ItemId> = Vec::new();
    let mut candidates = Vec::new();

    for row in rows {
        let Some(item) = index.get(row.item_id.as_ref()) else {
            continue;
        };
        if seen.contains(&&item.id) {
            continue;
        }
        seen.push(&item.id);

        let markup_amount = row.rate.percent(markup);
        let implied = row.rate + markup_amount;
        if (implied - item.trade_price).abs().amount() > PRICE_DRIFT_TOLERANCE {
            candidates.push(PriceUpdateCandidate {
                item_id: item.id.clone(),
                title: item.title.clone(),
                old_price: item.trade_price,
                new_price: implied.round_cents(),
                markup_percent: markup,
                markup_amount: markup_amount.round_cents(),
                retail_price: item.retail_price,
            });
        }
    }

    candidates
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::types::{ItemHistory, PriceTier};

    fn item(id: &str, stock: i64) -> Item {
        Item {
            id: ItemId::new(id),
            title: id.to_string(),
            packing: Decimal::ONE,
            trade_price: Money::from_whole(100),
            retail_price: Money::from_whole(120),
            price_tiers: vec![PriceTier {
                category: "wholesale".to_string(),
                percent: Percent::from_whole(10),
            }],
            discount_percent: Percent::zero(),
            tax_percent: Percent::zero(),
            stock: Decimal::from(stock),
            company: None,
        }
    }

    fn catalog(items: Vec<Item>) -> Catalog {
        Catalog {
            items,
            ..Catalog::default()
        }
    }

    fn row(id: u32, item: &str, pcs: i64, rate: Money) -> Row {
        Row {
            item_id: Some(ItemId::new(item)),
            pcs: Decimal::from(pcs),
            rate,
            ..Row::empty(RowId(id))
        }
    }

    #[test]
    fn test_stock_demand_sums_duplicate_rows() {
        let cat = catalog(vec![item("A", 50)]);
        let rows = vec![
            row(1, "A", 30, Money::from_whole(120)),
            row(2, "A", 25, Money::from_whole(120)),
        ];

        let short = stock_shortfalls(TransactionKind::Sale, &rows, &cat.index());
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].demand, Decimal::from(55));
        assert_eq!(short[0].rows, vec![RowId(1), RowId(2)]);

        let flags = row_flags(TransactionKind::Sale, &rows, &cat.index());
        assert!(flags.iter().all(|f| f.stock_exceeded));
    }

    #[test]
    fn test_stock_counts_bonus() {
        let cat = catalog(vec![item("A", 10)]);
        let mut r = row(1, "A", 10, Money::from_whole(120));
        assert!(stock_shortfalls(TransactionKind::Sale, &[r.clone()], &cat.index()).is_empty());

        r.bonus_pcs = Decimal::ONE;
        assert_eq!(stock_shortfalls(TransactionKind::Sale, &[r], &cat.index()).len(), 1);
    }

    #[test]
    fn test_stock_not_checked_outside_sales() {
        let cat = catalog(vec![item("A", 0)]);
        let rows = vec![row(1, "A", 5, Money::from_whole(100))];
        assert!(stock_shortfalls(TransactionKind::Purchase, &rows, &cat.index()).is_empty());
        assert!(stock_shortfalls(TransactionKind::Return, &rows, &cat.index()).is_empty());
    }

    #[test]
    fn test_loss_is_strictly_below_lowest_reference() {
        // retail 120, wholesale tier 110
        let it = item("A", 0);
        assert!(!is_loss(Money::from_whole(110), &it));
        assert!(is_loss(Money::from_cents(10999), &it));
    }

    #[test]
    fn test_loss_ignores_items_without_references() {
        let mut it = item("A", 0);
        it.retail_price = Money::ZERO;
        it.trade_price = Money::ZERO;
        assert!(!is_loss(Money::from_whole(1), &it));
    }

    #[test]
    fn test_loss_only_flagged_for_sales() {
        let cat = catalog(vec![item("A", 100)]);
        let rows = vec![row(1, "A", 1, Money::from_whole(5))];
        assert!(row_flags(TransactionKind::Sale, &rows, &cat.index())[0].is_loss);
        assert!(!row_flags(TransactionKind::Purchase, &rows, &cat.index())[0].is_loss);
    }

    #[test]
    fn test_above_last_rate_is_strict() {
        let mut r = row(1, "A", 1, Money::from_whole(90));
        assert!(!above_last_rate(&r));

        r.history = Some(ItemHistory {
            item_id: ItemId::new("A"),
            previous_full: Decimal::ZERO,
            previous_pcs: Decimal::from(6),
            previous_retail_price: Money::from_whole(120),
            previous_trade_price: Money::from_whole(90),
            last_date: None,
            company: None,
        });
        assert!(!above_last_rate(&r));

        r.rate = Money::from_cents(9001);
        assert!(above_last_rate(&r));

        let cat = catalog(vec![item("A", 100)]);
        let rows = vec![r];
        assert!(row_flags(TransactionKind::Purchase, &rows, &cat.index())[0].above_last_rate);
        assert!(!row_flags(TransactionKind::Sale, &rows, &cat.index())[0].above_last_rate);
    }

    #[test]
    fn test_credit_limit() {
        let mut account = Account {
            id: "C1".to_string(),
            name: "Corner Store".to_string(),
            credit_limit: Money::from_whole(1000),
            credit_days: 30,
            markup_percent: Percent::zero(),
            price_category: None,
        };
        assert!(!credit_limit_exceeded(Some(&account), Money::from_whole(1000)));
        assert!(credit_limit_exceeded(Some(&account), Money::from_cents(100001)));

        account.credit_limit = Money::ZERO;
        assert!(!credit_limit_exceeded(Some(&account), Money::from_whole(1_000_000)));
        assert!(!credit_limit_exceeded(None, Money::from_whole(1_000_000)));
    }

    #[test]
    fn test_drift_tolerance_is_strict() {
        let mut it = item("A", 0);
        let rows = vec![row(1, "A", 1, Money::from_whole(100))];

        it.trade_price = Money::from_cents(11999);
        let cat = catalog(vec![it.clone()]);
        assert!(price_update_candidates(&rows, &cat.index(), Percent::from_whole(20)).is_empty());

        it.trade_price = Money::from_cents(11998);
        let cat = catalog(vec![it]);
        let found = price_update_candidates(&rows, &cat.index(), Percent::from_whole(20));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].new_price, Money::from_whole(120));
        assert_eq!(found[0].markup_amount, Money::from_whole(20));
        assert_eq!(found[0].old_price, Money::from_cents(11998));
    }

    #[test]
    fn test_drift_just_above_tolerance_is_flagged() {
        let mut it = item("A", 0);
        let rows = vec![row(1, "A", 1, Money::from_whole(100))];

        it.trade_price = Money::new(Decimal::new(119_989, 3));
        let cat = catalog(vec![it.clone()]);
        let found = price_update_candidates(&rows, &cat.index(), Percent::from_whole(20));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].new_price, Money::from_whole(120));

        it.trade_price = Money::new(Decimal::new(119_990, 3));
        let cat = catalog(vec![it]);
        assert!(price_update_candidates(&rows, &cat.index(), Percent::from_whole(20)).is_empty());
    }

    #[test]
    fn test_drift_checks_zero_rate_rows() {
        let cat = catalog(vec![item("A", 0)]);
        let rows = vec![row(1, "A", 1, Money::ZERO)];
        let found = price_update_candidates(&rows, &cat.index(), Percent::from_whole(20));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].new_price, Money::ZERO);
        assert_eq!(found[0].old_price, Money::from_whole(100));
        assert_eq!(found[0].markup_amount, Money::ZERO);
    }

    #[test]
    fn test_drift_first_row_per_item_wins() {
        let cat = catalog(vec![item("A", 0)]);
        let rows = vec![
            row(1, "A", 1, Money::from_whole(90)),
            row(2, "A", 1, Money::from_whole(150)),
        ];
        let found = price_update_candidates(&rows, &cat.index(), Percent::zero());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].new_price, Money::from_whole(90));
    }

    #[test]
    fn test_drift_later_duplicate_rows_are_not_compared() {
        let cat = catalog(vec![item("A", 0), item("B", 0)]);
        let rows = vec![
            row(1, "A", 1, Money::from_whole(100)),
            row(2, "A", 1, Money::from_whole(150)),
            row(3, "B", 1, Money::from_whole(80)),
        ];
        let found = price_update_candidates(&rows, &cat.index(), Percent::zero());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item_id, ItemId::new("B"));
    }
}
