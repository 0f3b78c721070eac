//! # Line & Invoice Totals Calculator
//!
//! Derives each row's monetary amounts and the invoice aggregates.
//!
//! ## Per-Document Accounting Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  amount   = normalized_qty × rate          (bonus never billed)         │
//! │  discount = amount × disc% / 100                                        │
//! │                                                                         │
//! │  Purchase (create)   tax = 0                                            │
//! │  Purchase (edit)     tax = amount × tax% / 100                          │
//! │  Sale                tax = amount × tax% / 100                          │
//! │  Return              tax = (amount − discount) × tax% / 100             │
//! │                                                                         │
//! │  net = gross − discount + tax + freight                                 │
//! │                                                                         │
//! │  Purchase (create)   gross, discount rounded to whole units             │
//! │  everything else     aggregates rounded to two decimals                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sale/return difference in tax base is a real difference between the
//! two documents and is kept per kind.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::quantity::normalized_qty;
use crate::types::{FormMode, Item, Row, TransactionKind};

/// What the row tax percentage is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxBasis {
    /// Tax is not modeled.
    None,
    /// Tax on the undiscounted amount.
    Gross,
    /// Tax on the amount after discount.
    Discounted,
}

/// How invoice aggregates are rounded before netting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Gross and discount to whole currency units.
    WholeUnits,
    /// Every aggregate to two decimals.
    Cents,
}

/// Amounts derived for a single row (unrounded).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineAmounts {
    /// `normalized_qty × rate`.
    pub amount: Money,
    /// Absolute discount.
    pub discount: Money,
    /// Base the tax was computed on.
    pub taxable: Money,
    /// Absolute tax.
    pub tax: Money,
    /// Row total shown in the grid.
    pub total: Money,
}

/// Invoice-level inputs that are not rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Adjustments {
    /// Flat freight / courier charge.
    pub freight: Money,
    /// Account balance before this document.
    pub previous_balance: Money,
    /// Cash received (or paid) immediately.
    pub cash_received: Money,
}

/// Invoice aggregates.
///
/// Always a pure function of the rows and [`Adjustments`]; never edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub gross: Money,
    pub discount: Money,
    pub tax: Money,
    pub freight: Money,
    pub net: Money,
    pub previous_balance: Money,
    pub cash_received: Money,
    /// `net + previous_balance − cash_received`.
    pub total_receivable: Money,
    /// Amount paid against this document (the cash received).
    pub paid: Money,
    /// `net − paid`.
    pub remaining: Money,
}

/// Totals calculator bound to one document kind and form mode.
///
/// ## Example
/// ```rust
/// use tradedesk_core::totals::{Adjustments, Calculator};
/// use tradedesk_core::types::{FormMode, TransactionKind};
///
/// let calc = Calculator::new(TransactionKind::Sale, FormMode::Create);
/// let totals = calc.invoice(std::iter::empty(), &Adjustments::default());
/// assert!(totals.net.is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calculator {
    kind: TransactionKind,
    mode: FormMode,
}

impl Calculator {
    pub fn new(kind: TransactionKind, mode: FormMode) -> Self {
        Calculator { kind, mode }
    }

    /// Tax treatment for this document.
    pub fn tax_basis(&self) -> TaxBasis {
        match (self.kind, self.mode) {
            (TransactionKind::Purchase, FormMode::Create) => TaxBasis::None,
            (TransactionKind::Purchase, FormMode::Edit) => TaxBasis::Gross,
            (TransactionKind::Sale, _) => TaxBasis::Gross,
            (TransactionKind::Return, _) => TaxBasis::Discounted,
        }
    }

    /// Aggregate rounding for this document.
    pub fn rounding(&self) -> Rounding {
        match (self.kind, self.mode) {
            (TransactionKind::Purchase, FormMode::Create) => Rounding::WholeUnits,
            _ => Rounding::Cents,
        }
    }

    /// Computes a row's amounts. A row without a (known) item contributes
    /// nothing.
    pub fn line(&self, row: &Row, item: Option<&Item>) -> LineAmounts {
        let Some(item) = item else {
            return LineAmounts::default();
        };

        let amount = row.rate.multiply_quantity(normalized_qty(row, Some(item)));
        let discount = amount.percent(row.discount_percent);

        let taxable = match self.tax_basis() {
            TaxBasis::None => Money::ZERO,
            TaxBasis::Gross => amount,
            TaxBasis::Discounted => amount - discount,
        };
        let tax = taxable.percent(row.tax_percent);

        let total = match self.tax_basis() {
            TaxBasis::Discounted => taxable + tax,
            TaxBasis::None | TaxBasis::Gross => amount - discount + tax,
        };

        LineAmounts {
            amount,
            discount,
            taxable,
            tax,
            total,
        }
    }

    /// Aggregates row amounts into invoice totals.
    pub fn invoice<'a, I>(&self, lines: I, adjustments: &Adjustments) -> InvoiceTotals
    where
        I: IntoIterator<Item = &'a LineAmounts>,
    {
        let (gross, discount, tax) = lines.into_iter().fold(
            (Money::ZERO, Money::ZERO, Money::ZERO),
            |(g, d, t), line| (g + line.amount, d + line.discount, t + line.tax),
        );

        let (gross, discount, tax) = match self.rounding() {
            Rounding::WholeUnits => (gross.round_whole(), discount.round_whole(), tax.round_whole()),
            Rounding::Cents => (gross.round_cents(), discount.round_cents(), tax.round_cents()),
        };

        let freight = adjustments.freight;
        let net = gross - discount + tax + freight;
        let paid = adjustments.cash_received;

        InvoiceTotals {
            gross,
            discount,
            tax,
            freight,
            net,
            previous_balance: adjustments.previous_balance,
            cash_received: adjustments.cash_received,
            total_receivable: net + adjustments.previous_balance - adjustments.cash_received,
            paid,
            remaining: net - paid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemId, Percent, RowId};
    use rust_decimal::Decimal;

    fn item(packing: i64) -> Item {
        Item {
            id: ItemId::new("A"),
            title: "A".to_string(),
            packing: Decimal::from(packing),
            trade_price: Money::from_whole(100),
            retail_price: Money::from_whole(120),
            price_tiers: vec![],
            discount_percent: Percent::zero(),
            tax_percent: Percent::zero(),
            stock: Decimal::from(1000),
            company: None,
        }
    }

    fn row(full: i64, pcs: i64, rate: Money, disc: i64, tax: i64) -> Row {
        Row {
            item_id: Some(ItemId::new("A")),
            full: Decimal::from(full),
            pcs: Decimal::from(pcs),
            rate,
            discount_percent: Percent::from_whole(disc),
            tax_percent: Percent::from_whole(tax),
            ..Row::empty(RowId(1))
        }
    }

    #[test]
    fn test_bonus_is_not_billed() {
        let calc = Calculator::new(TransactionKind::Sale, FormMode::Create);
        let it = item(12);
        let mut r = row(1, 0, Money::from_whole(10), 0, 0);
        let before = calc.line(&r, Some(&it));
        r.bonus_full = Decimal::from(5);
        r.bonus_pcs = Decimal::from(7);
        assert_eq!(calc.line(&r, Some(&it)).amount, before.amount);
        assert_eq!(before.amount, Money::from_whole(120));
    }

    #[test]
    fn test_missing_item_contributes_nothing() {
        let calc = Calculator::new(TransactionKind::Sale, FormMode::Create);
        let r = row(3, 4, Money::from_whole(10), 10, 5);
        assert_eq!(calc.line(&r, None), LineAmounts::default());
    }

    #[test]
    fn test_sale_tax_is_on_gross() {
        let calc = Calculator::new(TransactionKind::Sale, FormMode::Create);
        let line = calc.line(&row(0, 10, Money::from_whole(100), 10, 5), Some(&item(1)));
        assert_eq!(line.amount, Money::from_whole(1000));
        assert_eq!(line.discount, Money::from_whole(100));
        assert_eq!(line.tax, Money::from_whole(50));
        assert_eq!(line.total, Money::from_whole(950));
    }

    #[test]
    fn test_return_tax_is_on_discounted_base() {
        let calc = Calculator::new(TransactionKind::Return, FormMode::Create);
        let line = calc.line(&row(0, 10, Money::from_whole(100), 10, 5), Some(&item(1)));
        assert_eq!(line.taxable, Money::from_whole(900));
        assert_eq!(line.tax, Money::from_whole(45));
        assert_eq!(line.total, Money::from_whole(945));
    }

    #[test]
    fn test_purchase_create_ignores_tax_but_edit_models_it() {
        let r = row(0, 10, Money::from_whole(100), 10, 5);
        let it = item(1);

        let create = Calculator::new(TransactionKind::Purchase, FormMode::Create);
        assert!(create.line(&r, Some(&it)).tax.is_zero());

        let edit = Calculator::new(TransactionKind::Purchase, FormMode::Edit);
        let line = edit.line(&r, Some(&it));
        assert_eq!(line.tax, Money::from_whole(50));
        assert_eq!(line.total, Money::from_whole(950));
    }

    #[test]
    fn test_purchase_create_rounds_to_whole_units() {
        let calc = Calculator::new(TransactionKind::Purchase, FormMode::Create);
        let it = item(1);
        // 3 × 33.35 = 100.05 ; 7.5% = 7.50375
        let mut r = row(0, 3, Money::from_cents(3335), 0, 0);
        r.discount_percent = Percent::new(Decimal::new(75, 1));
        let line = calc.line(&r, Some(&it));
        let totals = calc.invoice([&line], &Adjustments::default());
        assert_eq!(totals.gross, Money::from_whole(100));
        assert_eq!(totals.discount, Money::from_whole(8));
        assert_eq!(totals.net, Money::from_whole(92));
    }

    #[test]
    fn test_sale_rounds_to_cents() {
        let calc = Calculator::new(TransactionKind::Sale, FormMode::Create);
        let mut r = row(0, 3, Money::from_cents(3335), 0, 0);
        r.discount_percent = Percent::new(Decimal::new(75, 1));
        let line = calc.line(&r, Some(&item(1)));
        let totals = calc.invoice([&line], &Adjustments::default());
        assert_eq!(totals.gross, Money::from_cents(10005));
        assert_eq!(totals.discount, Money::from_cents(750));
        assert_eq!(totals.net, Money::from_cents(9255));
    }

    #[test]
    fn test_receivable_and_remaining() {
        let calc = Calculator::new(TransactionKind::Sale, FormMode::Create);
        let line = calc.line(&row(0, 10, Money::from_whole(100), 0, 0), Some(&item(1)));
        let adjustments = Adjustments {
            freight: Money::from_whole(50),
            previous_balance: Money::from_whole(300),
            cash_received: Money::from_whole(200),
        };
        let totals = calc.invoice([&line], &adjustments);
        assert_eq!(totals.net, Money::from_whole(1050));
        assert_eq!(totals.total_receivable, Money::from_whole(1150));
        assert_eq!(totals.paid, Money::from_whole(200));
        assert_eq!(totals.remaining, Money::from_whole(850));
    }
}
