//! # Domain Types
//!
//! Core domain types used by every transaction form.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │       Row       │   │     Account     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, title      │   │  id (local)     │   │  id, name       │       │
//! │  │  packing        │◄──│  item_id?       │   │  credit_limit   │       │
//! │  │  trade/retail   │   │  full, pcs      │   │  markup %       │       │
//! │  │  price tiers    │   │  bonus full/pcs │   │  price category │       │
//! │  │  stock (pcs)    │   │  rate, disc, tax│   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ TransactionKind │   │    FormMode     │   │     Percent     │       │
//! │  │  Purchase       │   │  Create         │   │  10 = 10%       │       │
//! │  │  Sale           │   │  Edit           │   └─────────────────┘       │
//! │  │  Return         │   └─────────────────┘                             │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - `ItemId` and the other master-data ids come from the backend.
//! - `RowId` is form-local: a monotonic counter, never sent to the backend.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Percent
// =============================================================================

/// A percentage as entered on the form (10 = 10%).
///
/// ## Why Not Basis Points?
/// Discount and tax percentages are typed by hand and may carry any number
/// of decimals (e.g. 12.375%). Keeping the exact decimal avoids a second
/// rounding step before amounts are computed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Percent(#[ts(type = "number")] Decimal);

impl Percent {
    /// Creates a percentage from its decimal value.
    #[inline]
    pub const fn new(value: Decimal) -> Self {
        Percent(value)
    }

    /// Creates a percentage from a whole number (10 → 10%).
    #[inline]
    pub fn from_whole(value: i64) -> Self {
        Percent(Decimal::from(value))
    }

    /// Returns the percentage value (10 for 10%).
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percent(Decimal::ZERO)
    }

    /// Checks if the percentage is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

// =============================================================================
// Transaction Kind & Form Mode
// =============================================================================

/// The kind of document a form produces.
///
/// Each kind carries its own accounting treatment for tax, rounding and
/// which cross-row checks apply.
///
/// ```text
/// ┌──────────┬──────────────────────┬─────────────┬──────┬───────┐
/// │ Kind     │ Tax base             │ Stock check │ Loss │ Drift │
/// ├──────────┼──────────────────────┼─────────────┼──────┼───────┤
/// │ Purchase │ gross (edit only)    │     no      │  no  │  yes  │
/// │ Sale     │ gross                │     yes     │  yes │  no   │
/// │ Return   │ gross - discount     │     no      │  no  │  no   │
/// └──────────┴──────────────────────┴─────────────┴──────┴───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Goods received from a supplier (increases stock).
    Purchase,
    /// Goods sold to a customer (decreases stock).
    Sale,
    /// Goods returned by a customer (increases stock).
    Return,
}

impl TransactionKind {
    /// Sales consume stock, so only they check for overshoot.
    pub fn checks_stock(&self) -> bool {
        matches!(self, TransactionKind::Sale)
    }

    /// Loss-sale pricing only applies when selling.
    pub fn checks_loss(&self) -> bool {
        matches!(self, TransactionKind::Sale)
    }

    /// Trade-price drift is evaluated on purchases at save time.
    pub fn checks_price_drift(&self) -> bool {
        matches!(self, TransactionKind::Purchase)
    }

    /// Customer-side documents (sales and sales returns) carry the
    /// account's running balance; purchases do not.
    pub fn tracks_balance(&self) -> bool {
        matches!(self, TransactionKind::Sale | TransactionKind::Return)
    }

    /// Wire name used in URLs and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Sale => "sale",
            TransactionKind::Return => "return",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "purchase" => Ok(TransactionKind::Purchase),
            "sale" | "sales" => Ok(TransactionKind::Sale),
            "return" | "sale_return" | "sales_return" => Ok(TransactionKind::Return),
            other => Err(CoreError::UnknownKind(other.to_string())),
        }
    }
}

/// Whether the form creates a new document or edits a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    #[default]
    Create,
    Edit,
}

// =============================================================================
// Item (master data)
// =============================================================================

/// Backend identifier of a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A markup-based alternate price keyed by customer category.
///
/// The tier price is `trade_price + trade_price * percent / 100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    /// Customer category this tier applies to (e.g. "wholesale").
    pub category: String,
    /// Markup over trade price.
    pub percent: Percent,
}

/// A catalog item, read-only to the engine.
///
/// ## Invariants
/// - `packing >= 1` (ingestion replaces zero/missing packing with 1)
/// - All numeric fields are present; "might be missing" is resolved when
///   the backend record is ingested (see [`crate::catalog::RawItem`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,

    /// Display title shown in the item picker.
    pub title: String,

    /// Pieces per full carton.
    #[ts(type = "number")]
    pub packing: Decimal,

    /// Cost-side reference price (per piece).
    pub trade_price: Money,

    /// Customer-facing reference price (per piece).
    pub retail_price: Money,

    /// Alternate sale price points (sales contexts only).
    pub price_tiers: Vec<PriceTier>,

    /// Default discount percentage for new rows.
    pub discount_percent: Percent,

    /// Default tax percentage for new rows.
    pub tax_percent: Percent,

    /// Current stock in pieces.
    #[ts(type = "number")]
    pub stock: Decimal,

    /// Company / brand label.
    pub company: Option<String>,
}

impl Item {
    /// Pieces per carton, never below one.
    #[inline]
    pub fn packing(&self) -> Decimal {
        if self.packing < Decimal::ONE {
            Decimal::ONE
        } else {
            self.packing
        }
    }

    /// Price derived from the tier for `category`, if the item defines one.
    pub fn tier_price(&self, category: &str) -> Option<Money> {
        self.price_tiers
            .iter()
            .find(|t| t.category.eq_ignore_ascii_case(category))
            .map(|t| self.trade_price + self.trade_price.percent(t.percent))
    }

    /// All tier prices, in catalog order.
    pub fn tier_prices(&self) -> impl Iterator<Item = Money> + '_ {
        self.price_tiers
            .iter()
            .map(|t| self.trade_price + self.trade_price.percent(t.percent))
    }

    /// Non-zero reference price points used for loss detection.
    pub fn reference_prices(&self) -> Vec<Money> {
        std::iter::once(self.retail_price)
            .chain(self.tier_prices())
            .filter(|p| !p.is_zero())
            .collect()
    }

    /// Rate a freshly assigned row starts with.
    ///
    /// - Purchase: trade price
    /// - Sale / Return: the tier price for the customer's category when the
    ///   item defines one, otherwise the retail price
    pub fn default_rate(&self, kind: TransactionKind, category: Option<&str>) -> Money {
        match kind {
            TransactionKind::Purchase => self.trade_price,
            TransactionKind::Sale | TransactionKind::Return => category
                .and_then(|c| self.tier_price(c))
                .unwrap_or(self.retail_price),
        }
    }
}

// =============================================================================
// Counterparties & Header Options
// =============================================================================

/// A customer or supplier account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,

    /// Credit limit; zero means no limit is enforced.
    pub credit_limit: Money,

    /// Credit terms in days.
    pub credit_days: u32,

    /// Markup applied to purchase rates to derive the new trade price.
    pub markup_percent: Percent,

    /// Price tier category used to derive sale rates.
    pub price_category: Option<String>,
}

/// A salesman selectable on sale documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Salesman {
    pub id: String,
    pub name: String,
}

/// A firm / branding option printed on the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Firm {
    pub id: String,
    pub name: String,
}

/// A message-line template printed at the foot of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MessageLine {
    pub id: String,
    pub text: String,
}

/// Print layout chosen for the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PrintFormat {
    /// Full page invoice.
    #[default]
    A4,
    /// Half page invoice.
    A5,
    /// 80mm roll receipt.
    Thermal,
}

impl FromStr for PrintFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a4" => Ok(PrintFormat::A4),
            "a5" => Ok(PrintFormat::A5),
            "thermal" | "receipt" => Ok(PrintFormat::Thermal),
            other => Err(CoreError::UnknownPrintFormat(other.to_string())),
        }
    }
}

// =============================================================================
// Item History
// =============================================================================

/// Last transaction recorded for an item (advisory only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemHistory {
    pub item_id: ItemId,
    #[ts(type = "number")]
    pub previous_full: Decimal,
    #[ts(type = "number")]
    pub previous_pcs: Decimal,
    pub previous_retail_price: Money,
    pub previous_trade_price: Money,
    #[ts(as = "Option<String>")]
    pub last_date: Option<NaiveDate>,
    pub company: Option<String>,
}

// =============================================================================
// Row
// =============================================================================

/// Form-local row identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct RowId(pub u32);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row#{}", self.0)
    }
}

/// A line item being edited on a transaction form.
///
/// ## Invariants
/// - Quantities, rate, discount % and tax % are non-negative (input is
///   coerced, see [`crate::coerce`]).
/// - The row amount is never stored: it is derived on every view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: RowId,

    /// Attached item; `None` is a placeholder row.
    pub item_id: Option<ItemId>,

    /// Full cartons.
    #[ts(type = "number")]
    pub full: Decimal,

    /// Loose pieces.
    #[ts(type = "number")]
    pub pcs: Decimal,

    /// Bonus cartons (free goods).
    #[ts(type = "number")]
    pub bonus_full: Decimal,

    /// Bonus loose pieces (free goods).
    #[ts(type = "number")]
    pub bonus_pcs: Decimal,

    /// Rate per piece.
    pub rate: Money,

    pub discount_percent: Percent,
    pub tax_percent: Percent,

    /// Last-transaction info, once its lookup resolves.
    pub history: Option<ItemHistory>,
}

impl Row {
    /// Creates an unassigned, all-zero row.
    pub fn empty(id: RowId) -> Self {
        Row {
            id,
            item_id: None,
            full: Decimal::ZERO,
            pcs: Decimal::ZERO,
            bonus_full: Decimal::ZERO,
            bonus_pcs: Decimal::ZERO,
            rate: Money::ZERO,
            discount_percent: Percent::zero(),
            tax_percent: Percent::zero(),
            history: None,
        }
    }

    /// Creates a row pre-filled from an item's defaults.
    pub fn for_item(id: RowId, item: &Item, kind: TransactionKind, category: Option<&str>) -> Self {
        Row {
            item_id: Some(item.id.clone()),
            rate: item.default_rate(kind, category),
            discount_percent: item.discount_percent,
            tax_percent: item.tax_percent,
            ..Row::empty(id)
        }
    }

    /// Returns true when no item is attached.
    pub fn is_placeholder(&self) -> bool {
        self.item_id.is_none()
    }
}

/// A numeric row field the user can type into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RowField {
    Full,
    Pcs,
    BonusFull,
    BonusPcs,
    Rate,
    DiscountPercent,
    TaxPercent,
}

// =============================================================================
// Prior Documents (edit / return flows)
// =============================================================================

/// A stored invoice loaded back into a form.
///
/// Lines carry absolute discount and tax amounts, as they were submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriorInvoice {
    pub invoice_id: String,
    pub kind: TransactionKind,
    pub invoice_number: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub account_id: Option<String>,
    pub salesman_id: Option<String>,
    pub firm_id: Option<String>,
    pub message_line_id: Option<String>,
    pub freight: Money,
    pub cash_received: Money,
    pub lines: Vec<PriorLine>,
}

/// One stored line of a [`PriorInvoice`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriorLine {
    pub item_id: ItemId,
    #[ts(type = "number")]
    pub cartons: Decimal,
    #[ts(type = "number")]
    pub pieces: Decimal,
    #[ts(type = "number")]
    pub bonus_cartons: Decimal,
    #[ts(type = "number")]
    pub bonus_pieces: Decimal,
    pub rate: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
