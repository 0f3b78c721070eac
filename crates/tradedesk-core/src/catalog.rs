//! # Catalog Snapshot
//!
//! Reference data loaded once when a form opens: items, accounts,
//! salesmen, firms, message lines and the next invoice number.
//!
//! ## Ingestion
//! Backend records are loosely typed (numbers as strings, nulls, missing
//! fields). They are read into `Raw*` records with lenient serde helpers
//! and converted into the strict domain types exactly once:
//!
//! ```text
//! JSON ──► RawCatalog ──(From)──► Catalog ──► engine
//!          (Option, lenient)       (all fields present, packing ≥ 1)
//! ```

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::coerce::lenient;
use crate::error::CoreError;
use crate::money::Money;
use crate::types::{
    Account, Firm, Item, ItemHistory, ItemId, MessageLine, PriceTier, Percent, PriorInvoice,
    PriorLine, Salesman, TransactionKind,
};

// =============================================================================
// Catalog
// =============================================================================

/// Read-only reference data for one form session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub items: Vec<Item>,
    pub accounts: Vec<Account>,
    pub salesmen: Vec<Salesman>,
    pub firms: Vec<Firm>,
    pub message_lines: Vec<MessageLine>,
    /// Server-assigned, user-editable.
    pub next_invoice_number: String,
}

impl Catalog {
    /// Finds an item by id.
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Finds an account by id.
    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Builds a lookup table for per-keystroke view derivation.
    pub fn index(&self) -> ItemIndex<'_> {
        ItemIndex {
            items: self.items.iter().map(|i| (&i.id, i)).collect(),
        }
    }
}

/// Hash lookup of catalog items by id.
#[derive(Debug, Clone)]
pub struct ItemIndex<'a> {
    items: HashMap<&'a ItemId, &'a Item>,
}

impl<'a> ItemIndex<'a> {
    /// Resolves a row's item reference. Unknown ids resolve to `None`, so the
    /// row behaves as unassigned.
    #[inline]
    pub fn get(&self, id: Option<&ItemId>) -> Option<&'a Item> {
        id.and_then(|id| self.items.get(id).copied())
    }
}

// =============================================================================
// Raw Records (backend shape)
// =============================================================================

/// Catalog as delivered by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalog {
    #[serde(default)]
    pub items: Vec<RawItem>,
    #[serde(default)]
    pub accounts: Vec<RawAccount>,
    #[serde(default)]
    pub salesmen: Vec<RawNamed>,
    #[serde(default)]
    pub firms: Vec<RawNamed>,
    #[serde(default)]
    pub message_lines: Vec<RawMessageLine>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub next_invoice_number: String,
}

/// Item record with every numeric field optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub packing: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub trade_price: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub retail_price: Decimal,
    #[serde(default)]
    pub price_tiers: Vec<RawPriceTier>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub discount_percent: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub tax_percent: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub stock: Decimal,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriceTier {
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub percent: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub credit_limit: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub credit_days: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub markup_percent: Decimal,
    #[serde(default)]
    pub price_category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNamed {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessageLine {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Last-transaction record as delivered by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItemHistory {
    #[serde(default, deserialize_with = "lenient::id")]
    pub item_id: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub previous_full: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub previous_pcs: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub previous_retail_price: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub previous_trade_price: Decimal,
    #[serde(default)]
    pub last_date: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// Stored invoice as delivered by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriorInvoice {
    #[serde(default, deserialize_with = "lenient::id")]
    pub invoice_id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::id")]
    pub invoice_number: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub account_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub salesman_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub firm_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub message_line_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub freight: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cash_received: Decimal,
    #[serde(default)]
    pub lines: Vec<RawPriorLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriorLine {
    #[serde(default, deserialize_with = "lenient::id")]
    pub item_id: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cartons: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub pieces: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub bonus_cartons: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub bonus_pieces: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub rate: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub discount_amount: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub tax_amount: Decimal,
}

// =============================================================================
// Conversions
// =============================================================================

/// Reads the `YYYY-MM-DD` prefix of a date or timestamp string.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

fn label(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl From<RawItem> for Item {
    fn from(raw: RawItem) -> Self {
        let packing = if raw.packing < Decimal::ONE {
            Decimal::ONE
        } else {
            raw.packing
        };

        Item {
            title: label(raw.title).unwrap_or_else(|| raw.id.clone()),
            id: ItemId(raw.id),
            packing,
            trade_price: Money::new(non_negative(raw.trade_price)),
            retail_price: Money::new(non_negative(raw.retail_price)),
            price_tiers: raw
                .price_tiers
                .into_iter()
                .filter(|t| !t.category.trim().is_empty())
                .map(|t| PriceTier {
                    category: t.category.trim().to_string(),
                    percent: Percent::new(t.percent),
                })
                .collect(),
            discount_percent: Percent::new(non_negative(raw.discount_percent)),
            tax_percent: Percent::new(non_negative(raw.tax_percent)),
            // Stock may legitimately be negative when the backend allowed an override
            stock: raw.stock,
            company: label(raw.company),
        }
    }
}

impl From<RawAccount> for Account {
    fn from(raw: RawAccount) -> Self {
        let credit_days = non_negative(raw.credit_days.trunc())
            .to_u32()
            .unwrap_or(u32::MAX);

        Account {
            name: label(raw.name).unwrap_or_else(|| raw.id.clone()),
            id: raw.id,
            credit_limit: Money::new(non_negative(raw.credit_limit)),
            credit_days,
            markup_percent: Percent::new(non_negative(raw.markup_percent)),
            price_category: label(raw.price_category),
        }
    }
}

impl From<RawCatalog> for Catalog {
    fn from(raw: RawCatalog) -> Self {
        Catalog {
            items: raw
                .items
                .into_iter()
                .filter(|i| !i.id.is_empty())
                .map(Item::from)
                .collect(),
            accounts: raw
                .accounts
                .into_iter()
                .filter(|a| !a.id.is_empty())
                .map(Account::from)
                .collect(),
            salesmen: raw
                .salesmen
                .into_iter()
                .filter(|s| !s.id.is_empty())
                .map(|s| Salesman {
                    name: label(s.name).unwrap_or_else(|| s.id.clone()),
                    id: s.id,
                })
                .collect(),
            firms: raw
                .firms
                .into_iter()
                .filter(|f| !f.id.is_empty())
                .map(|f| Firm {
                    name: label(f.name).unwrap_or_else(|| f.id.clone()),
                    id: f.id,
                })
                .collect(),
            message_lines: raw
                .message_lines
                .into_iter()
                .filter(|m| !m.id.is_empty())
                .map(|m| MessageLine {
                    text: m.text.unwrap_or_default(),
                    id: m.id,
                })
                .collect(),
            next_invoice_number: raw.next_invoice_number,
        }
    }
}

impl From<RawItemHistory> for ItemHistory {
    fn from(raw: RawItemHistory) -> Self {
        ItemHistory {
            item_id: ItemId(raw.item_id),
            previous_full: non_negative(raw.previous_full),
            previous_pcs: non_negative(raw.previous_pcs),
            previous_retail_price: Money::new(non_negative(raw.previous_retail_price)),
            previous_trade_price: Money::new(non_negative(raw.previous_trade_price)),
            last_date: raw.last_date.as_deref().and_then(parse_date),
            company: label(raw.company),
        }
    }
}

impl TryFrom<RawPriorInvoice> for PriorInvoice {
    type Error = CoreError;

    /// Fails only on what cannot be defaulted: the document kind and date.
    fn try_from(raw: RawPriorInvoice) -> Result<Self, Self::Error> {
        let kind: TransactionKind = raw.kind.parse()?;
        let date = raw
            .date
            .as_deref()
            .and_then(parse_date)
            .ok_or_else(|| CoreError::InvalidRecord(format!("invoice {} has no date", raw.invoice_id)))?;

        Ok(PriorInvoice {
            invoice_id: raw.invoice_id,
            kind,
            invoice_number: raw.invoice_number,
            date,
            account_id: raw.account_id,
            salesman_id: raw.salesman_id,
            firm_id: raw.firm_id,
            message_line_id: raw.message_line_id,
            freight: Money::new(non_negative(raw.freight)),
            cash_received: Money::new(non_negative(raw.cash_received)),
            lines: raw
                .lines
                .into_iter()
                .filter(|l| !l.item_id.is_empty())
                .map(|l| PriorLine {
                    item_id: ItemId(l.item_id),
                    cartons: non_negative(l.cartons),
                    pieces: non_negative(l.pieces),
                    bonus_cartons: non_negative(l.bonus_cartons),
                    bonus_pieces: non_negative(l.bonus_pieces),
                    rate: Money::new(non_negative(l.rate)),
                    discount_amount: Money::new(non_negative(l.discount_amount)),
                    tax_amount: Money::new(non_negative(l.tax_amount)),
                })
                .collect(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
