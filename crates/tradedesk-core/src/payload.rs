//! # Submit Payload
//!
//! Maps a form and its derived view into the document the backend stores.
//! Percentages never leave the engine: every line carries absolute discount
//! and tax amounts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::checks::PriceUpdateCandidate;
use crate::coerce::lenient;
use crate::form::{FormState, FormView};
use crate::money::Money;
use crate::save::SubmitDirective;
use crate::types::{FormMode, ItemId, PrintFormat, TransactionKind};

/// One stored line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PayloadLine {
    pub item_id: ItemId,
    #[ts(type = "number")]
    pub cartons: Decimal,
    #[ts(type = "number")]
    pub pieces: Decimal,
    #[ts(type = "number")]
    pub bonus_cartons: Decimal,
    #[ts(type = "number")]
    pub bonus_pieces: Decimal,
    /// Billable pieces (`cartons × packing + pieces`).
    #[ts(type = "number")]
    pub total_pieces: Decimal,
    pub rate: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub subtotal: Money,
}

/// A complete document ready to submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
    pub kind: TransactionKind,
    pub mode: FormMode,
    pub invoice_id: Option<String>,
    pub original_invoice_id: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub invoice_number: String,
    pub account_id: Option<String>,
    pub salesman_id: Option<String>,
    pub firm_id: Option<String>,
    pub message_line_id: Option<String>,
    pub print_format: PrintFormat,
    pub gross: Money,
    pub discount_total: Money,
    pub tax_total: Money,
    pub freight: Money,
    pub net: Money,
    pub paid: Money,
    pub remaining: Money,
    pub allow_negative_stock: bool,
    pub update_prices: bool,
    pub price_updates: Vec<PriceUpdateCandidate>,
    pub lines: Vec<PayloadLine>,
}

/// What the backend returns for an accepted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    #[serde(default, deserialize_with = "lenient::id")]
    pub invoice_id: String,
    #[serde(default, deserialize_with = "lenient::id")]
    pub invoice_number: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Builds the submit payload.
///
/// Rows without a known item are skipped, as are rows with neither a billable
/// nor a bonus quantity. Line amounts are rounded to cents; the invoice
/// aggregates are taken from the view unchanged.
pub fn build_payload(form: &FormState, view: &FormView, directive: &SubmitDirective) -> SubmitPayload {
    let lines = view
        .rows
        .iter()
        .filter(|r| r.title.is_some())
        .filter(|r| r.normalized_qty > Decimal::ZERO || r.bonus_qty > Decimal::ZERO)
        .filter_map(|r| {
            let item_id = r.row.item_id.clone()?;
            Some(PayloadLine {
                item_id,
                cartons: r.row.full,
                pieces: r.row.pcs,
                bonus_cartons: r.row.bonus_full,
                bonus_pieces: r.row.bonus_pcs,
                total_pieces: r.normalized_qty,
                rate: r.row.rate,
                discount_amount: r.amounts.discount.round_cents(),
                tax_amount: r.amounts.tax.round_cents(),
                subtotal: r.amounts.total.round_cents(),
            })
        })
        .collect();

    let header = &form.header;
    let totals = &view.totals;

    SubmitPayload {
        kind: form.kind,
        mode: form.mode,
        invoice_id: header.invoice_id.clone(),
        original_invoice_id: header.original_invoice_id.clone(),
        date: header.date,
        invoice_number: header.invoice_number.clone(),
        account_id: header.account_id.clone(),
        salesman_id: header.salesman_id.clone(),
        firm_id: header.firm_id.clone(),
        message_line_id: header.message_line_id.clone(),
        print_format: header.print_format,
        gross: totals.gross,
        discount_total: totals.discount,
        tax_total: totals.tax,
        freight: totals.freight,
        net: totals.net,
        paid: totals.paid,
        remaining: totals.remaining,
        allow_negative_stock: directive.allow_negative_stock,
        update_prices: directive.update_prices,
        price_updates: if directive.update_prices {
            directive.price_updates.clone()
        } else {
            Vec::new()
        },
        lines,
    }
}
