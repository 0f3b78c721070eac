//! # Transaction Form
//!
//! The editable document state, the actions that change it, and the view
//! derived from it.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   user input ──► FormAction ──► reduce(&state, action, &catalog)        │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                                   FormState (rows, header, freight)     │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                      derive_view(&state, &catalog) ──► FormView         │
//! │                      (amounts, flags, totals: never stored)             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `reduce` never fails. Raw text is coerced, unknown row ids are ignored
//! and unknown item ids make a row contribute nothing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::{Catalog, ItemIndex};
use crate::checks::{credit_limit_exceeded, row_flags, stock_shortfalls, RowFlags, StockShortfall};
use crate::coerce::parse_non_negative;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::quantity::{normalized_bonus_qty, normalized_qty, packing};
use crate::totals::{Adjustments, Calculator, InvoiceTotals, LineAmounts, TaxBasis};
use crate::types::{
    FormMode, ItemHistory, ItemId, Percent, PrintFormat, PriorInvoice, Row, RowField, RowId,
    TransactionKind,
};

// =============================================================================
// State
// =============================================================================

/// Document header fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceHeader {
    pub invoice_number: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub account_id: Option<String>,
    pub salesman_id: Option<String>,
    pub firm_id: Option<String>,
    pub message_line_id: Option<String>,
    pub print_format: PrintFormat,
    /// Stored invoice being edited (edit mode).
    pub invoice_id: Option<String>,
    /// Sale the goods came back from (return flows).
    pub original_invoice_id: Option<String>,
}

/// Everything the user has entered on one transaction form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub kind: TransactionKind,
    pub mode: FormMode,
    pub header: InvoiceHeader,
    /// Row arena in display order; never empty.
    pub rows: Vec<Row>,
    pub freight: Money,
    pub previous_balance: Money,
    pub cash_received: Money,
    /// Markup used for drift checks when the account defines none.
    pub default_markup: Percent,
    next_row: u32,
}

impl FormState {
    /// Opens a form with a single empty row and the catalog's next invoice
    /// number.
    pub fn new(kind: TransactionKind, mode: FormMode, date: NaiveDate, catalog: &Catalog) -> Self {
        FormState {
            kind,
            mode,
            header: InvoiceHeader {
                invoice_number: catalog.next_invoice_number.clone(),
                date,
                account_id: None,
                salesman_id: None,
                firm_id: None,
                message_line_id: None,
                print_format: PrintFormat::default(),
                invoice_id: None,
                original_invoice_id: None,
            },
            rows: vec![Row::empty(RowId(1))],
            freight: Money::ZERO,
            previous_balance: Money::ZERO,
            cash_received: Money::ZERO,
            default_markup: Percent::zero(),
            next_row: 2,
        }
    }

    pub fn with_print_format(mut self, format: PrintFormat) -> Self {
        self.header.print_format = format;
        self
    }

    pub fn with_default_markup(mut self, markup: Percent) -> Self {
        self.default_markup = markup;
        self
    }

    /// Looks up a row by id.
    pub fn row(&self, id: RowId) -> CoreResult<&Row> {
        self.rows
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::RowNotFound(id.to_string()))
    }

    /// Markup for trade-price drift: the account's when set, else the default.
    pub fn markup(&self, catalog: &Catalog) -> Percent {
        self.header
            .account_id
            .as_deref()
            .and_then(|id| catalog.account(id))
            .map(|a| a.markup_percent)
            .filter(|m| !m.is_zero())
            .unwrap_or(self.default_markup)
    }

    /// Price category of the selected account.
    fn price_category<'a>(&self, catalog: &'a Catalog) -> Option<&'a str> {
        self.header
            .account_id
            .as_deref()
            .and_then(|id| catalog.account(id))
            .and_then(|a| a.price_category.as_deref())
    }

    fn allocate_row(&mut self) -> RowId {
        let id = RowId(self.next_row);
        self.next_row += 1;
        id
    }

    fn row_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    fn reset_rows(&mut self) {
        let id = self.allocate_row();
        self.rows = vec![Row::empty(id)];
    }

    fn calculator(&self) -> Calculator {
        Calculator::new(self.kind, self.mode)
    }
}

// =============================================================================
// Actions
// =============================================================================

/// A change requested by the entry screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FormAction {
    AddRow,
    /// Removing the last row leaves one empty row.
    RemoveRow { row: RowId },
    /// Back to a single empty row.
    ResetRows,
    /// One row per catalog item, with item defaults.
    LoadAllItems,
    AssignItem { row: RowId, item_id: ItemId },
    /// Raw text from a grid cell; non-numeric and negative input becomes 0.
    EditField { row: RowId, field: RowField, raw: String },
    AttachHistory { row: RowId, history: Option<ItemHistory> },
    SetFreight { raw: String },
    SetCashReceived { raw: String },
    SetPreviousBalance { amount: Money },
    SelectAccount { account_id: Option<String> },
    SelectSalesman { salesman_id: Option<String> },
    SelectFirm { firm_id: Option<String> },
    SelectMessageLine { message_line_id: Option<String> },
    SetPrintFormat { format: PrintFormat },
    SetInvoiceNumber { invoice_number: String },
    SetDate {
        #[ts(as = "String")]
        date: NaiveDate,
    },
    /// Loads a stored invoice (edit mode, or the sale a return refers to).
    LoadPriorInvoice { invoice: PriorInvoice },
    /// Clears the document after the backend accepted it.
    SubmitSucceeded,
}

/// Applies one action, returning the next state.
pub fn reduce(state: &FormState, action: FormAction, catalog: &Catalog) -> FormState {
    let mut next = state.clone();

    match action {
        FormAction::AddRow => {
            let id = next.allocate_row();
            next.rows.push(Row::empty(id));
        }
        FormAction::RemoveRow { row } => {
            next.rows.retain(|r| r.id != row);
            if next.rows.is_empty() {
                next.reset_rows();
            }
        }
        FormAction::ResetRows => next.reset_rows(),
        FormAction::LoadAllItems => {
            let category = next.price_category(catalog);
            let rows: Vec<Row> = catalog
                .items
                .iter()
                .map(|item| {
                    let id = next.allocate_row();
                    Row::for_item(id, item, next.kind, category)
                })
                .collect();
            next.rows = rows;
            if next.rows.is_empty() {
                next.reset_rows();
            }
        }
        FormAction::AssignItem { row, item_id } => {
            let kind = next.kind;
            let category = next.price_category(catalog);
            if let Some(target) = next.row_mut(row) {
                *target = match catalog.item(&item_id) {
                    Some(item) => Row::for_item(row, item, kind, category),
                    None => Row {
                        item_id: Some(item_id),
                        ..Row::empty(row)
                    },
                };
            }
        }
        FormAction::EditField { row, field, raw } => {
            if let Some(target) = next.row_mut(row) {
                let value = parse_non_negative(&raw);
                match field {
                    RowField::Full => target.full = value,
                    RowField::Pcs => target.pcs = value,
                    RowField::BonusFull => target.bonus_full = value,
                    RowField::BonusPcs => target.bonus_pcs = value,
                    RowField::Rate => target.rate = Money::new(value),
                    RowField::DiscountPercent => target.discount_percent = Percent::new(value),
                    RowField::TaxPercent => target.tax_percent = Percent::new(value),
                }
            }
        }
        FormAction::AttachHistory { row, history } => {
            if let Some(target) = next.row_mut(row) {
                // A late lookup for an item the row no longer holds is dropped
                let matches = match (&history, &target.item_id) {
                    (Some(h), Some(id)) => &h.item_id == id,
                    (None, _) => true,
                    _ => false,
                };
                if matches {
                    target.history = history;
                }
            }
        }
        FormAction::SetFreight { raw } => next.freight = Money::new(parse_non_negative(&raw)),
        FormAction::SetCashReceived { raw } => {
            next.cash_received = Money::new(parse_non_negative(&raw))
        }
        FormAction::SetPreviousBalance { amount } => next.previous_balance = amount,
        FormAction::SelectAccount { account_id } => {
            if next.header.account_id != account_id {
                next.previous_balance = Money::ZERO;
            }
            next.header.account_id = account_id;
        }
        FormAction::SelectSalesman { salesman_id } => next.header.salesman_id = salesman_id,
        FormAction::SelectFirm { firm_id } => next.header.firm_id = firm_id,
        FormAction::SelectMessageLine { message_line_id } => {
            next.header.message_line_id = message_line_id
        }
        FormAction::SetPrintFormat { format } => next.header.print_format = format,
        FormAction::SetInvoiceNumber { invoice_number } => {
            next.header.invoice_number = invoice_number.trim().to_string()
        }
        FormAction::SetDate { date } => next.header.date = date,
        FormAction::LoadPriorInvoice { invoice } => load_prior(&mut next, invoice, catalog),
        FormAction::SubmitSucceeded => {
            let number = match next.mode {
                FormMode::Create => advance_invoice_number(&next.header.invoice_number),
                FormMode::Edit => catalog.next_invoice_number.clone(),
            };
            next.mode = FormMode::Create;
            next.header.invoice_number = number;
            next.header.invoice_id = None;
            next.header.original_invoice_id = None;
            next.header.account_id = None;
            next.header.message_line_id = None;
            next.freight = Money::ZERO;
            next.previous_balance = Money::ZERO;
            next.cash_received = Money::ZERO;
            next.reset_rows();
        }
    }

    next
}

/// Replaces the form's rows and header with a stored invoice.
///
/// Stored lines carry absolute discount and tax amounts. They are turned
/// back into percentages using the tax base of the document they came from.
fn load_prior(state: &mut FormState, invoice: PriorInvoice, catalog: &Catalog) {
    let index = catalog.index();
    let source_basis = Calculator::new(invoice.kind, FormMode::Edit).tax_basis();

    if state.kind == invoice.kind {
        state.header.invoice_id = Some(invoice.invoice_id);
        state.header.invoice_number = invoice.invoice_number;
        state.header.date = invoice.date;
        state.freight = invoice.freight;
        state.cash_received = invoice.cash_received;
    } else {
        // A return drawn from a sale keeps its own number and date
        state.header.original_invoice_id = Some(invoice.invoice_id);
    }
    state.header.account_id = invoice.account_id;
    state.header.salesman_id = invoice.salesman_id;
    state.header.firm_id = invoice.firm_id;
    state.header.message_line_id = invoice.message_line_id;

    let mut rows = Vec::with_capacity(invoice.lines.len());
    for line in invoice.lines {
        let id = state.allocate_row();
        let item = index.get(Some(&line.item_id));
        let qty = line
            .cartons
            .saturating_mul(packing(item))
            .saturating_add(line.pieces);
        let amount = line.rate.multiply_quantity(qty);
        let taxable = match source_basis {
            TaxBasis::Discounted => amount - line.discount_amount,
            TaxBasis::Gross | TaxBasis::None => amount,
        };

        rows.push(Row {
            id,
            item_id: Some(line.item_id),
            full: line.cartons.max(Decimal::ZERO),
            pcs: line.pieces.max(Decimal::ZERO),
            bonus_full: line.bonus_cartons.max(Decimal::ZERO),
            bonus_pcs: line.bonus_pieces.max(Decimal::ZERO),
            rate: line.rate,
            discount_percent: share_of(line.discount_amount, amount),
            tax_percent: share_of(line.tax_amount, taxable),
            history: None,
        });
    }

    state.rows = rows;
    if state.rows.is_empty() {
        state.reset_rows();
    }
}

/// `part` as a percentage of `whole`; zero when `whole` is not positive.
fn share_of(part: Money, whole: Money) -> Percent {
    if !whole.is_positive() || part.is_negative() {
        return Percent::zero();
    }
    part.amount()
        .saturating_mul(Decimal::ONE_HUNDRED)
        .checked_div(whole.amount())
        .map(|share| Percent::new(share.normalize()))
        .unwrap_or_else(Percent::zero)
}

/// Next invoice number after a successful save.
///
/// The trailing digit run is incremented with its width preserved
/// (`INV-0099` → `INV-0100`, `999` → `1000`). A number without trailing
/// digits gets `-1` appended.
pub fn advance_invoice_number(current: &str) -> String {
    let current = current.trim();
    if current.is_empty() {
        return "1".to_string();
    }

    let digits = current
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if digits == 0 {
        return format!("{current}-1");
    }

    let (prefix, run) = current.split_at(current.len() - digits);
    let mut bytes = run.as_bytes().to_vec();
    let mut carry = true;
    for b in bytes.iter_mut().rev() {
        if !carry {
            break;
        }
        if *b == b'9' {
            *b = b'0';
        } else {
            *b += 1;
            carry = false;
        }
    }

    let run: String = bytes.into_iter().map(char::from).collect();
    if carry {
        format!("{prefix}1{run}")
    } else {
        format!("{prefix}{run}")
    }
}

// =============================================================================
// View
// =============================================================================

/// A row with everything the grid displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub row: Row,
    /// `None` when the row has no (known) item.
    pub title: Option<String>,
    #[ts(type = "number")]
    pub packing: Decimal,
    #[ts(type = "number")]
    pub normalized_qty: Decimal,
    #[ts(type = "number")]
    pub bonus_qty: Decimal,
    /// Current stock of the item, when known.
    #[ts(type = "number | null")]
    pub stock: Option<Decimal>,
    pub amounts: LineAmounts,
    pub flags: RowFlags,
}

/// Fully derived form view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub kind: TransactionKind,
    pub mode: FormMode,
    pub rows: Vec<RowView>,
    pub totals: InvoiceTotals,
    pub stock_shortfalls: Vec<StockShortfall>,
    pub credit_limit_exceeded: bool,
}

impl FormView {
    /// Returns true when any row is priced below its reference prices.
    pub fn has_loss(&self) -> bool {
        self.rows.iter().any(|r| r.flags.is_loss)
    }
}

/// Recomputes amounts, flags and totals from scratch.
pub fn derive_view(state: &FormState, catalog: &Catalog) -> FormView {
    let index = catalog.index();
    let calc = state.calculator();
    let flags = row_flags(state.kind, &state.rows, &index);

    let rows: Vec<RowView> = state
        .rows
        .iter()
        .zip(flags)
        .map(|(row, flags)| row_view(row, flags, &index, &calc))
        .collect();

    let adjustments = Adjustments {
        freight: state.freight,
        previous_balance: state.previous_balance,
        cash_received: state.cash_received,
    };
    let totals = calc.invoice(rows.iter().map(|r| &r.amounts), &adjustments);

    let account = state
        .header
        .account_id
        .as_deref()
        .and_then(|id| catalog.account(id));

    FormView {
        kind: state.kind,
        mode: state.mode,
        stock_shortfalls: stock_shortfalls(state.kind, &state.rows, &index),
        credit_limit_exceeded: credit_limit_exceeded(account, totals.net),
        rows,
        totals,
    }
}

fn row_view(row: &Row, flags: RowFlags, index: &ItemIndex<'_>, calc: &Calculator) -> RowView {
    let item = index.get(row.item_id.as_ref());
    RowView {
        title: item.map(|i| i.title.clone()),
        packing: packing(item),
        normalized_qty: normalized_qty(row, item),
        bonus_qty: normalized_bonus_qty(row, item),
        stock: item.map(|i| i.stock),
        amounts: calc.line(row, item),
        flags,
        row: row.clone(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
