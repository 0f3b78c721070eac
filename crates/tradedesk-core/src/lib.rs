//! # tradedesk-core: Line-Item Engine for Purchase, Sale and Return Forms
//!
//! This crate holds every rule of a transaction form as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TradeDesk Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Entry Screen (any UI)                        │   │
//! │  │    Header ──► Item grid ──► Totals ──► Save prompts             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ commands                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  tradedesk-app (sessions)                       │   │
//! │  │    open_form, dispatch, select_item, save, ...                  │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼───────────────────┐  ┌──────▼──────────────────┐     │
//! │  │   ★ tradedesk-core (THIS CRATE) ★│  │   tradedesk-client      │     │
//! │  │  quantity  totals  checks        │  │   Backend trait         │     │
//! │  │  form      save    payload       │  │   HTTP / in-memory      │     │
//! │  │  NO I/O • NO CLOCK • NO NETWORK  │  └─────────────────────────┘     │
//! │  └──────────────────────────────────┘                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Items, rows, accounts, transaction kinds
//! - [`money`] - Decimal `Money` newtype and rounding
//! - [`coerce`] - Lenient numeric input handling
//! - [`catalog`] - Reference data snapshot and its ingestion
//! - [`quantity`] - Carton/piece normalization
//! - [`totals`] - Per-kind line and invoice arithmetic
//! - [`checks`] - Stock, loss, credit-limit and price-drift checks
//! - [`form`] - Form state, reducer and derived view
//! - [`save`] - Save-flow confirmation state machine
//! - [`payload`] - Submit payload mapping
//! - [`validation`] - Pre-submit checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tradedesk_core::catalog::RawCatalog;
//! use tradedesk_core::form::{derive_view, reduce, FormAction, FormState};
//! use tradedesk_core::{Catalog, FormMode, ItemId, Money, RowField, RowId, TransactionKind};
//!
//! let raw: RawCatalog = serde_json::from_str(
//!     r#"{"items": [{"id": "A", "packing": 12, "tradePrice": 100}]}"#,
//! ).unwrap();
//! let catalog = Catalog::from(raw);
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let mut form = FormState::new(TransactionKind::Purchase, FormMode::Create, date, &catalog);
//! for action in [
//!     FormAction::AssignItem { row: RowId(1), item_id: ItemId::new("A") },
//!     FormAction::EditField { row: RowId(1), field: RowField::Full, raw: "2".into() },
//!     FormAction::EditField { row: RowId(1), field: RowField::Pcs, raw: "3".into() },
//! ] {
//!     form = reduce(&form, action, &catalog);
//! }
//!
//! // 2 cartons of 12 + 3 pieces at 100
//! assert_eq!(derive_view(&form, &catalog).totals.gross, Money::from_whole(2700));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod checks;
pub mod coerce;
pub mod error;
pub mod form;
pub mod money;
pub mod payload;
pub mod quantity;
pub mod save;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::Catalog;
pub use checks::PRICE_DRIFT_TOLERANCE;
pub use error::{CoreError, CoreResult, ValidationError};
pub use form::{derive_view, reduce, FormAction, FormState, FormView};
pub use money::Money;
pub use payload::{build_payload, SubmitPayload, SubmitReceipt};
pub use save::{PriceDecision, SaveFlow, SaveState, SaveStep, SubmitDirective};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Decimal places money aggregates are rounded to (except whole-unit
/// purchase entry).
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Maximum rows on a single document.
///
/// ## Business Reason
/// "Load all items" on a large catalog can produce thousands of rows; the
/// backend refuses documents beyond this size.
pub const MAX_ROWS: usize = 2_000;

/// Maximum length of an invoice number.
pub const MAX_INVOICE_NUMBER_LEN: usize = 32;
