//! # Commands Module
//!
//! All commands the entry screens call.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── form.rs     ◄─── Open form, edits, item/account selection, prior invoices
//! └── save.rs     ◄─── Save flow, confirmation prompts, submit
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  UI shell                                                               │
//! │  ────────                                                               │
//! │  let session = open_form(&backend, &config, Sale, Create).await?;       │
//! │  dispatch(&session, FormAction::EditField { .. })?;                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Rust commands                                                          │
//! │  ─────────────                                                          │
//! │  async fn select_item(                                                  │
//! │      backend: &BackendState,  ◄── shared backend handle                 │
//! │      session: &SessionState,  ◄── the form being edited                 │
//! │      row: RowId,              ◄── from the screen                       │
//! │      item_id: ItemId,                                                   │
//! │  ) -> Result<FormResponse, ApiError>                                    │
//! │         │                                                               │
//! │         │ (JSON serialization)                                          │
//! │         ▼                                                               │
//! │  Screen receives: { form, view, saveState }                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command declares only the state it needs: pure edits take just the
//! session, anything that calls out also takes the backend.

pub mod form;
pub mod save;

pub use form::{
    dispatch, get_form, load_invoice, open_form, select_account, select_item, FormResponse,
};
pub use save::{
    cancel_stock_override, confirm_stock_override, resolve_price_update, save, SaveOutcome,
};
