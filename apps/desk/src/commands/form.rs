//! # Form Commands
//!
//! Opening a form and everything the user does while filling it in.
//!
//! ## Form Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Form Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Opened  │────►│ Editing  │────►│  Saving  │────►│  Saved   │       │
//! │  │ (1 row)  │     │          │     │ (prompts)│     │          │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │   open_form            │            save (save.rs)        │             │
//! │                   dispatch                                │             │
//! │                   select_item                             ▼             │
//! │                   select_account          next number, one empty row   │
//! │                   load_invoice ◄──────────────────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Edits are refused while a save is pending so a prompt always answers
//! the rows it was raised for.

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};
use tradedesk_core::{
    FormAction, FormMode, FormState, FormView, ItemId, RowId, SaveState, TransactionKind,
};

use crate::error::ApiError;
use crate::state::{BackendState, DeskConfig, FormSession, SessionState};

/// Form contents plus everything derived from them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    pub form: FormState,
    pub view: FormView,
    pub save_state: SaveState,
}

impl From<&FormSession> for FormResponse {
    fn from(session: &FormSession) -> Self {
        FormResponse {
            form: session.form.clone(),
            view: session.view(),
            save_state: session.flow.state().clone(),
        }
    }
}

/// Opens a new purchase, sale or return form.
///
/// Fetches the catalog for `kind`, dates the form today and applies the
/// desk's print format and default markup.
pub async fn open_form(
    backend: &BackendState,
    config: &DeskConfig,
    kind: TransactionKind,
    mode: FormMode,
) -> Result<SessionState, ApiError> {
    debug!(%kind, ?mode, "open_form command");

    let catalog = backend.inner().catalog(kind).await?;
    let today = Local::now().date_naive();
    let form = FormState::new(kind, mode, today, &catalog)
        .with_print_format(config.print_format)
        .with_default_markup(config.default_markup);

    info!(
        %kind,
        items = catalog.items.len(),
        accounts = catalog.accounts.len(),
        invoice_number = %form.header.invoice_number,
        "Form opened"
    );
    Ok(SessionState::new(FormSession::new(form, catalog)))
}

/// Gets the current form with its derived view.
pub fn get_form(session: &SessionState) -> Result<FormResponse, ApiError> {
    session.with_session(|s| FormResponse::from(s))
}

/// Applies one edit to the form.
pub fn dispatch(session: &SessionState, action: FormAction) -> Result<FormResponse, ApiError> {
    debug!(?action, "dispatch command");
    session.with_session_mut(|s| {
        ensure_editing(s)?;
        s.apply(action);
        Ok::<_, ApiError>(FormResponse::from(&*s))
    })?
}

/// Assigns an item to a row and attaches its last transaction.
///
/// ## Flow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. AssignItem (rate, discount and tax defaults)       lock, release    │
/// │  2. backend.item_history(item, kind).await             no lock held     │
/// │       failure ──► warn!, treated as "no history"                        │
/// │  3. AttachHistory                                      lock, release    │
/// │       dropped by the reducer if the row changed item meanwhile          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn select_item(
    backend: &BackendState,
    session: &SessionState,
    row: RowId,
    item_id: ItemId,
) -> Result<FormResponse, ApiError> {
    debug!(%row, %item_id, "select_item command");

    let kind = session.with_session_mut(|s| {
        ensure_editing(s)?;
        s.form.row(row)?;
        s.apply(FormAction::AssignItem {
            row,
            item_id: item_id.clone(),
        });
        Ok::<_, ApiError>(s.form.kind)
    })??;

    if !backend.history_enabled() {
        return get_form(session);
    }

    let history = match backend.inner().item_history(&item_id, kind).await {
        Ok(history) => history,
        Err(e) => {
            warn!(%item_id, error = %e, "Item history lookup failed, continuing without it");
            None
        }
    };

    session.with_session_mut(|s| {
        s.apply(FormAction::AttachHistory { row, history });
        FormResponse::from(&*s)
    })
}

/// Selects the counterparty account and, on sales and returns, loads its
/// previous balance.
///
/// Clearing the account (`None`) needs no lookup, and neither does a
/// purchase supplier. If the balance call fails the account stays selected
/// with a zero balance and the error is returned.
pub async fn select_account(
    backend: &BackendState,
    session: &SessionState,
    account_id: Option<String>,
) -> Result<FormResponse, ApiError> {
    debug!(?account_id, "select_account command");

    let kind = session.with_session_mut(|s| {
        ensure_editing(s)?;
        if let Some(id) = &account_id {
            if s.catalog.account(id).is_none() {
                return Err(ApiError::not_found("Account", id));
            }
        }
        s.apply(FormAction::SelectAccount {
            account_id: account_id.clone(),
        });
        Ok(s.form.kind)
    })??;

    match account_id {
        Some(id) if kind.tracks_balance() => refresh_balance(backend, session, &id).await,
        _ => get_form(session),
    }
}

/// Loads a stored invoice into the form.
///
/// On a form of the same kind this is the edit flow (the invoice's own
/// number, date and id are taken over). On a return form it draws the lines
/// from a sale and records it as the original invoice.
pub async fn load_invoice(
    backend: &BackendState,
    session: &SessionState,
    invoice_id: &str,
) -> Result<FormResponse, ApiError> {
    debug!(invoice_id, "load_invoice command");

    session.with_session(ensure_editing)??;
    let invoice = backend.inner().invoice(invoice_id).await?;
    let lines = invoice.lines.len();

    let (kind, account_id) = session.with_session_mut(|s| {
        ensure_editing(s)?;
        s.apply(FormAction::LoadPriorInvoice { invoice });
        Ok::<_, ApiError>((s.form.kind, s.form.header.account_id.clone()))
    })??;
    info!(invoice_id, lines, "Invoice loaded into form");

    match account_id {
        Some(id) if kind.tracks_balance() => refresh_balance(backend, session, &id).await,
        _ => get_form(session),
    }
}

/// Fetches the account balance and applies it if the account is still the
/// one selected.
async fn refresh_balance(
    backend: &BackendState,
    session: &SessionState,
    account_id: &str,
) -> Result<FormResponse, ApiError> {
    let balance = backend.inner().account_balance(account_id).await?;

    session.with_session_mut(|s| {
        if s.form.header.account_id.as_deref() == Some(account_id) {
            s.apply(FormAction::SetPreviousBalance { amount: balance });
        } else {
            debug!(account_id, "Account changed during balance lookup, dropping result");
        }
        FormResponse::from(&*s)
    })
}

fn ensure_editing(session: &FormSession) -> Result<(), ApiError> {
    match session.flow.state() {
        SaveState::Editing => Ok(()),
        _ => Err(ApiError::save_flow(
            "Finish or cancel the pending save before editing the form",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{backend, catalog, item_history};
    use crate::error::ErrorCode;
    use std::sync::Arc;
    use tradedesk_client::MemoryBackend;
    use tradedesk_core::{Money, RowField};

    async fn open(backend: &BackendState, kind: TransactionKind) -> SessionState {
        open_form(backend, &DeskConfig::default(), kind, FormMode::Create)
            .await
            .unwrap()
    }

    fn first_row(session: &SessionState) -> RowId {
        get_form(session).unwrap().form.rows[0].id
    }

    #[tokio::test]
    async fn test_open_form_starts_with_one_empty_row() {
        let (state, _) = backend();
        let session = open(&state, TransactionKind::Sale).await;

        let response = get_form(&session).unwrap();
        assert_eq!(response.form.rows.len(), 1);
        assert_eq!(response.form.header.invoice_number, "100");
        assert_eq!(response.save_state, SaveState::Editing);
        assert!(response.view.totals.net.is_zero());
    }

    #[tokio::test]
    async fn test_dispatch_recomputes_totals() {
        let (state, _) = backend();
        let session = open(&state, TransactionKind::Sale).await;
        let row = first_row(&session);

        select_item(&state, &session, row, ItemId::new("A")).await.unwrap();
        let response = dispatch(
            &session,
            FormAction::EditField {
                row,
                field: RowField::Full,
                raw: "2".into(),
            },
        )
        .unwrap();

        // 2 cartons of 12 at the retail price of 10
        assert_eq!(response.view.totals.gross, Money::from_whole(240));
    }

    #[tokio::test]
    async fn test_select_item_attaches_history() {
        let (state, _) = backend();
        let session = open(&state, TransactionKind::Purchase).await;
        let row = first_row(&session);

        let response = select_item(&state, &session, row, ItemId::new("A")).await.unwrap();

        assert_eq!(response.form.rows[0].history, Some(item_history("A")));
        assert!(!response.view.rows[0].flags.above_last_rate);

        let response = dispatch(
            &session,
            FormAction::EditField {
                row,
                field: RowField::Rate,
                raw: "9".into(),
            },
        )
        .unwrap();
        assert!(response.view.rows[0].flags.above_last_rate);
    }

    #[tokio::test]
    async fn test_history_failure_degrades_to_none() {
        let (state, memory) = backend();
        memory.set_history_down(true);
        let session = open(&state, TransactionKind::Purchase).await;
        let row = first_row(&session);

        let response = select_item(&state, &session, row, ItemId::new("A")).await.unwrap();

        assert_eq!(response.form.rows[0].item_id, Some(ItemId::new("A")));
        assert!(response.form.rows[0].history.is_none());
    }

    #[tokio::test]
    async fn test_history_lookup_can_be_switched_off() {
        let memory = Arc::new(MemoryBackend::new(catalog()).with_history(
            TransactionKind::Purchase,
            item_history("A"),
        ));
        let state = BackendState::new(memory).with_history(false);
        let session = open(&state, TransactionKind::Purchase).await;
        let row = first_row(&session);

        let response = select_item(&state, &session, row, ItemId::new("A")).await.unwrap();

        assert!(response.form.rows[0].history.is_none());
    }

    #[tokio::test]
    async fn test_select_item_unknown_row() {
        let (state, _) = backend();
        let session = open(&state, TransactionKind::Sale).await;

        let err = select_item(&state, &session, RowId(99), ItemId::new("A"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_select_account_loads_balance() {
        let (state, _) = backend();
        let session = open(&state, TransactionKind::Sale).await;

        let response = select_account(&state, &session, Some("C1".into())).await.unwrap();
        assert_eq!(response.form.previous_balance, Money::from_whole(500));

        let response = select_account(&state, &session, None).await.unwrap();
        assert!(response.form.previous_balance.is_zero());
        assert!(response.form.header.account_id.is_none());
    }

    #[tokio::test]
    async fn test_purchase_supplier_has_no_balance() {
        let (state, _) = backend();
        let session = open(&state, TransactionKind::Purchase).await;

        let response = select_account(&state, &session, Some("C1".into())).await.unwrap();
        assert_eq!(response.form.header.account_id.as_deref(), Some("C1"));
        assert!(response.form.previous_balance.is_zero());
        assert!(response.view.totals.total_receivable.is_zero());
    }

    #[tokio::test]
    async fn test_select_unknown_account() {
        let (state, _) = backend();
        let session = open(&state, TransactionKind::Sale).await;

        let err = select_account(&state, &session, Some("nobody".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_load_invoice_into_return_form() {
        let (state, _) = backend();
        let session = open(&state, TransactionKind::Return).await;

        let response = load_invoice(&state, &session, "S-7").await.unwrap();

        assert_eq!(response.form.header.original_invoice_id.as_deref(), Some("S-7"));
        assert_eq!(response.form.header.account_id.as_deref(), Some("C1"));
        assert_eq!(response.form.previous_balance, Money::from_whole(500));
        assert_eq!(response.form.rows.len(), 1);
        assert_eq!(response.form.rows[0].item_id, Some(ItemId::new("A")));
    }

    #[tokio::test]
    async fn test_load_missing_invoice() {
        let (state, _) = backend();
        let session = open(&state, TransactionKind::Sale).await;

        let err = load_invoice(&state, &session, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
