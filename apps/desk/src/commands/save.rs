//! # Save Commands
//!
//! Drives a form through its save flow and submits it.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    save(session)                                        │
//! │                         │                                               │
//! │            validation ──┼──► VALIDATION_ERROR (nothing sent)            │
//! │                         │                                               │
//! │      ┌──────────────────┼──────────────────────┐                        │
//! │      ▼                  ▼                      ▼                        │
//! │  Purchase            Sale                   Return                      │
//! │  price drift?        stock shortfall?          │                        │
//! │      │ yes               │ yes                  │                        │
//! │      ▼                   ▼                      │                        │
//! │  ConfirmPrices       ConfirmOverride            │                        │
//! │      │                   │        │             │                        │
//! │  resolve_price_update    │   cancel_stock_override ──► back to editing  │
//! │      │          confirm_stock_override          │                        │
//! │      ▼                   ▼                      ▼                        │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │ submit: payload + key ─► backend.submit().await ─► finish          │ │
//! │  │   ok:  next invoice number, one empty row                          │ │
//! │  │   err: form kept as entered, error returned                        │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};
use tradedesk_core::checks::{PriceUpdateCandidate, StockShortfall};
use tradedesk_core::{
    build_payload, PriceDecision, SaveStep, SubmitDirective, SubmitPayload, SubmitReceipt,
};
use uuid::Uuid;

use crate::commands::form::FormResponse;
use crate::error::ApiError;
use crate::state::{BackendState, FormSession, SessionState};

/// What the screen shows after a save command.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SaveOutcome {
    /// The document was stored and the form is ready for the next one.
    Saved {
        receipt: SubmitReceipt,
        form: FormResponse,
    },
    /// Purchase rates imply new trade prices; ask before storing.
    ConfirmPrices {
        candidates: Vec<PriceUpdateCandidate>,
    },
    /// Sale quantities exceed stock; ask before selling past it.
    ConfirmOverride { shortfalls: Vec<StockShortfall> },
}

/// Starts saving the form.
pub async fn save(backend: &BackendState, session: &SessionState) -> Result<SaveOutcome, ApiError> {
    debug!("save command");

    let step = session.with_session_mut(|s| {
        let step = s.flow.begin(&s.form, &s.catalog)?;
        let payload = match &step {
            SaveStep::Submit(directive) => Some(prepare(s, directive)),
            _ => None,
        };
        Ok::<_, ApiError>((step, payload))
    })??;

    match step {
        (_, Some((payload, key))) => submit(backend, session, payload, key).await,
        (SaveStep::ConfirmPrices(candidates), None) => {
            info!(count = candidates.len(), "Purchase rates differ from trade prices");
            Ok(SaveOutcome::ConfirmPrices { candidates })
        }
        (SaveStep::ConfirmOverride(shortfalls), None) => {
            info!(count = shortfalls.len(), "Sale exceeds available stock");
            Ok(SaveOutcome::ConfirmOverride { shortfalls })
        }
        (SaveStep::Submit(_), None) => Err(ApiError::internal("Submit step without a payload")),
    }
}

/// Answers the price drift prompt. Either answer stores the document.
pub async fn resolve_price_update(
    backend: &BackendState,
    session: &SessionState,
    decision: PriceDecision,
) -> Result<SaveOutcome, ApiError> {
    debug!(?decision, "resolve_price_update command");

    let (payload, key) = session.with_session_mut(|s| {
        let directive = s.flow.resolve_prices(decision)?;
        Ok::<_, ApiError>(prepare(s, &directive))
    })??;

    submit(backend, session, payload, key).await
}

/// Sells past stock after the user confirmed the shortfall.
pub async fn confirm_stock_override(
    backend: &BackendState,
    session: &SessionState,
) -> Result<SaveOutcome, ApiError> {
    debug!("confirm_stock_override command");

    let (payload, key) = session.with_session_mut(|s| {
        let directive = s.flow.confirm_override()?;
        Ok::<_, ApiError>(prepare(s, &directive))
    })??;

    submit(backend, session, payload, key).await
}

/// Backs out of the stock shortfall prompt and returns to editing.
pub fn cancel_stock_override(session: &SessionState) -> Result<FormResponse, ApiError> {
    debug!("cancel_stock_override command");

    session.with_session_mut(|s| {
        s.flow.cancel_override()?;
        Ok::<_, ApiError>(FormResponse::from(&*s))
    })?
}

/// Builds the payload and picks its idempotency key.
fn prepare(session: &mut FormSession, directive: &SubmitDirective) -> (SubmitPayload, Uuid) {
    let payload = build_payload(&session.form, &session.view(), directive);
    let key = session.submission_key(&payload);
    (payload, key)
}

/// Sends the payload and settles the flow with the result.
async fn submit(
    backend: &BackendState,
    session: &SessionState,
    payload: SubmitPayload,
    key: Uuid,
) -> Result<SaveOutcome, ApiError> {
    let result = backend.inner().submit(&payload, key).await;

    session.with_session_mut(|s| {
        s.flow.finish()?;
        match result {
            Ok(receipt) => {
                info!(
                    kind = %payload.kind,
                    invoice_id = %receipt.invoice_id,
                    invoice_number = %receipt.invoice_number,
                    lines = payload.lines.len(),
                    net = %payload.net,
                    "Invoice saved"
                );
                s.submit_succeeded();
                Ok(SaveOutcome::Saved {
                    receipt,
                    form: FormResponse::from(&*s),
                })
            }
            Err(e) => {
                warn!(
                    kind = %payload.kind,
                    invoice_number = %payload.invoice_number,
                    idempotency_key = %key,
                    transient = e.is_transient(),
                    error = %e,
                    "Invoice submit failed, form kept"
                );
                Err(ApiError::from(e))
            }
        }
    })?
}
