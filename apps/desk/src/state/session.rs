//! # Form Session State
//!
//! One open transaction form: what the user entered, the reference data it
//! was opened with, and where its save flow stands.
//!
//! ## Locking Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session Access Around Backend Calls                  │
//! │                                                                         │
//! │  lock ──► read what the call needs ──► unlock                           │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                                  backend.call().await                   │
//! │                                          │                              │
//! │                                          ▼                              │
//! │  lock ◄── apply the result as a FormAction / flow event ◄───────────    │
//! │                                                                         │
//! │  NOTE: The closures passed to with_session / with_session_mut are       │
//! │        synchronous, so the lock can never be held across an .await.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submission Keys
//! Every submit carries an idempotency key. Resending an unchanged payload
//! after a failure reuses the key of the failed attempt, so a document the
//! backend stored before the connection dropped is not stored twice.

use std::sync::{Arc, Mutex};

use tradedesk_core::{
    derive_view, reduce, Catalog, FormAction, FormState, FormView, SaveFlow, SubmitPayload,
};
use uuid::Uuid;

use crate::error::ApiError;

/// Everything one form needs in memory.
#[derive(Debug, Clone)]
pub struct FormSession {
    pub form: FormState,
    pub catalog: Catalog,
    pub flow: SaveFlow,
    /// Last payload sent without a confirmed receipt, and its key.
    pending_submit: Option<(Uuid, SubmitPayload)>,
}

impl FormSession {
    pub fn new(form: FormState, catalog: Catalog) -> Self {
        FormSession {
            form,
            catalog,
            flow: SaveFlow::new(),
            pending_submit: None,
        }
    }

    /// Idempotency key for sending `payload`.
    pub fn submission_key(&mut self, payload: &SubmitPayload) -> Uuid {
        match &self.pending_submit {
            Some((key, pending)) if pending == payload => *key,
            _ => {
                let key = Uuid::new_v4();
                self.pending_submit = Some((key, payload.clone()));
                key
            }
        }
    }

    /// Clears the document after the backend stored it.
    pub fn submit_succeeded(&mut self) {
        self.pending_submit = None;
        self.apply(FormAction::SubmitSucceeded);
    }

    /// Runs one edit through the reducer.
    pub fn apply(&mut self, action: FormAction) {
        self.form = reduce(&self.form, action, &self.catalog);
    }

    /// Recomputes rows, flags and totals.
    pub fn view(&self) -> FormView {
        derive_view(&self.form, &self.catalog)
    }
}

/// Shared handle to one form session.
///
/// Cloning the handle shares the session; dropping the last handle discards
/// the form without side effects.
#[derive(Debug, Clone)]
pub struct SessionState {
    session: Arc<Mutex<FormSession>>,
}

impl SessionState {
    pub fn new(session: FormSession) -> Self {
        SessionState {
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Executes a read-only operation on the session.
    pub fn with_session<F, R>(&self, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&FormSession) -> R,
    {
        let session = self
            .session
            .lock()
            .map_err(|_| ApiError::internal("Form session is unavailable"))?;
        Ok(f(&session))
    }

    /// Executes a mutating operation on the session.
    pub fn with_session_mut<F, R>(&self, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&mut FormSession) -> R,
    {
        let mut session = self
            .session
            .lock()
            .map_err(|_| ApiError::internal("Form session is unavailable"))?;
        Ok(f(&mut session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tradedesk_core::{build_payload, FormMode, Money, SubmitDirective, TransactionKind};

    fn session() -> SessionState {
        let catalog = Catalog {
            next_invoice_number: "P-1".to_string(),
            ..Catalog::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let form = FormState::new(TransactionKind::Purchase, FormMode::Create, date, &catalog);
        SessionState::new(FormSession::new(form, catalog))
    }

    #[test]
    fn test_clones_share_the_session() {
        let a = session();
        let b = a.clone();

        a.with_session_mut(|s| s.apply(FormAction::AddRow)).unwrap();

        assert_eq!(b.with_session(|s| s.form.rows.len()).unwrap(), 2);
    }

    #[test]
    fn test_unchanged_payload_reuses_submission_key() {
        let state = session();
        state
            .with_session_mut(|s| {
                let payload = build_payload(&s.form, &s.view(), &SubmitDirective::default());
                let first = s.submission_key(&payload);
                assert_eq!(s.submission_key(&payload), first);

                let mut changed = payload.clone();
                changed.freight = Money::from_whole(5);
                let second = s.submission_key(&changed);
                assert_ne!(second, first);

                s.submit_succeeded();
                assert_ne!(s.submission_key(&changed), second);
            })
            .unwrap();
    }

    #[test]
    fn test_view_follows_form() {
        let state = session();
        let rows = state.with_session(|s| s.view().rows.len()).unwrap();
        assert_eq!(rows, 1);
    }
}
