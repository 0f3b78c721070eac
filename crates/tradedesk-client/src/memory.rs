//! In-memory backend for tests and offline demos.
//!
//! Holds a fixed catalog and records every submitted payload. A key that
//! was already stored returns its first receipt instead of a second copy.
//! Failures can be switched on to exercise the error paths of the calling
//! layer.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use tradedesk_core::{
    Catalog, ItemHistory, ItemId, Money, PriorInvoice, SubmitPayload, SubmitReceipt,
    TransactionKind,
};

use crate::backend::Backend;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Default)]
struct Store {
    catalog: Catalog,
    histories: HashMap<(ItemId, TransactionKind), ItemHistory>,
    balances: HashMap<String, Money>,
    invoices: HashMap<String, PriorInvoice>,
    submitted: Vec<SubmitPayload>,
    receipts: HashMap<Uuid, SubmitReceipt>,
    submit_keys: Vec<Uuid>,
    reject_submit: Option<String>,
    lose_submit_responses: bool,
    history_down: bool,
}

/// Backend that lives entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
}

impl MemoryBackend {
    pub fn new(catalog: Catalog) -> Self {
        MemoryBackend {
            store: Mutex::new(Store {
                catalog,
                ..Store::default()
            }),
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        // A poisoned store only means another test thread panicked mid-write
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_history(self, kind: TransactionKind, history: ItemHistory) -> Self {
        self.store()
            .histories
            .insert((history.item_id.clone(), kind), history);
        self
    }

    pub fn with_balance(self, account_id: &str, balance: Money) -> Self {
        self.store().balances.insert(account_id.to_string(), balance);
        self
    }

    pub fn with_invoice(self, invoice: PriorInvoice) -> Self {
        self.store()
            .invoices
            .insert(invoice.invoice_id.clone(), invoice);
        self
    }

    /// Makes every submit fail with `message` until cleared with `None`.
    pub fn reject_submits(&self, message: Option<&str>) {
        self.store().reject_submit = message.map(str::to_string);
    }

    /// Stores submits but reports them as failed, like a connection that
    /// drops after the backend committed.
    pub fn set_lose_submit_responses(&self, lose: bool) {
        self.store().lose_submit_responses = lose;
    }

    /// Makes history lookups fail as if the service were unreachable.
    pub fn set_history_down(&self, down: bool) {
        self.store().history_down = down;
    }

    /// Payloads accepted so far, oldest first.
    pub fn submitted(&self) -> Vec<SubmitPayload> {
        self.store().submitted.clone()
    }

    /// Idempotency key of every submit call, oldest first.
    pub fn submit_keys(&self) -> Vec<Uuid> {
        self.store().submit_keys.clone()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn catalog(&self, _kind: TransactionKind) -> ClientResult<Catalog> {
        Ok(self.store().catalog.clone())
    }

    async fn item_history(
        &self,
        item_id: &ItemId,
        kind: TransactionKind,
    ) -> ClientResult<Option<ItemHistory>> {
        let store = self.store();
        if store.history_down {
            return Err(ClientError::Internal("history service unavailable".into()));
        }
        Ok(store.histories.get(&(item_id.clone(), kind)).cloned())
    }

    async fn account_balance(&self, account_id: &str) -> ClientResult<Money> {
        let store = self.store();
        if store.catalog.account(account_id).is_none() {
            return Err(ClientError::NotFound(format!("account {account_id}")));
        }
        Ok(store.balances.get(account_id).copied().unwrap_or(Money::ZERO))
    }

    async fn invoice(&self, invoice_id: &str) -> ClientResult<PriorInvoice> {
        self.store()
            .invoices
            .get(invoice_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("invoice {invoice_id}")))
    }

    async fn submit(
        &self,
        payload: &SubmitPayload,
        idempotency_key: Uuid,
    ) -> ClientResult<SubmitReceipt> {
        let mut store = self.store();
        store.submit_keys.push(idempotency_key);
        if let Some(message) = &store.reject_submit {
            return Err(ClientError::Rejected(message.clone()));
        }

        let receipt = match store.receipts.get(&idempotency_key).cloned() {
            Some(receipt) => receipt,
            None => {
                store.submitted.push(payload.clone());
                let receipt = SubmitReceipt {
                    invoice_id: format!("{}-{}", payload.kind, store.submitted.len()),
                    invoice_number: payload.invoice_number.clone(),
                    message: None,
                };
                store.receipts.insert(idempotency_key, receipt.clone());
                receipt
            }
        };

        if store.lose_submit_responses {
            return Err(ClientError::Internal("connection reset after submit".into()));
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tradedesk_core::{
        build_payload, derive_view, Account, FormMode, FormState, Percent, SubmitDirective,
    };

    fn catalog() -> Catalog {
        Catalog {
            accounts: vec![Account {
                id: "C1".to_string(),
                name: "C1".to_string(),
                credit_limit: Money::ZERO,
                credit_days: 0,
                markup_percent: Percent::zero(),
                price_category: None,
            }],
            ..Catalog::default()
        }
    }

    #[tokio::test]
    async fn test_balance_lookup() {
        let backend = MemoryBackend::new(catalog()).with_balance("C1", Money::from_whole(75));
        assert_eq!(backend.account_balance("C1").await.unwrap(), Money::from_whole(75));
        assert!(matches!(
            backend.account_balance("nobody").await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_history_failure_injection() {
        let backend = MemoryBackend::new(catalog());
        let id = ItemId::new("A");
        assert!(backend.item_history(&id, TransactionKind::Sale).await.unwrap().is_none());

        backend.set_history_down(true);
        assert!(backend.item_history(&id, TransactionKind::Sale).await.is_err());
    }

    #[tokio::test]
    async fn test_resubmitted_key_is_stored_once() {
        let backend = MemoryBackend::new(catalog());
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let form = FormState::new(TransactionKind::Sale, FormMode::Create, date, &catalog());
        let payload = build_payload(
            &form,
            &derive_view(&form, &catalog()),
            &SubmitDirective::default(),
        );
        let key = Uuid::new_v4();

        backend.set_lose_submit_responses(true);
        assert!(backend.submit(&payload, key).await.is_err());
        backend.set_lose_submit_responses(false);
        let receipt = backend.submit(&payload, key).await.unwrap();

        assert_eq!(receipt.invoice_id, "sale-1");
        assert_eq!(backend.submitted().len(), 1);
        assert_eq!(backend.submit_keys(), vec![key, key]);

        backend.submit(&payload, Uuid::new_v4()).await.unwrap();
        assert_eq!(backend.submitted().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_invoice() {
        let backend = MemoryBackend::new(catalog());
        assert!(matches!(backend.invoice("X").await, Err(ClientError::NotFound(_))));
    }
}
