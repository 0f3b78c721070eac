//! # Backend Collaborators
//!
//! The calls a transaction form makes to the system of record. The engine
//! itself never performs I/O; the application layer drives these and feeds
//! the results back in as form actions.
//!
//! ```text
//! ┌──────────────────┬──────────────────────────────┬──────────────────────┐
//! │ Call             │ When                         │ On failure           │
//! ├──────────────────┼──────────────────────────────┼──────────────────────┤
//! │ catalog          │ form opens                   │ error to the screen  │
//! │ item_history     │ item assigned to a row       │ treated as "none"    │
//! │ account_balance  │ account selected             │ error to the screen  │
//! │ invoice          │ edit / return form loads     │ error to the screen  │
//! │ submit           │ save flow reaches submitting │ form kept, error     │
//! └──────────────────┴──────────────────────────────┴──────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tradedesk_core::{
    Catalog, ItemHistory, ItemId, Money, PriorInvoice, SubmitPayload, SubmitReceipt,
    TransactionKind,
};

use crate::error::ClientResult;

/// Standard response envelope used by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

/// The system of record behind the forms.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Reference data for a new form of `kind`.
    async fn catalog(&self, kind: TransactionKind) -> ClientResult<Catalog>;

    /// Last transaction of `kind` involving the item, if any.
    async fn item_history(
        &self,
        item_id: &ItemId,
        kind: TransactionKind,
    ) -> ClientResult<Option<ItemHistory>>;

    /// Balance the account carries before the current document.
    async fn account_balance(&self, account_id: &str) -> ClientResult<Money>;

    /// A stored invoice with its lines.
    async fn invoice(&self, invoice_id: &str) -> ClientResult<PriorInvoice>;

    /// Stores a document.
    ///
    /// `idempotency_key` identifies one save attempt. Sending the same key
    /// again (a retry after a lost response) must not store a second copy.
    async fn submit(
        &self,
        payload: &SubmitPayload,
        idempotency_key: Uuid,
    ) -> ClientResult<SubmitReceipt>;
}
