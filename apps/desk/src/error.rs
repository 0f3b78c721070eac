//! # API Error Type
//!
//! Unified error type for the form commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in TradeDesk                              │
//! │                                                                         │
//! │  Entry screen                Rust commands                              │
//! │  ────────────                ─────────────                              │
//! │                                                                         │
//! │  save(session)                                                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Backend Error? ─── ClientError::Rejected("...") ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Form Error? ─── CoreError::Validation(..) ───── ApiError ─────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "VALIDATION_ERROR", "message": "Account is required" }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Backend internals (transport failures, server errors) are logged here
//! and replaced by a generic message; the screen only ever sees the code
//! and something a clerk can act on. `retryable` marks failures where the
//! same command may succeed if sent again (timeouts, backend outages).

use serde::Serialize;
use thiserror::Error;
use tradedesk_client::ClientError;
use tradedesk_core::CoreError;

/// Error returned from every command.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Invoice not found: S-100",
///   "retryable": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// True when sending the same command again may succeed
    pub retryable: bool,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Item, account, invoice or row not found
    NotFound,

    /// The form cannot be submitted as entered
    ValidationError,

    /// The backend could not be reached or failed
    BackendError,

    /// The backend declined the document
    BusinessLogic,

    /// A save prompt was answered out of order
    SaveFlow,

    /// Anything else
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            retryable: false,
        }
    }

    fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a save flow error.
    pub fn save_flow(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::SaveFlow, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts engine errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::RowNotFound(id) => ApiError::not_found("Row", &id),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            e @ CoreError::InvalidTransition { .. } => ApiError::save_flow(e.to_string()),
            e @ (CoreError::UnknownKind(_) | CoreError::UnknownPrintFormat(_)) => {
                ApiError::validation(e.to_string())
            }
            CoreError::InvalidRecord(e) => {
                tracing::error!("Invalid backend record: {}", e);
                ApiError::new(ErrorCode::BackendError, "Backend returned an unreadable record")
            }
        }
    }
}

/// Converts backend errors to API errors.
impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        let retryable = err.is_transient();
        let api = match err {
            ClientError::NotFound(what) => {
                ApiError::new(ErrorCode::NotFound, format!("Not found: {}", what))
            }
            ClientError::Validation(message) => ApiError::validation(message),
            ClientError::Rejected(message) => ApiError::new(ErrorCode::BusinessLogic, message),
            ClientError::Unauthorized => {
                ApiError::new(ErrorCode::BackendError, "Not signed in to the backend")
            }
            ClientError::Http(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Backend request failed: {}", e);
                ApiError::new(ErrorCode::BackendError, "Backend is unreachable")
            }
            ClientError::InvalidResponse(e) => {
                tracing::error!("Unreadable backend response: {}", e);
                ApiError::new(ErrorCode::BackendError, "Backend returned an unreadable response")
            }
            ClientError::Serialization(e) => {
                tracing::error!("Backend serialization failed: {}", e);
                ApiError::new(ErrorCode::BackendError, "Backend returned an unreadable response")
            }
            ClientError::Internal(e) => {
                tracing::error!("Backend internal error: {}", e);
                ApiError::new(ErrorCode::BackendError, "Backend operation failed")
            }
            e @ (ClientError::InvalidConfig(_) | ClientError::Io(_) | ClientError::Toml(_)) => {
                tracing::error!("Client configuration error: {}", e);
                ApiError::internal("Backend connection is misconfigured")
            }
        };
        api.with_retryable(retryable)
    }
}
