//! # Client Error Types
//!
//! Errors raised while talking to the backend or loading client settings.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend answer      │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  Unauthorized           │ │
//! │  │  Io / Toml      │  │  InvalidResponse│  │  NotFound / Validation  │ │
//! │  │                 │  │                 │  │  Rejected / Internal    │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Everything that can go wrong between the engine and the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Transport
    // =========================================================================
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with something we cannot read.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Backend Answers
    // =========================================================================
    /// Authentication required or token rejected.
    #[error("Authentication required")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the request as malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend understood the document but declined it
    /// (e.g. duplicate invoice number).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Backend-side failure.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // =========================================================================
    // Configuration
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be read.
    #[error("Failed to load config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML.
    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ClientError {
    /// Returns true when retrying the same call later may succeed.
    ///
    /// Surfaced to the screen as `ApiError::retryable`.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect(),
            ClientError::Internal(_) => true,
            _ => false,
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidConfig(format!("invalid URL: {err}"))
    }
}
