//! # Error Types
//!
//! Domain-specific error types for tradedesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tradedesk-core errors (this file)                                     │
//! │  ├── CoreError        - Save-flow and form errors                      │
//! │  └── ValidationError  - Submission checks                              │
//! │                                                                         │
//! │  tradedesk-client errors (separate crate)                              │
//! │  └── ClientError      - Backend call failures                          │
//! │                                                                         │
//! │  App errors (apps/desk)                                                │
//! │  └── ApiError         - What the entry screen sees (serialized)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                   │
//! │                       ClientError ──┴─► ApiError → Entry screen        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT An Error
//! Bad numeric input, missing catalog items, stock overshoot, loss pricing
//! and credit-limit exceedance are all computed into the form view as
//! values. Only the save flow and submission checks produce errors.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core form and save-flow errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The save flow received an event its current state cannot handle.
    ///
    /// ## When This Occurs
    /// - Clicking save twice while a submit is in flight
    /// - Answering a price confirmation that was never asked
    /// - Reporting a submit result when nothing was submitted
    #[error("Save flow is {state}, cannot handle {event}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },

    /// A row id does not exist on the form.
    #[error("Row not found: {0}")]
    RowNotFound(String),

    /// A transaction kind name could not be parsed.
    #[error("Unknown transaction kind: {0}")]
    UnknownKind(String),

    /// A print format name could not be parsed.
    #[error("Unknown print format: {0}")]
    UnknownPrintFormat(String),

    /// A backend record is missing something that has no sensible default.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Submission validation errors.
///
/// These block a save before any network call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required header field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// The form has no row that would produce a billable line.
    #[error("Add at least one item with a quantity before saving")]
    NoBillableRows,

    /// The form has more rows than a document may carry.
    #[error("A document cannot have more than {max} rows")]
    TooManyRows { max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidTransition {
            state: "submitting",
            event: "save",
        };
        assert_eq!(err.to_string(), "Save flow is submitting, cannot handle save");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "account".to_string(),
        };
        assert_eq!(err.to_string(), "account is required");
        assert_eq!(
            ValidationError::NoBillableRows.to_string(),
            "Add at least one item with a quantity before saving"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::NoBillableRows;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
