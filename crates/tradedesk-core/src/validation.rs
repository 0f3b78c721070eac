//! # Validation Module
//!
//! Submission checks that run before any network call.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Input coercion (coerce.rs)                                   │
//! │  └── Bad numbers become 0, never an error                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE, on save                                         │
//! │  ├── Header completeness (invoice number, account)                     │
//! │  └── At least one billable row                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Rejects with a message surfaced as a submit error                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::catalog::Catalog;
use crate::error::ValidationError;
use crate::form::FormState;
use crate::quantity::normalized_qty;
use crate::{MAX_INVOICE_NUMBER_LEN, MAX_ROWS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates an invoice number.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_INVOICE_NUMBER_LEN`] characters
///
/// ## Example
/// ```rust
/// use tradedesk_core::validation::validate_invoice_number;
///
/// assert!(validate_invoice_number("INV-0001").is_ok());
/// assert!(validate_invoice_number("  ").is_err());
/// ```
pub fn validate_invoice_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "invoice number".to_string(),
        });
    }

    if number.chars().count() > MAX_INVOICE_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "invoice number".to_string(),
            max: MAX_INVOICE_NUMBER_LEN,
        });
    }

    Ok(())
}

/// Validates that a form may be submitted.
///
/// ## Rules
/// - Valid invoice number
/// - An account that exists in the catalog
/// - No more than [`MAX_ROWS`] rows
/// - At least one row with a known item and a positive billable quantity
pub fn validate_submission(form: &FormState, catalog: &Catalog) -> ValidationResult<()> {
    validate_invoice_number(&form.header.invoice_number)?;

    let has_account = form
        .header
        .account_id
        .as_deref()
        .is_some_and(|id| catalog.account(id).is_some());
    if !has_account {
        return Err(ValidationError::Required {
            field: "account".to_string(),
        });
    }

    if form.rows.len() > MAX_ROWS {
        return Err(ValidationError::TooManyRows { max: MAX_ROWS });
    }

    let index = catalog.index();
    let billable = form.rows.iter().any(|row| {
        index
            .get(row.item_id.as_ref())
            .is_some_and(|item| normalized_qty(row, Some(item)) > Decimal::ZERO)
    });
    if !billable {
        return Err(ValidationError::NoBillableRows);
    }

    Ok(())
}
