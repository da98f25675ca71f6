//! # Engine Errors
//!
//! Failure modes of the stateful layer. Everything here is recoverable by
//! the caller: retry with an adjusted quantity or code, or surface a
//! user-facing message. Nothing is fatal to the process.
//!
//! Authorization failures guarantee rollback: when `authorize` returns an
//! error, every stock reservation taken for that order has been released
//! and no credit was retained.

use thiserror::Error;

use simflow_core::error::{PromotionError, ValidationError};
use simflow_core::types::{InvoiceStatus, OrderStatus};

// =============================================================================
// Engine Error
// =============================================================================

/// Errors from the stock ledger, credit ledger, authorizer, and invoicing.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The catalog has no item with this id.
    #[error("catalog item not found: {item_id}")]
    UnknownItem { item_id: String },

    /// Requested quantity exceeds what the item's stock pool holds
    /// (or the single-activation cap for eSIMs).
    #[error("out of stock for {item_id}: available {available}, requested {requested}")]
    OutOfStock {
        item_id: String,
        available: i64,
        requested: i64,
    },

    /// No retailer account with this id has been provisioned.
    #[error("retailer account not found: {retailer_id}")]
    UnknownRetailer { retailer_id: String },

    /// A debit would push used credit past the retailer's limit.
    #[error(
        "credit limit exceeded for {retailer_id}: available {available_cents}, requested {requested_cents}"
    )]
    CreditLimitExceeded {
        retailer_id: String,
        available_cents: i64,
        requested_cents: i64,
    },

    /// No order with this id.
    #[error("order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// The order is not in a state that allows the requested transition.
    #[error("order {order_id} is {status:?}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        status: OrderStatus,
    },

    /// No invoice with this number.
    #[error("invoice not found: {invoice_number}")]
    InvoiceNotFound { invoice_number: String },

    /// The invoice is not in a state that allows the requested transition.
    #[error("invoice {invoice_number} is {status:?}, cannot perform operation")]
    InvalidInvoiceStatus {
        invoice_number: String,
        status: InvoiceStatus,
    },

    /// The notification channel could not deliver the invoice. The invoice
    /// stays PENDING and dispatch can be retried.
    #[error("invoice {invoice_number} could not be delivered: {reason}")]
    InvoiceDeliveryFailed {
        invoice_number: String,
        reason: String,
    },

    /// Promo-code failure, surfaced only on the preview path. During
    /// authorization these are swallowed and the discount is zeroed.
    #[error("promotion error: {0}")]
    Promotion(#[from] PromotionError),

    /// Request validation failure (wraps core ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::OutOfStock {
            item_id: "esim-roam-5gb".to_string(),
            available: 0,
            requested: 1,
        };
        assert_eq!(
            err.to_string(),
            "out of stock for esim-roam-5gb: available 0, requested 1"
        );

        let err = EngineError::CreditLimitExceeded {
            retailer_id: "r1".to_string(),
            available_cents: 1000_00,
            requested_cents: 2000_00,
        };
        assert_eq!(
            err.to_string(),
            "credit limit exceeded for r1: available 100000, requested 200000"
        );
    }

    #[test]
    fn test_validation_converts_to_engine_error() {
        let validation_err = ValidationError::Required {
            field: "lines".to_string(),
        };
        let err: EngineError = validation_err.into();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
