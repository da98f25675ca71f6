//! # Notification Seam
//!
//! The engine never sends email or WhatsApp itself. It emits events and
//! hands documents to a [`NotificationChannel`]; delivery is the external
//! channel's problem. Delivery failures are logged, never fatal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use simflow_core::types::Invoice;

// =============================================================================
// Credit Threshold Events
// =============================================================================

/// Emitted after a debit pushes a retailer's credit usage across an alert
/// threshold (90% or 100%).
///
/// Semantics are at-least-once and idempotent per threshold crossing:
/// consumers alert, they do not reconcile balances from these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditThresholdCrossed {
    pub retailer_id: String,

    /// The threshold that was crossed, in basis points (9000 or 10000).
    pub threshold_bps: u32,

    /// Usage after the debit, in basis points.
    pub usage_bps: u32,

    pub occurred_at: DateTime<Utc>,
}

// =============================================================================
// Invoice Delivery
// =============================================================================

/// The external channel could not deliver a document.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct DeliveryError {
    pub reason: String,
}

impl DeliveryError {
    pub fn new(reason: impl Into<String>) -> Self {
        DeliveryError {
            reason: reason.into(),
        }
    }
}

/// Outbound seam for invoice dispatch.
///
/// Implementations wrap whatever the deployment uses (backend API call,
/// message queue). Must be cheap to call; retries belong to the caller.
pub trait NotificationChannel: Send + Sync {
    fn deliver_invoice(&self, invoice: &Invoice) -> Result<(), DeliveryError>;
}

/// Default channel: logs the serialized invoice and reports success.
///
/// Useful in tests and in deployments where dispatch is picked up from the
/// log pipeline.
#[derive(Debug, Default)]
pub struct LogNotificationChannel;

impl NotificationChannel for LogNotificationChannel {
    fn deliver_invoice(&self, invoice: &Invoice) -> Result<(), DeliveryError> {
        let payload = serde_json::to_string(invoice)
            .map_err(|e| DeliveryError::new(format!("serialize invoice: {e}")))?;
        info!(
            invoice_number = %invoice.invoice_number,
            retailer_id = %invoice.retailer_id,
            %payload,
            "Invoice handed to notification channel"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
