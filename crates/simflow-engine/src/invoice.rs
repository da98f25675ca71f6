//! # Invoice Generator
//!
//! Turns a retailer's outstanding credit into a billable document and walks
//! it through its lifecycle.
//!
//! ## Invoice Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  generate(retailer)          dispatch(number)      confirm_payment(no.) │
//! │        │                          │                        │            │
//! │        ▼                          ▼                        ▼            │
//! │    PENDING ───deliver ok────► SENT ─────────────────► PAID             │
//! │        │                                                   │            │
//! │        └──deliver failed: stays PENDING,                   │            │
//! │           dispatch retryable                    used_credit −= total    │
//! │                                                                         │
//! │  Forward-only. The account's billing status shadows the invoice.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The total is a snapshot of the account's used credit at generation time;
//! debits landing afterwards belong to the next cycle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use simflow_core::money::Money;
use simflow_core::types::{
    AccountInvoiceStatus, Invoice, InvoiceLineItem, InvoiceStatus,
};
use simflow_core::INVOICE_DUE_DAYS;

use crate::authorize::OrderBook;
use crate::credit::CreditLedger;
use crate::error::{EngineError, EngineResult};
use crate::notify::NotificationChannel;

// =============================================================================
// Invoice Generator
// =============================================================================

/// Compact retailer id for embedding in an invoice number.
fn retailer_fragment(retailer_id: &str) -> String {
    retailer_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_uppercase()
}

pub struct InvoiceGenerator {
    credit: Arc<CreditLedger>,
    orders: Arc<OrderBook>,
    invoices: RwLock<HashMap<String, Invoice>>,
    channel: Arc<dyn NotificationChannel>,
}

impl InvoiceGenerator {
    pub fn new(
        credit: Arc<CreditLedger>,
        orders: Arc<OrderBook>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        InvoiceGenerator {
            credit,
            orders,
            invoices: RwLock::new(HashMap::new()),
            channel,
        }
    }

    /// Opens a billing cycle for a retailer: snapshots used credit as the
    /// invoice total, itemizes it from the completed credit orders not yet
    /// billed, and puts the invoice in PENDING.
    ///
    /// Line items always sum to the snapshot total. Itemization stops at
    /// the snapshot: an order whose amount the balance no longer covers
    /// (partially repaid between completion and billing) is clamped, and
    /// orders past that point stay unbilled for the next cycle. A balance
    /// no unbilled order accounts for appears as a single credit-usage
    /// line, as does the whole total when nothing is itemizable.
    pub async fn generate(&self, retailer_id: &str) -> EngineResult<Invoice> {
        let account = self.credit.account(retailer_id).await?;
        let total = Money::from_cents(account.used_credit_cents);

        let billable = self.orders.uninvoiced_completed(retailer_id).await;
        let mut line_items: Vec<InvoiceLineItem> = Vec::with_capacity(billable.len() + 1);
        let mut billed_ids: Vec<String> = Vec::with_capacity(billable.len());
        let mut covered = Money::zero();
        for order in &billable {
            let remaining = total - covered;
            if remaining.is_zero() {
                break;
            }
            line_items.push(InvoiceLineItem {
                description: format!(
                    "Order {} ({} line{})",
                    order.id,
                    order.lines.len(),
                    if order.lines.len() == 1 { "" } else { "s" }
                ),
                order_id: Some(order.id.clone()),
                amount_cents: order.total().min(remaining).cents(),
            });
            billed_ids.push(order.id.clone());
            covered += order.total().min(remaining);
        }
        if covered < total || line_items.is_empty() {
            line_items.push(InvoiceLineItem {
                description: "Credit usage".to_string(),
                order_id: None,
                amount_cents: (total - covered).cents(),
            });
        }

        let issue_date = Utc::now();
        let invoice = Invoice {
            invoice_number: format!(
                "INV-{}-{}-{}",
                issue_date.format("%Y%m%d%H%M%S"),
                retailer_fragment(retailer_id),
                Uuid::new_v4().simple().to_string()[..8].to_uppercase()
            ),
            retailer_id: retailer_id.to_string(),
            issue_date,
            due_date: issue_date + Duration::days(INVOICE_DUE_DAYS),
            line_items,
            total_amount_cents: total.cents(),
            status: InvoiceStatus::Pending,
        };

        self.orders.mark_invoiced(&billed_ids).await;

        // A retailer whose last invoice was paid starts a fresh cycle.
        if account.invoice_status == AccountInvoiceStatus::Paid {
            self.credit.reset_invoice_status(retailer_id).await?;
        }
        self.credit
            .advance_invoice_status(retailer_id, AccountInvoiceStatus::Pending)
            .await?;

        info!(
            invoice_number = %invoice.invoice_number,
            retailer_id,
            total = invoice.total_amount_cents,
            due = %invoice.due_date,
            "Invoice generated"
        );
        self.invoices
            .write()
            .await
            .insert(invoice.invoice_number.clone(), invoice.clone());
        Ok(invoice)
    }

    /// Hands a PENDING invoice to the notification channel.
    ///
    /// On success the invoice moves to SENT. On failure it stays PENDING
    /// and dispatch can be retried; the failure is surfaced as
    /// [`EngineError::InvoiceDeliveryFailed`].
    pub async fn dispatch(&self, invoice_number: &str) -> EngineResult<Invoice> {
        let mut invoices = self.invoices.write().await;
        let invoice =
            invoices
                .get_mut(invoice_number)
                .ok_or_else(|| EngineError::InvoiceNotFound {
                    invoice_number: invoice_number.to_string(),
                })?;

        if invoice.status != InvoiceStatus::Pending {
            return Err(EngineError::InvalidInvoiceStatus {
                invoice_number: invoice_number.to_string(),
                status: invoice.status,
            });
        }

        if let Err(err) = self.channel.deliver_invoice(invoice) {
            warn!(
                invoice_number,
                %err,
                "Invoice delivery failed, staying PENDING"
            );
            return Err(EngineError::InvoiceDeliveryFailed {
                invoice_number: invoice_number.to_string(),
                reason: err.to_string(),
            });
        }

        invoice.status = InvoiceStatus::Sent;
        let retailer_id = invoice.retailer_id.clone();
        let snapshot = invoice.clone();
        drop(invoices);

        self.credit
            .advance_invoice_status(&retailer_id, AccountInvoiceStatus::Sent)
            .await?;

        info!(invoice_number, retailer_id = %retailer_id, "Invoice dispatched");
        Ok(snapshot)
    }

    /// Records payment of a SENT invoice: the invoice moves to PAID and the
    /// invoiced amount is credited back to the retailer's line.
    pub async fn confirm_payment(&self, invoice_number: &str) -> EngineResult<Invoice> {
        let mut invoices = self.invoices.write().await;
        let invoice =
            invoices
                .get_mut(invoice_number)
                .ok_or_else(|| EngineError::InvoiceNotFound {
                    invoice_number: invoice_number.to_string(),
                })?;

        if invoice.status != InvoiceStatus::Sent {
            return Err(EngineError::InvalidInvoiceStatus {
                invoice_number: invoice_number.to_string(),
                status: invoice.status,
            });
        }

        invoice.status = InvoiceStatus::Paid;
        let retailer_id = invoice.retailer_id.clone();
        let total = Money::from_cents(invoice.total_amount_cents);
        let snapshot = invoice.clone();
        drop(invoices);

        self.credit.credit(&retailer_id, total).await?;
        self.credit
            .advance_invoice_status(&retailer_id, AccountInvoiceStatus::Paid)
            .await?;

        info!(
            invoice_number,
            retailer_id = %retailer_id,
            amount = total.cents(),
            "Invoice paid, credit restored"
        );
        Ok(snapshot)
    }

    /// Snapshot of an invoice by number.
    pub async fn get(&self, invoice_number: &str) -> EngineResult<Invoice> {
        self.invoices
            .read()
            .await
            .get(invoice_number)
            .cloned()
            .ok_or_else(|| EngineError::InvoiceNotFound {
                invoice_number: invoice_number.to_string(),
            })
    }

    /// All invoices for a retailer, newest first.
    pub async fn for_retailer(&self, retailer_id: &str) -> Vec<Invoice> {
        let invoices = self.invoices.read().await;
        let mut result: Vec<Invoice> = invoices
            .values()
            .filter(|invoice| invoice.retailer_id == retailer_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.issue_date.cmp(&a.issue_date));
        debug!(retailer_id, count = result.len(), "Invoices listed");
        result
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
