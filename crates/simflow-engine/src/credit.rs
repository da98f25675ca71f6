//! # Credit Ledger
//!
//! Tracks each retailer's revolving credit line: limit, used credit, and
//! the derived available balance.
//!
//! ## Invariants
//! - `0 <= used_credit <= credit_limit`, always. The ceiling is enforced in
//!   `debit` under the account lock; the floor in `credit`.
//! - Used credit only grows through `debit` (order authorization) and only
//!   shrinks through `credit` (confirmed invoice payment).
//!
//! ## Threshold Alerts
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  debit(retailer, amount)                                                │
//! │                                                                         │
//! │  usage before: 85%     usage after: 92%                                │
//! │         │                     │                                         │
//! │         └────────── 90% ──────┘   ──► CreditThresholdCrossed { 9000 }  │
//! │                                                                         │
//! │  Events are at-least-once and idempotent per crossing; they alert,     │
//! │  they never gate. A full send buffer or dropped receiver only logs.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

use simflow_core::money::Money;
use simflow_core::types::{AccountInvoiceStatus, RetailerAccount};
use simflow_core::validation::validate_credit_limit_cents;
use simflow_core::{CREDIT_FULL_BPS, CREDIT_WARN_BPS};

use crate::error::{EngineError, EngineResult};
use crate::notify::CreditThresholdCrossed;

// =============================================================================
// Credit Ledger
// =============================================================================

/// In-memory ledger of retailer credit lines, one lock per account.
pub struct CreditLedger {
    accounts: RwLock<HashMap<String, Arc<Mutex<RetailerAccount>>>>,
    events: mpsc::UnboundedSender<CreditThresholdCrossed>,
}

impl CreditLedger {
    /// Creates the ledger and the receiving end of its alert stream.
    ///
    /// The receiver is consumed externally (email/WhatsApp alerter). An
    /// unbounded channel keeps the debit path non-blocking.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CreditThresholdCrossed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            CreditLedger {
                accounts: RwLock::new(HashMap::new()),
                events: tx,
            },
            rx,
        )
    }

    /// Registers a retailer account.
    pub async fn provision(&self, account: RetailerAccount) -> EngineResult<()> {
        validate_credit_limit_cents(account.credit_limit_cents)?;

        info!(
            retailer_id = %account.id,
            level = ?account.level,
            credit_limit = account.credit_limit_cents,
            "Provisioning retailer account"
        );
        self.accounts
            .write()
            .await
            .insert(account.id.clone(), Arc::new(Mutex::new(account)));
        Ok(())
    }

    /// Snapshot of an account's current state.
    pub async fn account(&self, retailer_id: &str) -> EngineResult<RetailerAccount> {
        let handle = self.handle(retailer_id).await?;
        let account = handle.lock().await;
        Ok(account.clone())
    }

    /// Credit still available for new orders: limit − used.
    pub async fn available_credit(&self, retailer_id: &str) -> EngineResult<Money> {
        let handle = self.handle(retailer_id).await?;
        let account = handle.lock().await;
        Ok(account.available_credit())
    }

    /// Increases used credit by `amount`, atomically against the ceiling.
    ///
    /// The account lock is held for the whole check-then-act sequence, so
    /// two concurrent debits can never jointly push used credit past the
    /// limit.
    pub async fn debit(&self, retailer_id: &str, amount: Money) -> EngineResult<()> {
        let handle = self.handle(retailer_id).await?;
        let mut account = handle.lock().await;

        let available = account.available_credit();
        if amount > available {
            return Err(EngineError::CreditLimitExceeded {
                retailer_id: retailer_id.to_string(),
                available_cents: available.cents(),
                requested_cents: amount.cents(),
            });
        }

        let usage_before = account.usage_bps();
        account.used_credit_cents += amount.cents();
        let usage_after = account.usage_bps();

        debug!(
            retailer_id,
            amount = amount.cents(),
            used = account.used_credit_cents,
            limit = account.credit_limit_cents,
            "Credit debited"
        );

        self.emit_threshold_crossings(retailer_id, usage_before, usage_after);
        Ok(())
    }

    /// Decreases used credit by `amount`, floored at zero.
    ///
    /// Called only on confirmed invoice payment.
    pub async fn credit(&self, retailer_id: &str, amount: Money) -> EngineResult<()> {
        let handle = self.handle(retailer_id).await?;
        let mut account = handle.lock().await;

        let used = Money::from_cents(account.used_credit_cents);
        account.used_credit_cents = used.saturating_sub_floor_zero(amount).cents();

        info!(
            retailer_id,
            amount = amount.cents(),
            used = account.used_credit_cents,
            "Credit restored from invoice payment"
        );
        Ok(())
    }

    /// Advances the account's billing status if the transition is legal.
    /// Returns whether the transition happened.
    pub async fn advance_invoice_status(
        &self,
        retailer_id: &str,
        next: AccountInvoiceStatus,
    ) -> EngineResult<bool> {
        let handle = self.handle(retailer_id).await?;
        let mut account = handle.lock().await;

        if account.invoice_status.can_advance_to(next) {
            debug!(
                retailer_id,
                from = ?account.invoice_status,
                to = ?next,
                "Billing status advanced"
            );
            account.invoice_status = next;
            Ok(true)
        } else {
            debug!(
                retailer_id,
                current = ?account.invoice_status,
                rejected = ?next,
                "Billing status transition rejected"
            );
            Ok(false)
        }
    }

    /// Explicit reset back to None when a new billing cycle opens.
    pub async fn reset_invoice_status(&self, retailer_id: &str) -> EngineResult<()> {
        let handle = self.handle(retailer_id).await?;
        let mut account = handle.lock().await;
        account.invoice_status = AccountInvoiceStatus::None;
        Ok(())
    }

    fn emit_threshold_crossings(&self, retailer_id: &str, before_bps: u32, after_bps: u32) {
        for threshold_bps in [CREDIT_WARN_BPS, CREDIT_FULL_BPS] {
            if before_bps < threshold_bps && after_bps >= threshold_bps {
                warn!(
                    retailer_id,
                    threshold_bps,
                    usage_bps = after_bps,
                    "Credit usage threshold crossed"
                );
                let event = CreditThresholdCrossed {
                    retailer_id: retailer_id.to_string(),
                    threshold_bps,
                    usage_bps: after_bps,
                    occurred_at: Utc::now(),
                };
                if self.events.send(event).is_err() {
                    // alerting consumer is gone; the ledger keeps working
                    warn!(retailer_id, "Threshold event dropped, no consumer");
                }
            }
        }
    }

    async fn handle(&self, retailer_id: &str) -> EngineResult<Arc<Mutex<RetailerAccount>>> {
        self.accounts
            .read()
            .await
            .get(retailer_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownRetailer {
                retailer_id: retailer_id.to_string(),
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
