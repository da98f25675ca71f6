//! # Domain Types
//!
//! Core domain types used throughout simflow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │   Promotion     │   │ RetailerAccount │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  promo_code     │   │  id (UUID)      │       │
//! │  │  product_type   │   │  discount_type  │   │  credit_limit   │       │
//! │  │  base_price     │   │  usage_limit    │   │  used_credit    │       │
//! │  │  stock_quantity │   │  date window    │   │  invoice_status │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │     Order       │   │    Invoice      │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  lines (frozen) │   │  invoice_number │                             │
//! │  │  subtotal/total │   │  total snapshot │                             │
//! │  │  status         │   │  due date       │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Order lines freeze the catalog name and unit price at authorization time;
//! invoice totals freeze used credit at issuance time. Later catalog or
//! ledger changes never rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::{CREDIT_FULL_BPS, MAX_EPIN_QUANTITY};

// =============================================================================
// Catalog
// =============================================================================

/// What kind of product a catalog item is.
///
/// The product type drives the per-line quantity rule: an eSIM is a
/// single-activation digital profile, so its quantity is fixed at 1;
/// ePIN codes may be bought in small batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Textual PIN redeemable for a prepaid plan. 1-5 units per line.
    Epin,
    /// Digital SIM profile delivered as a QR code. Exactly 1 per line.
    Esim,
}

impl ProductType {
    /// Maximum quantity allowed on a single order line.
    #[inline]
    pub const fn max_line_quantity(&self) -> i64 {
        match self {
            ProductType::Epin => MAX_EPIN_QUANTITY,
            ProductType::Esim => 1,
        }
    }
}

/// A purchasable item in the reseller catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name ("Telenor 500 MB ePIN", "Roam eSIM 5GB").
    pub name: String,

    /// ePIN or eSIM. Drives the per-line quantity rule.
    pub product_type: ProductType,

    /// Unit price in cents.
    pub base_price_cents: i64,

    /// Units remaining. Never goes below zero.
    pub stock_quantity: i64,

    /// Optional shared-inventory bucket. Listings with the same pool id
    /// draw down one stock count.
    pub stock_pool_id: Option<String>,
}

impl CatalogItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }

    /// The inventory bucket this item draws from: its stock pool if it has
    /// one, otherwise its own id.
    pub fn pool_key(&self) -> &str {
        self.stock_pool_id.as_deref().unwrap_or(&self.id)
    }
}

// =============================================================================
// Promotions
// =============================================================================

/// How a promotion's discount is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a whole percentage of the subtotal (1-100).
    Percentage,
    /// `discount_value` is a fixed amount in cents.
    FixedAmount,
}

/// Promotion status, derived from the date window at evaluation time.
/// Never stored; always recomputed from `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionStatus {
    /// `now` is before the start date.
    Scheduled,
    /// `now` is inside [start_date, end_date].
    Active,
    /// `now` is past the end date.
    Expired,
}

/// A promotional discount unlocked by a promo code at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: String,

    /// The code customers type. Matched case-insensitively.
    pub promo_code: String,

    pub discount_type: DiscountType,

    /// Percentage (1-100) or fixed cents, depending on `discount_type`.
    pub discount_value: i64,

    /// Minimum order subtotal in cents for the promotion to apply.
    pub min_order_value_cents: Option<i64>,

    /// Maximum number of redemptions. None = unlimited.
    pub usage_limit: Option<u32>,

    /// Redemptions so far. Incremented once per authorized order that
    /// applied this promotion; never decremented.
    pub usage_count: u32,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Promotion {
    /// Computes the status from the date window.
    pub fn status_at(&self, now: DateTime<Utc>) -> PromotionStatus {
        if now < self.start_date {
            PromotionStatus::Scheduled
        } else if now > self.end_date {
            PromotionStatus::Expired
        } else {
            PromotionStatus::Active
        }
    }

    /// Whether the usage cap (if any) has been reached.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.usage_limit, Some(limit) if self.usage_count >= limit)
    }
}

// =============================================================================
// Retailer Accounts
// =============================================================================

/// Commercial tier of a retailer. Assigned at provisioning; informational
/// for the engine (limits are carried explicitly on the account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetailerLevel {
    Entry,
    Silver,
    Gold,
    Diamond,
}

/// Where a retailer account stands in the billing cycle.
///
/// Transitions are forward-only (None → Pending → Sent → Paid) except for
/// an explicit reset back to None when a new cycle opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountInvoiceStatus {
    None,
    Pending,
    Sent,
    Paid,
}

impl AccountInvoiceStatus {
    /// Whether moving to `next` is a legal forward transition.
    pub fn can_advance_to(&self, next: AccountInvoiceStatus) -> bool {
        use AccountInvoiceStatus::*;
        matches!(
            (self, next),
            (None, Pending) | (Pending, Sent) | (Sent, Paid)
        )
    }
}

/// A B2B retailer with a revolving credit line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailerAccount {
    pub id: String,
    pub level: RetailerLevel,

    /// Maximum outstanding balance in cents. Always > 0.
    pub credit_limit_cents: i64,

    /// Outstanding balance in cents. Invariant: 0 <= used <= limit,
    /// enforced by the credit ledger's debit path.
    pub used_credit_cents: i64,

    pub invoice_status: AccountInvoiceStatus,
}

impl RetailerAccount {
    /// Credit still available for new orders.
    #[inline]
    pub fn available_credit(&self) -> Money {
        Money::from_cents(self.credit_limit_cents - self.used_credit_cents)
    }

    /// Credit usage as basis points of the limit (10000 = 100%).
    ///
    /// Integer math so threshold comparisons (90%, 100%) are exact.
    pub fn usage_bps(&self) -> u32 {
        if self.credit_limit_cents <= 0 {
            return CREDIT_FULL_BPS;
        }
        ((self.used_credit_cents as i128 * 10000) / self.credit_limit_cents as i128) as u32
    }

    /// Credit usage as a percentage, for display.
    pub fn usage_percentage(&self) -> f64 {
        self.usage_bps() as f64 / 100.0
    }
}

// =============================================================================
// Orders
// =============================================================================

/// How an order is (or will be) paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Debited against the retailer's revolving credit line.
    CreditLine,
    /// Captured by the external payment gateway after authorization.
    ExternalGateway,
}

/// Terminal and intermediate order states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Stock (and credit, for retailer orders) secured. Awaiting payment
    /// capture unless paid by credit line.
    Authorized,
    /// Authorization failed; nothing was retained.
    Rejected,
    /// Paid and final. Immutable from here on.
    Completed,
}

/// A line item on an order.
/// Uses the snapshot pattern: catalog name and price frozen at authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: String,

    /// Catalog name at authorization time (frozen).
    pub name_snapshot: String,

    pub product_type: ProductType,

    pub quantity: i64,

    /// Unit price in cents at authorization time (frozen).
    pub unit_price_cents: i64,
}

impl OrderLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// An authorized (or completed) order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,

    /// Present for B2B credit orders, absent for consumer orders.
    pub retailer_id: Option<String>,

    pub lines: Vec<OrderLine>,

    /// The promo code the buyer supplied, applied or not.
    pub promo_code: Option<String>,

    pub subtotal_cents: i64,
    pub discount_cents: i64,

    /// Invariant: total = subtotal - discount, never negative.
    pub total_cents: i64,

    pub payment_method: PaymentMethod,
    pub status: OrderStatus,

    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Requests
// =============================================================================

/// One requested line on a proposed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequestLine {
    pub item_id: String,
    pub quantity: i64,
}

/// A proposed order, as it arrives from checkout. Prices come from the
/// catalog at authorization time, never from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Present for retailer (credit) orders.
    pub retailer_id: Option<String>,

    pub lines: Vec<OrderRequestLine>,

    pub promo_code: Option<String>,

    pub payment_method: PaymentMethod,
}

// =============================================================================
// Invoices
// =============================================================================

/// Invoice lifecycle. PENDING until dispatched, SENT until the external
/// payment confirmation arrives, then PAID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Sent,
    Paid,
}

/// One line on an invoice. `order_id` links back to the completed order it
/// was itemized from, when that itemization was possible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub description: String,
    pub order_id: Option<String>,
    pub amount_cents: i64,
}

/// A formal bill for a retailer's outstanding used credit.
///
/// `total_amount_cents` is a snapshot of used credit at issuance and never
/// changes afterwards, even as the ledger moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique, derived from issuance timestamp + retailer id.
    pub invoice_number: String,

    pub retailer_id: String,

    pub issue_date: DateTime<Utc>,

    /// issue_date + 7 days.
    pub due_date: DateTime<Utc>,

    pub line_items: Vec<InvoiceLineItem>,

    /// Snapshot of used credit at issuance.
    pub total_amount_cents: i64,

    pub status: InvoiceStatus,
}

impl Invoice {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
