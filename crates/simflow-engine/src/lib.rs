//! # SimFlow Engine
//!
//! Stateful ordering and billing engine for a prepaid top-up and eSIM
//! reseller. Pure calculation lives in `simflow-core`; this crate owns the
//! shared mutable state and its concurrency discipline.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Engine                                     │
//! │                                                                         │
//! │  ┌───────────┐  ┌──────────────────┐  ┌──────────────┐                 │
//! │  │  Catalog   │  │ PromotionDirectory│  │ CreditLedger │──► threshold   │
//! │  │ (stock     │  │ (pure evaluate,   │  │ (per-account │    events      │
//! │  │  pools)    │  │  usage counts)    │  │  locks)      │                 │
//! │  └─────┬─────┘  └────────┬─────────┘  └──────┬───────┘                 │
//! │        │                 │                    │                         │
//! │        └────────┬────────┴────────────────────┘                         │
//! │                 ▼                                                       │
//! │         OrderAuthorizer ──► OrderBook ──► InvoiceGenerator              │
//! │         (all-or-nothing)                  (PENDING→SENT→PAID)           │
//! │                                                │                        │
//! │                                                ▼                        │
//! │                                       NotificationChannel               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//! - One `tokio::sync::Mutex` per stock pool and per retailer account, held
//!   across the full check-then-act sequence.
//! - Registries are `RwLock<HashMap<..>>` of those handles; locks are taken
//!   one at a time, never nested across pools or accounts.
//! - Credit threshold alerts flow over an unbounded mpsc channel so the
//!   debit path never blocks on a slow consumer.

pub mod authorize;
pub mod catalog;
pub mod credit;
pub mod error;
pub mod invoice;
pub mod notify;
pub mod promotions;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use simflow_core::money::Money;
use simflow_core::types::{
    CatalogItem, Invoice, Order, OrderRequest, Promotion, RetailerAccount,
};

pub use authorize::{OrderAuthorizer, OrderBook};
pub use catalog::{Catalog, Reservation};
pub use credit::CreditLedger;
pub use error::{EngineError, EngineResult};
pub use invoice::InvoiceGenerator;
pub use notify::{
    CreditThresholdCrossed, DeliveryError, LogNotificationChannel, NotificationChannel,
};
pub use promotions::PromotionDirectory;

// =============================================================================
// Engine Facade
// =============================================================================

/// Wires the components together and exposes the operations a transport
/// layer (HTTP API, gRPC service) would call.
///
/// Cheap to share: wrap it in an `Arc` and clone the handle per task.
pub struct Engine {
    catalog: Arc<Catalog>,
    promotions: Arc<PromotionDirectory>,
    credit: Arc<CreditLedger>,
    orders: Arc<OrderBook>,
    authorizer: OrderAuthorizer,
    invoices: InvoiceGenerator,
}

impl Engine {
    /// Builds an engine delivering invoices over the given channel. Returns
    /// the receiving end of the credit threshold alert stream alongside it.
    pub fn new(
        channel: Arc<dyn NotificationChannel>,
    ) -> (Self, mpsc::UnboundedReceiver<CreditThresholdCrossed>) {
        let catalog = Arc::new(Catalog::new());
        let promotions = Arc::new(PromotionDirectory::new());
        let (credit, events) = CreditLedger::new();
        let credit = Arc::new(credit);
        let orders = Arc::new(OrderBook::new());

        let authorizer = OrderAuthorizer::new(
            catalog.clone(),
            promotions.clone(),
            credit.clone(),
            orders.clone(),
        );
        let invoices = InvoiceGenerator::new(credit.clone(), orders.clone(), channel);

        (
            Engine {
                catalog,
                promotions,
                credit,
                orders,
                authorizer,
                invoices,
            },
            events,
        )
    }

    /// Engine with the default log-backed notification channel.
    pub fn with_log_channel() -> (Self, mpsc::UnboundedReceiver<CreditThresholdCrossed>) {
        Self::new(Arc::new(LogNotificationChannel))
    }

    // ====== Catalog ======

    pub async fn upsert_item(&self, item: CatalogItem) {
        self.catalog.upsert_item(item).await;
    }

    pub async fn set_pool_stock(&self, pool_id: &str, quantity: i64) {
        self.catalog.set_pool_stock(pool_id, quantity).await;
    }

    pub async fn get_item(&self, item_id: &str) -> EngineResult<CatalogItem> {
        self.catalog.get_item(item_id).await
    }

    pub async fn available_stock(&self, item_id: &str) -> EngineResult<i64> {
        self.catalog.available(item_id).await
    }

    // ====== Promotions ======

    pub async fn upsert_promotion(&self, promotion: Promotion) -> EngineResult<()> {
        self.promotions.upsert(promotion).await
    }

    /// Checkout preview: evaluates a promo code against a subtotal without
    /// consuming anything. Unlike authorization, failures surface here as
    /// typed errors so the UI can explain them.
    pub async fn preview_discount(&self, code: &str, subtotal: Money) -> EngineResult<Money> {
        Ok(self.promotions.evaluate(code, subtotal, Utc::now()).await?)
    }

    // ====== Retailers & Credit ======

    pub async fn provision_retailer(&self, account: RetailerAccount) -> EngineResult<()> {
        self.credit.provision(account).await
    }

    pub async fn retailer_account(&self, retailer_id: &str) -> EngineResult<RetailerAccount> {
        self.credit.account(retailer_id).await
    }

    pub async fn available_credit(&self, retailer_id: &str) -> EngineResult<Money> {
        self.credit.available_credit(retailer_id).await
    }

    // ====== Orders ======

    pub async fn authorize(&self, request: OrderRequest) -> EngineResult<Order> {
        self.authorizer.authorize(request).await
    }

    pub async fn complete_order(&self, order_id: &str) -> EngineResult<Order> {
        self.authorizer.complete_order(order_id).await
    }

    pub async fn abort_order(&self, order_id: &str) -> EngineResult<Order> {
        self.authorizer.abort_order(order_id).await
    }

    pub async fn get_order(&self, order_id: &str) -> EngineResult<Order> {
        self.authorizer.get_order(order_id).await
    }

    // ====== Invoices ======

    pub async fn generate_invoice(&self, retailer_id: &str) -> EngineResult<Invoice> {
        self.invoices.generate(retailer_id).await
    }

    pub async fn dispatch_invoice(&self, invoice_number: &str) -> EngineResult<Invoice> {
        self.invoices.dispatch(invoice_number).await
    }

    pub async fn confirm_invoice_payment(&self, invoice_number: &str) -> EngineResult<Invoice> {
        self.invoices.confirm_payment(invoice_number).await
    }

    pub async fn get_invoice(&self, invoice_number: &str) -> EngineResult<Invoice> {
        self.invoices.get(invoice_number).await
    }

    pub async fn invoices_for(&self, retailer_id: &str) -> Vec<Invoice> {
        self.invoices.for_retailer(retailer_id).await
    }

    /// Completed credit orders for a retailer not yet billed.
    pub async fn unbilled_orders(&self, retailer_id: &str) -> Vec<Order> {
        self.orders.uninvoiced_completed(retailer_id).await
    }
}
