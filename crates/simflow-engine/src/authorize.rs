//! # Order Authorizer
//!
//! Turns an order request into an AUTHORIZED order, or rejects it with
//! nothing retained.
//!
//! ## Authorization Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  authorize(request)                                                     │
//! │                                                                         │
//! │  1. validate shape          ──fail──► Validation (nothing taken)        │
//! │  2. resolve + check lines   ──fail──► UnknownItem / quantity rule       │
//! │  3. reserve stock per line  ──fail──► OutOfStock, release prior holds   │
//! │  4. subtotal from frozen catalog prices                                 │
//! │  5. promo evaluate          ──fail──► discount = 0, checkout continues  │
//! │  6. total = subtotal − discount                                         │
//! │  7. credit debit (retailer) ──fail──► CreditLimitExceeded, release all  │
//! │  8. record promo use, build order                                       │
//! │       • credit order   → COMPLETED now, reservations finalized          │
//! │       • consumer order → AUTHORIZED, reservations held for the gateway  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## All-or-Nothing
//! Any failure after step 2 releases every reservation taken for this order
//! before the error is returned. No partial order is ever retained.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use simflow_core::money::Money;
use simflow_core::types::{
    Order, OrderLine, OrderRequest, OrderStatus, PaymentMethod,
};
use simflow_core::validation::{validate_line_quantity, validate_order_request};

use crate::catalog::{Catalog, Reservation};
use crate::credit::CreditLedger;
use crate::error::{EngineError, EngineResult};
use crate::promotions::PromotionDirectory;

// =============================================================================
// Order Book
// =============================================================================

struct StoredOrder {
    order: Order,
    /// Held only while the order is AUTHORIZED and awaiting the gateway.
    reservations: Vec<Reservation>,
    /// Set once the order has appeared on an invoice.
    invoiced: bool,
}

/// Record of every order the authorizer has produced. Shared with the
/// invoice generator, which itemizes bills from completed credit orders.
pub struct OrderBook {
    orders: RwLock<HashMap<String, StoredOrder>>,
}

impl OrderBook {
    pub fn new() -> Self {
        OrderBook {
            orders: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of an order by id.
    pub async fn get(&self, order_id: &str) -> Option<Order> {
        self.orders
            .read()
            .await
            .get(order_id)
            .map(|stored| stored.order.clone())
    }

    /// Completed credit orders for a retailer that have not yet been billed.
    pub async fn uninvoiced_completed(&self, retailer_id: &str) -> Vec<Order> {
        let orders = self.orders.read().await;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|stored| {
                !stored.invoiced
                    && stored.order.status == OrderStatus::Completed
                    && stored.order.retailer_id.as_deref() == Some(retailer_id)
            })
            .map(|stored| stored.order.clone())
            .collect();
        result.sort_by_key(|order| order.created_at);
        result
    }

    /// Marks orders as billed so the next invoice starts fresh.
    pub async fn mark_invoiced(&self, order_ids: &[String]) {
        let mut orders = self.orders.write().await;
        for id in order_ids {
            if let Some(stored) = orders.get_mut(id) {
                stored.invoiced = true;
            }
        }
    }

    pub(crate) async fn insert(&self, order: Order, reservations: Vec<Reservation>) {
        self.orders.write().await.insert(
            order.id.clone(),
            StoredOrder {
                order,
                reservations,
                invoiced: false,
            },
        );
    }

    /// Transitions an AUTHORIZED order and hands back its reservations.
    /// Status check and reservation hand-off happen under one lock.
    async fn settle(
        &self,
        order_id: &str,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> EngineResult<(Order, Vec<Reservation>)> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(order_id)
            .ok_or_else(|| EngineError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;

        if stored.order.status != OrderStatus::Authorized {
            return Err(EngineError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                status: stored.order.status,
            });
        }

        stored.order.status = next;
        if next == OrderStatus::Completed {
            stored.order.completed_at = Some(now);
        }
        let reservations = std::mem::take(&mut stored.reservations);
        Ok((stored.order.clone(), reservations))
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Order Authorizer
// =============================================================================

pub struct OrderAuthorizer {
    catalog: Arc<Catalog>,
    promotions: Arc<PromotionDirectory>,
    credit: Arc<CreditLedger>,
    orders: Arc<OrderBook>,
}

impl OrderAuthorizer {
    pub fn new(
        catalog: Arc<Catalog>,
        promotions: Arc<PromotionDirectory>,
        credit: Arc<CreditLedger>,
        orders: Arc<OrderBook>,
    ) -> Self {
        OrderAuthorizer {
            catalog,
            promotions,
            credit,
            orders,
        }
    }

    /// Authorizes a proposed order.
    ///
    /// A request with `retailer_id` set is a B2B credit order: the total is
    /// debited from the retailer's credit line and the order completes
    /// immediately. Consumer orders come back AUTHORIZED with their stock
    /// held until the payment gateway settles via [`complete_order`] or
    /// [`abort_order`].
    ///
    /// An invalid or inapplicable promo code never blocks checkout; the
    /// discount is simply zero.
    ///
    /// [`complete_order`]: OrderAuthorizer::complete_order
    /// [`abort_order`]: OrderAuthorizer::abort_order
    pub async fn authorize(&self, request: OrderRequest) -> EngineResult<Order> {
        validate_order_request(&request)?;
        let now = Utc::now();

        // Resolve items and re-check the per-type quantity rule with the
        // catalog in hand. Nothing is reserved yet, so failures here need
        // no rollback.
        let mut resolved = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let item = self.catalog.get_item(&line.item_id).await?;
            validate_line_quantity(item.product_type, line.quantity)?;
            resolved.push((item, line.quantity));
        }

        // Reserve stock line by line; all-or-nothing.
        let mut reservations: Vec<Reservation> = Vec::with_capacity(resolved.len());
        for (item, quantity) in &resolved {
            match self.catalog.reserve(&item.id, *quantity).await {
                Ok(reservation) => reservations.push(reservation),
                Err(err) => {
                    debug!(item_id = %item.id, "Reservation failed, rolling back order");
                    self.release_all(reservations).await;
                    return Err(err);
                }
            }
        }

        // Freeze catalog names and prices onto the order lines.
        let lines: Vec<OrderLine> = resolved
            .iter()
            .map(|(item, quantity)| OrderLine {
                item_id: item.id.clone(),
                name_snapshot: item.name.clone(),
                product_type: item.product_type,
                quantity: *quantity,
                unit_price_cents: item.base_price_cents,
            })
            .collect();
        let subtotal: Money = lines.iter().map(OrderLine::line_total).sum();

        // Promotion is advisory: a failure zeroes the discount, it never
        // blocks checkout.
        let mut discount = Money::zero();
        let mut promo_applied = false;
        if let Some(code) = &request.promo_code {
            match self.promotions.evaluate(code, subtotal, now).await {
                Ok(amount) => {
                    discount = amount;
                    promo_applied = true;
                }
                Err(err) => {
                    debug!(promo_code = %code, %err, "Promo code not applied");
                }
            }
        }

        // evaluate caps the discount at the subtotal, so total >= 0
        let total = subtotal - discount;

        let is_credit_order = request.retailer_id.is_some();
        if let Some(retailer_id) = &request.retailer_id {
            if let Err(err) = self.credit.debit(retailer_id, total).await {
                debug!(retailer_id = %retailer_id, "Credit debit failed, rolling back order");
                self.release_all(reservations).await;
                return Err(err);
            }
        }

        if promo_applied {
            // usage counts only once the order is fully authorized
            if let Some(code) = &request.promo_code {
                self.promotions.record_use(code).await;
            }
        }

        let order = Order {
            id: Uuid::new_v4().to_string(),
            retailer_id: request.retailer_id.clone(),
            lines,
            promo_code: request.promo_code.clone(),
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            total_cents: total.cents(),
            // retailer presence defines a credit order; consumer orders
            // keep whatever tender the request named
            payment_method: if is_credit_order {
                PaymentMethod::CreditLine
            } else {
                request.payment_method
            },
            status: if is_credit_order {
                OrderStatus::Completed
            } else {
                OrderStatus::Authorized
            },
            created_at: now,
            completed_at: is_credit_order.then_some(now),
        };

        if is_credit_order {
            // ledger debit settles the order; the decrements are permanent
            for reservation in reservations {
                self.catalog.finalize(reservation).await;
            }
            self.orders.insert(order.clone(), Vec::new()).await;
        } else {
            self.orders.insert(order.clone(), reservations).await;
        }

        info!(
            order_id = %order.id,
            retailer_id = ?order.retailer_id,
            subtotal = order.subtotal_cents,
            discount = order.discount_cents,
            total = order.total_cents,
            status = ?order.status,
            "Order authorized"
        );
        Ok(order)
    }

    /// Gateway callback: payment captured. Finalizes the held stock and
    /// marks the order COMPLETED (immutable from here on).
    pub async fn complete_order(&self, order_id: &str) -> EngineResult<Order> {
        let (order, reservations) = self
            .orders
            .settle(order_id, OrderStatus::Completed, Utc::now())
            .await?;
        for reservation in reservations {
            self.catalog.finalize(reservation).await;
        }

        info!(order_id = %order.id, total = order.total_cents, "Order completed");
        Ok(order)
    }

    /// Gateway callback: payment failed. Releases the held stock back to
    /// its pools and marks the order REJECTED.
    pub async fn abort_order(&self, order_id: &str) -> EngineResult<Order> {
        let (order, reservations) = self
            .orders
            .settle(order_id, OrderStatus::Rejected, Utc::now())
            .await?;
        for reservation in reservations {
            self.catalog.release(reservation).await;
        }

        info!(order_id = %order.id, "Order aborted, stock released");
        Ok(order)
    }

    /// Snapshot of an order by id.
    pub async fn get_order(&self, order_id: &str) -> EngineResult<Order> {
        self.orders
            .get(order_id)
            .await
            .ok_or_else(|| EngineError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    async fn release_all(&self, reservations: Vec<Reservation>) {
        for reservation in reservations {
            self.catalog.release(reservation).await;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
