//! # Catalog & Stock Ledger
//!
//! Holds the purchasable catalog and its inventory pools, and hands out
//! stock reservations.
//!
//! ## Reservation Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Reservation Lifecycle                                │
//! │                                                                         │
//! │  reserve(item, qty) ──► pool -= qty ──► Reservation                    │
//! │                                             │                           │
//! │                       ┌─────────────────────┴────────────────────┐     │
//! │                       ▼                                          ▼     │
//! │               release(reservation)                 finalize(reservation)│
//! │               pool += qty                          decrement permanent  │
//! │               (payment failed,                     (order COMPLETED)    │
//! │                authorization rolled back)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! One `tokio::sync::Mutex` per stock pool, held for the whole
//! check-then-act sequence. Two concurrent reservations on the same pool
//! serialize; their combined effect can never drive the pool below zero.
//! Listings sharing a `stock_pool_id` serialize on the same lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use simflow_core::types::{CatalogItem, ProductType};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Reservation
// =============================================================================

/// A stock hold taken during order authorization.
///
/// Deliberately not `Clone`: a reservation is consumed exactly once, by
/// either [`Catalog::release`] or [`Catalog::finalize`].
#[derive(Debug)]
pub struct Reservation {
    pub id: String,
    pub item_id: String,
    pool_key: String,
    pub quantity: i64,
}

// =============================================================================
// Catalog
// =============================================================================

/// In-memory catalog with per-pool stock accounting.
///
/// Item records come from the external catalog source; the engine owns only
/// the authoritative in-flight stock counts. Pool quantities are the live
/// numbers; `CatalogItem::stock_quantity` is the seed at registration.
pub struct Catalog {
    items: RwLock<HashMap<String, CatalogItem>>,
    pools: RwLock<HashMap<String, Arc<Mutex<i64>>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            items: RwLock::new(HashMap::new()),
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Registers or updates a catalog item.
    ///
    /// ## Pool Seeding
    /// - Item with its own inventory: its pool is (re)seeded from
    ///   `stock_quantity` on every upsert — the catalog source owns stock
    ///   corrections.
    /// - Item drawing from a shared pool: the pool is seeded only if absent,
    ///   so a second listing joining the pool cannot clobber the shared
    ///   count. Use [`Catalog::set_pool_stock`] for corrections.
    pub async fn upsert_item(&self, item: CatalogItem) {
        debug!(item_id = %item.id, name = %item.name, "Upserting catalog item");

        let pool_key = item.pool_key().to_string();
        let shared = item.stock_pool_id.is_some();
        let seed = item.stock_quantity;

        {
            let mut pools = self.pools.write().await;
            match pools.get(&pool_key) {
                Some(pool) if !shared => {
                    let mut stock = pool.lock().await;
                    *stock = seed;
                }
                Some(_) => {} // shared pool already seeded
                None => {
                    pools.insert(pool_key, Arc::new(Mutex::new(seed)));
                }
            }
        }

        self.items.write().await.insert(item.id.clone(), item);
    }

    /// Sets a shared pool's stock directly (admin stock correction).
    pub async fn set_pool_stock(&self, pool_id: &str, quantity: i64) {
        let mut pools = self.pools.write().await;
        match pools.get(pool_id) {
            Some(pool) => *pool.lock().await = quantity,
            None => {
                pools.insert(pool_id.to_string(), Arc::new(Mutex::new(quantity)));
            }
        }
    }

    /// Returns the item with its live stock count filled in.
    pub async fn get_item(&self, item_id: &str) -> EngineResult<CatalogItem> {
        let mut item = self
            .items
            .read()
            .await
            .get(item_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownItem {
                item_id: item_id.to_string(),
            })?;

        item.stock_quantity = self.pool_quantity(item.pool_key()).await;
        Ok(item)
    }

    /// Live units available to the given item.
    pub async fn available(&self, item_id: &str) -> EngineResult<i64> {
        let item = self.get_item(item_id).await?;
        Ok(item.stock_quantity)
    }

    /// Reserves stock for one order line, decrementing the pool atomically.
    ///
    /// ## Failure Modes
    /// - `UnknownItem` - item is not registered
    /// - `OutOfStock` - pool holds fewer units than requested, or the item
    ///   is an eSIM and more than one unit was requested (single-activation)
    ///
    /// The pool lock is held across the read-decide-write sequence, so no
    /// interleaving of concurrent reservations can overdraw the pool.
    pub async fn reserve(&self, item_id: &str, quantity: i64) -> EngineResult<Reservation> {
        let item = self
            .items
            .read()
            .await
            .get(item_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownItem {
                item_id: item_id.to_string(),
            })?;

        // eSIM profiles are single-activation: one per line, no matter how
        // deep the pool is.
        if item.product_type == ProductType::Esim && quantity > 1 {
            return Err(EngineError::OutOfStock {
                item_id: item_id.to_string(),
                available: 1,
                requested: quantity,
            });
        }

        let pool = self.pool_handle(item.pool_key()).await;
        let mut stock = pool.lock().await;

        if *stock < quantity {
            return Err(EngineError::OutOfStock {
                item_id: item_id.to_string(),
                available: *stock,
                requested: quantity,
            });
        }

        *stock -= quantity;
        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            pool_key: item.pool_key().to_string(),
            quantity,
        };

        debug!(
            reservation_id = %reservation.id,
            item_id = %item_id,
            quantity,
            remaining = *stock,
            "Stock reserved"
        );
        Ok(reservation)
    }

    /// Reverses a reservation that never became a completed order,
    /// restoring the pool.
    pub async fn release(&self, reservation: Reservation) {
        let pool = self.pool_handle(&reservation.pool_key).await;
        let mut stock = pool.lock().await;
        *stock += reservation.quantity;

        debug!(
            reservation_id = %reservation.id,
            item_id = %reservation.item_id,
            quantity = reservation.quantity,
            restored = *stock,
            "Stock reservation released"
        );
    }

    /// Consumes a reservation: the decrement taken at reserve time becomes
    /// permanent.
    pub async fn finalize(&self, reservation: Reservation) {
        debug!(
            reservation_id = %reservation.id,
            item_id = %reservation.item_id,
            quantity = reservation.quantity,
            "Stock reservation finalized"
        );
        // The pool was already decremented at reserve time; dropping the
        // reservation makes that permanent.
    }

    async fn pool_handle(&self, pool_key: &str) -> Arc<Mutex<i64>> {
        if let Some(pool) = self.pools.read().await.get(pool_key) {
            return pool.clone();
        }

        // A reservation against an item whose pool was never seeded means a
        // registration bug upstream; treat as an empty pool.
        warn!(pool_key, "Stock pool missing, treating as empty");
        let mut pools = self.pools.write().await;
        pools
            .entry(pool_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(0)))
            .clone()
    }

    async fn pool_quantity(&self, pool_key: &str) -> i64 {
        match self.pools.read().await.get(pool_key) {
            Some(pool) => *pool.lock().await,
            None => 0,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
