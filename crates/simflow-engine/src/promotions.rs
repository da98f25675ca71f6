//! # Promotion Directory
//!
//! Case-insensitive registry of promotions. Evaluation stays pure (it
//! delegates to `simflow_core::promotion::evaluate`); the only mutation is
//! `record_use`, called by the authorizer after an order that applied the
//! promotion is fully authorized.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use simflow_core::error::PromotionError;
use simflow_core::money::Money;
use simflow_core::promotion::evaluate;
use simflow_core::types::Promotion;
use simflow_core::validation::validate_promotion;

use crate::error::EngineResult;

// =============================================================================
// Promotion Directory
// =============================================================================

pub struct PromotionDirectory {
    // keyed by lowercased promo code
    promotions: RwLock<HashMap<String, Promotion>>,
}

impl PromotionDirectory {
    pub fn new() -> Self {
        PromotionDirectory {
            promotions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers or updates a promotion, keyed by its code case-insensitively.
    ///
    /// Malformed records (non-positive or over-100% discount values,
    /// inverted date windows, bad codes) are rejected here so that
    /// evaluation can assume well-formed promotions.
    pub async fn upsert(&self, promotion: Promotion) -> EngineResult<()> {
        validate_promotion(&promotion)?;

        debug!(
            promo_code = %promotion.promo_code,
            discount_type = ?promotion.discount_type,
            "Upserting promotion"
        );
        self.promotions
            .write()
            .await
            .insert(promotion.promo_code.to_lowercase(), promotion);
        Ok(())
    }

    /// Snapshot of a promotion by code.
    pub async fn get(&self, code: &str) -> Option<Promotion> {
        self.promotions
            .read()
            .await
            .get(&code.trim().to_lowercase())
            .cloned()
    }

    /// Evaluates a promo code against an order subtotal. Pure: calling this
    /// twice with the same inputs yields the same discount and mutates
    /// nothing, so checkout previews and retries are free.
    pub async fn evaluate(
        &self,
        code: &str,
        subtotal: Money,
        now: DateTime<Utc>,
    ) -> Result<Money, PromotionError> {
        let promotions = self.promotions.read().await;
        let promotion = promotions
            .get(&code.trim().to_lowercase())
            .ok_or_else(|| PromotionError::NotFound {
                code: code.to_string(),
            })?;

        evaluate(promotion, subtotal, now)
    }

    /// Counts one redemption. Called once per authorized order that applied
    /// the promotion, after authorization succeeds.
    ///
    /// A concurrent order may have consumed the last use between evaluation
    /// and this call; the overrun is logged and kept, never rolled back
    /// (usage_count is monotone).
    pub async fn record_use(&self, code: &str) {
        let mut promotions = self.promotions.write().await;
        match promotions.get_mut(&code.trim().to_lowercase()) {
            Some(promotion) => {
                promotion.usage_count += 1;
                if let Some(limit) = promotion.usage_limit {
                    if promotion.usage_count > limit {
                        warn!(
                            promo_code = %promotion.promo_code,
                            usage_count = promotion.usage_count,
                            limit,
                            "Promotion usage recorded past its limit"
                        );
                        return;
                    }
                }
                debug!(
                    promo_code = %promotion.promo_code,
                    usage_count = promotion.usage_count,
                    "Promotion use recorded"
                );
            }
            None => warn!(code, "record_use for unknown promo code"),
        }
    }
}

impl Default for PromotionDirectory {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
