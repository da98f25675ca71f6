//! # Promotion Evaluation
//!
//! Pure discount computation for promo codes.
//!
//! ## Evaluation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  evaluate(promotion, subtotal, now)                                     │
//! │                                                                         │
//! │  1. status_at(now) == Active?      ──no──► PromotionError::NotActive   │
//! │  2. usage_count < usage_limit?     ──no──► PromotionError::Exhausted   │
//! │  3. subtotal >= min_order_value?   ──no──► PromotionError::BelowMin    │
//! │  4. compute discount:                                                   │
//! │       Percentage  → subtotal × value / 100  (capped at subtotal)       │
//! │       FixedAmount → min(value, subtotal)                               │
//! │  5. return discount Money                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purity
//! `evaluate` reads the promotion and writes nothing. The same inputs always
//! produce the same discount, so checkout previews and retries are free.
//! Incrementing `usage_count` is the caller's job, after the order is fully
//! authorized.

use chrono::{DateTime, Utc};

use crate::error::PromotionError;
use crate::money::Money;
use crate::types::{DiscountType, Promotion, PromotionStatus};

/// Evaluates a promotion against an order subtotal.
///
/// Returns the discount amount. The discount never exceeds the subtotal, so
/// `subtotal - discount` is always non-negative.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use simflow_core::money::Money;
/// use simflow_core::promotion::evaluate;
/// use simflow_core::types::{DiscountType, Promotion};
///
/// let now = Utc::now();
/// let promo = Promotion {
///     id: "p1".into(),
///     promo_code: "SAVE50".into(),
///     discount_type: DiscountType::Percentage,
///     discount_value: 50,
///     min_order_value_cents: Some(10000),
///     usage_limit: None,
///     usage_count: 0,
///     start_date: now - Duration::days(1),
///     end_date: now + Duration::days(1),
/// };
///
/// let discount = evaluate(&promo, Money::from_cents(20000), now).unwrap();
/// assert_eq!(discount.cents(), 10000);
/// ```
pub fn evaluate(
    promotion: &Promotion,
    subtotal: Money,
    now: DateTime<Utc>,
) -> Result<Money, PromotionError> {
    let status = promotion.status_at(now);
    if status != PromotionStatus::Active {
        return Err(PromotionError::NotActive {
            code: promotion.promo_code.clone(),
            status: match status {
                PromotionStatus::Scheduled => "scheduled".to_string(),
                PromotionStatus::Expired => "expired".to_string(),
                PromotionStatus::Active => unreachable!(),
            },
        });
    }

    if promotion.is_exhausted() {
        return Err(PromotionError::UsageExhausted {
            code: promotion.promo_code.clone(),
            // is_exhausted() is only true when a limit is set
            limit: promotion.usage_limit.unwrap_or(0),
        });
    }

    if let Some(min_cents) = promotion.min_order_value_cents {
        if subtotal.cents() < min_cents {
            return Err(PromotionError::BelowMinimum {
                code: promotion.promo_code.clone(),
                subtotal_cents: subtotal.cents(),
                min_cents,
            });
        }
    }

    let discount = match promotion.discount_type {
        // Whole percents → basis points. Cap at the subtotal so a
        // misconfigured value can never drive the total negative.
        DiscountType::Percentage => subtotal
            .percentage_of((promotion.discount_value * 100) as u32)
            .min(subtotal),
        DiscountType::FixedAmount => Money::from_cents(promotion.discount_value).min(subtotal),
    };

    Ok(discount)
}

// =============================================================================
// Unit Tests
// =============================================================================
