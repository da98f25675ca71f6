//! # Validation Module
//!
//! Input validation for order requests and catalog writes.
//!
//! Runs before any reservation or debit: a request that fails here has
//! touched no shared state and needs no rollback.
//!
//! ## Usage
//! ```rust
//! use simflow_core::types::ProductType;
//! use simflow_core::validation::{validate_line_quantity, validate_promo_code};
//!
//! validate_line_quantity(ProductType::Epin, 3).unwrap();
//! validate_promo_code("SAVE50").unwrap();
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::types::{DiscountType, OrderRequest, ProductType, Promotion};
use crate::MAX_ORDER_LINES;

// =============================================================================
// Line Validators
// =============================================================================

/// Validates a line quantity against the product-type rule.
///
/// ## Rules
/// - Must be positive
/// - ESIM: exactly 1 (single-activation)
/// - EPIN: 1 to 5
pub fn validate_line_quantity(product_type: ProductType, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    let max = product_type.max_line_quantity();
    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates the shape of an order request (not stock or credit — those are
/// the engine's job).
///
/// ## Rules
/// - At least one line
/// - At most MAX_ORDER_LINES lines
/// - Every line names an item
/// - Quantities positive (the per-type cap needs the catalog, so the
///   authorizer re-checks it once items are resolved)
///
/// The promo code is deliberately not checked here: promotion failures
/// never block checkout, a malformed code simply matches nothing and the
/// order proceeds at full price.
pub fn validate_order_request(request: &OrderRequest) -> ValidationResult<()> {
    if request.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if request.lines.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    for line in &request.lines {
        if line.item_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "item_id".to_string(),
            });
        }
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a promo code's shape.
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - Alphanumeric, hyphens, underscores only
pub fn validate_promo_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "promo_code".to_string(),
        });
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "promo_code".to_string(),
            max: 32,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "promo_code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a promotion record before it enters the directory.
///
/// ## Rules
/// - Code shape per [`validate_promo_code`]
/// - `discount_value` strictly positive
/// - Percentage discounts at most 100
/// - `start_date` not after `end_date`
/// - Minimum order value, when set, strictly positive
pub fn validate_promotion(promotion: &Promotion) -> ValidationResult<()> {
    validate_promo_code(&promotion.promo_code)?;

    if promotion.discount_value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "discount_value".to_string(),
        });
    }

    if promotion.discount_type == DiscountType::Percentage && promotion.discount_value > 100 {
        return Err(ValidationError::OutOfRange {
            field: "discount_value".to_string(),
            min: 1,
            max: 100,
        });
    }

    if promotion.start_date > promotion.end_date {
        return Err(ValidationError::InvalidFormat {
            field: "start_date".to_string(),
            reason: "must not be after end_date".to_string(),
        });
    }

    if let Some(min) = promotion.min_order_value_cents {
        if min <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "min_order_value".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents. Zero is allowed (promotional freebies).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a credit limit in cents. Must be strictly positive.
pub fn validate_credit_limit_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "credit_limit".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderRequestLine, PaymentMethod};
    use chrono::{Duration, Utc};

    fn request(lines: Vec<OrderRequestLine>) -> OrderRequest {
        OrderRequest {
            retailer_id: None,
            lines,
            promo_code: None,
            payment_method: PaymentMethod::ExternalGateway,
        }
    }

    #[test]
    fn test_epin_quantity_bounds() {
        assert!(validate_line_quantity(ProductType::Epin, 1).is_ok());
        assert!(validate_line_quantity(ProductType::Epin, 5).is_ok());

        assert!(validate_line_quantity(ProductType::Epin, 0).is_err());
        assert!(validate_line_quantity(ProductType::Epin, 6).is_err());
        assert!(validate_line_quantity(ProductType::Epin, -1).is_err());
    }

    #[test]
    fn test_esim_quantity_fixed_at_one() {
        assert!(validate_line_quantity(ProductType::Esim, 1).is_ok());
        assert!(validate_line_quantity(ProductType::Esim, 2).is_err());
    }

    #[test]
    fn test_validate_promo_code() {
        assert!(validate_promo_code("SAVE50").is_ok());
        assert!(validate_promo_code("launch-20").is_ok());
        assert!(validate_promo_code("EID_2026").is_ok());

        assert!(validate_promo_code("").is_err());
        assert!(validate_promo_code("   ").is_err());
        assert!(validate_promo_code("has space").is_err());
        assert!(validate_promo_code(&"A".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_order_request() {
        assert!(validate_order_request(&request(vec![])).is_err());

        let ok = request(vec![OrderRequestLine {
            item_id: "item-1".to_string(),
            quantity: 2,
        }]);
        assert!(validate_order_request(&ok).is_ok());

        let bad_qty = request(vec![OrderRequestLine {
            item_id: "item-1".to_string(),
            quantity: 0,
        }]);
        assert!(validate_order_request(&bad_qty).is_err());

        let blank_item = request(vec![OrderRequestLine {
            item_id: "  ".to_string(),
            quantity: 1,
        }]);
        assert!(validate_order_request(&blank_item).is_err());
    }

    #[test]
    fn test_order_request_tolerates_malformed_promo_code() {
        // a bad code matches nothing later; it must not fail the request
        let mut r = request(vec![OrderRequestLine {
            item_id: "item-1".to_string(),
            quantity: 1,
        }]);
        r.promo_code = Some("not a code".to_string());
        assert!(validate_order_request(&r).is_ok());
    }

    #[test]
    fn test_validate_promotion() {
        let now = Utc::now();
        let base = Promotion {
            id: "p1".to_string(),
            promo_code: "SAVE50".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 50,
            min_order_value_cents: Some(10000),
            usage_limit: None,
            usage_count: 0,
            start_date: now,
            end_date: now + Duration::days(1),
        };
        assert!(validate_promotion(&base).is_ok());

        let mut negative = base.clone();
        negative.discount_type = DiscountType::FixedAmount;
        negative.discount_value = -500;
        assert!(matches!(
            validate_promotion(&negative).unwrap_err(),
            ValidationError::MustBePositive { .. }
        ));

        let mut over_hundred = base.clone();
        over_hundred.discount_value = 150;
        assert!(matches!(
            validate_promotion(&over_hundred).unwrap_err(),
            ValidationError::OutOfRange { .. }
        ));

        // 150 cents is a legal fixed amount, only percentages are capped
        let mut fixed = base.clone();
        fixed.discount_type = DiscountType::FixedAmount;
        fixed.discount_value = 150;
        assert!(validate_promotion(&fixed).is_ok());

        let mut inverted = base.clone();
        inverted.start_date = now + Duration::days(2);
        inverted.end_date = now;
        assert!(validate_promotion(&inverted).is_err());

        let mut bad_min = base;
        bad_min.min_order_value_cents = Some(0);
        assert!(validate_promotion(&bad_min).is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-1).is_err());

        assert!(validate_credit_limit_cents(1).is_ok());
        assert!(validate_credit_limit_cents(0).is_err());
        assert!(validate_credit_limit_cents(-100).is_err());
    }
}
