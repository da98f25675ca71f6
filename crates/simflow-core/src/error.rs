//! # Error Types
//!
//! Domain-specific error types for simflow-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  simflow-core errors (this file)                                       │
//! │  ├── PromotionError   - Why a discount did not apply                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  simflow-engine errors (separate crate)                                │
//! │  └── EngineError      - Stock, credit, and delivery failures           │
//! │                                                                         │
//! │  Every error here is recoverable by the caller: retry with an          │
//! │  adjusted quantity or code, or surface a user-facing message.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, available amount, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Promotion Error
// =============================================================================

/// Why a promo code did not yield a discount.
///
/// Promotion errors never block checkout: the authorizer zeroes the discount
/// and proceeds. Preview callers surface them to the user instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromotionError {
    /// No promotion matches the supplied code.
    #[error("promo code not found: {code}")]
    NotFound { code: String },

    /// The promotion exists but is outside its date window.
    #[error("promo code {code} is {status} at this time")]
    NotActive { code: String, status: String },

    /// The usage cap has been reached.
    #[error("promo code {code} has reached its usage limit of {limit}")]
    UsageExhausted { code: String, limit: u32 },

    /// Order subtotal is below the promotion's minimum.
    #[error("order subtotal {subtotal_cents} is below the minimum {min_cents} for {code}")]
    BelowMinimum {
        code: String,
        subtotal_cents: i64,
        min_cents: i64,
    },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a request doesn't meet requirements. Used for early
/// validation before any reservation or debit happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (bad characters, not a UUID, etc.).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
